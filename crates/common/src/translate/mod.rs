//! Translation service abstraction
//!
//! Translation is a fallible collaborator: callers supply their own
//! fallback (usually the untranslated text) and never let a failed call
//! abort a request.

use crate::config::TranslationConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for text translation between two languages
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang` (ISO-639-1 codes)
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str)
        -> Result<String>;
}

/// HTTP translation client
pub struct HttpTranslator {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

impl HttpTranslator {
    /// Create a new translator from configuration
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let base_url = config
            .api_base
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "translation.api_base is required for the HTTP translator".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url,
            max_retries: config.max_retries,
        })
    }

    async fn request_with_retry(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * (2_u64.pow(attempt)));
                tokio::time::sleep(delay).await;
            }

            match self.make_request(text, source_lang, target_lang).await {
                Ok(translated) => return Ok(translated),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Translation request failed, retrying"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::Translation {
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn make_request(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        let url = format!("{}/translate", self.base_url);

        let request = TranslateRequest {
            text,
            source_language_code: source_lang,
            target_language_code: target_lang,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| AppError::Translation {
            message: format!("Request failed: {}", e),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Translation {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: TranslateResponse =
            response.json().await.map_err(|e| AppError::Translation {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(result.translated_text)
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        self.request_with_retry(text, source_lang, target_lang).await
    }
}

/// Translator that returns the input unchanged
///
/// Useful for monolingual deployments and as a test double.
#[derive(Debug, Default)]
pub struct IdentityTranslator;

impl IdentityTranslator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Create a translator based on configuration
pub fn create_translator(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    match config.api_base {
        Some(_) => Ok(Arc::new(HttpTranslator::new(config)?)),
        None => {
            tracing::warn!("translation.api_base not set, translation disabled");
            Ok(Arc::new(IdentityTranslator::new()))
        }
    }
}
