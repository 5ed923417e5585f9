//! Answer generation abstraction
//!
//! The generation collaborator takes a system prompt and a user prompt
//! and returns a typed answer payload. Deterministic decoding
//! (temperature 0) is expected by the pipeline; any extraction or shape
//! error surfaces as `Err` and is treated as an escalation trigger by
//! the caller.

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Typed answer payload from the generation collaborator
///
/// Replaces shape-probing over heterogeneous provider result objects:
/// either the provider handed back plain text, or a structured value the
/// caller addresses by field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelAnswer {
    /// Plain text answer
    Text(String),
    /// Structured answer payload with a `text` field
    Structured(serde_json::Value),
}

impl ModelAnswer {
    /// Extract the answer text, if the payload carries one
    pub fn text(&self) -> Option<&str> {
        match self {
            ModelAnswer::Text(t) => Some(t),
            ModelAnswer::Structured(v) => v.get("text").and_then(|t| t.as_str()),
        }
    }
}

/// Trait for answer generation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate an answer for the given system and user prompts
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<ModelAnswer>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// HTTP generation client
pub struct HttpGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: usize,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: Vec<TextPart<'a>>,
    messages: Vec<Message<'a>>,
    inference_config: InferenceConfig,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct InferenceConfig {
    temperature: f32,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    output: GenerateOutput,
}

#[derive(Deserialize)]
struct GenerateOutput {
    message: OutputMessage,
}

#[derive(Deserialize)]
struct OutputMessage {
    content: Vec<OutputPart>,
}

#[derive(Deserialize)]
struct OutputPart {
    text: Option<String>,
}

impl HttpGenerator {
    /// Create a new generator from configuration
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let base_url = config
            .api_base
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "generation.api_base is required for the HTTP generator".to_string(),
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
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            base_url,
        })
    }

    async fn make_request(&self, system_prompt: &str, user_prompt: &str) -> Result<ModelAnswer> {
        let url = format!("{}/model/{}/converse", self.base_url, self.model);

        let request = GenerateRequest {
            model: &self.model,
            system: vec![TextPart { text: system_prompt }],
            messages: vec![Message {
                role: "user",
                content: vec![TextPart { text: user_prompt }],
            }],
            inference_config: InferenceConfig {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            },
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| AppError::Generation {
            message: format!("Request failed: {}", e),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: GenerateResponse =
            response.json().await.map_err(|e| AppError::Generation {
                message: format!("Failed to parse response: {}", e),
            })?;

        let text = result
            .output
            .message
            .content
            .into_iter()
            .find_map(|part| part.text)
            .ok_or_else(|| AppError::Generation {
                message: "Response carried no text content".to_string(),
            })?;

        Ok(ModelAnswer::Text(text))
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<ModelAnswer> {
        self.make_request(system_prompt, user_prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Canned-answer generator for testing
pub struct MockGenerator {
    answer: Option<String>,
}

impl MockGenerator {
    /// Always return the given answer text
    pub fn returning(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
        }
    }

    /// Always fail generation
    pub fn failing() -> Self {
        Self { answer: None }
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> Result<ModelAnswer> {
        match &self.answer {
            Some(text) => Ok(ModelAnswer::Text(text.clone())),
            None => Err(AppError::Generation {
                message: "mock failure".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "mock-generation"
    }
}

/// Create a generator based on configuration
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(HttpGenerator::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_generator() {
        let generator = MockGenerator::returning("The answer.");
        let answer = generator.generate("system", "user").await.unwrap();
        assert_eq!(answer.text(), Some("The answer."));
    }

    #[test]
    fn test_structured_answer_text() {
        let answer = ModelAnswer::Structured(serde_json::json!({"text": "hi", "tables": []}));
        assert_eq!(answer.text(), Some("hi"));

        let answer = ModelAnswer::Structured(serde_json::json!({"tables": []}));
        assert_eq!(answer.text(), None);
    }

    #[test]
    fn test_http_generator_requires_base_url() {
        let config = GenerationConfig::default();
        assert!(HttpGenerator::new(&config).is_err());
    }
}
