//! Cross-lingual query normalizer
//!
//! The embedding service maps different languages to different vector
//! neighborhoods; queries must land in the same neighborhood as the
//! indexed documents for similarity search to be meaningful. The
//! normalizer detects the query language and aligns the text to the
//! index's embedding language before it is embedded.
//!
//! Both steps fail soft: detection falls back to English, alignment
//! falls back to the original text. A failed translation degrades
//! retrieval quality silently, which is an accepted tradeoff.

use polyglot_common::{LanguageDetector, Translator};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fallback language code when detection fails
const FALLBACK_LANGUAGE: &str = "en";

/// Aligns queries to the index's embedding language
pub struct QueryNormalizer {
    detector: Arc<dyn LanguageDetector>,
    translator: Arc<dyn Translator>,
    index_language: String,
}

impl QueryNormalizer {
    pub fn new(
        detector: Arc<dyn LanguageDetector>,
        translator: Arc<dyn Translator>,
        index_language: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            translator,
            index_language: index_language.into(),
        }
    }

    /// Detect the language of a query; never fails outward
    pub fn detect_language(&self, text: &str) -> String {
        match self.detector.detect(text) {
            Ok(code) if !code.is_empty() => code,
            Ok(_) => FALLBACK_LANGUAGE.to_string(),
            Err(e) => {
                debug!(error = %e, "Language detection failed, assuming English");
                FALLBACK_LANGUAGE.to_string()
            }
        }
    }

    /// Align a query to the index language
    ///
    /// Returns the text unchanged when it is already in the index
    /// language, or when translation fails.
    pub async fn align_to_index_language(&self, text: &str, detected_lang: &str) -> String {
        if detected_lang == self.index_language {
            return text.to_string();
        }

        match self
            .translator
            .translate(text, detected_lang, &self.index_language)
            .await
        {
            Ok(aligned) => {
                debug!(
                    from = detected_lang,
                    to = %self.index_language,
                    "Aligned query to index language"
                );
                aligned
            }
            Err(e) => {
                warn!(
                    error = %e,
                    from = detected_lang,
                    "Query alignment failed, embedding original text"
                );
                text.to_string()
            }
        }
    }

    /// Language the index corpus is embedded in
    pub fn index_language(&self) -> &str {
        &self.index_language
    }
}
