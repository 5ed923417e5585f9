//! Context assembler
//!
//! Builds the generation-ready context bundle from gated retrieval
//! results: source-tagged text segments in the user's language, table
//! markup passed through untouched, and image references.
//!
//! Translation must never alter quantitative facts. Text is segmented
//! on a numeric-token pattern (integers, decimals, currency-prefixed
//! amounts, percentages); only the non-numeric segments are translated
//! and the pieces are rejoined in their original order and positions.

use polyglot_common::Translator;
use polyglot_index::SearchResult;
use regex_lite::Regex;
use std::sync::Arc;
use tracing::warn;

/// Language assumed for records whose metadata lacks a `lang` entry
const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// Matches numeric and currency literals that must survive translation
/// byte-identical: `$42.50`, `€1,000`, `42%`, `3.14`, `1000`.
const NUMERIC_TOKEN_PATTERN: &str = r"[$€£¥₺₹]\s?\d[\d,]*(?:\.\d+)?%?|\d[\d,]*(?:\.\d+)?%?";

/// Generation-ready context for one request
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    /// Source-tagged text segments joined by blank lines
    pub text: String,

    /// Table HTML fragments, untranslated (markup is never translated)
    pub tables: Vec<String>,

    /// Image references, passed through unmodified
    pub images: Vec<String>,

    /// Retrieval confidence attached by the gate
    pub confidence: f32,
}

/// Assembles context bundles, translating text toward the user language
pub struct ContextAssembler {
    translator: Arc<dyn Translator>,
    numeric_token: Regex,
}

impl ContextAssembler {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self {
            translator,
            numeric_token: Regex::new(NUMERIC_TOKEN_PATTERN).unwrap(),
        }
    }

    /// Build a context bundle from gated results
    ///
    /// Assembly never aborts: any segment whose translation fails is
    /// carried untranslated.
    pub async fn assemble(
        &self,
        results: &[SearchResult],
        target_lang: &str,
        confidence: f32,
    ) -> ContextBundle {
        let mut segments = Vec::with_capacity(results.len());
        let mut tables = Vec::new();
        let mut images = Vec::new();

        for result in results {
            let source_lang = result
                .metadata
                .get("lang")
                .map(String::as_str)
                .unwrap_or(DEFAULT_SOURCE_LANGUAGE);

            let text = if source_lang != target_lang && !result.text.is_empty() {
                self.translate_preserving_numbers(&result.text, source_lang, target_lang)
                    .await
            } else {
                result.text.clone()
            };

            let source = result
                .metadata
                .get("source")
                .map(String::as_str)
                .unwrap_or("unknown");
            segments.push(format!("[source: {}] {}", source, text));

            if let Some(table_html) = result.metadata.get("table_html") {
                tables.push(table_html.clone());
            }
            if let Some(image_path) = result.metadata.get("image_path") {
                images.push(image_path.clone());
            }
        }

        ContextBundle {
            text: segments.join("\n\n"),
            tables,
            images,
            confidence,
        }
    }

    /// Translate text while keeping numeric/currency literals intact
    pub async fn translate_preserving_numbers(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last_end = 0;

        for m in self.numeric_token.find_iter(text) {
            out.push_str(
                &self
                    .translate_segment(&text[last_end..m.start()], source_lang, target_lang)
                    .await,
            );
            out.push_str(m.as_str());
            last_end = m.end();
        }
        out.push_str(
            &self
                .translate_segment(&text[last_end..], source_lang, target_lang)
                .await,
        );

        out
    }

    async fn translate_segment(&self, segment: &str, source_lang: &str, target_lang: &str) -> String {
        if segment.trim().is_empty() {
            return segment.to_string();
        }

        match self
            .translator
            .translate(segment, source_lang, target_lang)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                warn!(
                    error = %e,
                    from = source_lang,
                    to = target_lang,
                    "Segment translation failed, keeping original"
                );
                segment.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyglot_common::errors::{AppError, Result};
    use polyglot_common::translate::IdentityTranslator;
    use polyglot_index::Metadata;

    struct UppercaseTranslator;

    #[async_trait::async_trait]
    impl Translator for UppercaseTranslator {
        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    struct FailingTranslator;

    #[async_trait::async_trait]
    impl Translator for FailingTranslator {
        async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
            Err(AppError::Translation {
                message: "unavailable".to_string(),
            })
        }
    }

    fn result(text: &str, entries: &[(&str, &str)]) -> SearchResult {
        let mut metadata = Metadata::new();
        for (k, v) in entries {
            metadata.insert(k.to_string(), v.to_string());
        }
        SearchResult {
            text: text.to_string(),
            metadata,
            score: 0.8,
        }
    }

    #[tokio::test]
    async fn test_numeric_literals_survive_translation() {
        let assembler = ContextAssembler::new(Arc::new(UppercaseTranslator));
        let out = assembler
            .translate_preserving_numbers("Price: $42.50 today", "en", "de")
            .await;
        assert!(out.contains("$42.50"));
        assert_eq!(out, "PRICE: $42.50 TODAY");
    }

    #[tokio::test]
    async fn test_multiple_numeric_tokens_keep_positions() {
        let assembler = ContextAssembler::new(Arc::new(UppercaseTranslator));
        let out = assembler
            .translate_preserving_numbers("from €1,000 to €2,500.75 or 15%", "en", "fr")
            .await;
        assert_eq!(out, "FROM €1,000 TO €2,500.75 OR 15%");
    }

    #[tokio::test]
    async fn test_translation_failure_keeps_original_segment() {
        let assembler = ContextAssembler::new(Arc::new(FailingTranslator));
        let out = assembler
            .translate_preserving_numbers("Price: $42.50 today", "en", "de")
            .await;
        assert_eq!(out, "Price: $42.50 today");
    }

    #[tokio::test]
    async fn test_segments_are_source_tagged_and_joined() {
        let assembler = ContextAssembler::new(Arc::new(IdentityTranslator::new()));
        let results = vec![
            result("first passage", &[("source", "a.pdf#p1"), ("lang", "en")]),
            result("second passage", &[("source", "b.pdf#p2"), ("lang", "en")]),
        ];

        let bundle = assembler.assemble(&results, "en", 0.9).await;
        assert_eq!(
            bundle.text,
            "[source: a.pdf#p1] first passage\n\n[source: b.pdf#p2] second passage"
        );
        assert!((bundle.confidence - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_table_markup_passes_through_untranslated() {
        let assembler = ContextAssembler::new(Arc::new(UppercaseTranslator));
        let results = vec![result(
            "Model | Price\nS25 | $999",
            &[
                ("source", "specs.pdf#p2"),
                ("lang", "es"),
                ("table_html", "<table><tr><td>S25</td><td>$999</td></tr></table>"),
            ],
        )];

        let bundle = assembler.assemble(&results, "en", 0.8).await;
        // The flattened twin is translated into the text segment
        assert!(bundle.text.contains("MODEL | PRICE"));
        // The markup twin is untouched
        assert_eq!(
            bundle.tables,
            vec!["<table><tr><td>S25</td><td>$999</td></tr></table>".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_lang_defaults_to_english() {
        let assembler = ContextAssembler::new(Arc::new(UppercaseTranslator));
        let results = vec![result("no lang here", &[("source", "x.txt")])];

        // Target is English, source defaults to English: no translation
        let bundle = assembler.assemble(&results, "en", 0.7).await;
        assert!(bundle.text.contains("no lang here"));
    }

    #[tokio::test]
    async fn test_image_references_pass_through() {
        let assembler = ContextAssembler::new(Arc::new(IdentityTranslator::new()));
        let results = vec![result(
            "figure caption",
            &[("source", "r.pdf#p4"), ("image_path", "figures/r4.png")],
        )];

        let bundle = assembler.assemble(&results, "en", 0.8).await;
        assert_eq!(bundle.images, vec!["figures/r4.png".to_string()]);
    }
}
