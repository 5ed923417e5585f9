//! Answer engine
//!
//! Orchestrates one request end to end: detect the user language, align
//! the query to the index language, embed, search, gate, assemble
//! context, generate, and parse the answer into renderable blocks.
//!
//! No step is fatal to a request. Every failure path converges on the
//! same localized handoff message, indistinguishable from an
//! intentional escalation. Session state (chat history, UI caches) is
//! caller-held; the engine keeps nothing between requests.

use crate::context::{ContextAssembler, ContextBundle};
use crate::gate::{ConfidenceGate, GateDecision};
use crate::normalizer::QueryNormalizer;
use crate::parser::{ParsedResponse, ResponseBlock, ResponseParser};
use crate::prompts::{build_rag_prompt, SYSTEM_PROMPT};
use polyglot_common::{AppConfig, Embedder, Generator, LanguageDetector, Translator};
use polyglot_index::VectorStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Fixed English handoff message; translated per user language on return
pub const HANDOFF_MESSAGE: &str =
    "We are connecting you to our human agent who can assist you further. Please stay tuned.";

/// Renderable answer for one request
#[derive(Debug, Clone, Serialize)]
pub struct StructuredAnswer {
    /// Aggregated text blocks, joined by blank lines
    pub text: String,

    /// Sanitized table HTML fragments, in document order
    pub tables: Vec<String>,

    /// Image references from the retrieved context
    pub images: Vec<String>,

    /// Distinct source identifiers cited by the model
    pub sources: Vec<String>,

    /// Whether this answer is the human handoff
    pub escalated: bool,

    /// Retrieval confidence for the request
    pub confidence: f32,
}

/// End-to-end answer pipeline over a loaded vector store
pub struct AnswerEngine {
    normalizer: QueryNormalizer,
    gate: ConfidenceGate,
    assembler: ContextAssembler,
    parser: ResponseParser,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    translator: Arc<dyn Translator>,
    top_k: usize,
}

impl AnswerEngine {
    pub fn new(
        config: &AppConfig,
        detector: Arc<dyn LanguageDetector>,
        translator: Arc<dyn Translator>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            normalizer: QueryNormalizer::new(
                detector,
                translator.clone(),
                config.retrieval.index_language.clone(),
            ),
            gate: ConfidenceGate::new(config.retrieval.confidence_threshold),
            assembler: ContextAssembler::new(translator.clone()),
            parser: ResponseParser::new(),
            embedder,
            generator,
            translator,
            top_k: config.retrieval.top_k,
        }
    }

    /// Answer one query against the given store
    ///
    /// The store is read-only for the request; callers serialize writes
    /// externally.
    pub async fn answer(&self, store: &VectorStore, query: &str) -> StructuredAnswer {
        let user_lang = self.normalizer.detect_language(query);
        debug!(lang = %user_lang, "Handling query");

        let aligned = self
            .normalizer
            .align_to_index_language(query, &user_lang)
            .await;

        let query_vector = match self.embedder.embed(&aligned).await {
            Ok(vector) => vector,
            Err(e) => {
                error!(error = %e, "Query embedding failed, escalating");
                return self.escalate(&user_lang, 0.0).await;
            }
        };

        let results = match store.search(&query_vector, self.top_k) {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "Index search failed, escalating");
                return self.escalate(&user_lang, 0.0).await;
            }
        };

        let confidence = ConfidenceGate::confidence(&results);

        let (results, confidence) = match self.gate.gate(results) {
            GateDecision::Proceed {
                results,
                confidence,
            } => (results, confidence),
            GateDecision::Escalate => {
                return self.escalate(&user_lang, confidence).await;
            }
        };

        let bundle = self.assembler.assemble(&results, &user_lang, confidence).await;
        let prompt = build_rag_prompt(query, &bundle, HANDOFF_MESSAGE);

        let raw = match self.generator.generate(SYSTEM_PROMPT, &prompt).await {
            Ok(answer) => match answer.text() {
                Some(text) => text.to_string(),
                None => {
                    warn!("Generation returned no text content, escalating");
                    return self.escalate(&user_lang, confidence).await;
                }
            },
            Err(e) => {
                warn!(error = %e, "Generation failed, escalating");
                return self.escalate(&user_lang, confidence).await;
            }
        };

        // The model may itself choose the handoff token
        if raw.trim() == HANDOFF_MESSAGE {
            debug!("Model returned the handoff token");
            return self.escalate(&user_lang, confidence).await;
        }

        let parsed = self.parser.parse(&raw);
        debug!(blocks = parsed.blocks.len(), "Generated answer parsed");

        Self::render(parsed, bundle, confidence)
    }

    fn render(
        parsed: ParsedResponse,
        bundle: ContextBundle,
        confidence: f32,
    ) -> StructuredAnswer {
        let mut text_parts = Vec::new();
        let mut tables = Vec::new();

        for block in parsed.blocks {
            match block {
                ResponseBlock::Text(content) => text_parts.push(content),
                ResponseBlock::Table(html) => tables.push(html),
            }
        }

        StructuredAnswer {
            text: text_parts.join("\n\n"),
            tables,
            images: bundle.images,
            sources: parsed.sources,
            escalated: false,
            confidence,
        }
    }

    async fn escalate(&self, user_lang: &str, confidence: f32) -> StructuredAnswer {
        StructuredAnswer {
            text: self.localized_handoff(user_lang).await,
            tables: Vec::new(),
            images: Vec::new(),
            sources: Vec::new(),
            escalated: true,
            confidence,
        }
    }

    /// Translate the handoff to the user's language; English on failure
    async fn localized_handoff(&self, target_lang: &str) -> String {
        if target_lang == "en" {
            return HANDOFF_MESSAGE.to_string();
        }

        match self
            .translator
            .translate(HANDOFF_MESSAGE, "en", target_lang)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "Handoff translation failed, returning English");
                HANDOFF_MESSAGE.to_string()
            }
        }
    }
}
