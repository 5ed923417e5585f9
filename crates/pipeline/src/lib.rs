//! Polyglot Answer Pipeline
//!
//! The retrieval-and-decision pipeline for multilingual document QA:
//! - Cross-lingual query normalization into the index language
//! - Confidence gating between generation and human handoff
//! - Context assembly with numeric-preserving translation
//! - Strict grounded prompt construction
//! - Response parsing into sanitized text/table blocks
//!
//! Control flow: query → normalizer → embed → index search → gate →
//! (escalate | assemble → generate → parse).

pub mod context;
pub mod engine;
pub mod gate;
pub mod normalizer;
pub mod parser;
pub mod prompts;

// Re-export the request-level API
pub use context::{ContextAssembler, ContextBundle};
pub use engine::{AnswerEngine, StructuredAnswer, HANDOFF_MESSAGE};
pub use gate::{ConfidenceGate, GateDecision, DEFAULT_CONFIDENCE_THRESHOLD};
pub use normalizer::QueryNormalizer;
pub use parser::{
    ParsedResponse, ResponseBlock, ResponseParser, NO_RESPONSE_MESSAGE, UNPARSED_MESSAGE,
};
pub use prompts::{build_rag_prompt, SYSTEM_PROMPT};
