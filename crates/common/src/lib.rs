//! Polyglot Common Library
//!
//! Shared code for the Polyglot question-answering core:
//! - Error types and handling
//! - Configuration management
//! - Language detection abstraction
//! - Translation client abstraction
//! - Embedding client abstraction
//! - Generation client abstraction

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod generation;
pub mod language;
pub mod telemetry;
pub mod translate;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use generation::{Generator, ModelAnswer};
pub use language::LanguageDetector;
pub use translate::Translator;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;

/// Language the corpus is embedded in unless configured otherwise
pub const DEFAULT_INDEX_LANGUAGE: &str = "en";
