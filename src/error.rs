//! Error taxonomy for the ingestion and answering pipeline.
//!
//! Every failure the core can produce is a [`RagError`] variant. The core
//! never retries and never swallows an error; callers decide how to render
//! each kind. The `pdfrag` binary wraps these in `anyhow` at the top level.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    /// Identifier is not present in the model catalog.
    #[error("Unknown model '{identifier}'. Available models: {available}")]
    UnknownModel {
        identifier: String,
        available: String,
    },

    /// The document could not be parsed (corrupt or non-PDF payload).
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    /// Embedding backend unreachable or rejected the request.
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// Generation backend unreachable or rejected the request.
    #[error("Generation service error: {0}")]
    GenerationService(String),

    /// The vector index could not be built from the produced embeddings.
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// Query against an index that holds no passages.
    #[error("No content available: the document index is empty")]
    EmptyIndex,

    /// No persisted index under the given key.
    #[error("No saved index found at {}", path.display())]
    NotFound { path: PathBuf },

    /// An index, embedder or session was paired with a different model.
    #[error("Model mismatch: index was built with '{expected}', but '{actual}' was supplied")]
    ModelMismatch { expected: String, actual: String },

    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// Persisted index files exist but cannot be decoded.
    #[error("Corrupt saved index: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub(crate) fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        RagError::Io {
            source,
            context: context.into(),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
