//! Error types shared by the matching pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatcherError {
    /// An embedding or matrix step received zero documents.
    #[error("corpus is empty")]
    EmptyCorpus,

    /// A document with empty text was offered to a vector store.
    #[error("document {id} has empty text")]
    EmptyDocument { id: String },

    /// One of the two store artifacts is missing.
    #[error("vector store not found at {}", .path.display())]
    StoreNotFound { path: PathBuf },

    /// The store artifacts exist but disagree with each other.
    #[error("vector store at {} is corrupt: {reason}", .path.display())]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Transport, auth or quota failure reported by an embedding backend.
    #[error("embedding service error ({provider}): {message}")]
    EmbeddingService { provider: String, message: String },

    /// A raw document could not be turned into a structured record.
    #[error("failed to extract record {id}: {message}")]
    Extraction { id: String, message: String },

    #[error("vector index error: {0}")]
    Index(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl MatcherError {
    /// Whether the failure is worth retrying at the call site.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatcherError::EmbeddingService { .. })
    }
}

pub type MatcherResult<T> = Result<T, MatcherError>;
