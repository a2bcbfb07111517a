//! Error types for the recommendation pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] lookbook_embeddings::EmbeddingError),

    /// Vision error.
    #[error("vision error: {0}")]
    Vision(#[from] lookbook_vision::VisionError),

    /// Catalog content problem.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A catalog item is missing its embedding column.
    #[error("item {id} has no embedding; embed the catalog first")]
    MissingEmbedding { id: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
