//! Error types for the vision capabilities.

use thiserror::Error;

/// Result type alias for vision operations.
pub type Result<T> = std::result::Result<T, VisionError>;

/// Errors that can occur when calling the vision model.
#[derive(Error, Debug)]
pub enum VisionError {
    /// Model client not configured.
    #[error("vision model not configured")]
    NotConfigured,

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The model answered, but not in the agreed structure. Distinct from
    /// a service outage: this points at a prompt/contract mismatch.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    /// Image could not be read.
    #[error("image error: {0}")]
    Image(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
