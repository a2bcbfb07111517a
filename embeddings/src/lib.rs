//! # Lookbook Embeddings
//!
//! This crate provides embedding generation and similarity search for the
//! lookbook recommendation pipeline.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert catalog text to dense vectors
//! - **Resilient Batching**: Concurrent, order-stable corpus embedding
//! - **Similarity Search**: Exact cosine ranking with threshold and top-k
//! - **Token Budgets**: Silent prefix truncation before embedding
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Embeddings System                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► CorpusEmbedder ──► SimilarityIndex      │
//! │       │                     │                   │               │
//! │       ▼                     ▼                   ▼               │
//! │  OpenAI API           Tokenizer           cosine ranking       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod corpus;
pub mod error;
pub mod index;
pub mod provider;
pub mod retry;
pub mod similarity;
pub mod tokenizer;

pub use corpus::{CorpusEmbedder, CorpusEmbedderConfig, CorpusStats, ProgressEvent, ProgressFn};
pub use error::{EmbeddingError, Result};
pub use index::{IndexEntry, SimilarityIndex};
pub use provider::{EmbeddingProvider, OpenAIProvider};
pub use retry::RetryPolicy;
pub use similarity::{SimilarityResult, cosine_similarity};
pub use tokenizer::{HfTokenizer, Tokenizer, Truncated};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings (varies by model).
pub const DEFAULT_DIMENSION: usize = 1536; // OpenAI text-embedding-3-small
