//! # Lookbook Pipeline
//!
//! Retrieval-augmented outfit recommendation over a clothing catalog:
//!
//! - **Analyze**: describe the reference image as complementary item
//!   descriptions plus category and audience
//! - **Retrieve**: embed each description and rank pre-filtered catalog
//!   rows by cosine similarity
//! - **Verify**: judge every unique candidate image against the reference,
//!   keeping only affirmed matches with reasons
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Outfit Pipeline                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │ ItemAnalyzer │  │  Similarity  │  │  MatchJudge  │          │
//! │  │   (vision)   │  │    Index     │  │   (vision)   │          │
//! │  └──────────────┘  └──────────────┘  └──────────────┘          │
//! │         │                │                  │                   │
//! │         ▼                ▼                  ▼                   │
//! │     analysis ──► MatchRetriever ──► GuardrailVerifier          │
//! │                                            │                    │
//! │                                            ▼                    │
//! │                                     Recommendation              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lookbook_pipeline::{Catalog, OutfitPipeline, PipelineConfig};
//!
//! let pipeline = OutfitPipeline::builder()
//!     .with_provider(provider)
//!     .with_analyzer(analyzer)
//!     .with_judge(judge)
//!     .with_catalog(catalog)
//!     .with_config(PipelineConfig::default().with_image_dir("data/images"))
//!     .build()?;
//!
//! let recommendation = pipeline.recommend(&reference_image).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod guardrail;
pub mod retriever;

pub use catalog::{Catalog, CatalogItem};
pub use config::PipelineConfig;
pub use engine::{OutfitPipeline, OutfitPipelineBuilder, Recommendation};
pub use error::{PipelineError, Result};
pub use guardrail::{
    GuardrailVerifier, UnverifiedCandidate, VerificationOutcome, VerifiedMatch,
};
pub use retriever::{MatchCandidate, MatchRetriever};

// Re-export from dependencies for convenience
pub use lookbook_embeddings::{CorpusEmbedder, EmbeddingProvider, SimilarityIndex};
pub use lookbook_vision::{Gender, ImageData, ItemAnalyzer, MatchJudge};
