//! # Lookbook Vision
//!
//! This crate wraps the vision-capable chat model behind two narrow
//! capabilities used by the recommendation pipeline:
//!
//! - **Describe**: reference image → structured complementary-item analysis
//! - **Verify**: reference + candidate image → yes/no verdict with a reason
//!
//! Both capabilities are traits so the pipeline can be tested with
//! deterministic stubs; the OpenAI-backed implementations share one
//! [`ChatClient`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Vision System                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ImageData ──► ChatClient ──► structured JSON content          │
//! │                    │                  │                         │
//! │                    ▼                  ▼                         │
//! │              ItemAnalyzer         MatchJudge                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod describe;
pub mod error;
pub mod image;
pub mod verify;

pub use client::ChatClient;
pub use describe::{AnalysisWarning, Gender, ItemAnalysis, ItemAnalyzer, OpenAiAnalyzer};
pub use error::{Result, VisionError};
pub use image::ImageData;
pub use verify::{MatchJudge, OpenAiJudge, Verdict};
