//! Configuration for the recommendation pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the recommendation pipeline.
///
/// Everything that was a module-level constant in earlier prototypes lives
/// here and is passed in at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Similarity floor for generic catalog queries.
    pub query_threshold: f32,

    /// Similarity floor for outfit-matching retrieval.
    pub match_threshold: f32,

    /// Results kept per candidate description.
    pub top_k_per_description: usize,

    /// Hard cap on guardrail model calls per run.
    pub max_verifications: usize,

    /// Directory holding catalog item images.
    pub image_dir: PathBuf,

    /// Extension used by the `{identifier}.{ext}` image convention.
    pub image_extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            query_threshold: 0.5,
            match_threshold: 0.6,
            top_k_per_description: 2,
            max_verifications: 20,
            image_dir: PathBuf::from("images"),
            image_extension: "jpg".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Set the generic query threshold.
    pub fn with_query_threshold(mut self, threshold: f32) -> Self {
        self.query_threshold = threshold;
        self
    }

    /// Set the outfit-matching threshold.
    pub fn with_match_threshold(mut self, threshold: f32) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Set how many results each description may contribute.
    pub fn with_top_k_per_description(mut self, top_k: usize) -> Self {
        self.top_k_per_description = top_k;
        self
    }

    /// Set the guardrail call cap.
    pub fn with_max_verifications(mut self, cap: usize) -> Self {
        self.max_verifications = cap;
        self
    }

    /// Set the catalog image directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    /// Set the image file extension.
    pub fn with_image_extension(mut self, ext: impl Into<String>) -> Self {
        self.image_extension = ext.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_documented_thresholds() {
        let config = PipelineConfig::default();
        assert_eq!(config.query_threshold, 0.5);
        assert_eq!(config.match_threshold, 0.6);
        assert_eq!(config.top_k_per_description, 2);
        assert_eq!(config.max_verifications, 20);
        assert_eq!(config.image_extension, "jpg");
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = PipelineConfig::default()
            .with_match_threshold(0.75)
            .with_top_k_per_description(5)
            .with_image_dir("/data/images")
            .with_image_extension("png");

        assert_eq!(config.match_threshold, 0.75);
        assert_eq!(config.top_k_per_description, 5);
        assert_eq!(config.image_dir, PathBuf::from("/data/images"));
        assert_eq!(config.image_extension, "png");
    }
}
