//! End-to-end recommendation pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use lookbook_embeddings::EmbeddingProvider;
use lookbook_vision::{ImageData, ItemAnalysis, ItemAnalyzer, MatchJudge};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::guardrail::{GuardrailVerifier, UnverifiedCandidate, VerifiedMatch};
use crate::retriever::{MatchCandidate, MatchRetriever};

/// The final, filtered recommendation set for one reference image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// What the model saw in the reference image.
    pub analysis: ItemAnalysis,

    /// Verified matches with reasons, in verification order.
    pub matches: Vec<VerifiedMatch>,

    /// Candidates the guardrail turned down.
    pub rejected: usize,

    /// Candidates that could not be verified.
    pub unverified: Vec<UnverifiedCandidate>,

    /// Candidates dropped by the verification cap.
    pub skipped: usize,
}

/// Retrieval-augmented outfit recommendation over a clothing catalog.
///
/// The pipeline coordinates four explicit dependencies:
/// - an [`EmbeddingProvider`] for description embeddings,
/// - an [`ItemAnalyzer`] to describe the reference image,
/// - a [`MatchJudge`] to verify candidates against it,
/// - an embedded [`Catalog`].
///
/// All of them are injected at construction; nothing is read from process
/// globals.
pub struct OutfitPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    analyzer: Arc<dyn ItemAnalyzer>,
    judge: Arc<dyn MatchJudge>,
    catalog: Catalog,
    config: PipelineConfig,
}

impl OutfitPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> OutfitPipelineBuilder {
        OutfitPipelineBuilder::default()
    }

    /// The catalog this pipeline recommends from.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Recommend catalog items that complement the clothing item in
    /// `reference`.
    pub async fn recommend(&self, reference: &ImageData) -> Result<Recommendation> {
        let categories = self.catalog.categories();
        let analysis = self.analyzer.analyze(reference, &categories).await?;
        for warning in &analysis.warnings {
            warn!("analysis warning: {warning}");
        }
        info!(
            descriptions = analysis.items.len(),
            category = %analysis.category,
            gender = %analysis.gender,
            "reference image analyzed"
        );

        let subset = self
            .catalog
            .compatible_subset(analysis.gender, &analysis.category);
        if subset.is_empty() {
            info!("no compatible catalog rows; nothing to retrieve");
            return Ok(Recommendation {
                analysis,
                matches: Vec::new(),
                rejected: 0,
                unverified: Vec::new(),
                skipped: 0,
            });
        }

        let index = Catalog::index_of(&subset)?;
        let retriever = MatchRetriever::new(Arc::clone(&self.provider));
        let candidates = retriever
            .retrieve(
                &index,
                &self.catalog,
                &analysis.items,
                self.config.match_threshold,
                self.config.top_k_per_description,
            )
            .await?;
        info!(candidates = candidates.len(), "retrieval complete");

        let with_paths: Vec<(MatchCandidate, PathBuf)> = candidates
            .into_iter()
            .map(|candidate| {
                let path = self.image_path(&candidate.item_id);
                (candidate, path)
            })
            .collect();

        let verifier = GuardrailVerifier::new(
            Arc::clone(&self.judge),
            self.config.max_verifications,
        );
        let outcome = verifier.verify_candidates(reference, with_paths).await;

        Ok(Recommendation {
            analysis,
            matches: outcome.matches,
            rejected: outcome.rejected,
            unverified: outcome.unverified,
            skipped: outcome.skipped,
        })
    }

    /// Generic semantic search over the whole catalog.
    ///
    /// Unlike [`OutfitPipeline::recommend`] this applies no gender or
    /// category pre-filter and uses the looser
    /// [`PipelineConfig::query_threshold`].
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<MatchCandidate>> {
        let index = self.catalog.build_index()?;
        let retriever = MatchRetriever::new(Arc::clone(&self.provider));
        retriever
            .retrieve(
                &index,
                &self.catalog,
                &[query.to_string()],
                self.config.query_threshold,
                top_k,
            )
            .await
    }

    /// Resolve a catalog item to its image via the `{identifier}.{ext}`
    /// convention.
    fn image_path(&self, item_id: &str) -> PathBuf {
        self.config
            .image_dir
            .join(format!("{item_id}.{}", self.config.image_extension))
    }
}

/// Builder for [`OutfitPipeline`].
#[derive(Default)]
pub struct OutfitPipelineBuilder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    analyzer: Option<Arc<dyn ItemAnalyzer>>,
    judge: Option<Arc<dyn MatchJudge>>,
    catalog: Option<Catalog>,
    config: PipelineConfig,
}

impl OutfitPipelineBuilder {
    /// Set the embedding provider.
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the image analyzer.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn ItemAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Set the match judge.
    pub fn with_judge(mut self, judge: Arc<dyn MatchJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Set the catalog.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline, failing on any missing dependency.
    pub fn build(self) -> Result<OutfitPipeline> {
        let provider = self
            .provider
            .ok_or_else(|| PipelineError::Config("embedding provider not set".to_string()))?;
        let analyzer = self
            .analyzer
            .ok_or_else(|| PipelineError::Config("item analyzer not set".to_string()))?;
        let judge = self
            .judge
            .ok_or_else(|| PipelineError::Config("match judge not set".to_string()))?;
        let catalog = self
            .catalog
            .ok_or_else(|| PipelineError::Config("catalog not set".to_string()))?;
        if catalog.is_empty() {
            return Err(PipelineError::Catalog("catalog is empty".to_string()));
        }

        Ok(OutfitPipeline {
            provider,
            analyzer,
            judge,
            catalog,
            config: self.config,
        })
    }
}
