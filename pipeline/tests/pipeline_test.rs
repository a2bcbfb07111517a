//! End-to-end pipeline tests with deterministic stub capabilities.
//!
//! The generative and embedding services are replaced with fixed tables,
//! so every stage of analyze → retrieve → verify is exercised with
//! reproducible expectations.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use lookbook_embeddings::{Embedding, EmbeddingError, EmbeddingProvider};
use lookbook_pipeline::{Catalog, CatalogItem, OutfitPipeline, PipelineConfig, PipelineError};
use lookbook_vision::{
    Gender, ImageData, ItemAnalysis, ItemAnalyzer, MatchJudge, Result as VisionResult, Verdict,
    VisionError,
};

/// Maps known texts to fixed vectors.
struct TableProvider {
    table: HashMap<String, Embedding>,
}

impl TableProvider {
    fn new(entries: &[(&str, Embedding)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TableProvider {
    fn name(&self) -> &str {
        "table"
    }

    fn model(&self) -> &str {
        "stub"
    }

    async fn embed_batch(&self, texts: &[String]) -> lookbook_embeddings::Result<Vec<Embedding>> {
        texts
            .iter()
            .map(|text| {
                self.table
                    .get(text)
                    .cloned()
                    .ok_or_else(|| EmbeddingError::ApiRequest(format!("unknown text {text:?}")))
            })
            .collect()
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Returns one fixed analysis regardless of the image.
struct FixedAnalyzer {
    analysis: ItemAnalysis,
}

#[async_trait]
impl ItemAnalyzer for FixedAnalyzer {
    async fn analyze(
        &self,
        _image: &ImageData,
        _allowed_categories: &[String],
    ) -> VisionResult<ItemAnalysis> {
        Ok(self.analysis.clone())
    }
}

/// Affirms candidates whose image file stem is listed; records calls.
struct ScriptedJudge {
    yes_stems: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    fn new(yes_stems: &[&str]) -> Self {
        Self {
            yes_stems: yes_stems.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MatchJudge for ScriptedJudge {
    async fn judge(
        &self,
        _reference: &ImageData,
        candidate: &ImageData,
    ) -> VisionResult<Verdict> {
        let stem = candidate
            .source()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .ok_or_else(|| VisionError::Image("candidate without a source path".to_string()))?
            .to_string();
        self.calls.lock().unwrap().push(stem.clone());

        Ok(Verdict {
            matches: self.yes_stems.contains(&stem),
            reason: format!("scripted verdict for {stem}"),
        })
    }
}

fn analysis(items: &[&str], category: &str, gender: Gender) -> ItemAnalysis {
    ItemAnalysis {
        items: items.iter().map(|s| s.to_string()).collect(),
        category: category.to_string(),
        gender,
        warnings: Vec::new(),
    }
}

fn embedded(id: &str, name: &str, category: &str, gender: Gender, v: Embedding) -> CatalogItem {
    let mut item = CatalogItem::new(id, name, category, gender);
    item.embedding = Some(v);
    item
}

/// Catalog from the reference scenario: Unisex sneakers and a Women dress.
fn scenario_catalog() -> Catalog {
    Catalog::new(vec![
        embedded("1", "White Sneakers", "Shoes", Gender::Unisex, vec![1.0, 0.0]),
        embedded("2", "Red Dress", "Dresses", Gender::Women, vec![0.0, 1.0]),
    ])
}

fn scenario_provider() -> Arc<TableProvider> {
    Arc::new(TableProvider::new(&[
        ("White Sneakers", vec![1.0, 0.0]),
        ("white low-top sneakers", vec![0.95, 0.05]),
    ]))
}

fn write_images(dir: &Path, ids: &[&str]) {
    for id in ids {
        std::fs::write(dir.join(format!("{id}.jpg")), [0u8; 4]).unwrap();
    }
}

fn pipeline(
    catalog: Catalog,
    analyzer: ItemAnalysis,
    judge: Arc<ScriptedJudge>,
    image_dir: &Path,
) -> OutfitPipeline {
    OutfitPipeline::builder()
        .with_provider(scenario_provider())
        .with_analyzer(Arc::new(FixedAnalyzer { analysis: analyzer }))
        .with_judge(judge)
        .with_catalog(catalog)
        .with_config(PipelineConfig::default().with_image_dir(image_dir))
        .build()
        .unwrap()
}

fn reference() -> ImageData {
    ImageData::from_bytes(vec![0xFF, 0xD8], "image/jpeg")
}

#[tokio::test]
async fn rejected_candidate_leaves_the_final_output_empty() {
    let images = TempDir::new().unwrap();
    write_images(images.path(), &["1", "2"]);

    // Reference: a Women's jacket. The Unisex sneakers pass the filter and
    // match the description; the judge then rules them out.
    let judge = Arc::new(ScriptedJudge::new(&[]));
    let pipeline = pipeline(
        scenario_catalog(),
        analysis(&["White Sneakers"], "Jackets", Gender::Women),
        Arc::clone(&judge),
        images.path(),
    );

    let recommendation = pipeline.recommend(&reference()).await.unwrap();

    assert!(recommendation.matches.is_empty());
    assert_eq!(recommendation.rejected, 1);
    assert_eq!(judge.calls.lock().unwrap().as_slice(), ["1".to_string()]);
}

#[tokio::test]
async fn affirmed_candidate_appears_once_even_via_two_descriptions() {
    let images = TempDir::new().unwrap();
    write_images(images.path(), &["1", "2"]);

    // Both descriptions embed close to the sneakers row.
    let judge = Arc::new(ScriptedJudge::new(&["1"]));
    let pipeline = pipeline(
        scenario_catalog(),
        analysis(
            &["White Sneakers", "white low-top sneakers"],
            "Jackets",
            Gender::Women,
        ),
        Arc::clone(&judge),
        images.path(),
    );

    let recommendation = pipeline.recommend(&reference()).await.unwrap();

    assert_eq!(recommendation.matches.len(), 1);
    let matched = &recommendation.matches[0];
    assert_eq!(matched.candidate.item_id, "1");
    assert_eq!(matched.candidate.source_description, "White Sneakers");
    assert_eq!(matched.reason, "scripted verdict for 1");
    // One judge call despite two retrieval routes to the same item.
    assert_eq!(judge.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn gender_incompatible_rows_never_reach_retrieval() {
    let images = TempDir::new().unwrap();
    write_images(images.path(), &["1", "2"]);

    // A Men's reference: the Women's dress is filtered out, the Unisex
    // sneakers stay reachable.
    let judge = Arc::new(ScriptedJudge::new(&["1", "2"]));
    let pipeline = pipeline(
        scenario_catalog(),
        analysis(&["White Sneakers"], "Jackets", Gender::Men),
        Arc::clone(&judge),
        images.path(),
    );

    let recommendation = pipeline.recommend(&reference()).await.unwrap();

    assert_eq!(recommendation.matches.len(), 1);
    assert_eq!(recommendation.matches[0].candidate.item_id, "1");
}

#[tokio::test]
async fn own_category_is_excluded_from_candidates() {
    let images = TempDir::new().unwrap();
    write_images(images.path(), &["1", "2"]);

    // The reference is itself a pair of shoes: the sneakers row shares the
    // category and must not come back, leaving nothing above threshold.
    let judge = Arc::new(ScriptedJudge::new(&["1", "2"]));
    let pipeline = pipeline(
        scenario_catalog(),
        analysis(&["White Sneakers"], "Shoes", Gender::Women),
        Arc::clone(&judge),
        images.path(),
    );

    let recommendation = pipeline.recommend(&reference()).await.unwrap();

    assert!(recommendation.matches.is_empty());
    assert!(judge.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn analysis_warnings_ride_along_in_the_recommendation() {
    let images = TempDir::new().unwrap();
    write_images(images.path(), &["1", "2"]);

    let mut foreign = analysis(&["White Sneakers"], "Capes", Gender::Women);
    foreign.warnings.push(
        lookbook_vision::AnalysisWarning::CategoryOutsideAllowed {
            category: "Capes".to_string(),
        },
    );

    let judge = Arc::new(ScriptedJudge::new(&["1"]));
    let pipeline = pipeline(scenario_catalog(), foreign, judge, images.path());

    let recommendation = pipeline.recommend(&reference()).await.unwrap();

    assert_eq!(recommendation.analysis.warnings.len(), 1);
    // A foreign category excludes nothing, so retrieval still works.
    assert_eq!(recommendation.matches.len(), 1);
}

#[tokio::test]
async fn search_ranks_the_whole_catalog_without_filters() {
    let images = TempDir::new().unwrap();
    write_images(images.path(), &["1", "2"]);

    let judge = Arc::new(ScriptedJudge::new(&[]));
    let pipeline = pipeline(
        scenario_catalog(),
        analysis(&[], "Jackets", Gender::Women),
        judge,
        images.path(),
    );

    let candidates = pipeline.search("White Sneakers", 5).await.unwrap();

    // No gender or category filter applies here; only the 0.5 threshold.
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].item_id, "1");
    assert!(candidates[0].score > 0.99);
}

#[test]
fn builder_rejects_missing_dependencies() {
    let result = OutfitPipeline::builder()
        .with_provider(scenario_provider())
        .with_catalog(scenario_catalog())
        .build();

    assert!(matches!(result, Err(PipelineError::Config(_))));
}
