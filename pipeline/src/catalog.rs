//! The clothing catalog and its embedding-backed index.
//!
//! Items are immutable once indexed. The embedding column starts empty,
//! is filled by a [`CorpusEmbedder`] pass aligned with row order, and is
//! persisted with the rest of the row as JSON.

use lookbook_embeddings::{CorpusEmbedder, CorpusStats, Embedding, SimilarityIndex};
use lookbook_vision::Gender;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// One catalog row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique identifier; also names the item's image file.
    pub id: String,

    /// Display name, the text that gets embedded.
    pub name: String,

    /// Open-vocabulary category label.
    pub category: String,

    /// Target audience.
    pub gender: Gender,

    /// Embedding of `name`; present only after an embedding pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
}

impl CatalogItem {
    /// Create an item without an embedding.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        gender: Gender,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            gender,
            embedding: None,
        }
    }
}

/// An in-memory clothing catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Create a catalog from rows.
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Load a catalog from its JSON serialization.
    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<CatalogItem> = serde_json::from_str(json)?;
        info!("loaded catalog with {} items", items.len());
        Ok(Self { items })
    }

    /// Serialize the catalog, embeddings included.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.items)?)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All rows, in catalog order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Distinct categories, first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.category) {
                seen.push(item.category.clone());
            }
        }
        seen
    }

    /// Rows compatible with `gender` whose category differs from
    /// `exclude_category`.
    ///
    /// This is the pre-filter retrieval assumes: gender must match exactly
    /// or either side is Unisex, and an analyzed jacket should never be
    /// answered with more jackets.
    pub fn compatible_subset(&self, gender: Gender, exclude_category: &str) -> Vec<&CatalogItem> {
        let subset: Vec<&CatalogItem> = self
            .items
            .iter()
            .filter(|item| {
                item.gender.is_compatible_with(gender) && item.category != exclude_category
            })
            .collect();
        debug!(
            total = self.items.len(),
            kept = subset.len(),
            %gender,
            exclude_category,
            "filtered catalog for retrieval"
        );
        subset
    }

    /// Fill the embedding column from display names, row-aligned.
    pub async fn embed_with(&mut self, embedder: &CorpusEmbedder) -> Result<CorpusStats> {
        let names: Vec<String> = self.items.iter().map(|item| item.name.clone()).collect();
        let stats = embedder.estimate(&names)?;
        let vectors = embedder.embed_corpus(&names).await?;

        for (item, vector) in self.items.iter_mut().zip(vectors) {
            item.embedding = Some(vector);
        }
        info!(items = self.items.len(), "embedded catalog display names");
        Ok(stats)
    }

    /// Build a similarity index over the whole catalog.
    ///
    /// Every item must carry an embedding; dimensions must agree.
    pub fn build_index(&self) -> Result<SimilarityIndex> {
        let refs: Vec<&CatalogItem> = self.items.iter().collect();
        Self::index_of(&refs)
    }

    /// Build a similarity index over a subset of rows (e.g. the output of
    /// [`Catalog::compatible_subset`]).
    pub fn index_of(items: &[&CatalogItem]) -> Result<SimilarityIndex> {
        let dimension = items
            .iter()
            .find_map(|item| item.embedding.as_ref())
            .map(Vec::len)
            .ok_or_else(|| PipelineError::Catalog("no embedded items to index".to_string()))?;

        let mut index = SimilarityIndex::new(dimension);
        for item in items {
            let embedding = item
                .embedding
                .as_ref()
                .ok_or_else(|| PipelineError::MissingEmbedding {
                    id: item.id.clone(),
                })?;
            index.add(item.id.clone(), embedding.clone())?;
        }
        Ok(index)
    }
}
