//! Candidate retrieval over the similarity index.
//!
//! Each candidate description is embedded on its own (one small request,
//! not the corpus batching path) and queried against the index. Items
//! reached through several descriptions are kept once, attributed to the
//! first description that surfaced them.

use std::collections::HashSet;
use std::sync::Arc;

use lookbook_embeddings::{EmbeddingProvider, SimilarityIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::Result;

/// A retrieved catalog item with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Catalog item identifier.
    pub item_id: String,

    /// Catalog display name.
    pub name: String,

    /// Similarity score that surfaced the item.
    pub score: f32,

    /// The description whose embedding surfaced the item first.
    pub source_description: String,
}

/// Retrieves catalog candidates for a set of descriptions.
pub struct MatchRetriever {
    provider: Arc<dyn EmbeddingProvider>,
}

impl MatchRetriever {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Retrieve up to `top_k` items per description at or above `threshold`,
    /// deduplicated by item id across all descriptions.
    ///
    /// `index` is expected to cover only pre-filtered rows (gender
    /// compatible, analyzed category excluded); the retriever does not
    /// re-derive that filter. A failed description embedding fails the
    /// whole call: the descriptions belong to one analysis and a silently
    /// partial result would skew it.
    pub async fn retrieve(
        &self,
        index: &SimilarityIndex,
        catalog: &Catalog,
        descriptions: &[String],
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<MatchCandidate>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();

        for description in descriptions {
            let vector = self.provider.embed_one(description).await?;
            let results = index.query(&vector, threshold, top_k)?;
            debug!(
                description = %description,
                hits = results.len(),
                "queried index for description"
            );

            for result in results {
                if !seen.insert(result.id.clone()) {
                    continue;
                }
                let name = catalog
                    .get(&result.id)
                    .map(|item| item.name.clone())
                    .unwrap_or_default();
                candidates.push(MatchCandidate {
                    item_id: result.id,
                    name,
                    score: result.score,
                    source_description: description.clone(),
                });
            }
        }

        Ok(candidates)
    }
}
