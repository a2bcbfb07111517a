//! Similarity index over catalog embeddings.
//!
//! The index is built once from a corpus and read-only afterwards. Entries
//! keep their insertion order, which is also the tie-break order for equal
//! scores, so query results are deterministic.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::{SimilarityResult, cosine_similarity};

/// An entry in the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique identifier.
    pub id: String,

    /// The embedding vector.
    pub embedding: Embedding,
}

/// An in-memory similarity index with exact cosine ranking.
///
/// Every vector has the same dimension, fixed at construction and enforced
/// on add, query and load. Queries are full linear scans; at catalog scale
/// exact ranking beats an approximate structure.
pub struct SimilarityIndex {
    /// Stored entries, in insertion order.
    entries: Vec<IndexEntry>,

    /// Position of each id in `entries`.
    positions: HashMap<String, usize>,

    /// Expected dimension of embeddings.
    dimension: usize,
}

impl SimilarityIndex {
    /// Create a new similarity index.
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            dimension,
        }
    }

    /// Add an embedding to the index.
    ///
    /// Ids are unique; re-adding one is an error rather than an overwrite,
    /// since the index is build-once.
    pub fn add(&mut self, id: impl Into<String>, embedding: Embedding) -> Result<()> {
        let id = id.into();

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        if self.positions.contains_key(&id) {
            return Err(EmbeddingError::DuplicateId(id));
        }

        self.positions.insert(id.clone(), self.entries.len());
        debug!("added embedding to index: {id}");
        self.entries.push(IndexEntry { id, embedding });

        Ok(())
    }

    /// Get an entry by ID.
    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.positions.get(id).map(|&pos| &self.entries[pos])
    }

    /// Check if an ID exists in the index.
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Get the number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension every vector in the index has.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Search for similar embeddings.
    ///
    /// Returns up to `top_k` results with `score >= threshold`, sorted
    /// descending by score; ties keep insertion order. Entries with a
    /// zero-norm vector are excluded rather than scored as NaN, and a
    /// zero-norm query matches nothing.
    pub fn query(
        &self,
        query: &Embedding,
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<SimilarityResult>> {
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(OrderedFloat<f32>, usize)> = Vec::new();
        for (position, entry) in self.entries.iter().enumerate() {
            if let Some(score) = cosine_similarity(query, &entry.embedding)? {
                if score >= threshold {
                    scored.push((OrderedFloat(score), position));
                }
            }
        }

        // Stable sort: equal scores keep ascending position order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, position)| SimilarityResult::new(self.entries[position].id.clone(), score.0))
            .collect())
    }

    /// Serialize the index to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Load index from JSON, validating every vector's dimension.
    pub fn from_json(json: &str, dimension: usize) -> Result<Self> {
        let entries: Vec<IndexEntry> = serde_json::from_str(json)?;

        let mut index = Self::new(dimension);
        for entry in entries {
            index.add(entry.id, entry.embedding)?;
        }

        info!("loaded {} entries into similarity index", index.len());
        Ok(index)
    }
}
