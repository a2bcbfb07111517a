//! Concurrent corpus embedding with order-stable reassembly.
//!
//! Texts are truncated to a token budget, partitioned into contiguous
//! batches, and dispatched to the provider over a bounded worker pool.
//! Batches complete in any order; results are keyed by batch index and
//! re-sorted, so the output always aligns with the input. A single failed
//! batch (after the provider's retries) aborts the whole operation — there
//! is no partial index.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingProvider;
use crate::tokenizer::Tokenizer;

/// Tuning knobs for corpus embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEmbedderConfig {
    /// Texts per embedding request.
    pub batch_size: usize,

    /// Concurrent in-flight requests.
    pub concurrency: usize,

    /// Token budget per text; longer texts keep the prefix.
    pub max_tokens_per_item: usize,

    /// Price used for the pre-dispatch cost estimate.
    pub cost_per_1k_tokens: f64,
}

impl Default for CorpusEmbedderConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            concurrency: 8,
            max_tokens_per_item: 8191,
            cost_per_1k_tokens: 0.00002, // text-embedding-3-small
        }
    }
}

impl CorpusEmbedderConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_tokens_per_item(mut self, max_tokens: usize) -> Self {
        self.max_tokens_per_item = max_tokens;
        self
    }

    pub fn with_cost_per_1k_tokens(mut self, cost: f64) -> Self {
        self.cost_per_1k_tokens = cost;
        self
    }
}

/// Aggregate accounting reported before dispatch.
///
/// The cost figure is informational, not a billing guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of input texts.
    pub texts: usize,

    /// Tokens that will be sent, after truncation.
    pub total_tokens: usize,

    /// How many texts lost their tail to the budget.
    pub truncated: usize,

    /// `total_tokens / 1000 * cost_per_1k_tokens`.
    pub estimated_cost: f64,
}

/// Progress notifications emitted while a corpus embeds.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Dispatch is about to start.
    Started { stats: CorpusStats, batches: usize },

    /// One batch finished; completion order is non-deterministic.
    BatchCompleted {
        batch_index: usize,
        completed: usize,
        total: usize,
    },

    /// All batches finished and results were reassembled.
    Finished { texts: usize },
}

/// Optional observer for [`ProgressEvent`]s.
pub type ProgressFn = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Embeds a whole corpus through an [`EmbeddingProvider`].
pub struct CorpusEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    tokenizer: Arc<dyn Tokenizer>,
    config: CorpusEmbedderConfig,
    progress: Option<ProgressFn>,
}

impl CorpusEmbedder {
    /// Create a corpus embedder with default configuration.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            provider,
            tokenizer,
            config: CorpusEmbedderConfig::default(),
            progress: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: CorpusEmbedderConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a progress observer.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Token and cost accounting for `texts`, without embedding anything.
    pub fn estimate(&self, texts: &[String]) -> Result<CorpusStats> {
        Ok(self.prepare(texts)?.1)
    }

    /// Embed every text, returning vectors aligned with the input order.
    pub async fn embed_corpus(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let (prepared, stats) = self.prepare(texts)?;

        let batches: Vec<Vec<String>> = prepared
            .chunks(self.config.batch_size.max(1))
            .map(<[String]>::to_vec)
            .collect();
        let total_batches = batches.len();

        info!(
            texts = stats.texts,
            total_tokens = stats.total_tokens,
            truncated = stats.truncated,
            estimated_cost = stats.estimated_cost,
            batches = total_batches,
            "embedding corpus"
        );
        self.emit(ProgressEvent::Started {
            stats: stats.clone(),
            batches: total_batches,
        });

        let completed = Arc::new(AtomicUsize::new(0));
        let indexed: Vec<(usize, Vec<Embedding>)> =
            stream::iter(batches.into_iter().enumerate().map(|(batch_index, batch)| {
                let provider = Arc::clone(&self.provider);
                let progress = self.progress.clone();
                let completed = Arc::clone(&completed);
                async move {
                    let vectors = provider.embed_batch(&batch).await?;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(batch_index, done, total_batches, "batch embedded");
                    if let Some(progress) = progress {
                        progress(ProgressEvent::BatchCompleted {
                            batch_index,
                            completed: done,
                            total: total_batches,
                        });
                    }
                    Ok::<_, EmbeddingError>((batch_index, vectors))
                }
            }))
            .buffer_unordered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        // Reassemble in input order regardless of completion order.
        let mut indexed = indexed;
        indexed.sort_by_key(|(batch_index, _)| *batch_index);
        let vectors: Vec<Embedding> = indexed
            .into_iter()
            .flat_map(|(_, vectors)| vectors)
            .collect();

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "corpus of {} texts produced {} vectors",
                texts.len(),
                vectors.len()
            )));
        }

        self.emit(ProgressEvent::Finished {
            texts: vectors.len(),
        });
        Ok(vectors)
    }

    /// Truncate every text to the token budget and tally the stats.
    fn prepare(&self, texts: &[String]) -> Result<(Vec<String>, CorpusStats)> {
        let mut prepared = Vec::with_capacity(texts.len());
        let mut total_tokens = 0usize;
        let mut truncated = 0usize;

        for text in texts {
            let cut = self
                .tokenizer
                .truncate(text, self.config.max_tokens_per_item)?;
            if cut.was_truncated {
                truncated += 1;
                debug!(tokens = cut.tokens, "text truncated to token budget");
            }
            total_tokens += cut.tokens;
            prepared.push(cut.text);
        }

        let stats = CorpusStats {
            texts: texts.len(),
            total_tokens,
            truncated,
            estimated_cost: total_tokens as f64 / 1000.0 * self.config.cost_per_1k_tokens,
        };
        Ok((prepared, stats))
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            progress(event);
        }
    }
}
