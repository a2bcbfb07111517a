//! Token counting and truncation for embedding inputs.
//!
//! Corpus texts are cut to a token budget before they hit the wire. The
//! policy is keep-the-prefix, drop-the-remainder, and it is silent: an
//! over-budget text is not an error.

use std::path::Path;

use crate::error::{EmbeddingError, Result};

/// Token accounting used by the corpus embedder.
pub trait Tokenizer: Send + Sync {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> Result<usize>;

    /// Truncate `text` to at most `max_tokens` tokens, keeping the prefix.
    fn truncate(&self, text: &str, max_tokens: usize) -> Result<Truncated>;
}

/// Result of applying a token budget to one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    /// The (possibly shortened) text.
    pub text: String,

    /// Tokens in the returned text.
    pub tokens: usize,

    /// Whether anything was dropped.
    pub was_truncated: bool,
}

/// [`Tokenizer`] backed by a HuggingFace `tokenizer.json` definition.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
}

impl HfTokenizer {
    /// Load a tokenizer definition from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path.as_ref())
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        Ok(Self { inner })
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }
}

impl Tokenizer for HfTokenizer {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text)?.len())
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> Result<Truncated> {
        let ids = self.encode(text)?;
        if ids.len() <= max_tokens {
            return Ok(Truncated {
                text: text.to_string(),
                tokens: ids.len(),
                was_truncated: false,
            });
        }

        let decoded = self
            .inner
            .decode(&ids[..max_tokens], true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        Ok(Truncated {
            text: decoded,
            tokens: max_tokens,
            was_truncated: true,
        })
    }
}
