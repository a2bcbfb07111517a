//! Guardrail verification loop.
//!
//! Retrieval is similarity over text; the guardrail looks at the actual
//! pictures. Every unique candidate image is judged once against the
//! reference, affirmative verdicts survive, and a failure on one candidate
//! never takes down the run: the candidate is reported as unverified
//! instead.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use lookbook_vision::{ImageData, MatchJudge};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::retriever::MatchCandidate;

/// A candidate that passed verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedMatch {
    /// The retrieved candidate.
    pub candidate: MatchCandidate,

    /// Why the judge affirmed it.
    pub reason: String,
}

/// A candidate the judge could not rule on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnverifiedCandidate {
    /// The retrieved candidate.
    pub candidate: MatchCandidate,

    /// What went wrong (judge error or unreadable image).
    pub error: String,
}

/// Result of one guardrail pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Affirmed candidates with reasons, in verification order.
    pub matches: Vec<VerifiedMatch>,

    /// Candidates the judge turned down.
    pub rejected: usize,

    /// Candidates that could not be verified; reported, not fatal.
    pub unverified: Vec<UnverifiedCandidate>,

    /// Candidates dropped by the verification cap.
    pub skipped: usize,
}

/// Runs candidates through a [`MatchJudge`], one unique image at a time.
pub struct GuardrailVerifier {
    judge: Arc<dyn MatchJudge>,
    max_verifications: usize,
}

impl GuardrailVerifier {
    pub fn new(judge: Arc<dyn MatchJudge>, max_verifications: usize) -> Self {
        Self {
            judge,
            max_verifications,
        }
    }

    /// Verify `candidates` (each paired with its resolved image path)
    /// against the reference image.
    ///
    /// Candidates sharing an image path are verified once; the cap applies
    /// after deduplication and is logged, never silent. Verification runs
    /// sequentially in candidate order, so the outcome order is
    /// deterministic and matches retrieval order.
    pub async fn verify_candidates(
        &self,
        reference: &ImageData,
        candidates: Vec<(MatchCandidate, PathBuf)>,
    ) -> VerificationOutcome {
        let mut seen_paths: HashSet<PathBuf> = HashSet::new();
        let mut unique: Vec<(MatchCandidate, PathBuf)> = Vec::new();
        for (candidate, path) in candidates {
            if seen_paths.insert(path.clone()) {
                unique.push((candidate, path));
            }
        }

        let mut skipped = 0;
        if unique.len() > self.max_verifications {
            skipped = unique.len() - self.max_verifications;
            warn!(
                cap = self.max_verifications,
                skipped, "candidate count exceeds the verification cap"
            );
            unique.truncate(self.max_verifications);
        }

        let mut outcome = VerificationOutcome {
            skipped,
            ..VerificationOutcome::default()
        };

        for (candidate, path) in unique {
            let image = match ImageData::from_path(&path) {
                Ok(image) => image,
                Err(err) => {
                    warn!(item_id = %candidate.item_id, "candidate image unreadable: {err}");
                    outcome.unverified.push(UnverifiedCandidate {
                        candidate,
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            match self.judge.judge(reference, &image).await {
                Ok(verdict) if verdict.matches => {
                    debug!(item_id = %candidate.item_id, "candidate affirmed");
                    outcome.matches.push(VerifiedMatch {
                        candidate,
                        reason: verdict.reason,
                    });
                }
                Ok(verdict) => {
                    debug!(
                        item_id = %candidate.item_id,
                        reason = %verdict.reason,
                        "candidate rejected"
                    );
                    outcome.rejected += 1;
                }
                Err(err) => {
                    warn!(item_id = %candidate.item_id, "verification failed: {err}");
                    outcome.unverified.push(UnverifiedCandidate {
                        candidate,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            affirmed = outcome.matches.len(),
            rejected = outcome.rejected,
            unverified = outcome.unverified.len(),
            skipped = outcome.skipped,
            "guardrail pass complete"
        );
        outcome
    }
}
