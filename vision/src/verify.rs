//! Guardrail verification of a candidate against the reference image.
//!
//! The judge is a two-outcome classifier: "yes" or "no" plus a short
//! justification. Any other answer value is a parse error, never a third
//! outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ChatClient, extract_json};
use crate::error::{Result, VisionError};
use crate::image::ImageData;

/// Outcome of comparing a candidate against the reference image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the candidate works with the reference item.
    pub matches: bool,

    /// Short model-provided justification.
    pub reason: String,
}

/// Capability: compare two images and rule yes or no.
#[async_trait]
pub trait MatchJudge: Send + Sync {
    /// Judge whether `candidate` would pair well with `reference`.
    async fn judge(&self, reference: &ImageData, candidate: &ImageData) -> Result<Verdict>;
}

/// [`MatchJudge`] backed by an OpenAI vision model.
pub struct OpenAiJudge {
    client: ChatClient,
}

impl OpenAiJudge {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    const PROMPT: &str = "You will be shown two images. The first is a \
        reference clothing item; the second is a candidate suggested to go \
        with it in an outfit. Decide whether the candidate genuinely \
        complements the reference item, considering style, color and \
        occasion.\n\
        Respond with a single JSON object and nothing else:\n\
        {\"answer\": \"yes\" or \"no\", \"reason\": \"<one sentence>\"}";
}

#[async_trait]
impl MatchJudge for OpenAiJudge {
    async fn judge(&self, reference: &ImageData, candidate: &ImageData) -> Result<Verdict> {
        let parts = vec![
            ChatClient::text_part(Self::PROMPT),
            ChatClient::image_part(reference),
            ChatClient::image_part(candidate),
        ];

        let content = self.client.complete(parts).await?;
        let verdict = parse_verdict(&content)?;

        debug!(matches = verdict.matches, "judged candidate image");
        Ok(verdict)
    }
}

/// Validate raw model content into a [`Verdict`].
pub fn parse_verdict(content: &str) -> Result<Verdict> {
    let value = extract_json(content)?;
    let wire: VerdictWire = serde_json::from_value(value)
        .map_err(|e| VisionError::MalformedResponse(format!("verdict shape: {e}")))?;

    let matches = match wire.answer.trim() {
        "yes" => true,
        "no" => false,
        other => {
            return Err(VisionError::MalformedResponse(format!(
                "verdict answer {other:?} is neither \"yes\" nor \"no\""
            )));
        }
    };

    Ok(Verdict {
        matches,
        reason: wire.reason,
    })
}

#[derive(Debug, Deserialize)]
struct VerdictWire {
    answer: String,
    reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn yes_and_no_are_the_only_outcomes() {
        let yes = parse_verdict(r#"{"answer": "yes", "reason": "matching palette"}"#).unwrap();
        assert!(yes.matches);
        assert_eq!(yes.reason, "matching palette");

        let no = parse_verdict(r#"{"answer": "no", "reason": "clashing styles"}"#).unwrap();
        assert!(!no.matches);
    }

    #[test]
    fn any_other_answer_is_malformed() {
        for answer in ["maybe", "Yes", "NO", ""] {
            let content = format!(r#"{{"answer": {answer:?}, "reason": "r"}}"#);
            let result = parse_verdict(&content);
            assert!(
                matches!(result, Err(VisionError::MalformedResponse(_))),
                "answer {answer:?} must be rejected"
            );
        }
    }

    #[test]
    fn fenced_verdicts_are_tolerated() {
        let fenced = "```json\n{\"answer\": \"yes\", \"reason\": \"works\"}\n```";
        assert!(parse_verdict(fenced).unwrap().matches);
    }

    #[test]
    fn missing_reason_is_malformed() {
        let result = parse_verdict(r#"{"answer": "yes"}"#);
        assert!(matches!(result, Err(VisionError::MalformedResponse(_))));
    }
}
