//! Chat-completions client for vision requests.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, VisionError};
use crate::image::ImageData;

/// Thin wrapper over the chat completions endpoint.
///
/// Requests carry mixed text/image content parts; the single thing callers
/// get back is the first choice's message content.
pub struct ChatClient {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model requested from the API.
    model: String,

    /// Completion token ceiling per request.
    max_tokens: u32,
}

impl ChatClient {
    /// Create a new chat client.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 400,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the completion token ceiling.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Model requested from the API.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether an API key is configured.
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// A text content part.
    pub fn text_part(text: impl Into<String>) -> Value {
        serde_json::json!({ "type": "text", "text": text.into() })
    }

    /// An image content part.
    pub fn image_part(image: &ImageData) -> Value {
        serde_json::json!({
            "type": "image_url",
            "image_url": { "url": image.data_url() },
        })
    }

    /// Send one user message built from `parts`, returning the raw content
    /// of the first choice.
    pub async fn complete(&self, parts: Vec<Value>) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or(VisionError::NotConfigured)?;

        debug!("requesting chat completion with model: {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": parts }],
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);

            return Err(VisionError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisionError::ApiRequest(format!("API error: {error_text}")));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| VisionError::MalformedResponse("no choices in response".to_string()))
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a JSON object out of model content, tolerating markdown fences.
pub fn extract_json(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| VisionError::MalformedResponse(format!("{e}: {body:.120}")))
}

/// Chat completions response format.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extract_json_handles_bare_objects() {
        let value = extract_json(r#"{"answer": "yes"}"#).unwrap();
        assert_eq!(value["answer"], "yes");
    }

    #[test]
    fn extract_json_strips_code_fences() {
        let fenced = "```json\n{\"items\": [\"scarf\"]}\n```";
        let value = extract_json(fenced).unwrap();
        assert_eq!(value["items"][0], "scarf");

        let plain_fence = "```\n{\"items\": []}\n```";
        assert!(extract_json(plain_fence).is_ok());
    }

    #[test]
    fn extract_json_rejects_prose() {
        let result = extract_json("Sure! Here are some matching items.");
        assert!(matches!(result, Err(VisionError::MalformedResponse(_))));
    }

    #[test]
    fn content_parts_have_the_wire_shape() {
        let text = ChatClient::text_part("hello");
        assert_eq!(text["type"], "text");

        let image = ImageData::from_bytes(vec![7], "image/jpeg");
        let part = ChatClient::image_part(&image);
        assert_eq!(part["type"], "image_url");
        assert!(
            part["image_url"]["url"]
                .as_str()
                .unwrap()
                .starts_with("data:image/jpeg;base64,")
        );
    }
}
