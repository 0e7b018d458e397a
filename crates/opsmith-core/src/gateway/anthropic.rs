//! Reqwest client for the Anthropic Messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::TextGateway;
use crate::domain::GatewayError;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Request body for the Messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.content_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

/// Production [`TextGateway`] backed by the Anthropic Messages API.
///
/// Temperature is pinned to 0.0: generation output feeds a parser, not a
/// human, and determinism keeps repair diffs small.
#[derive(Debug)]
pub struct AnthropicGateway {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicGateway {
    /// Create a gateway against the default API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a gateway against a custom base URL (mock servers in tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Read the API key from `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self, GatewayError> {
        let key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| GatewayError::MissingApiKey("ANTHROPIC_API_KEY".to_string()))?;
        Ok(Self::new(key))
    }

    /// Override the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the per-call token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl TextGateway for AnthropicGateway {
    async fn invoke(&self, prompt: &str) -> Result<String, GatewayError> {
        let url = format!("{}/v1/messages", self.base_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(GatewayError::RateLimited { retry_after });
        }

        if status >= 400 {
            let message = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(GatewayError::Api { status, message });
        }

        let parsed: MessagesResponse = response.json().await?;
        let text = parsed.text().ok_or(GatewayError::EmptyResponse)?;
        if text.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults() {
        let gw = AnthropicGateway::new("test-key");
        assert_eq!(gw.base_url, DEFAULT_BASE_URL);
        assert_eq!(gw.model, DEFAULT_MODEL);
        assert_eq!(gw.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_gateway_builders() {
        let gw = AnthropicGateway::with_base_url("k", "http://localhost:8080")
            .with_model("claude-haiku-4-5")
            .with_max_tokens(1024);
        assert_eq!(gw.base_url, "http://localhost:8080");
        assert_eq!(gw.model, "claude-haiku-4-5");
        assert_eq!(gw.max_tokens, 1024);
    }

    #[test]
    fn test_request_serializes_without_extras() {
        let req = MessagesRequest {
            model: "m",
            max_tokens: 16,
            messages: vec![Message {
                role: "user",
                content: "hello",
            }],
            temperature: 0.0,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let resp: MessagesResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "thinking", "text": null},
                {"type": "text", "text": "FROM python:latest"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(resp.text(), Some("FROM python:latest"));
    }
}
