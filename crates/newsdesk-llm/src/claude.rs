//! Anthropic Claude Provider Implementation
//!
//! Talks to the Anthropic Messages API. Claude supports a native system
//! prompt and multi-turn message history, so both trait operations map
//! directly onto the wire format.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ChatMessage, LlmError, LlmProvider, ProviderResponse, Role};

/// Default Claude model
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic Messages API endpoint
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// API version header required by Anthropic
const API_VERSION: &str = "2023-06-01";

/// Request timeout; a transport property, not a retry policy
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Anthropic Claude API provider
pub struct ClaudeProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

// The credential must never appear in logs.
impl fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

impl ClaudeProvider {
    /// Create a new Claude provider
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey("claude".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: model.into(),
            client,
        })
    }

    async fn send(&self, request: MessagesRequest<'_>) -> Result<ProviderResponse, LlmError> {
        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, body)));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| LlmError::InvalidResponse("Empty content array".to_string()))?;

        Ok(ProviderResponse {
            content,
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
            model: parsed.model,
            provider: "claude".to_string(),
        })
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn provider_name(&self) -> &str {
        "claude"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<ProviderResponse, LlmError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            system: Some(system_prompt),
            messages: vec![WireMessage {
                role: "user",
                content: user_prompt,
            }],
        };
        self.send(request).await
    }

    async fn complete_with_history(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<ProviderResponse, LlmError> {
        let wire_messages = messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &m.content,
            })
            .collect();

        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            system: None,
            messages: wire_messages,
        };
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_provider_creation() {
        let provider = ClaudeProvider::new("sk-test", DEFAULT_MODEL).unwrap();
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert_eq!(provider.provider_name(), "claude");
    }

    #[test]
    fn test_claude_provider_rejects_empty_key() {
        let result = ClaudeProvider::new("", DEFAULT_MODEL);
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));

        let result = ClaudeProvider::new("   ", DEFAULT_MODEL);
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = ClaudeProvider::new("sk-very-secret", DEFAULT_MODEL).unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_request_serialization_omits_absent_system() {
        let request = MessagesRequest {
            model: "m",
            max_tokens: 64,
            system: None,
            messages: vec![WireMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
