//! OpenAI GPT Provider Implementation
//!
//! Talks to the OpenAI Chat Completions API. The system prompt becomes a
//! leading system-role message; history turns map one-to-one onto the wire
//! format.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ChatMessage, LlmError, LlmProvider, ProviderResponse, Role};

/// Default OpenAI model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Chat Completions API endpoint
const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Request timeout; a transport property, not a retry policy
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// OpenAI GPT API provider
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

// The credential must never appear in logs.
impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey("openai".to_string()));
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

    async fn send(&self, request: ChatRequest<'_>) -> Result<ProviderResponse, LlmError> {
        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Empty choices array".to_string()))?;

        Ok(ProviderResponse {
            content,
            input_tokens: parsed.usage.prompt_tokens,
            output_tokens: parsed.usage.completion_tokens,
            model: parsed.model,
            provider: "openai".to_string(),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
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
        let request = ChatRequest {
            model: &self.model,
            max_tokens,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system_prompt,
                },
                WireMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
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

        let request = ChatRequest {
            model: &self.model,
            max_tokens,
            messages: wire_messages,
        };
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAiProvider::new("sk-test", DEFAULT_MODEL).unwrap();
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_openai_provider_rejects_empty_key() {
        let result = OpenAiProvider::new("", DEFAULT_MODEL);
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = OpenAiProvider::new("sk-very-secret", DEFAULT_MODEL).unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-very-secret"));
    }

    #[test]
    fn test_system_prompt_becomes_leading_message() {
        let request = ChatRequest {
            model: "m",
            max_tokens: 64,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: "persona",
                },
                WireMessage {
                    role: "user",
                    content: "task",
                },
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
    }
}
