//! Google Gemini Provider Implementation
//!
//! Talks to the Gemini generateContent API. Gemini has no system-role
//! separation and no role-tagged history in the shape this crate uses, so
//! both trait operations flatten their input into a single content block.
//! The flattening is deterministic (system first, blank line, user; history
//! joined in turn order by blank lines) so that prompts are reproducible
//! across runs.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ChatMessage, LlmError, LlmProvider, ProviderResponse};

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// generateContent API endpoint root
const API_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Request timeout; a transport property, not a retry policy
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Google Gemini API provider
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

// The credential must never appear in logs.
impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

/// Combine system and user prompts into one content block
///
/// System text first, blank line, user text. This ordering is part of the
/// provider contract, not a free choice.
pub fn combine_prompts(system_prompt: &str, user_prompt: &str) -> String {
    format!("{}\n\n{}", system_prompt, user_prompt)
}

/// Flatten a message history into one ordered concatenation
///
/// Turn order is preserved exactly; turns are joined by blank lines.
pub fn flatten_history(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey("gemini".to_string()));
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

    async fn send(&self, prompt: String, max_tokens: u32) -> Result<ProviderResponse, LlmError> {
        let url = format!("{}/{}:generateContent", API_ROOT, self.model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
            },
        };

        // Credential goes in a header, not the query string, to keep it out
        // of access logs.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| LlmError::InvalidResponse("Empty candidates array".to_string()))?;

        // Gemini may omit usage metadata; report zero rather than guessing.
        let (input_tokens, output_tokens) = match parsed.usage_metadata {
            Some(usage) => (usage.prompt_token_count, usage.candidates_token_count),
            None => (0, 0),
        };

        Ok(ProviderResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
            provider: "gemini".to_string(),
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
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
        let prompt = combine_prompts(system_prompt, user_prompt);
        self.send(prompt, max_tokens).await
    }

    async fn complete_with_history(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<ProviderResponse, LlmError> {
        let prompt = flatten_history(messages);
        self.send(prompt, max_tokens).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_provider_creation() {
        let provider = GeminiProvider::new("key", DEFAULT_MODEL).unwrap();
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert_eq!(provider.provider_name(), "gemini");
    }

    #[test]
    fn test_gemini_provider_rejects_empty_key() {
        let result = GeminiProvider::new("", DEFAULT_MODEL);
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));
    }

    #[test]
    fn test_combine_prompts_is_deterministic() {
        let combined = combine_prompts("You are an analyst.", "Analyze this.");
        assert_eq!(combined, "You are an analyst.\n\nAnalyze this.");
        // Same inputs, same output
        assert_eq!(combined, combine_prompts("You are an analyst.", "Analyze this."));
    }

    #[test]
    fn test_flatten_history_preserves_turn_order() {
        let messages = [
            ChatMessage::user("first"),
            ChatMessage::assistant("second"),
            ChatMessage::user("third"),
        ];
        assert_eq!(flatten_history(&messages), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn test_flatten_empty_history() {
        assert_eq!(flatten_history(&[]), "");
    }

    #[test]
    fn test_usage_metadata_optional() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "hi"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.usage_metadata.is_none());
        assert_eq!(parsed.candidates[0].content.parts[0].text, "hi");
    }

    #[test]
    fn test_generation_config_serializes_camel_case() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "t".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 64,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 64);
    }
}
