//! Newsdesk LLM Provider Layer
//!
//! Pluggable LLM provider implementations behind a common capability trait.
//!
//! # Architecture
//!
//! This crate provides the [`LlmProvider`] trait and one implementation per
//! supported backend. All providers normalize their responses into
//! [`ProviderResponse`] so the extraction core never sees vendor-specific
//! payload shapes.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `ClaudeProvider`: Anthropic Messages API
//! - `OpenAiProvider`: OpenAI Chat Completions API
//! - `GeminiProvider`: Google Gemini generateContent API
//!
//! Providers are stateless between calls (credential + model id + HTTP
//! client), so a single instance can serve concurrent extractions.
//!
//! # Examples
//!
//! ```
//! use newsdesk_llm::{LlmProvider, MockProvider};
//!
//! # async fn example() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let response = provider.complete("system", "user", 1024).await.unwrap();
//! assert_eq!(response.content, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod claude;
pub mod factory;
pub mod gemini;
pub mod openai;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use claude::ClaudeProvider;
pub use factory::{ProviderFactory, ProviderKind};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Provider constructed without a usable credential
    #[error("Missing API key for provider '{0}'")]
    MissingApiKey(String),

    /// Provider name not present in the factory registry
    #[error("Unknown provider: {name}. Available providers: {available}")]
    UnknownProvider {
        /// The name that failed to resolve
        name: String,
        /// Comma-separated list of accepted names
        available: String,
    },

    /// Network or API communication error (includes non-2xx statuses)
    #[error("Communication error: {0}")]
    Communication(String),

    /// Upstream returned a 2xx response we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Standardized response from any LLM provider
///
/// Token counts are the provider-reported usage figures, never derived by
/// re-tokenizing locally. Backends that omit usage metadata report zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Generated text
    pub content: String,

    /// Prompt tokens as counted by the provider
    pub input_tokens: u64,

    /// Completion tokens as counted by the provider
    pub output_tokens: u64,

    /// Model identifier that served the call
    pub model: String,

    /// Provider identifier ("claude", "openai", "gemini", ...)
    pub provider: String,
}

/// Role of a turn in a multi-turn conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Caller-authored turn
    User,
    /// Model-authored turn
    Assistant,
}

/// One turn of conversation history
///
/// The two-pass extraction protocol replays history as an explicit ordered
/// list of these values; there is no hidden client-side session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the turn
    pub role: Role,

    /// Verbatim text of the turn
    pub content: String,
}

impl ChatMessage {
    /// Create a user-role message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant-role message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Capability trait implemented by every model backend
///
/// Both operations consume exactly one network round trip. Providers perform
/// no retries; transport failures propagate to the caller unmodified.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable provider identifier ("claude", "openai", "gemini", "mock")
    fn provider_name(&self) -> &str;

    /// Model identifier this instance is bound to
    fn model(&self) -> &str;

    /// Single-turn completion with a system/user prompt split
    ///
    /// Backends without a native system role concatenate deterministically:
    /// system text first, blank line, user text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<ProviderResponse, LlmError>;

    /// Multi-turn completion from an explicit message history
    ///
    /// Turns are carried verbatim and in order. Backends without a
    /// multi-turn API flatten the list into one ordered concatenation.
    async fn complete_with_history(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<ProviderResponse, LlmError>;
}

/// One recorded call against a [`MockProvider`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// System prompt, present for `complete` calls only
    pub system_prompt: Option<String>,

    /// Message list as the provider received it
    pub messages: Vec<ChatMessage>,

    /// Requested generation budget
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
enum MockReply {
    Text {
        content: String,
        input_tokens: u64,
        output_tokens: u64,
    },
    Error(String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns scripted replies in FIFO order without any network calls, and
/// records every call it receives so tests can assert on the exact prompts
/// that were sent.
///
/// # Examples
///
/// ```
/// use newsdesk_llm::{LlmProvider, MockProvider};
///
/// # async fn example() {
/// let provider = MockProvider::new("fallback");
/// provider.push_response("first scripted reply");
///
/// let first = provider.complete("sys", "user", 256).await.unwrap();
/// assert_eq!(first.content, "first scripted reply");
///
/// let second = provider.complete("sys", "user", 256).await.unwrap();
/// assert_eq!(second.content, "fallback");
/// assert_eq!(provider.calls().len(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockProvider {
    /// Create a mock that answers every unscripted call with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock-model".to_string(),
            default_response: response.into(),
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Override the model identifier reported by this mock
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Queue a scripted reply with zero token usage
    pub fn push_response(&self, content: impl Into<String>) {
        self.push_response_with_usage(content, 0, 0);
    }

    /// Queue a scripted reply with explicit token usage
    pub fn push_response_with_usage(
        &self,
        content: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
    ) {
        self.replies.lock().unwrap().push_back(MockReply::Text {
            content: content.into(),
            input_tokens,
            output_tokens,
        });
    }

    /// Queue a transport failure
    pub fn push_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Error(message.into()));
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn reply(&self) -> Result<ProviderResponse, LlmError> {
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(MockReply::Text {
                content,
                input_tokens,
                output_tokens,
            }) => Ok(ProviderResponse {
                content,
                input_tokens,
                output_tokens,
                model: self.model.clone(),
                provider: "mock".to_string(),
            }),
            Some(MockReply::Error(message)) => Err(LlmError::Communication(message)),
            None => Ok(ProviderResponse {
                content: self.default_response.clone(),
                input_tokens: 0,
                output_tokens: 0,
                model: self.model.clone(),
                provider: "mock".to_string(),
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
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
        self.calls.lock().unwrap().push(RecordedCall {
            system_prompt: Some(system_prompt.to_string()),
            messages: vec![ChatMessage::user(user_prompt)],
            max_tokens,
        });
        self.reply()
    }

    async fn complete_with_history(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<ProviderResponse, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system_prompt: None,
            messages: messages.to_vec(),
            max_tokens,
        });
        self.reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let response = provider.complete("sys", "any prompt", 128).await.unwrap();
        assert_eq!(response.content, "Test response");
        assert_eq!(response.provider, "mock");
        assert_eq!(response.input_tokens, 0);
        assert_eq!(response.output_tokens, 0);
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_replies_in_order() {
        let provider = MockProvider::new("fallback");
        provider.push_response_with_usage("one", 10, 20);
        provider.push_response("two");

        let first = provider.complete("s", "u", 64).await.unwrap();
        assert_eq!(first.content, "one");
        assert_eq!(first.input_tokens, 10);
        assert_eq!(first.output_tokens, 20);

        let history = [ChatMessage::user("u"), ChatMessage::assistant("a")];
        let second = provider.complete_with_history(&history, 64).await.unwrap();
        assert_eq!(second.content, "two");

        let third = provider.complete("s", "u", 64).await.unwrap();
        assert_eq!(third.content, "fallback");
    }

    #[tokio::test]
    async fn test_mock_provider_records_calls() {
        let provider = MockProvider::new("ok");
        provider.complete("system text", "user text", 512).await.unwrap();

        let history = [
            ChatMessage::user("turn 1"),
            ChatMessage::assistant("turn 2"),
            ChatMessage::user("turn 3"),
        ];
        provider.complete_with_history(&history, 256).await.unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].system_prompt.as_deref(), Some("system text"));
        assert_eq!(calls[0].messages[0].content, "user text");
        assert_eq!(calls[0].max_tokens, 512);
        assert!(calls[1].system_prompt.is_none());
        assert_eq!(calls[1].messages.len(), 3);
        assert_eq!(calls[1].messages[2].content, "turn 3");
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_error() {
        let provider = MockProvider::new("ok");
        provider.push_error("connection refused");

        let result = provider.complete("s", "u", 64).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));

        // Error consumed; next call falls through to the default
        let next = provider.complete("s", "u", 64).await.unwrap();
        assert_eq!(next.content, "ok");
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete("s", "u", 64).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_chat_message_constructors() {
        let user = ChatMessage::user("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");

        let assistant = ChatMessage::assistant("hi");
        assert_eq!(assistant.role, Role::Assistant);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::assistant("text");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
    }
}
