//! Provider factory
//!
//! Maps a provider name to a concrete provider instance. Names are resolved
//! case-insensitively against a fixed registry of aliases; each resolved
//! kind carries a default model used when the caller supplies none.

use crate::{claude, gemini, openai};
use crate::{ClaudeProvider, GeminiProvider, LlmError, LlmProvider, OpenAiProvider};

/// Accepted provider names, in registry order
pub const AVAILABLE_PROVIDERS: &[&str] = &["anthropic", "claude", "openai", "gpt", "gemini", "google"];

/// Resolved provider backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Anthropic Claude ("anthropic", "claude")
    Claude,
    /// OpenAI GPT ("openai", "gpt")
    OpenAi,
    /// Google Gemini ("gemini", "google")
    Gemini,
}

impl ProviderKind {
    /// Resolve a provider name against the registry, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Some(ProviderKind::Claude),
            "openai" | "gpt" => Some(ProviderKind::OpenAi),
            "gemini" | "google" => Some(ProviderKind::Gemini),
            _ => None,
        }
    }

    /// Default model for this backend
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Claude => claude::DEFAULT_MODEL,
            ProviderKind::OpenAi => openai::DEFAULT_MODEL,
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
        }
    }

    /// Canonical provider identifier
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }
}

/// Factory for constructing [`LlmProvider`] instances
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance
    ///
    /// `model` overrides the backend's default when given.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::UnknownProvider`] (listing valid names) when the
    /// name matches no registry entry, or [`LlmError::MissingApiKey`] when
    /// the credential is empty.
    pub fn create(
        provider_name: &str,
        api_key: &str,
        model: Option<&str>,
    ) -> Result<Box<dyn LlmProvider>, LlmError> {
        let kind = ProviderKind::from_name(provider_name).ok_or_else(|| LlmError::UnknownProvider {
            name: provider_name.to_string(),
            available: AVAILABLE_PROVIDERS.join(", "),
        })?;

        let model = model.unwrap_or_else(|| kind.default_model());

        let provider: Box<dyn LlmProvider> = match kind {
            ProviderKind::Claude => Box::new(ClaudeProvider::new(api_key, model)?),
            ProviderKind::OpenAi => Box::new(OpenAiProvider::new(api_key, model)?),
            ProviderKind::Gemini => Box::new(GeminiProvider::new(api_key, model)?),
        };

        Ok(provider)
    }

    /// Canonical names of the supported backends (aliases deduplicated)
    pub fn available_providers() -> Vec<&'static str> {
        vec!["anthropic", "openai", "gemini"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolution() {
        assert_eq!(ProviderKind::from_name("anthropic"), Some(ProviderKind::Claude));
        assert_eq!(ProviderKind::from_name("claude"), Some(ProviderKind::Claude));
        assert_eq!(ProviderKind::from_name("openai"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_name("gpt"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_name("gemini"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::from_name("google"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::from_name("mistral"), None);
    }

    #[test]
    fn test_alias_resolution_is_case_insensitive() {
        assert_eq!(ProviderKind::from_name("Claude"), Some(ProviderKind::Claude));
        assert_eq!(ProviderKind::from_name("OPENAI"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_name("Google"), Some(ProviderKind::Gemini));
    }

    #[test]
    fn test_aliases_build_equivalent_providers() {
        let a = ProviderFactory::create("claude", "key", None).unwrap();
        let b = ProviderFactory::create("anthropic", "key", None).unwrap();
        assert_eq!(a.provider_name(), b.provider_name());
        assert_eq!(a.model(), b.model());
        assert_eq!(a.model(), ProviderKind::Claude.default_model());
    }

    #[test]
    fn test_default_model_substitution() {
        let provider = ProviderFactory::create("gpt", "key", None).unwrap();
        assert_eq!(provider.model(), "gpt-4o");

        let provider = ProviderFactory::create("google", "key", None).unwrap();
        assert_eq!(provider.model(), "gemini-2.0-flash-exp");
    }

    #[test]
    fn test_model_override() {
        let provider = ProviderFactory::create("claude", "key", Some("claude-opus-4")).unwrap();
        assert_eq!(provider.model(), "claude-opus-4");
    }

    #[test]
    fn test_unknown_provider_lists_valid_names() {
        let result = ProviderFactory::create("llama", "key", None);
        match result {
            Err(LlmError::UnknownProvider { name, available }) => {
                assert_eq!(name, "llama");
                assert!(available.contains("anthropic"));
                assert!(available.contains("gpt"));
                assert!(available.contains("google"));
            }
            _ => panic!("Expected UnknownProvider error"),
        }
    }

    #[test]
    fn test_empty_api_key_fails_construction() {
        let result = ProviderFactory::create("claude", "", None);
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));
    }

    #[test]
    fn test_available_providers_deduplicates_aliases() {
        let providers = ProviderFactory::available_providers();
        assert_eq!(providers, vec!["anthropic", "openai", "gemini"]);
    }
}
