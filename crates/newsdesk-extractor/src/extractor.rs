//! Two-pass agentic extractor

use std::path::Path;
use std::sync::Arc;

use newsdesk_llm::{ChatMessage, LlmProvider};
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::error::ExtractorError;
use crate::parser::recover_record;
use crate::prompt::{render_structuring_prompt, PromptSet};
use crate::types::{Extraction, ExtractionMetadata, METADATA_KEY, RAW_REASONING_KEY};

/// Character ceiling for email bodies; truncation happens once, upstream of
/// both passes, so Pass 2 replays the identical user prompt
pub const MAX_EMAIL_CHARS: usize = 50_000;

/// Generation budget for the free-form analysis pass
const PASS1_MAX_TOKENS: u32 = 8192;

/// Generation budget for the structuring pass
const PASS2_MAX_TOKENS: u32 = 4096;

/// Callback for user-facing progress lines
pub type ProgressCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Two-pass extraction orchestrator
///
/// Pass 1 sends the analysis persona plus the email body and collects
/// free-form reasoning. Pass 2 replays the same user prompt, the assistant's
/// analysis, and a structuring instruction as explicit message history, then
/// recovers JSON from the reply. Usage metadata and the raw reasoning are
/// attached to whatever record results.
///
/// Holds no per-call mutable state; one extractor can serve concurrent
/// extractions against its shared provider.
pub struct AgenticExtractor {
    provider: Arc<dyn LlmProvider>,
    config: ExtractionConfig,
    progress: Option<ProgressCallback>,
}

impl AgenticExtractor {
    /// Create an extractor over an already-constructed provider
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            config: ExtractionConfig::default(),
            progress: None,
        }
    }

    /// Use the given extraction configuration
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load extraction configuration from a TOML file
    ///
    /// A missing or unparsable file silently falls back to the defaults, so
    /// this can never fail the run.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config = ExtractionConfig::load(path);
        self
    }

    /// Attach a progress callback for user-facing status lines
    pub fn with_progress(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    fn report(&self, message: &str) {
        if let Some(callback) = &self.progress {
            callback(message);
        }
    }

    /// Extract insights from an .eml file
    ///
    /// # Errors
    ///
    /// Fails fast for a missing file or a non-.eml extension, before any
    /// network call. Transport failures from either pass propagate.
    pub async fn extract_file(&self, path: impl AsRef<Path>) -> Result<Extraction, ExtractorError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ExtractorError::FileNotFound(path.to_path_buf()));
        }
        let is_eml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("eml"))
            .unwrap_or(false);
        if !is_eml {
            return Err(ExtractorError::InvalidExtension(path.to_path_buf()));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.report(&format!("Reading {}...", file_name));

        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);

        self.extract_text(&content, &path.display().to_string()).await
    }

    /// Extract insights from pre-parsed email text
    ///
    /// `source` is an opaque label recorded in `_metadata.source_file`.
    ///
    /// # Errors
    ///
    /// Fails fast for empty input. Transport failures from either pass
    /// propagate; JSON-shape problems in Pass 2 degrade instead (branch on
    /// [`Extraction::is_degraded`]).
    pub async fn extract_text(
        &self,
        text: &str,
        source: &str,
    ) -> Result<Extraction, ExtractorError> {
        if text.trim().is_empty() {
            return Err(ExtractorError::Input("email text is empty".to_string()));
        }

        let content = truncate_chars(text, MAX_EMAIL_CHARS);
        if content.len() < text.len() {
            warn!(
                "Truncating email from {} to {} chars",
                text.chars().count(),
                MAX_EMAIL_CHARS
            );
        }

        let prompts = PromptSet::from_config(&self.config);
        let user_prompt = prompts.render_task(content);
        debug!("Pass 1 prompt length: {} chars", user_prompt.len());

        self.report("Running pass 1: Analysis...");
        let pass1 = self
            .provider
            .complete(&prompts.system_prompt, &user_prompt, PASS1_MAX_TOKENS)
            .await?;
        debug!("Pass 1 response length: {} chars", pass1.content.len());

        self.report("Running pass 2: Structuring...");
        let structuring_prompt = render_structuring_prompt(&pass1.content, prompts.schema.as_ref());
        let history = [
            ChatMessage::user(user_prompt),
            ChatMessage::assistant(pass1.content.clone()),
            ChatMessage::user(structuring_prompt),
        ];
        let pass2 = self
            .provider
            .complete_with_history(&history, PASS2_MAX_TOKENS)
            .await?;

        let mut record = Extraction::from_map(recover_record(&pass1.content, &pass2.content));

        let metadata = ExtractionMetadata::new(
            self.provider.provider_name(),
            self.provider.model(),
            pass1.input_tokens,
            pass1.output_tokens,
            pass2.input_tokens,
            pass2.output_tokens,
            source,
        );
        record.insert(METADATA_KEY, metadata.to_value());
        record.insert(RAW_REASONING_KEY, pass1.content.into());

        info!(
            source,
            total_tokens = metadata.total_tokens,
            degraded = record.is_degraded(),
            "Extraction complete"
        );
        self.report(&format!(
            "Extraction complete ({} tokens)",
            metadata.total_tokens
        ));

        Ok(record)
    }
}

/// Truncate to at most `max` characters, on a character boundary
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_shorter_text_unchanged() {
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("", 50), "");
    }

    #[test]
    fn test_truncate_exact_boundary() {
        let text = "abcde";
        assert_eq!(truncate_chars(text, 5), "abcde");
        assert_eq!(truncate_chars(text, 4), "abcd");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        // Multi-byte characters must not be split
        let text = "héllo wörld";
        let truncated = truncate_chars(text, 6);
        assert_eq!(truncated, "héllo ");
        assert_eq!(truncated.chars().count(), 6);
    }
}
