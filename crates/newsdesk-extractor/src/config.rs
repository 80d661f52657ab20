//! Extraction configuration
//!
//! An optional, externally supplied bundle of prompt overrides and an
//! output-schema description. Configuration is pure data; all rendering
//! behavior lives in the prompt module.
//!
//! The fallback contract: a missing or unparsable config file must never
//! fail an extraction. [`ExtractionConfig::load`] degrades to the built-in
//! defaults and logs at warn level.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Output-schema description for the structuring pass
///
/// Field order is meaningful: the schema renderer enumerates
/// `required_fields` first, then `optional_fields`, each in the order given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    /// Fields the model must emit
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Fields the model may omit
    #[serde(default)]
    pub optional_fields: Vec<String>,
}

impl SchemaSpec {
    /// True when neither list names a field
    pub fn is_empty(&self) -> bool {
        self.required_fields.is_empty() && self.optional_fields.is_empty()
    }
}

/// Prompt and schema overrides for one extraction run
///
/// Every field is optional; absent fields fall back to the built-in
/// defaults at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Replacement for the built-in analysis persona prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_system_prompt: Option<String>,

    /// Replacement for the built-in analysis task prompt; must contain an
    /// `{email_content}` slot for the email body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_task_prompt: Option<String>,

    /// Custom output schema for the structuring pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaSpec>,
}

impl ExtractionConfig {
    /// Load configuration from a TOML file, falling back to defaults
    ///
    /// Never fails: a missing or unparsable file yields
    /// `ExtractionConfig::default()` so the extractor behaves exactly as if
    /// no config had been supplied.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), "Extraction config not readable, using defaults: {}", e);
                return Self::default();
            }
        };

        match Self::from_toml(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), "Extraction config unparsable, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
