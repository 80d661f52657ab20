//! Extraction record and metadata types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::parser::PARSE_ERROR_KEY;

/// Record key carrying usage and provenance metadata
pub const METADATA_KEY: &str = "_metadata";

/// Record key carrying the full Pass-1 analysis text
pub const RAW_REASONING_KEY: &str = "_raw_reasoning";

/// Usage and provenance metadata attached to every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Extractor identifier ("agentic")
    pub extractor: String,

    /// Provider that served both passes
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Pass-1 prompt tokens
    pub pass1_input_tokens: u64,

    /// Pass-1 completion tokens
    pub pass1_output_tokens: u64,

    /// Pass-2 prompt tokens
    pub pass2_input_tokens: u64,

    /// Pass-2 completion tokens
    pub pass2_output_tokens: u64,

    /// Sum of the four pass-level counters
    pub total_tokens: u64,

    /// Source label (file path or caller-supplied tag)
    pub source_file: String,
}

impl ExtractionMetadata {
    /// Build metadata, computing `total_tokens` from the four counters
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        pass1_input_tokens: u64,
        pass1_output_tokens: u64,
        pass2_input_tokens: u64,
        pass2_output_tokens: u64,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            extractor: "agentic".to_string(),
            provider: provider.into(),
            model: model.into(),
            pass1_input_tokens,
            pass1_output_tokens,
            pass2_input_tokens,
            pass2_output_tokens,
            total_tokens: pass1_input_tokens
                + pass1_output_tokens
                + pass2_input_tokens
                + pass2_output_tokens,
            source_file: source_file.into(),
        }
    }

    /// Metadata as a JSON value for insertion into a record
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "extractor": self.extractor,
            "provider": self.provider,
            "model": self.model,
            "pass1_input_tokens": self.pass1_input_tokens,
            "pass1_output_tokens": self.pass1_output_tokens,
            "pass2_input_tokens": self.pass2_input_tokens,
            "pass2_output_tokens": self.pass2_output_tokens,
            "total_tokens": self.total_tokens,
            "source_file": self.source_file,
        })
    }
}

/// One story from the default output schema
///
/// Typed view over the polymorphic record. No field-level validation is
/// performed on model output, so every field is defaulted: a story the model
/// rendered partially still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Story headline
    #[serde(default)]
    pub title: String,

    /// Category label (not validated against the suggested set)
    #[serde(default)]
    pub category: String,

    /// Key facts and numbers
    #[serde(default)]
    pub key_facts: Vec<String>,

    /// Companies mentioned
    #[serde(default)]
    pub companies: Vec<String>,

    /// What this story means for the stakeholder
    #[serde(default)]
    pub google_implications: String,

    /// Model's confidence label (not validated)
    #[serde(default)]
    pub confidence: String,

    /// How the model arrived at this analysis
    #[serde(default)]
    pub reasoning: String,

    /// Links worth deeper investigation
    #[serde(default)]
    pub links_to_follow: Vec<String>,
}

/// One trend signal from the default output schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    /// Trend name
    #[serde(default)]
    pub trend: String,

    /// Evidence from the newsletter
    #[serde(default)]
    pub evidence: String,

    /// Trajectory label (not validated)
    #[serde(default)]
    pub trajectory: String,
}

/// The structured insight record returned by an extraction
///
/// The record is polymorphic: with a custom schema configured, its top-level
/// fields are whatever the schema names. The typed accessors below cover the
/// default schema and return empty values for records shaped differently.
/// `_metadata` and `_raw_reasoning` are always present, on degraded records
/// too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extraction {
    fields: Map<String, Value>,
}

impl Extraction {
    pub(crate) fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub(crate) fn insert(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    /// True when Pass-2 output could not be parsed as JSON
    ///
    /// Callers branch on this flag instead of catching errors; it is the
    /// expected failure mode when a model ignores the JSON-only instruction.
    pub fn is_degraded(&self) -> bool {
        self.fields
            .get(PARSE_ERROR_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Executive summary, when present
    pub fn executive_summary(&self) -> Option<&str> {
        self.fields.get("executive_summary").and_then(Value::as_str)
    }

    /// Stories from the default schema; empty for other shapes
    pub fn stories(&self) -> Vec<Story> {
        self.typed_sequence("stories")
    }

    /// Trend signals from the default schema; empty for other shapes
    pub fn trend_signals(&self) -> Vec<TrendSignal> {
        self.typed_sequence("trend_signals")
    }

    /// Action items from the default schema; empty for other shapes
    pub fn action_items(&self) -> Vec<String> {
        self.typed_sequence("action_items")
    }

    /// Usage and provenance metadata
    pub fn metadata(&self) -> Option<ExtractionMetadata> {
        self.fields
            .get(METADATA_KEY)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Full Pass-1 analysis text, retained for audit and debugging
    pub fn raw_reasoning(&self) -> Option<&str> {
        self.fields.get(RAW_REASONING_KEY).and_then(Value::as_str)
    }

    /// Arbitrary top-level field access, for custom-schema records
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Borrow the underlying field map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the record into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    fn typed_sequence<T: serde::de::DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
