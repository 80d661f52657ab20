//! JSON recovery for Pass-2 output
//!
//! Models do not always obey the "JSON only" instruction. Recovery is
//! layered: direct parse, then the largest brace-delimited substring, then
//! the degraded record shape. The caller always receives a well-formed
//! mapping, never a parse error.

use serde_json::{Map, Value};
use tracing::{error, warn};

/// Key set on degraded records
pub const PARSE_ERROR_KEY: &str = "parse_error";

/// Recover a record from the raw Pass-2 response
///
/// `analysis_text` is the Pass-1 output, needed to build the degraded shape
/// when structuring output cannot be salvaged.
pub fn recover_record(analysis_text: &str, structured_text: &str) -> Map<String, Value> {
    if let Some(record) = parse_object(structured_text) {
        return record;
    }

    warn!("Failed to parse JSON directly, trying brace extraction");

    match largest_object_slice(structured_text) {
        Some(candidate) => match parse_object(candidate) {
            Some(record) => record,
            None => {
                error!("Failed to parse extracted JSON");
                degraded_record(analysis_text, structured_text, "JSON parsing failed")
            }
        },
        None => {
            error!("No JSON found in response");
            degraded_record(analysis_text, structured_text, "No JSON found")
        }
    }
}

/// Parse a string as a top-level JSON object
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Largest substring spanning the first `{` to the last `}`
///
/// Both delimiters are ASCII, so byte-index slicing is safe.
fn largest_object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn degraded_record(analysis_text: &str, structured_text: &str, reason: &str) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(
        "raw_analysis".to_string(),
        Value::String(analysis_text.to_string()),
    );
    record.insert(
        "raw_structured".to_string(),
        Value::String(structured_text.to_string()),
    );
    record.insert(PARSE_ERROR_KEY.to_string(), Value::Bool(true));
    record.insert("error".to_string(), Value::String(reason.to_string()));
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_parse() {
        let record = recover_record("analysis", r#"{"executive_summary": "ok", "stories": []}"#);
        assert_eq!(record["executive_summary"], "ok");
        assert!(!record.contains_key(PARSE_ERROR_KEY));
    }

    #[test]
    fn test_recovers_from_markdown_fencing() {
        let raw = "Sure! ```json\n{\"executive_summary\": \"ok\", \"stories\": []}\n```";
        let record = recover_record("analysis", raw);
        assert_eq!(record["executive_summary"], "ok");
        assert_eq!(record["stories"], serde_json::json!([]));
        assert!(!record.contains_key(PARSE_ERROR_KEY));
    }

    #[test]
    fn test_recovers_from_prose_prefix_and_suffix() {
        let raw = "Here is the output you asked for:\n{\"a\": 1}\nHope that helps!";
        let record = recover_record("analysis", raw);
        assert_eq!(record["a"], 1);
    }

    #[test]
    fn test_recovers_nested_object_with_greedy_braces() {
        let raw = "prefix {\"outer\": {\"inner\": [1, 2]}} suffix";
        let record = recover_record("analysis", raw);
        assert_eq!(record["outer"]["inner"][1], 2);
    }

    #[test]
    fn test_no_json_at_all_degrades() {
        let record = recover_record("the analysis text", "I could not produce JSON, sorry.");
        assert_eq!(record[PARSE_ERROR_KEY], true);
        assert_eq!(record["error"], "No JSON found");
        assert_eq!(record["raw_analysis"], "the analysis text");
        assert_eq!(record["raw_structured"], "I could not produce JSON, sorry.");
    }

    #[test]
    fn test_malformed_braces_degrade_with_parse_reason() {
        let record = recover_record("analysis", "text { not json at all } more");
        assert_eq!(record[PARSE_ERROR_KEY], true);
        assert_eq!(record["error"], "JSON parsing failed");
    }

    #[test]
    fn test_top_level_array_is_not_a_record() {
        // A bare array has no brace-delimited object to recover.
        let record = recover_record("analysis", "[1, 2, 3]");
        assert_eq!(record[PARSE_ERROR_KEY], true);
        assert_eq!(record["error"], "No JSON found");
    }

    #[test]
    fn test_array_wrapping_object_recovers_inner_object() {
        let record = recover_record("analysis", "[{\"a\": 1}]");
        assert_eq!(record["a"], 1);
    }

    #[test]
    fn test_whitespace_tolerated() {
        let record = recover_record("analysis", "  \n {\"a\": true} \n ");
        assert_eq!(record["a"], true);
    }
}
