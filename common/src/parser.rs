//! Response parser
//!
//! Model replies are expected to be a single JSON object, sometimes wrapped in a
//! code fence. The fence is removed and the remainder decoded; nothing inside the
//! JSON body is touched.

use crate::error::{Error, Result};
use crate::types::StructuredAnalysis;
use regex::Regex;
use serde_json::Value;

/// Remove a surrounding code fence
///
/// Handles a leading "```" marker with an optional language tag on the same
/// line (e.g. "```json") and a trailing "```" marker, then trims whitespace.
/// Text without fences is only trimmed.
///
/// # Examples
/// ```
/// use repair_advisor_common::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
/// ```
pub fn strip_code_fence(response: &str) -> &str {
    lazy_static::lazy_static! {
        // tag must start with a letter so a same-line "```{" body survives
        static ref OPENING_FENCE: Regex = Regex::new(r"^```(?:[A-Za-z][\w+.-]*)?").unwrap();
    }

    let mut cleaned = response.trim();

    if let Some(m) = OPENING_FENCE.find(cleaned) {
        cleaned = &cleaned[m.end()..];
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }

    cleaned.trim()
}

/// Analysis response parse
///
/// # Arguments
/// * `response` - raw text returned by the completion service
///
/// # Returns
/// * `Ok(StructuredAnalysis)` - the decoded object, fields passed through unchanged
/// * `Err(Error::Parse)` - the cleaned text is not JSON, or not a JSON object
///
/// Valid JSON that is not an object (an array, a bare string) is also reported as
/// a parse error: the analysis record is always an object.
pub fn parse_analysis_response(response: &str) -> Result<StructuredAnalysis> {
    let cleaned = strip_code_fence(response);

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| Error::Parse(format!("Failed to parse AI response as JSON: {}", e)))?;

    match value {
        Value::Object(map) => Ok(StructuredAnalysis::from(map)),
        other => Err(Error::Parse(format!(
            "Expected a JSON object in AI response, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
