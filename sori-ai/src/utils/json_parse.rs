//! Defensive JSON extraction from language model replies
//!
//! Replies are expected to be a single JSON object but often arrive wrapped in
//! Markdown code fences or surrounded by prose. Extraction order:
//! 1. Strip a leading/trailing ``` fence (with optional language tag)
//! 2. Parse the remaining text directly
//! 3. Parse the span from the first `{` to the last `}`

use crate::types::AnalysisFailure;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Extract a JSON object from free-form model output
///
/// Returns `None` when no object can be recovered. Arrays and scalars are not
/// objects and are rejected.
pub fn extract_json_object(reply: &str) -> Option<Map<String, Value>> {
    let text = strip_code_fence(reply.trim());

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Some(map);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Extract and deserialize a typed response schema
///
/// # Errors
/// * `EmptyResponse` when the reply holds no object or an empty object
/// * `Schema` when the object does not match `T`
pub fn parse_typed<T: DeserializeOwned>(reply: &str) -> Result<T, AnalysisFailure> {
    let map = extract_json_object(reply).ok_or(AnalysisFailure::EmptyResponse)?;
    if map.is_empty() {
        return Err(AnalysisFailure::EmptyResponse);
    }
    serde_json::from_value(Value::Object(map)).map_err(|e| AnalysisFailure::Schema(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
