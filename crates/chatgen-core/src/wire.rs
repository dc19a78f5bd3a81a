//! Boundary encodings for chat messages and stop lists.

use chatgen_abi::ChatMessage;
use serde_json::Value;

use crate::error::{GenerationError, Result};

/// Separator between entries of a stop-string blob (ASCII unit separator).
pub const STOP_SEPARATOR: char = '\u{1f}';

/// Decode a JSON array of `{role, content}` objects.
///
/// Empty text, anything that is not an array, an empty array, or an entry
/// that is not a role/content pair is rejected as invalid input.
pub fn parse_messages_json(text: &str) -> Result<Vec<ChatMessage>> {
    if text.trim().is_empty() {
        return Err(GenerationError::invalid_input("chat messages: empty input"));
    }
    let value: Value = serde_json::from_str(text)?;
    if !value.is_array() {
        return Err(GenerationError::invalid_input(
            "chat messages: expected a JSON array",
        ));
    }
    let messages: Vec<ChatMessage> = serde_json::from_value(value)?;
    if messages.is_empty() {
        return Err(GenerationError::invalid_input("chat messages: empty array"));
    }
    Ok(messages)
}

/// Split a unit-separator blob into stop strings, discarding empty entries.
pub fn split_stop_blob(blob: Option<&str>) -> Vec<String> {
    match blob {
        Some(b) if !b.is_empty() => b
            .split(STOP_SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Inverse of [`split_stop_blob`], for callers that have to hand a blob across.
pub fn join_stop_blob<S: AsRef<str>>(stops: &[S]) -> String {
    let mut out = String::new();
    for (i, s) in stops.iter().enumerate() {
        if i > 0 {
            out.push(STOP_SEPARATOR);
        }
        out.push_str(s.as_ref());
    }
    out
}
