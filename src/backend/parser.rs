//! Assistant payload parsing.
//!
//! Replies arrive as plain text. When the model wants tools it embeds a JSON
//! payload: `{"reasoning"?, "response"|"text", "tool_calls"?}`, possibly
//! wrapped in a markdown code fence. Anything that does not parse as JSON is
//! a final answer verbatim. A tool call without a name is the one hard
//! parse failure; a missing id is repaired with a generated one.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::tools::ToolCall;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("tool call at index {0} is not an object")]
    MalformedToolCall(usize),
    #[error("tool call at index {0} is missing a name")]
    MissingToolName(usize),
}

/// A structured view of one assistant turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAssistant {
    /// The turn's user-facing text (may be empty on pure tool turns).
    pub text: String,
    pub reasoning: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ParsedAssistant {
    fn plain(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
            reasoning: None,
            tool_calls: Vec::new(),
        }
    }
}

/// Parse one assistant reply body.
pub fn parse_assistant_payload(raw: &str) -> Result<ParsedAssistant, ParseError> {
    let body = strip_code_fence(raw.trim());
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Ok(ParsedAssistant::plain(raw));
    };
    let Some(object) = value.as_object() else {
        // JSON scalars and arrays are not our payload shape; keep them as text.
        return Ok(ParsedAssistant::plain(raw));
    };

    // A JSON object that carries none of our keys is some other JSON the
    // model chose to emit; pass it through as the final text.
    if !object.contains_key("response")
        && !object.contains_key("text")
        && !object.contains_key("tool_calls")
    {
        return Ok(ParsedAssistant::plain(raw));
    }

    let text = object
        .get("response")
        .or_else(|| object.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut tool_calls = Vec::new();
    if let Some(calls) = object.get("tool_calls").and_then(Value::as_array) {
        for (index, entry) in calls.iter().enumerate() {
            tool_calls.push(parse_tool_call(index, entry)?);
        }
    }

    Ok(ParsedAssistant {
        text,
        reasoning,
        tool_calls,
    })
}

fn parse_tool_call(index: usize, entry: &Value) -> Result<ToolCall, ParseError> {
    let call = entry
        .as_object()
        .ok_or(ParseError::MalformedToolCall(index))?;
    let name = call
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or(ParseError::MissingToolName(index))?;
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{index}_{}", Uuid::new_v4()));
    let input = call
        .get("input")
        .or_else(|| call.get("arguments"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    Ok(ToolCall {
        id,
        name: name.to_string(),
        input,
    })
}

/// Peel one markdown code fence (with or without a language tag) off the
/// payload. Unfenced input passes through untouched.
fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let Some(newline) = rest.find('\n') else {
        return s;
    };
    let inner = &rest[newline + 1..];
    match inner.rfind("```") {
        Some(end) => inner[..end].trim(),
        None => s,
    }
}
