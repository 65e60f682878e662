//! Conversation records. Everything here serializes, so session snapshots
//! and host-side inspection get the same shapes.

use serde::{Deserialize, Serialize};

use super::metrics::Metrics;
use crate::tools::{ToolCall, ToolOutcome};

/// A single entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    /// Flat text view of the content.
    pub fn text(&self) -> String {
        self.content.as_text()
    }
}

/// Message content: plain text, or the structured tool results of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ToolResultBlock>),
}

impl MessageContent {
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .map(|b| b.content.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One tool result carried in a user-role message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub tool_use_id: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResultBlock {
    pub fn from_outcome(outcome: &ToolOutcome) -> Self {
        Self {
            block_type: "tool_result".to_string(),
            tool_use_id: outcome.tool_call_id.clone(),
            content: outcome.content.clone(),
            is_error: outcome.is_error,
        }
    }
}

/// One backend round-trip and everything it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 1-based position in the run.
    pub turn_number: usize,
    pub assistant_message: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Everything a finished run yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub final_response: String,
    pub turns: Vec<TurnRecord>,
    /// Every tool call across all turns, in dispatch order.
    pub tool_calls: Vec<ToolCall>,
    pub messages: Vec<Message>,
    pub metrics: Metrics,
    /// Set when the run ended on a failure rather than a final answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the run hit the turn budget before a final answer.
    #[serde(default)]
    pub truncated: bool,
}

impl AgentResult {
    /// A run that never got anywhere, for failures outside the loop.
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            final_response: "No response".to_string(),
            turns: Vec::new(),
            tool_calls: Vec::new(),
            messages: Vec::new(),
            metrics: Metrics::default(),
            error: Some(message.into()),
            truncated: false,
        }
    }
}
