//! Wire types for the backend session protocol.

use serde::{Deserialize, Serialize};

/// Body of a session-creation response. Servers answer either `{"id": ...}`
/// or `{"data": {"id": ...}}`.
#[derive(Debug, Deserialize)]
pub struct SessionCreated {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<SessionData>,
}

#[derive(Debug, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub id: Option<String>,
}

impl SessionCreated {
    /// The session id from whichever shape the server used.
    pub fn into_session_id(self) -> Option<String> {
        self.id.or_else(|| self.data.and_then(|d| d.id))
    }
}

/// One part of a model reply. Parts we do not understand keep their type
/// tag and are simply ignored by the extractors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ReplyPart {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            part_type: "text".to_string(),
            text: Some(content.into()),
        }
    }

    pub fn reasoning(content: impl Into<String>) -> Self {
        Self {
            part_type: "reasoning".to_string(),
            text: Some(content.into()),
        }
    }
}

/// Token accounting attached to a reply, when the server provides it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// A model reply: ordered parts plus optional usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub parts: Vec<ReplyPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ReplyUsage>,
}

impl BackendReply {
    /// Concatenated text parts, in order.
    pub fn text(&self) -> String {
        self.collect_parts("text")
    }

    /// Concatenated reasoning parts, when any exist.
    pub fn reasoning(&self) -> Option<String> {
        let reasoning = self.collect_parts("reasoning");
        if reasoning.is_empty() {
            None
        } else {
            Some(reasoning)
        }
    }

    fn collect_parts(&self, part_type: &str) -> String {
        self.parts
            .iter()
            .filter(|p| p.part_type == part_type)
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-message options forwarded to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostOptions {
    /// Model to answer with; None lets the server pick its default.
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_from_flat_shape() {
        let created: SessionCreated = serde_json::from_str(r#"{"id": "ses_1"}"#).unwrap();
        assert_eq!(created.into_session_id().as_deref(), Some("ses_1"));
    }

    #[test]
    fn session_id_from_nested_shape() {
        let created: SessionCreated =
            serde_json::from_str(r#"{"data": {"id": "ses_2"}}"#).unwrap();
        assert_eq!(created.into_session_id().as_deref(), Some("ses_2"));
    }

    #[test]
    fn session_id_missing_in_both_shapes() {
        let created: SessionCreated = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        assert!(created.into_session_id().is_none());
    }

    #[test]
    fn reply_text_joins_text_parts_and_skips_others() {
        let reply: BackendReply = serde_json::from_str(
            r#"{
                "parts": [
                    {"type": "reasoning", "text": "thinking"},
                    {"type": "text", "text": "first"},
                    {"type": "step-start"},
                    {"type": "text", "text": "second"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(reply.text(), "first\nsecond");
        assert_eq!(reply.reasoning().as_deref(), Some("thinking"));
    }

    #[test]
    fn reply_without_reasoning_parts_has_no_reasoning() {
        let reply = BackendReply {
            parts: vec![ReplyPart::text("just text")],
            usage: None,
        };
        assert!(reply.reasoning().is_none());
    }

    #[test]
    fn usage_fields_default_to_zero() {
        let reply: BackendReply =
            serde_json::from_str(r#"{"parts": [], "usage": {"input_tokens": 12}}"#).unwrap();
        let usage = reply.usage.unwrap();
        assert_eq!(usage.input_tokens, 12);
        assert_eq!(usage.output_tokens, 0);
    }
}
