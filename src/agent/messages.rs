//! Ordered conversation log.
//!
//! Holds the full history for inspection, context sharing, and snapshots.
//! At most one system message exists and it sits at the front; setting a
//! new one replaces the old in place.

use crate::tools::ToolOutcome;

use super::types::{Message, MessageContent, ToolResultBlock};

#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system message, replacing an existing one in place.
    pub fn add_system(&mut self, content: &str) {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.role == "system") {
            existing.content = MessageContent::Text(content.to_string());
        } else {
            self.messages.insert(0, Message::system(content));
        }
    }

    pub fn add_user(&mut self, content: &str) {
        self.messages.push(Message::user(content));
    }

    pub fn add_assistant(&mut self, content: &str) {
        self.messages.push(Message::assistant(content));
    }

    /// Append one turn's tool results as a single structured user entry.
    pub fn add_tool_results(&mut self, outcomes: &[ToolOutcome]) {
        if outcomes.is_empty() {
            return;
        }
        let blocks = outcomes.iter().map(ToolResultBlock::from_outcome).collect();
        self.messages.push(Message {
            role: "user".to_string(),
            content: MessageContent::Blocks(blocks),
        });
    }

    /// Append an arbitrary message as-is. For system content prefer
    /// `add_system`, which keeps the single-system invariant.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn system_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == "system")
    }

    pub fn by_role(&self, role: &str) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.role == role)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything except the system message.
    pub fn retain_system(&mut self) {
        self.messages.retain(|m| m.role == "system");
    }

    /// Drop the whole history, system message included.
    pub fn reset(&mut self) {
        self.messages.clear();
    }
}
