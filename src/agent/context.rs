//! Point-in-time context sharing between agents.
//!
//! Sharing copies messages; nothing stays linked afterwards. The system
//! message is special: it is only copied on request and only into a target
//! that has none, so an agent's persona is never silently overwritten.

use std::collections::HashSet;

use super::messages::MessageLog;
use super::types::Message;

/// Options for one share operation.
#[derive(Debug, Clone)]
pub struct ShareOptions {
    /// Copy the source's system message when the target has none.
    pub include_system: bool,
    /// Keep only this many of the most recent non-system messages.
    pub max_messages: usize,
    /// When set, only messages with this role are copied.
    pub filter_by_role: Option<String>,
}

impl Default for ShareOptions {
    fn default() -> Self {
        Self {
            include_system: true,
            max_messages: 10,
            filter_by_role: None,
        }
    }
}

/// Copy recent messages from a source history into a target log.
pub fn share_context(source: &[Message], target: &mut MessageLog, options: &ShareOptions) {
    if options.include_system && target.system_message().is_none() {
        if let Some(system) = source.iter().find(|m| m.role == "system") {
            target.add_system(&system.text());
        }
    }

    let eligible: Vec<&Message> = source
        .iter()
        .filter(|m| m.role != "system")
        .filter(|m| {
            options
                .filter_by_role
                .as_deref()
                .map_or(true, |role| m.role == role)
        })
        .collect();

    let start = eligible.len().saturating_sub(options.max_messages);
    for message in &eligible[start..] {
        target.push((*message).clone());
    }
}

/// Merge several histories into one, deduping by (role, text) with first
/// occurrence winning, then keeping the most recent `max_messages`.
pub fn merge_contexts(histories: &[Vec<Message>], max_messages: usize) -> Vec<Message> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut merged: Vec<Message> = Vec::new();
    for history in histories {
        for message in history {
            let key = (message.role.clone(), message.text());
            if seen.insert(key) {
                merged.push(message.clone());
            }
        }
    }
    let start = merged.len().saturating_sub(max_messages);
    merged.split_off(start)
}

/// One line per message: `role: first 100 chars`.
pub fn context_summary(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| {
            let text = message.text();
            let preview: String = text.chars().take(100).collect();
            format!("{}: {preview}", message.role)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
