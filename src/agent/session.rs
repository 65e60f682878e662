//! Session persistence.
//!
//! A snapshot is the full message history plus run metadata, serialized as
//! pretty JSON into one file per session id. The store is a flat directory;
//! listing strips the `.json` suffix and sorts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metrics::Metrics;
use super::types::Message;

pub const DEFAULT_SESSIONS_DIR: &str = ".agent-sessions";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid session snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),
    #[error("session not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub created_at: u64,
    pub last_updated: u64,
    pub message_count: usize,
    pub turn_count: usize,
    pub tool_call_count: usize,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub metadata: SessionMetadata,
    pub messages: Vec<Message>,
}

/// File-backed store, one JSON document per session.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&snapshot.metadata.session_id);
        let body = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, body)?;
        debug!(session_id = %snapshot.metadata.session_id, path = %path.display(), "session saved");
        Ok(())
    }

    pub fn load(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Err(SessionError::NotFound(session_id.to_string()));
        }
        let body = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Saved session ids, sorted. A store that was never written to lists
    /// as empty rather than erroring.
    pub fn list(&self) -> Result<Vec<String>, SessionError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(id) = name.to_string_lossy().strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Returns whether a file was actually removed.
    pub fn delete(&self, session_id: &str) -> Result<bool, SessionError> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        debug!(session_id, "session deleted");
        Ok(true)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSIONS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot(id: &str) -> SessionSnapshot {
        SessionSnapshot {
            metadata: SessionMetadata {
                session_id: id.to_string(),
                created_at: 1_700_000_000_000,
                last_updated: 1_700_000_060_000,
                message_count: 3,
                turn_count: 1,
                tool_call_count: 2,
                metrics: Metrics {
                    api_calls: 1,
                    input_tokens: 50,
                    output_tokens: 20,
                    ..Metrics::default()
                },
            },
            messages: vec![
                Message::system("persona"),
                Message::user("question"),
                Message::assistant("answer"),
            ],
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        store.save(&snapshot("ses_1")).unwrap();
        let loaded = store.load("ses_1").unwrap();

        assert_eq!(loaded.metadata.session_id, "ses_1");
        assert_eq!(loaded.metadata.message_count, 3);
        assert_eq!(loaded.metadata.metrics.input_tokens, 50);
        assert_eq!(loaded.messages.len(), 3);
        assert_eq!(loaded.messages[2].text(), "answer");
    }

    #[test]
    fn load_missing_session_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let err = store.load("ghost").unwrap_err();
        assert!(matches!(err, SessionError::NotFound(id) if id == "ghost"));
    }

    #[test]
    fn list_is_sorted_and_empty_when_dir_missing() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("never-created"));
        assert!(store.list().unwrap().is_empty());

        let store = SessionStore::new(dir.path());
        store.save(&snapshot("ses_b")).unwrap();
        store.save(&snapshot("ses_a")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["ses_a", "ses_b"]);
    }

    #[test]
    fn delete_reports_whether_file_existed() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&snapshot("ses_1")).unwrap();

        assert!(store.delete("ses_1").unwrap());
        assert!(!store.delete("ses_1").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn save_overwrites_existing_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        store.save(&snapshot("ses_1")).unwrap();
        let mut updated = snapshot("ses_1");
        updated.metadata.turn_count = 5;
        store.save(&updated).unwrap();

        assert_eq!(store.load("ses_1").unwrap().metadata.turn_count, 5);
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
