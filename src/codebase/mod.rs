//! Virtual codebase — the in-memory view of proposed file contents.
//!
//! Every change proposal lands here before anything reaches disk. Reads
//! prefer this map over the repository snapshot; writes are last-write-wins
//! per path. The map sits behind a mutex so each operation is atomic with
//! respect to concurrent tool calls.

pub mod workspace;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Kinds of change a proposal may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Modify,
    Delete,
    Refactor,
}

impl ChangeKind {
    /// Parse the wire spelling. Unknown strings are rejected by callers
    /// with their own error text.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "modify" => Some(Self::Modify),
            "delete" => Some(Self::Delete),
            "refactor" => Some(Self::Refactor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
            Self::Refactor => "refactor",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed change to one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeProposal {
    pub file_path: String,
    pub change_type: ChangeKind,
    pub description: String,
    /// Full replacement content. Empty only for deletes.
    pub suggested_code: String,
    pub reasoning: String,
}

/// Shared path-to-proposed-content map.
///
/// Cloning is cheap and every clone addresses the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct VirtualCodebase {
    files: Arc<Mutex<HashMap<String, String>>>,
}

impl VirtualCodebase {
    /// Create an empty virtual codebase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a repository snapshot, for runs that start from the
    /// current repo state.
    pub fn seeded(files: HashMap<String, String>) -> Self {
        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    // No holder ever panics while the lock is held (plain map operations),
    // so a poisoned lock still contains a coherent map. Recover the guard.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.files.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Store content for a path. Last write wins.
    pub fn set(&self, path: &str, content: String) {
        self.lock().insert(path.to_string(), content);
    }

    /// Content for a path, if any. `Some("")` is a valid empty file and is
    /// distinct from `None`.
    pub fn get(&self, path: &str) -> Option<String> {
        self.lock().get(path).cloned()
    }

    /// Remove a path, returning its content when present.
    pub fn remove(&self, path: &str) -> Option<String> {
        self.lock().remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    /// All proposed paths, sorted for deterministic reporting.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Copy of the whole map.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let vc = VirtualCodebase::new();
        vc.set("src/main.rs", "fn main() {}".to_string());
        assert_eq!(vc.get("src/main.rs").as_deref(), Some("fn main() {}"));
        assert!(vc.get("src/other.rs").is_none());
    }

    #[test]
    fn last_write_wins() {
        let vc = VirtualCodebase::new();
        vc.set("a.txt", "first".to_string());
        vc.set("a.txt", "second".to_string());
        assert_eq!(vc.get("a.txt").as_deref(), Some("second"));
        assert_eq!(vc.len(), 1);
    }

    #[test]
    fn empty_content_is_distinct_from_absent() {
        let vc = VirtualCodebase::new();
        vc.set("empty.txt", String::new());
        assert_eq!(vc.get("empty.txt").as_deref(), Some(""));
        assert!(vc.contains("empty.txt"));
        assert!(!vc.contains("missing.txt"));
    }

    #[test]
    fn remove_returns_previous_content() {
        let vc = VirtualCodebase::new();
        vc.set("a.txt", "gone".to_string());
        assert_eq!(vc.remove("a.txt").as_deref(), Some("gone"));
        assert!(vc.remove("a.txt").is_none());
        assert!(vc.is_empty());
    }

    #[test]
    fn clones_share_the_same_map() {
        let vc = VirtualCodebase::new();
        let other = vc.clone();
        other.set("shared.txt", "visible".to_string());
        assert_eq!(vc.get("shared.txt").as_deref(), Some("visible"));
    }

    #[test]
    fn paths_are_sorted() {
        let vc = VirtualCodebase::new();
        vc.set("b.txt", String::new());
        vc.set("a.txt", String::new());
        vc.set("c/d.txt", String::new());
        assert_eq!(vc.paths(), vec!["a.txt", "b.txt", "c/d.txt"]);
    }

    #[test]
    fn seeded_starts_with_snapshot() {
        let mut seed = HashMap::new();
        seed.insert("README.md".to_string(), "# hi".to_string());
        let vc = VirtualCodebase::seeded(seed);
        assert_eq!(vc.get("README.md").as_deref(), Some("# hi"));
    }

    #[test]
    fn change_kind_parses_wire_spellings() {
        assert_eq!(ChangeKind::parse("create"), Some(ChangeKind::Create));
        assert_eq!(ChangeKind::parse("refactor"), Some(ChangeKind::Refactor));
        assert_eq!(ChangeKind::parse("rename"), None);
        assert_eq!(ChangeKind::Delete.to_string(), "delete");
    }
}
