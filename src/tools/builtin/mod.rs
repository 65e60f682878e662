//! Built-in coding tools and their wiring.
//!
//! Six capabilities over shared state: read and search see the repository
//! snapshot plus proposed content; propose and apply mutate the virtual
//! codebase and, under the promotion rules, the working directory; todos
//! and progress report back to the host. Everything a tool touches is
//! injected at construction, nothing goes through globals.

pub mod apply_changes;
pub mod manage_todos;
pub mod propose_change;
pub mod read_file;
pub mod report_progress;
pub mod search_files;

pub use apply_changes::{AppliedChange, ApplyCallback, ApplyChangesTool};
pub use manage_todos::{ManageTodosTool, Todo, TodoStatus, TodoStore};
pub use propose_change::{
    ApplyChangeFn, ChangeCallback, DiskPromoteFn, ProposeChangeTool,
};
pub use read_file::ReadFileTool;
pub use report_progress::{ProgressCallback, ReportProgressTool};
pub use search_files::{SearchFilesTool, SearchFn};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::codebase::workspace::Workspace;
use crate::codebase::{ChangeKind, VirtualCodebase};
use crate::tools::{DuplicateTool, Tool, ToolRegistry};

/// Per-run signals the propose tool consults when deciding promotion: the
/// prompt that started the run and an optional pre-classified intent. The
/// host sets these before each run; tools only read.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    inner: Arc<Mutex<RunSignals>>,
}

#[derive(Debug, Default)]
struct RunSignals {
    prompt: Option<String>,
    pre_classified: Option<bool>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RunSignals> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record the prompt that starts a run, clearing any stale intent.
    pub fn begin_run(&self, prompt: &str) {
        let mut signals = self.lock();
        signals.prompt = Some(prompt.to_string());
        signals.pre_classified = None;
    }

    /// Attach a pre-classified order/question decision for the current run.
    pub fn set_pre_classified(&self, is_order: Option<bool>) {
        self.lock().pre_classified = is_order;
    }

    pub fn prompt(&self) -> Option<String> {
        self.lock().prompt.clone()
    }

    pub fn pre_classified(&self) -> Option<bool> {
        self.lock().pre_classified
    }
}

/// Default in-memory apply: create/modify/refactor store the suggested code,
/// delete drops the entry.
pub fn apply_to_codebase(codebase: VirtualCodebase) -> ApplyChangeFn {
    Arc::new(move |change| {
        match change.change_type {
            ChangeKind::Delete => {
                codebase.remove(&change.file_path);
            }
            _ => {
                codebase.set(&change.file_path, change.suggested_code.clone());
            }
        }
        true
    })
}

/// Default disk promotion: deletes go through the workspace, everything else
/// writes the path's current virtual content.
pub fn promote_to_workspace(workspace: Arc<Workspace>, codebase: VirtualCodebase) -> DiskPromoteFn {
    Arc::new(move |path, kind| {
        if kind == ChangeKind::Delete {
            return workspace.delete_file(path);
        }
        let Some(content) = codebase.get(path) else {
            warn!(path, "nothing proposed for path, skipping disk write");
            return Ok(false);
        };
        workspace.write_file(path, &content)?;
        Ok(true)
    })
}

/// Default path searcher over the repository snapshot plus proposed paths.
/// Queries with glob metacharacters match as globs, anything else as a
/// case-insensitive substring. Results are sorted and deduped.
pub fn snapshot_searcher(
    repository: Arc<HashMap<String, String>>,
    codebase: VirtualCodebase,
) -> SearchFn {
    Arc::new(move |query| {
        let mut paths: Vec<String> = repository.keys().cloned().collect();
        paths.extend(codebase.paths());
        paths.sort();
        paths.dedup();

        let looks_like_glob = query.contains(['*', '?', '[']);
        if looks_like_glob {
            if let Ok(pattern) = glob::Pattern::new(query) {
                paths.retain(|p| pattern.matches(p));
                return paths;
            }
            // Unparsable pattern: fall through to substring matching.
        }
        let needle = query.to_lowercase();
        paths.retain(|p| p.to_lowercase().contains(&needle));
        paths
    })
}

/// The shared stores behind the built-in toolset, plus optional host
/// callbacks. `tools()` wires everything into fresh tool instances.
#[derive(Clone)]
pub struct Builtins {
    codebase: VirtualCodebase,
    workspace: Arc<Workspace>,
    repository: Arc<HashMap<String, String>>,
    todos: TodoStore,
    run: RunContext,
    on_progress: Option<ProgressCallback>,
    on_change_applied: Option<ChangeCallback>,
    on_changes_applied: Option<ApplyCallback>,
}

impl Builtins {
    pub fn new(workspace: Workspace, repository: HashMap<String, String>) -> Self {
        Self {
            codebase: VirtualCodebase::new(),
            workspace: Arc::new(workspace),
            repository: Arc::new(repository),
            todos: TodoStore::new(),
            run: RunContext::new(),
            on_progress: None,
            on_change_applied: None,
            on_changes_applied: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn with_change_callback(mut self, callback: ChangeCallback) -> Self {
        self.on_change_applied = Some(callback);
        self
    }

    pub fn with_apply_callback(mut self, callback: ApplyCallback) -> Self {
        self.on_changes_applied = Some(callback);
        self
    }

    pub fn codebase(&self) -> &VirtualCodebase {
        &self.codebase
    }

    pub fn todos(&self) -> &TodoStore {
        &self.todos
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Record the prompt that starts the next run (feeds intent detection).
    pub fn begin_run(&self, prompt: &str) {
        self.run.begin_run(prompt);
    }

    /// Override intent detection for the current run.
    pub fn set_pre_classified(&self, is_order: Option<bool>) {
        self.run.set_pre_classified(is_order);
    }

    /// Build the six built-in tools wired to these stores.
    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let search = snapshot_searcher(self.repository.clone(), self.codebase.clone());
        let promote = promote_to_workspace(self.workspace.clone(), self.codebase.clone());

        let mut propose =
            ProposeChangeTool::new(apply_to_codebase(self.codebase.clone()), self.run.clone())
                .with_disk_promotion(promote);
        if let Some(callback) = &self.on_change_applied {
            propose = propose.with_change_callback(callback.clone());
        }

        let mut apply = ApplyChangesTool::new(self.codebase.clone(), self.workspace.clone());
        if let Some(callback) = &self.on_changes_applied {
            apply = apply.with_apply_callback(callback.clone());
        }

        let on_progress = self.on_progress.clone().unwrap_or_else(|| {
            Arc::new(|progress, summary| info!(progress, summary, "progress reported"))
        });

        vec![
            Arc::new(ReadFileTool::new(
                self.codebase.clone(),
                self.repository.clone(),
            )),
            Arc::new(SearchFilesTool::new(search)),
            Arc::new(propose),
            Arc::new(apply),
            Arc::new(ManageTodosTool::new(self.todos.clone())),
            Arc::new(ReportProgressTool::new(on_progress)),
        ]
    }

    /// The built-in tools in a fresh registry.
    pub fn registry(&self) -> Result<ToolRegistry, DuplicateTool> {
        let mut registry = ToolRegistry::new();
        for tool in self.tools() {
            registry.register(tool)?;
        }
        Ok(registry)
    }
}
