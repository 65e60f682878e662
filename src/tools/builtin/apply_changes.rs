//! Promote virtual-codebase content to disk in bulk.
//!
//! Specific paths or everything proposed so far, always confined to the
//! working directory. Dry-run reports what would happen without touching
//! disk. Per-file failures are collected, never fatal to the batch.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use crate::codebase::workspace::Workspace;
use crate::codebase::VirtualCodebase;
use crate::tools::{Tool, ToolError};

/// One file written during a batch apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub file: String,
    /// "create" when the destination was absent, "modify" when it existed.
    pub change_type: &'static str,
}

/// Observer invoked once per non-dry-run batch that wrote at least one file.
pub type ApplyCallback = Arc<dyn Fn(&[AppliedChange]) + Send + Sync>;

pub struct ApplyChangesTool {
    codebase: VirtualCodebase,
    workspace: Arc<Workspace>,
    on_changes_applied: Option<ApplyCallback>,
}

impl ApplyChangesTool {
    pub fn new(codebase: VirtualCodebase, workspace: Arc<Workspace>) -> Self {
        Self {
            codebase,
            workspace,
            on_changes_applied: None,
        }
    }

    pub fn with_apply_callback(mut self, callback: ApplyCallback) -> Self {
        self.on_changes_applied = Some(callback);
        self
    }

    /// Requested paths filtered to the working directory, or every proposed
    /// path inside it when the request names none.
    fn target_paths(&self, requested: Option<Vec<String>>) -> Vec<String> {
        let candidates = match requested {
            Some(paths) if !paths.is_empty() => paths,
            _ => self.codebase.paths(),
        };
        candidates
            .into_iter()
            .filter(|p| {
                let inside = self.workspace.contains(p);
                if !inside {
                    warn!(path = %p, "skipping path outside working directory");
                }
                inside
            })
            .collect()
    }
}

#[async_trait]
impl Tool for ApplyChangesTool {
    fn name(&self) -> &str {
        "apply_changes"
    }

    fn description(&self) -> &str {
        "Write proposed changes from the virtual codebase to disk. With no file_paths, applies everything proposed so far. Set dry_run to preview without writing."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_paths": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Specific files to apply; omit to apply all proposed files"
                },
                "dry_run": {
                    "type": "boolean",
                    "description": "Report what would be written without writing"
                }
            },
            "required": [],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value) -> Result<String, ToolError> {
        let requested = match input.get("file_paths") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let entries = value
                    .as_array()
                    .ok_or_else(|| ToolError::invalid("file_paths must be an array of strings"))?;
                let mut paths = Vec::with_capacity(entries.len());
                for entry in entries {
                    let path = entry.as_str().ok_or_else(|| {
                        ToolError::invalid("file_paths must be an array of strings")
                    })?;
                    paths.push(path.to_string());
                }
                Some(paths)
            }
        };
        let dry_run = input.get("dry_run").and_then(Value::as_bool) == Some(true);

        let targets = self.target_paths(requested);
        if targets.is_empty() {
            return Ok(
                "No files to apply. Make sure files are within the working directory and have been proposed with propose_change first."
                    .to_string(),
            );
        }

        let mut applied: Vec<AppliedChange> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for path in &targets {
            let Some(content) = self.codebase.get(path) else {
                errors.push(format!("{path}: Not found in virtual codebase"));
                continue;
            };
            let change_type = if self.workspace.exists(path) {
                "modify"
            } else {
                "create"
            };

            if !dry_run {
                if let Err(e) = self.workspace.write_file(path, &content) {
                    errors.push(format!("Error applying {path}: {e}"));
                    continue;
                }
            }
            applied.push(AppliedChange {
                file: path.clone(),
                change_type,
            });
        }

        if !dry_run && !applied.is_empty() {
            if let Some(callback) = &self.on_changes_applied {
                callback(&applied);
            }
        }

        let mut report = if dry_run {
            format!("[DRY RUN] Would apply {} file(s):\n", applied.len())
        } else {
            format!("Applied {} file(s) to disk:\n", applied.len())
        };
        for change in &applied {
            report.push_str(&format!("  - {} ({})\n", change.file, change.change_type));
        }
        if !errors.is_empty() {
            report.push_str("\nErrors:\n");
            for error in &errors {
                report.push_str(&format!("  - {error}\n"));
            }
        }

        Ok(report.trim().to_string())
    }
}
