//! Propose a change to one file, with optional promotion to disk.
//!
//! The change always lands in the virtual codebase (via the injected apply
//! function). Whether it also reaches disk is decided per call: an explicit
//! `auto_apply` flag wins, then a pre-classified intent signal, then the
//! prompt heuristic. A disk failure after a successful in-memory apply keeps
//! the in-memory change and reports the failure in the outcome text.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::codebase::workspace::WorkspaceError;
use crate::codebase::{ChangeKind, ChangeProposal};
use crate::intent;
use crate::tools::builtin::RunContext;
use crate::tools::{Tool, ToolError};

/// Applies a proposal to the virtual codebase. Reports success.
pub type ApplyChangeFn = Arc<dyn Fn(&ChangeProposal) -> bool + Send + Sync>;

/// Promotes one path to disk. `Ok(true)` applied, `Ok(false)` requested but
/// not performed, `Err` an I/O-level failure.
pub type DiskPromoteFn =
    Arc<dyn Fn(&str, ChangeKind) -> Result<bool, WorkspaceError> + Send + Sync>;

/// Observer invoked after each successful in-memory apply.
pub type ChangeCallback = Arc<dyn Fn(&ChangeProposal) + Send + Sync>;

pub struct ProposeChangeTool {
    apply_change: ApplyChangeFn,
    run: RunContext,
    promote: Option<DiskPromoteFn>,
    on_change_applied: Option<ChangeCallback>,
}

impl ProposeChangeTool {
    pub fn new(apply_change: ApplyChangeFn, run: RunContext) -> Self {
        Self {
            apply_change,
            run,
            promote: None,
            on_change_applied: None,
        }
    }

    /// Enable disk promotion through the given function.
    pub fn with_disk_promotion(mut self, promote: DiskPromoteFn) -> Self {
        self.promote = Some(promote);
        self
    }

    pub fn with_change_callback(mut self, callback: ChangeCallback) -> Self {
        self.on_change_applied = Some(callback);
        self
    }

    fn parse_proposal(input: &Value) -> Result<ChangeProposal, ToolError> {
        let file_path = input
            .get("file_path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ToolError::invalid("file_path is required and must be a string"))?;

        let change_type = input
            .get("change_type")
            .and_then(Value::as_str)
            .and_then(ChangeKind::parse)
            .ok_or_else(|| {
                ToolError::invalid("change_type must be one of: create, modify, delete, refactor")
            })?;

        let description = input
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ToolError::invalid("description is required and must be a string"))?;

        // Present-but-empty is allowed only for deletes.
        let suggested_code = input
            .get("suggested_code")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::invalid("suggested_code is required and must be a string")
            })?;
        if suggested_code.is_empty() && change_type != ChangeKind::Delete {
            return Err(ToolError::invalid(format!(
                "suggested_code cannot be empty for {change_type} changes"
            )));
        }

        let reasoning = input
            .get("reasoning")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ToolError::invalid("reasoning is required and must be a string"))?;

        Ok(ChangeProposal {
            file_path: file_path.to_string(),
            change_type,
            description: description.to_string(),
            suggested_code: suggested_code.to_string(),
            reasoning: reasoning.to_string(),
        })
    }

    fn promotion_note(&self, proposal: &ChangeProposal) -> String {
        let Some(promote) = &self.promote else {
            return String::new();
        };
        match promote(&proposal.file_path, proposal.change_type) {
            Ok(true) => {
                if proposal.change_type == ChangeKind::Delete {
                    "\n\nThe deletion was automatically applied to disk.".to_string()
                } else {
                    "\n\nThe change was automatically applied to disk.".to_string()
                }
            }
            Ok(false) => "\n\nAuto-apply to disk was requested but failed.".to_string(),
            // The in-memory change stays; only the promotion is lost.
            Err(e) => format!("\n\nAuto-apply to disk failed: {e}"),
        }
    }
}

#[async_trait]
impl Tool for ProposeChangeTool {
    fn name(&self) -> &str {
        "propose_change"
    }

    fn description(&self) -> &str {
        "Propose a change to a file. The change is applied to the in-memory virtual codebase and becomes visible to later reads. AUTO-APPLY: when the user's request is an order (or auto_apply is true), the change is also written to disk inside the working directory."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to change"
                },
                "change_type": {
                    "type": "string",
                    "enum": ["create", "modify", "delete", "refactor"],
                    "description": "What kind of change this is"
                },
                "description": {
                    "type": "string",
                    "description": "Short human-readable summary of the change"
                },
                "suggested_code": {
                    "type": "string",
                    "description": "Full replacement content for the file (may be empty for deletes)"
                },
                "reasoning": {
                    "type": "string",
                    "description": "Why this change is the right one"
                },
                "auto_apply": {
                    "type": "boolean",
                    "description": "Force AUTO-APPLY on or off for this change, overriding intent detection"
                }
            },
            "required": ["file_path", "change_type", "description", "suggested_code", "reasoning"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value) -> Result<String, ToolError> {
        let proposal = Self::parse_proposal(&input)?;
        let explicit = input.get("auto_apply").and_then(Value::as_bool);

        if !(self.apply_change)(&proposal) {
            return Ok(format!(
                "Failed to apply change to {}. The file may not exist or the change type may be invalid.",
                proposal.file_path
            ));
        }

        if let Some(callback) = &self.on_change_applied {
            callback(&proposal);
        }

        let mut result = format!(
            "Change applied successfully to {}:\n{}",
            proposal.file_path, proposal.description
        );

        let should_apply = intent::resolve_auto_apply(
            explicit,
            self.run.pre_classified(),
            self.run.prompt().as_deref(),
        );
        debug!(
            file = %proposal.file_path,
            kind = %proposal.change_type,
            auto_apply = should_apply,
            "change proposed"
        );
        if should_apply {
            result.push_str(&self.promotion_note(&proposal));
        }

        Ok(result)
    }
}
