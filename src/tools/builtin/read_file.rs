//! Read a file from the virtual codebase or the repository snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::codebase::VirtualCodebase;
use crate::tools::{Tool, ToolError};

/// Reads file content, preferring proposed (virtual) content over the
/// repository snapshot. An empty proposed file is real content, not a miss.
pub struct ReadFileTool {
    codebase: VirtualCodebase,
    repository: Arc<HashMap<String, String>>,
}

impl ReadFileTool {
    pub fn new(codebase: VirtualCodebase, repository: Arc<HashMap<String, String>>) -> Self {
        Self {
            codebase,
            repository,
        }
    }

    fn render(path: &str, content: &str) -> String {
        let lines = content.split('\n').count();
        format!("File: {path}\nLines: {lines}\n\n```\n{content}\n```")
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Proposed changes from earlier steps are visible, so the view is always the latest version."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to read, relative to the repository root"
                }
            },
            "required": ["file_path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value) -> Result<String, ToolError> {
        let path = input
            .get("file_path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ToolError::invalid("file_path is required and must be a string"))?;

        if let Some(content) = self.codebase.get(path) {
            return Ok(Self::render(path, &content));
        }
        if let Some(content) = self.repository.get(path) {
            return Ok(Self::render(path, content));
        }
        Ok(format!(
            "Error: File \"{path}\" not found in the repository."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_with(repo: &[(&str, &str)]) -> (ReadFileTool, VirtualCodebase) {
        let repository: HashMap<String, String> = repo
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let codebase = VirtualCodebase::new();
        (
            ReadFileTool::new(codebase.clone(), Arc::new(repository)),
            codebase,
        )
    }

    #[tokio::test]
    async fn reads_from_repository_snapshot() {
        let (tool, _vc) = tool_with(&[("src/lib.rs", "pub fn x() {}")]);
        let out = tool
            .execute(json!({ "file_path": "src/lib.rs" }))
            .await
            .unwrap();
        assert_eq!(out, "File: src/lib.rs\nLines: 1\n\n```\npub fn x() {}\n```");
    }

    #[tokio::test]
    async fn virtual_content_shadows_the_snapshot() {
        let (tool, vc) = tool_with(&[("src/lib.rs", "old")]);
        vc.set("src/lib.rs", "new\ncontent".to_string());

        let out = tool
            .execute(json!({ "file_path": "src/lib.rs" }))
            .await
            .unwrap();
        assert!(out.contains("Lines: 2"));
        assert!(out.contains("new\ncontent"));
        assert!(!out.contains("old"));
    }

    #[tokio::test]
    async fn empty_virtual_file_is_content_not_a_miss() {
        let (tool, vc) = tool_with(&[("a.txt", "snapshot text")]);
        vc.set("a.txt", String::new());

        let out = tool.execute(json!({ "file_path": "a.txt" })).await.unwrap();
        // One line (the empty one), and no fallthrough to the snapshot.
        assert!(out.contains("Lines: 1"));
        assert!(!out.contains("snapshot text"));
    }

    #[tokio::test]
    async fn missing_file_reports_not_found_without_erroring() {
        let (tool, _vc) = tool_with(&[]);
        let out = tool
            .execute(json!({ "file_path": "ghost.rs" }))
            .await
            .unwrap();
        assert_eq!(out, "Error: File \"ghost.rs\" not found in the repository.");
    }

    #[tokio::test]
    async fn missing_or_non_string_path_is_a_validation_error() {
        let (tool, _vc) = tool_with(&[]);
        let err = tool.execute(json!({})).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "file_path is required and must be a string"
        );

        let err = tool.execute(json!({ "file_path": 42 })).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "file_path is required and must be a string"
        );
    }

    #[tokio::test]
    async fn line_count_is_newline_based() {
        let (tool, _vc) = tool_with(&[("three.txt", "a\nb\nc")]);
        let out = tool
            .execute(json!({ "file_path": "three.txt" }))
            .await
            .unwrap();
        assert!(out.contains("Lines: 3"));
    }
}
