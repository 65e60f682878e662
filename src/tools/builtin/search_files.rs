//! Search repository paths by substring or glob.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::{Tool, ToolError};

/// Pluggable path searcher: query in, matching paths out.
pub type SearchFn = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Result cap applied when the caller does not ask for one.
const DEFAULT_MAX_RESULTS: usize = 1000;
/// Requests at or above this are treated as "give me everything".
const UNCAPPED_THRESHOLD: f64 = 10_000.0;

/// Finds files by name. The match strategy lives in the injected searcher;
/// this tool owns validation, capping, and report formatting.
pub struct SearchFilesTool {
    search: SearchFn,
}

impl SearchFilesTool {
    pub fn new(search: SearchFn) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Search for files by name or glob pattern (e.g. \"*.rs\" or \"config\"). Returns matching paths."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Substring or glob pattern to match against file paths"
                },
                "max_results": {
                    "type": "number",
                    "description": "Cap on returned paths (default 1000; 10000 or more removes the cap)"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value) -> Result<String, ToolError> {
        let query = input
            .get("query")
            .and_then(Value::as_str)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::invalid("query is required and must be a string"))?;

        let cap = match input.get("max_results") {
            None | Some(Value::Null) => Some(DEFAULT_MAX_RESULTS),
            Some(value) => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| ToolError::invalid("max_results must be a number"))?;
                if n <= 0.0 {
                    return Err(ToolError::invalid("max_results must be a positive number"));
                }
                if n >= UNCAPPED_THRESHOLD {
                    None
                } else {
                    Some(n as usize)
                }
            }
        };

        let mut matches = (self.search)(query);
        if let Some(cap) = cap {
            matches.truncate(cap);
        }

        if matches.is_empty() {
            return Ok(format!("No files found matching query: \"{query}\""));
        }

        let listing = matches
            .iter()
            .enumerate()
            .map(|(i, file)| format!("{}. {file}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "Found {} file(s) matching \"{query}\":\n\n{listing}",
            matches.len()
        ))
    }
}
