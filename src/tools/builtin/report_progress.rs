//! Report completion progress to the host.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::tools::{Tool, ToolError};

/// Host-side sink for (percent, summary) reports.
pub type ProgressCallback = Arc<dyn Fn(u32, &str) + Send + Sync>;

pub struct ReportProgressTool {
    on_progress: ProgressCallback,
}

impl ReportProgressTool {
    pub fn new(on_progress: ProgressCallback) -> Self {
        Self { on_progress }
    }

    /// Accept a number, or a string with a number somewhere in it
    /// ("about 75% done" reads as 75).
    fn parse_progress(value: &Value) -> Result<f64, ToolError> {
        if let Some(n) = value.as_f64() {
            return Ok(n);
        }
        if let Some(s) = value.as_str() {
            let re = Regex::new(r"(\d+(?:\.\d+)?)")
                .map_err(|e| ToolError::invalid(format!("internal pattern error: {e}")))?;
            return re
                .captures(s)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .ok_or_else(|| {
                    ToolError::invalid(format!(
                        "Invalid progress value: \"{s}\". Must be a number between 0 and 100."
                    ))
                });
        }
        Err(ToolError::invalid(
            "Invalid progress type. Must be a number between 0 and 100.",
        ))
    }

    /// Strip markdown noise (bold markers, headings, bullets, numbering) and
    /// turn literal `\n` sequences into real newlines.
    fn clean_summary(raw: &str) -> Result<String, ToolError> {
        let mut text = raw.replace("**", "").replace('*', "");
        for pattern in [r"(?m)^#+\s*", r"(?m)^-\s*", r"(?m)^\d+\.\s*"] {
            let re = Regex::new(pattern)
                .map_err(|e| ToolError::invalid(format!("internal pattern error: {e}")))?;
            text = re.replace_all(&text, "").into_owned();
        }
        Ok(text.replace("\\n", "\n").trim().to_string())
    }
}

#[async_trait]
impl Tool for ReportProgressTool {
    fn name(&self) -> &str {
        "report_progress"
    }

    fn description(&self) -> &str {
        "Report how far along the current work is, as a percentage plus a short plain-text summary."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "progress": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "Completion percentage"
                },
                "summary": {
                    "type": "string",
                    "description": "Short plain-text description of the state of the work"
                }
            },
            "required": ["progress", "summary"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value) -> Result<String, ToolError> {
        let raw = match input.get("progress") {
            None | Some(Value::Null) => return Err(ToolError::invalid("progress is required")),
            Some(value) => value,
        };
        let number = Self::parse_progress(raw)?;
        if !(0.0..=100.0).contains(&number) {
            return Err(ToolError::invalid(format!(
                "Progress must be a number between 0 and 100, got: {number}"
            )));
        }
        let progress = number.round() as u32;

        let summary = input
            .get("summary")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid("summary is required and must be a string"))?;
        let cleaned = Self::clean_summary(summary)?;
        if cleaned.is_empty() {
            return Err(ToolError::invalid("summary is required and cannot be empty"));
        }

        (self.on_progress)(progress, &cleaned);
        Ok(format!(
            "Successfully reported progress: {progress}%. Progress has been recorded."
        ))
    }
}
