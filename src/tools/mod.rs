//! Tool capability contract.
//!
//! ## Architecture
//!
//! - `Tool`: the closed contract every capability implements (identity,
//!   schema, async execute)
//! - `registry`: name-to-implementation table, resolved once at construction
//! - `executor`: dispatch with per-call error conversion
//! - `builtin`: the six built-in coding tools and their wiring
//!
//! A tool failure is an outcome, not a crash: executors convert every error
//! into an error-flagged result that flows back to the model.

pub mod builtin;
pub mod executor;
pub mod registry;

pub use registry::{DuplicateTool, ToolRegistry};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors surfaced by tool validation and execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Unexpected field: {0}")]
    UnexpectedField(String),
    #[error("{0}")]
    Invalid(String),
}

impl ToolError {
    /// Shorthand for the free-text variant.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// One tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// The outcome of one tool invocation, fed back to the model as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub tool_call_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn ok(call: &ToolCall, content: String) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content,
            is_error: false,
        }
    }

    pub fn error(call: &ToolCall, content: String) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content,
            is_error: true,
        }
    }
}

/// The capability contract.
///
/// Identity and schema are fixed for the lifetime of the tool; `execute`
/// returns the text handed back to the model. Expected failure conditions
/// (file not found, nothing to apply) are `Ok` text; contract violations in
/// the input are `Err`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name the model calls this tool by.
    fn name(&self) -> &str;

    /// What the tool does, in model-facing prose.
    fn description(&self) -> &str;

    /// JSON schema for the input object.
    fn input_schema(&self) -> Value;

    async fn execute(&self, input: Value) -> Result<String, ToolError>;

    /// Check the input against the schema's `required` list and, when the
    /// schema closes the object, reject unknown fields. Runs before
    /// `execute`; tools still validate field types themselves.
    fn validate_input(&self, input: &Value) -> Result<(), ToolError> {
        let schema = self.input_schema();
        let Some(object) = input.as_object() else {
            return Err(ToolError::invalid("input must be a JSON object"));
        };

        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for field in required {
                if let Some(name) = field.as_str() {
                    if !object.contains_key(name) {
                        return Err(ToolError::MissingField(name.to_string()));
                    }
                }
            }
        }

        if schema.get("additionalProperties").and_then(Value::as_bool) == Some(false) {
            let known = schema.get("properties").and_then(Value::as_object);
            for key in object.keys() {
                let recognized = known.map(|p| p.contains_key(key)).unwrap_or(false);
                if !recognized {
                    return Err(ToolError::UnexpectedField(key.clone()));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedSchemaTool;

    #[async_trait]
    impl Tool for FixedSchemaTool {
        fn name(&self) -> &str {
            "fixed"
        }

        fn description(&self) -> &str {
            "test fixture"
        }

        fn input_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "limit": { "type": "number" }
                },
                "required": ["path"],
                "additionalProperties": false
            })
        }

        async fn execute(&self, _input: Value) -> Result<String, ToolError> {
            Ok("done".to_string())
        }
    }

    struct OpenSchemaTool;

    #[async_trait]
    impl Tool for OpenSchemaTool {
        fn name(&self) -> &str {
            "open"
        }

        fn description(&self) -> &str {
            "test fixture"
        }

        fn input_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "action": { "type": "string" } },
                "required": ["action"],
                "additionalProperties": true
            })
        }

        async fn execute(&self, _input: Value) -> Result<String, ToolError> {
            Ok("done".to_string())
        }
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let err = FixedSchemaTool.validate_input(&json!({ "limit": 3 }));
        assert_eq!(
            err.unwrap_err().to_string(),
            "Missing required field: path"
        );
    }

    #[test]
    fn unknown_field_is_rejected_when_schema_is_closed() {
        let err = FixedSchemaTool.validate_input(&json!({ "path": "a", "bogus": 1 }));
        assert_eq!(err.unwrap_err().to_string(), "Unexpected field: bogus");
    }

    #[test]
    fn known_fields_pass() {
        FixedSchemaTool
            .validate_input(&json!({ "path": "a", "limit": 2 }))
            .unwrap();
    }

    #[test]
    fn open_schema_accepts_extra_fields() {
        OpenSchemaTool
            .validate_input(&json!({ "action": "list", "anything": true }))
            .unwrap();
    }

    #[test]
    fn non_object_input_is_rejected() {
        assert!(FixedSchemaTool
            .validate_input(&json!("just a string"))
            .is_err());
        assert!(FixedSchemaTool.validate_input(&json!(42)).is_err());
    }

    #[test]
    fn outcome_constructors_carry_call_identity() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "fixed".to_string(),
            input: json!({}),
        };
        let ok = ToolOutcome::ok(&call, "fine".to_string());
        assert_eq!(ok.tool_call_id, "call_1");
        assert!(!ok.is_error);

        let err = ToolOutcome::error(&call, "broke".to_string());
        assert_eq!(err.name, "fixed");
        assert!(err.is_error);
    }
}
