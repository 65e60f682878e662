//! Tool dispatch with per-call error conversion.
//!
//! A failed call becomes an error-flagged outcome fed back to the model; it
//! never aborts the surrounding run. Unknown names get the same treatment,
//! so a hallucinated tool costs one bad outcome rather than the whole turn.

use futures_util::future::join_all;
use tracing::debug;

use super::{ToolCall, ToolOutcome, ToolRegistry};

/// Execute one call against the registry.
pub async fn execute_call(registry: &ToolRegistry, call: &ToolCall) -> ToolOutcome {
    let Some(tool) = registry.get(&call.name) else {
        return ToolOutcome::error(call, format!("Error: Tool \"{}\" not found", call.name));
    };

    if let Err(e) = tool.validate_input(&call.input) {
        return ToolOutcome::error(call, e.to_string());
    }

    debug!(tool = %call.name, call_id = %call.id, "executing tool");
    match tool.execute(call.input.clone()).await {
        Ok(content) => ToolOutcome::ok(call, content),
        Err(e) => ToolOutcome::error(call, format!("Error executing tool: {e}")),
    }
}

/// Execute a batch concurrently. Outcomes come back in call order.
pub async fn execute_all(registry: &ToolRegistry, calls: &[ToolCall]) -> Vec<ToolOutcome> {
    join_all(calls.iter().map(|call| execute_call(registry, call))).await
}

/// Execute a batch one at a time, for tools with ordering side effects.
pub async fn execute_all_sequential(
    registry: &ToolRegistry,
    calls: &[ToolCall],
) -> Vec<ToolOutcome> {
    let mut outcomes = Vec::with_capacity(calls.len());
    for call in calls {
        outcomes.push(execute_call(registry, call).await);
    }
    outcomes
}
