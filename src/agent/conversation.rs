//! The conversation loop.
//!
//! One run is a bounded loop of backend round-trips. Each turn posts a
//! prompt, parses the reply, dispatches any requested tool calls, and feeds
//! their outcomes back as the next prompt. The loop exits on a turn with no
//! tool calls (final answer), on the turn budget (soft cutoff, last text
//! wins), or on a backend/parse failure (recorded on the result, never a
//! panic). Tool failures do not exit: they flow back to the model as
//! error-flagged outcomes.

use std::time::Instant;

use tracing::{debug, warn};

use crate::backend::{parse_assistant_payload, Backend, PostOptions};
use crate::config::RuntimeConfig;
use crate::tools::{executor, ToolCall, ToolOutcome, ToolRegistry};

use super::messages::MessageLog;
use super::metrics::{epoch_ms, MetricsTracker};
use super::types::{AgentResult, TurnRecord};

/// Everything one run borrows from its owning agent.
pub(crate) struct LoopContext<'a> {
    pub backend: &'a dyn Backend,
    pub registry: &'a ToolRegistry,
    pub log: &'a mut MessageLog,
    pub metrics: &'a mut MetricsTracker,
    pub session: &'a mut Option<String>,
    pub config: &'a RuntimeConfig,
}

pub(crate) async fn run(mut ctx: LoopContext<'_>, prompt: &str) -> AgentResult {
    if ctx.session.is_none() {
        *ctx.session = ctx.backend.create_session().await;
    }
    let Some(session_id) = ctx.session.clone() else {
        ctx.metrics.record_error();
        warn!("no backend session available");
        return finish(
            ctx,
            Vec::new(),
            Vec::new(),
            Some("backend did not provide a session".to_string()),
            false,
        );
    };

    ctx.log.add_user(prompt);

    let mut turns: Vec<TurnRecord> = Vec::new();
    let mut all_calls: Vec<ToolCall> = Vec::new();
    let mut outgoing = prompt.to_string();
    let max_turns = ctx.config.max_turns.max(1);

    for turn_number in 1..=max_turns {
        let options = PostOptions {
            model: ctx.config.model.clone(),
        };
        debug!(turn = turn_number, session_id = %session_id, "posting turn");

        let started = Instant::now();
        let reply = ctx
            .backend
            .post_message(&session_id, &outgoing, &options)
            .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let Some(reply) = reply else {
            ctx.metrics.record_error();
            warn!(turn = turn_number, "backend returned no reply");
            return finish(
                ctx,
                turns,
                all_calls,
                Some(format!("backend returned no reply on turn {turn_number}")),
                false,
            );
        };

        let (input_tokens, output_tokens) = reply
            .usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or((0, 0));
        ctx.metrics
            .record_api_call(input_tokens, output_tokens, latency_ms);

        let parsed = match parse_assistant_payload(&reply.text()) {
            Ok(parsed) => parsed,
            Err(e) => {
                ctx.metrics.record_error();
                warn!(turn = turn_number, "unusable reply: {e}");
                return finish(
                    ctx,
                    turns,
                    all_calls,
                    Some(format!("turn {turn_number} produced an unusable reply: {e}")),
                    false,
                );
            }
        };

        let reasoning = if ctx.config.include_reasoning {
            parsed.reasoning.clone().or_else(|| reply.reasoning())
        } else {
            None
        };

        ctx.log.add_assistant(&parsed.text);

        if parsed.tool_calls.is_empty() {
            turns.push(TurnRecord {
                turn_number,
                assistant_message: parsed.text.clone(),
                tool_calls: Vec::new(),
                tool_results: Vec::new(),
                reasoning,
                timestamp_ms: epoch_ms(),
            });
            debug!(turn = turn_number, "final answer");
            return finish_with(ctx, turns, all_calls, parsed.text, None, false);
        }

        let outcomes = executor::execute_all(ctx.registry, &parsed.tool_calls).await;
        for _ in &outcomes {
            ctx.metrics.record_tool_call();
        }
        ctx.log.add_tool_results(&outcomes);

        all_calls.extend(parsed.tool_calls.iter().cloned());
        outgoing = render_tool_results(&outcomes);
        turns.push(TurnRecord {
            turn_number,
            assistant_message: parsed.text,
            tool_calls: parsed.tool_calls,
            tool_results: outcomes,
            reasoning,
            timestamp_ms: epoch_ms(),
        });
    }

    warn!(max_turns, "turn budget exhausted");
    finish(ctx, turns, all_calls, None, true)
}

/// Follow-up prompt carrying a turn's outcomes back into the session.
fn render_tool_results(outcomes: &[ToolOutcome]) -> String {
    let mut out = String::from("Tool results:\n");
    for outcome in outcomes {
        let status = if outcome.is_error { "error" } else { "ok" };
        out.push_str(&format!(
            "[{}] {} ({status}):\n{}\n",
            outcome.tool_call_id, outcome.name, outcome.content
        ));
    }
    out
}

fn finish(
    ctx: LoopContext<'_>,
    turns: Vec<TurnRecord>,
    all_calls: Vec<ToolCall>,
    error: Option<String>,
    truncated: bool,
) -> AgentResult {
    let final_response = last_text(&turns);
    finish_with(ctx, turns, all_calls, final_response, error, truncated)
}

fn finish_with(
    ctx: LoopContext<'_>,
    turns: Vec<TurnRecord>,
    all_calls: Vec<ToolCall>,
    final_response: String,
    error: Option<String>,
    truncated: bool,
) -> AgentResult {
    AgentResult {
        final_response,
        turns,
        tool_calls: all_calls,
        messages: ctx.log.messages(),
        metrics: ctx.metrics.snapshot(),
        error,
        truncated,
    }
}

/// Most recent non-empty assistant text, or the stock fallback.
fn last_text(turns: &[TurnRecord]) -> String {
    turns
        .iter()
        .rev()
        .find(|t| !t.assistant_message.is_empty())
        .map(|t| t.assistant_message.clone())
        .unwrap_or_else(|| "No response".to_string())
}
