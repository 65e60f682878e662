//! Agent — the stateful conversation owner.
//!
//! Wires a backend session, a tool registry, and a message log into one
//! tool-calling loop. Fresh queries reset state, continuations append to it,
//! and sub-agents fan work out over the same backend.
//!
//! ## Architecture
//!
//! - `types`: messages, turn records, run results
//! - `messages`: ordered message log with system-message handling
//! - `conversation`: the bounded request → tools → follow-up loop
//! - `metrics`: per-run token/latency accounting
//! - `context`: point-in-time history sharing between agents
//! - `subagents`: named children, parallel and dependency-ordered batches
//! - `session`: JSON snapshot store for message history and metadata

mod conversation;

pub mod context;
pub mod messages;
pub mod metrics;
pub mod session;
pub mod subagents;
pub mod types;

pub use context::{context_summary, merge_contexts, share_context, ShareOptions};
pub use messages::MessageLog;
pub use metrics::{Metrics, MetricsTracker};
pub use session::{
    SessionError, SessionMetadata, SessionSnapshot, SessionStore, DEFAULT_SESSIONS_DIR,
};
pub use subagents::{combine_results, CoordinationError, SubAgentManager, Task};
pub use types::{AgentResult, Message, MessageContent, ToolResultBlock, TurnRecord};

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::backend::Backend;
use crate::config::RuntimeConfig;
use crate::mcp::{ProviderTool, ToolProvider};
use crate::tools::{DuplicateTool, Tool, ToolRegistry};

/// A tool-calling conversation bound to one backend.
///
/// Tools register before the first run. `query` starts a fresh session and
/// history (the system message survives); `continue_conversation` extends
/// the current one.
pub struct Agent {
    backend: Arc<dyn Backend>,
    config: RuntimeConfig,
    registry: ToolRegistry,
    log: MessageLog,
    metrics: MetricsTracker,
    session: Option<String>,
    system_prompt: Option<String>,
    subagents: SubAgentManager,
    created_at: u64,
    turn_count: usize,
    tool_call_count: usize,
}

impl Agent {
    pub fn new(backend: Arc<dyn Backend>, config: RuntimeConfig) -> Self {
        let subagents = SubAgentManager::new(backend.clone(), config.clone());
        Self {
            backend,
            config,
            registry: ToolRegistry::new(),
            log: MessageLog::new(),
            metrics: MetricsTracker::new(),
            session: None,
            system_prompt: None,
            subagents,
            created_at: metrics::epoch_ms(),
            turn_count: 0,
            tool_call_count: 0,
        }
    }

    /// Make a capability available to the model. Names are unique per agent.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), DuplicateTool> {
        self.registry.register(tool)
    }

    pub fn register_tools(&mut self, tools: Vec<Arc<dyn Tool>>) -> Result<(), DuplicateTool> {
        for tool in tools {
            self.registry.register(tool)?;
        }
        Ok(())
    }

    /// Install or replace the system message. It survives `query` resets.
    pub fn set_system_prompt(&mut self, prompt: &str) {
        self.system_prompt = Some(prompt.to_string());
        self.log.add_system(prompt);
    }

    /// Run a prompt in a fresh session: new backend session, history reduced
    /// to the system message, metrics restarted.
    pub async fn query(&mut self, prompt: &str) -> AgentResult {
        self.session = None;
        self.metrics.reset();
        self.log.retain_system();
        self.run(prompt).await
    }

    /// Run a prompt in the current session, keeping history and metrics.
    pub async fn continue_conversation(&mut self, prompt: &str) -> AgentResult {
        self.run(prompt).await
    }

    async fn run(&mut self, prompt: &str) -> AgentResult {
        let ctx = conversation::LoopContext {
            backend: self.backend.as_ref(),
            registry: &self.registry,
            log: &mut self.log,
            metrics: &mut self.metrics,
            session: &mut self.session,
            config: &self.config,
        };
        let result = conversation::run(ctx, prompt).await;
        self.turn_count += result.turns.len();
        self.tool_call_count += result.tool_calls.len();
        result
    }

    /// Drop session, history, and metrics. The system prompt is re-applied.
    pub fn reset(&mut self) {
        self.session = None;
        self.metrics.reset();
        self.log.reset();
        if let Some(prompt) = &self.system_prompt {
            self.log.add_system(prompt);
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.log.messages()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub(crate) fn log_mut(&mut self) -> &mut MessageLog {
        &mut self.log
    }

    /// Register every tool a provider lists, each proxied back to the
    /// provider on execution. Returns how many were attached.
    pub async fn attach_provider(
        &mut self,
        provider: Arc<dyn ToolProvider>,
    ) -> Result<usize, DuplicateTool> {
        let specs = provider.list_tools().await;
        let count = specs.len();
        for spec in specs {
            self.registry
                .register(Arc::new(ProviderTool::new(provider.clone(), spec)))?;
        }
        Ok(count)
    }

    /// Create (or fetch) a named child. With `inherit_context` the child
    /// starts from this agent's system message and recent history,
    /// point-in-time.
    pub fn create_sub_agent(
        &mut self,
        name: &str,
        system_prompt: Option<&str>,
        inherit_context: bool,
    ) -> Arc<Mutex<Agent>> {
        let inherited = if inherit_context {
            Some(self.log.messages())
        } else {
            None
        };
        self.subagents
            .create_sub_agent(name, system_prompt, inherited.as_deref())
    }

    pub fn sub_agent(&self, name: &str) -> Option<Arc<Mutex<Agent>>> {
        self.subagents.get(name)
    }

    pub fn sub_agent_names(&self) -> Vec<String> {
        self.subagents.names()
    }

    pub fn remove_sub_agent(&mut self, name: &str) -> bool {
        self.subagents.remove(name)
    }

    pub fn clear_sub_agents(&mut self) {
        self.subagents.clear();
    }

    /// Fan tasks out to child agents concurrently. Results keep input order.
    pub async fn execute_parallel(&mut self, tasks: Vec<Task>) -> Vec<(String, AgentResult)> {
        self.subagents.execute_parallel(tasks).await
    }

    /// Run a dependency-ordered batch on child agents. The graph is
    /// validated before anything starts.
    pub async fn coordinate(
        &mut self,
        tasks: Vec<Task>,
    ) -> Result<Vec<(String, AgentResult)>, CoordinationError> {
        self.subagents.coordinate(tasks).await
    }

    /// Copy recent history from one child to another.
    pub async fn share_context(&self, from: &str, to: &str) -> Result<(), CoordinationError> {
        self.subagents.share_between(from, to).await
    }

    /// Snapshot the current session for persistence. None until a run has
    /// opened a backend session.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let session_id = self.session.clone()?;
        Some(SessionSnapshot {
            metadata: SessionMetadata {
                session_id,
                created_at: self.created_at,
                last_updated: metrics::epoch_ms(),
                message_count: self.log.len(),
                turn_count: self.turn_count,
                tool_call_count: self.tool_call_count,
                metrics: self.metrics.snapshot(),
            },
            messages: self.log.messages(),
        })
    }

    /// Adopt a saved history. The backend session is not resumed; the next
    /// run opens a new one against the restored messages.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.session = None;
        self.metrics.reset();
        self.turn_count = snapshot.metadata.turn_count;
        self.tool_call_count = snapshot.metadata.tool_call_count;
        self.created_at = snapshot.metadata.created_at;
        self.log.reset();
        for message in snapshot.messages {
            self.log.push(message);
        }
        if let Some(system) = self.log.system_message() {
            self.system_prompt = Some(system.text());
        }
    }
}
