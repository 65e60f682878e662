//! Sub-agent coordination.
//!
//! Children are independent conversation loops sharing the parent's backend
//! and config. Parallel mode fans tasks out and returns results in input
//! order. Coordinated mode runs a dependency graph: the whole batch is
//! validated (unknown names, duplicates, cycles) before any task starts,
//! then every task gets its own completion signal so dependents block only
//! on their direct predecessors. A task whose run fails still signals
//! completion; its dependents run against whatever state exists.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::config::RuntimeConfig;
use crate::tools::Tool;

use super::context::{share_context, ShareOptions};
use super::metrics::Metrics;
use super::types::{AgentResult, Message};
use super::Agent;

/// One unit of coordinated work.
#[derive(Clone)]
pub struct Task {
    pub name: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Extra tools for the agent running this task (applied on creation).
    pub tools: Vec<Arc<dyn Tool>>,
    /// Names of tasks that must complete before this one starts.
    pub depends_on: Vec<String>,
}

impl Task {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            system_prompt: None,
            tools: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_dependencies(mut self, names: &[&str]) -> Self {
        self.depends_on = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

/// Errors from batch validation and scheduling.
#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    #[error("duplicate task name in batch: {0}")]
    DuplicateTask(String),
    #[error("task \"{task}\" depends on unknown task \"{dependency}\"")]
    UnknownDependency { task: String, dependency: String },
    #[error("dependency cycle detected among tasks: {0}")]
    DependencyCycle(String),
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
}

/// Creates, tracks, and schedules child agents.
pub struct SubAgentManager {
    backend: Arc<dyn Backend>,
    config: RuntimeConfig,
    agents: HashMap<String, Arc<Mutex<Agent>>>,
}

impl SubAgentManager {
    pub(crate) fn new(backend: Arc<dyn Backend>, config: RuntimeConfig) -> Self {
        Self {
            backend,
            config,
            agents: HashMap::new(),
        }
    }

    /// Create a child agent, or return the existing one under that name.
    /// `inherit_from` copies the source's system message plus up to five
    /// recent messages into the child, point-in-time.
    pub fn create_sub_agent(
        &mut self,
        name: &str,
        system_prompt: Option<&str>,
        inherit_from: Option<&[Message]>,
    ) -> Arc<Mutex<Agent>> {
        if let Some(existing) = self.agents.get(name) {
            debug!(name, "sub-agent already exists, reusing");
            return existing.clone();
        }

        let mut agent = Agent::new(self.backend.clone(), self.config.clone());
        if let Some(prompt) = system_prompt {
            agent.set_system_prompt(prompt);
        }
        if let Some(source) = inherit_from {
            share_context(
                source,
                agent.log_mut(),
                &ShareOptions {
                    include_system: true,
                    max_messages: 5,
                    filter_by_role: None,
                },
            );
        }

        let handle = Arc::new(Mutex::new(agent));
        self.agents.insert(name.to_string(), handle.clone());
        debug!(name, "sub-agent created");
        handle
    }

    pub fn get(&self, name: &str) -> Option<Arc<Mutex<Agent>>> {
        self.agents.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.agents.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.agents.clear();
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// The agent for a task, created on first sight with the task's system
    /// prompt and tools.
    fn agent_for_task(&mut self, task: &Task) -> Arc<Mutex<Agent>> {
        let existed = self.agents.contains_key(&task.name);
        let handle = self.create_sub_agent(&task.name, task.system_prompt.as_deref(), None);
        if !existed && !task.tools.is_empty() {
            // Freshly created, so nothing else can hold the lock yet.
            if let Ok(mut agent) = handle.try_lock() {
                for tool in &task.tools {
                    if let Err(e) = agent.register_tool(tool.clone()) {
                        warn!(task = %task.name, "skipping task tool: {e}");
                    }
                }
            }
        }
        handle
    }

    /// Run every task concurrently. Results come back in input order, one
    /// per task, failures included.
    pub async fn execute_parallel(&mut self, tasks: Vec<Task>) -> Vec<(String, AgentResult)> {
        let mut futures = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let handle = self.agent_for_task(task);
            let name = task.name.clone();
            let prompt = task.prompt.clone();
            futures.push(async move {
                let result = {
                    let mut agent = handle.lock().await;
                    agent.query(&prompt).await
                };
                (name, result)
            });
        }
        join_all(futures).await
    }

    /// Run a dependency-ordered batch. Validation (including cycle
    /// detection) happens before any task starts; a bad graph fails the
    /// whole batch up front. Results come back in input order.
    pub async fn coordinate(
        &mut self,
        tasks: Vec<Task>,
    ) -> Result<Vec<(String, AgentResult)>, CoordinationError> {
        validate_batch(&tasks)?;

        let mut senders: HashMap<String, watch::Sender<bool>> = HashMap::new();
        let mut receivers: HashMap<String, watch::Receiver<bool>> = HashMap::new();
        for task in &tasks {
            let (tx, rx) = watch::channel(false);
            senders.insert(task.name.clone(), tx);
            receivers.insert(task.name.clone(), rx);
        }

        let mut handles = Vec::with_capacity(tasks.len());
        let mut names = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let agent = self.agent_for_task(task);
            let name = task.name.clone();
            let prompt = task.prompt.clone();
            let waits: Vec<watch::Receiver<bool>> = task
                .depends_on
                .iter()
                .filter_map(|dep| receivers.get(dep).cloned())
                .collect();
            // Validation guarantees the sender exists exactly once per task.
            let done = senders.remove(&task.name);

            names.push(task.name.clone());
            handles.push(tokio::spawn(async move {
                for mut wait in waits {
                    while !*wait.borrow_and_update() {
                        if wait.changed().await.is_err() {
                            // Sender gone; treat the dependency as finished.
                            break;
                        }
                    }
                }
                debug!(task = %name, "starting task");
                let result = {
                    let mut agent = agent.lock().await;
                    agent.query(&prompt).await
                };
                // Signal completion whether or not the run succeeded, so
                // dependents never hang on a failed predecessor.
                if let Some(done) = done {
                    let _ = done.send(true);
                }
                (name, result)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in names.into_iter().zip(handles) {
            match handle.await {
                Ok(pair) => results.push(pair),
                Err(e) => {
                    warn!(task = %name, "task aborted: {e}");
                    results.push((name, AgentResult::failed("task aborted before completing")));
                }
            }
        }
        Ok(results)
    }

    /// Copy recent context from one child to another (no system message,
    /// at most five messages). Point-in-time, like all sharing.
    pub async fn share_between(&self, from: &str, to: &str) -> Result<(), CoordinationError> {
        let source_handle = self
            .agents
            .get(from)
            .ok_or_else(|| CoordinationError::UnknownAgent(from.to_string()))?;
        let target_handle = self
            .agents
            .get(to)
            .ok_or_else(|| CoordinationError::UnknownAgent(to.to_string()))?;

        let source = { source_handle.lock().await.messages() };
        let mut target = target_handle.lock().await;
        share_context(
            &source,
            target.log_mut(),
            &ShareOptions {
                include_system: false,
                max_messages: 5,
                filter_by_role: None,
            },
        );
        Ok(())
    }
}

/// Fold several named results into one. Sections join under per-agent
/// headers; metrics follow the aggregation rules (counts add, duration is
/// the max, latency is the call-weighted mean).
pub fn combine_results(results: &[(String, AgentResult)]) -> AgentResult {
    let metrics = Metrics::combine(&results.iter().map(|(_, r)| r.metrics).collect::<Vec<_>>());

    let mut sections = Vec::with_capacity(results.len());
    let mut turns = Vec::new();
    let mut tool_calls = Vec::new();
    let mut messages = Vec::new();
    let mut errors = Vec::new();
    let mut truncated = false;

    for (name, result) in results {
        sections.push(format!("## {name}\n{}", result.final_response));
        turns.extend(result.turns.iter().cloned());
        tool_calls.extend(result.tool_calls.iter().cloned());
        messages.extend(result.messages.iter().cloned());
        if let Some(error) = &result.error {
            errors.push(format!("{name}: {error}"));
        }
        truncated |= result.truncated;
    }

    AgentResult {
        final_response: sections.join("\n\n"),
        turns,
        tool_calls,
        messages,
        metrics,
        error: if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        },
        truncated,
    }
}

/// Reject duplicate names, unknown dependencies, and cycles. Kahn's
/// algorithm: anything left with edges after peeling is part of a cycle.
fn validate_batch(tasks: &[Task]) -> Result<(), CoordinationError> {
    let mut names: HashSet<&str> = HashSet::new();
    for task in tasks {
        if !names.insert(task.name.as_str()) {
            return Err(CoordinationError::DuplicateTask(task.name.clone()));
        }
    }
    for task in tasks {
        for dep in &task.depends_on {
            if !names.contains(dep.as_str()) {
                return Err(CoordinationError::UnknownDependency {
                    task: task.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    let mut indegree: HashMap<&str, usize> = tasks
        .iter()
        .map(|t| (t.name.as_str(), t.depends_on.len()))
        .collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        for dep in &task.depends_on {
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(task.name.as_str());
        }
    }

    let mut ready: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut processed = 0;
    while let Some(name) = ready.pop_front() {
        processed += 1;
        if let Some(children) = dependents.get(name) {
            for child in children {
                if let Some(degree) = indegree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(child);
                    }
                }
            }
        }
    }

    if processed != tasks.len() {
        let mut stuck: Vec<&str> = indegree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(name, _)| *name)
            .collect();
        stuck.sort_unstable();
        return Err(CoordinationError::DependencyCycle(stuck.join(", ")));
    }
    Ok(())
}
