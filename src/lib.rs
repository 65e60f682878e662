//! Codewright — a tool-calling conversation runtime for LLM coding agents.
//!
//! The model proposes, tools execute, and results feed the next turn until
//! the model stops asking or the turn budget runs out. File edits stage in a
//! virtual codebase and only reach disk through an explicit, containment-
//! checked apply step. Sub-agents fan work out over the same backend,
//! in parallel or along a validated dependency graph.
//!
//! ## Architecture
//!
//! - `agent`: the conversation loop, message log, metrics, sub-agents
//! - `backend`: session contract, default HTTP client, payload parser
//! - `tools`: capability contract, registry, executor, six built-in tools
//! - `codebase`: virtual codebase and the disk workspace boundary
//! - `intent`: order/question classification driving auto-apply
//! - `mcp`: external tool providers attached at runtime
//! - `config` / `telemetry`: YAML config and opt-in tracing setup

pub mod agent;
pub mod backend;
pub mod codebase;
pub mod config;
pub mod intent;
pub mod mcp;
pub mod telemetry;
pub mod tools;

pub use agent::{
    combine_results, Agent, AgentResult, CoordinationError, Message, SessionSnapshot,
    SessionStore, SubAgentManager, Task, TurnRecord,
};
pub use backend::{Backend, HttpBackend};
pub use codebase::workspace::{Workspace, WorkspaceError};
pub use codebase::{ChangeKind, ChangeProposal, VirtualCodebase};
pub use config::RuntimeConfig;
pub use mcp::{ProviderTool, ProviderToolSpec, ToolProvider};
pub use tools::builtin::Builtins;
pub use tools::{Tool, ToolCall, ToolError, ToolOutcome, ToolRegistry};
