//! The agent loop between a reasoning engine and the context tree.
//!
//! - [`tools`]: the closed tool request set and the schemas shown to the model
//! - [`executor`]: dispatches one request against the store
//! - [`engine`]: the reasoning engine trait
//! - [`runner`]: the bounded curate and query loops
//! - [`anthropic`]: a Claude-backed engine

pub mod anthropic;
pub mod engine;
pub mod executor;
pub mod runner;
pub mod tools;

pub use anthropic::{ClaudeEngine, EngineConfig, DEFAULT_MODEL};
pub use engine::{EngineTurn, HistoryMessage, HistoryRole, ReasoningEngine, Task, TaskKind};
pub use executor::{ToolExecutor, ToolResult};
pub use runner::{
    AgentRunner, CurateResult, QueryResult, RunOutcome, RunReport, WrittenFile, MAX_ITERATIONS,
};
pub use tools::{ContextTools, RetrievedContext, ToolDefinition, ToolRequest, WriteAction};
