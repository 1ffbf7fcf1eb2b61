//! Core library for bitranger.
//!
//! bitranger keeps a project's knowledge in a namespaced tree of markdown
//! documents (`domain/topic[/subtopic]/context.md`) and lets a reasoning
//! engine curate and query it through a small, closed tool protocol.
//!
//! # Architecture
//!
//! - **tree**: the on-disk namespace store, stats and rendering
//! - **relations**: the `## Relations` section and the graph it induces
//! - **agent**: tool requests, the dispatcher, the engine trait and the
//!   bounded run loop
//! - **rules**: rules files for coding agents
//!
//! # Example
//!
//! ```ignore
//! use bitranger_core::{AgentRunner, ClaudeEngine, ContextTreeStore};
//!
//! let store = ContextTreeStore::new(".");
//! let mut runner = AgentRunner::new(store, ClaudeEngine::from_env()?);
//! let result = runner.query("how do we handle errors?", None).await;
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod relations;
pub mod rules;
pub mod testing;
pub mod tree;

pub use agent::{
    AgentRunner, ClaudeEngine, CurateResult, EngineConfig, QueryResult, ReasoningEngine,
    ToolExecutor, ToolRequest, ToolResult,
};
pub use config::{ConfigUpdate, InitOptions, ProjectConfig};
pub use error::{EngineError, RelationError, StoreError};
pub use relations::RelationGraph;
pub use tree::{ContextTreeStore, NamespacePath, TreeStats};
