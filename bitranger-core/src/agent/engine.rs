//! The reasoning engine seam.

use super::tools::ToolRequest;
use crate::error::EngineResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which loop variant is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Curate,
    Query,
}

/// The task a run is working on, with its optional hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Curate {
        content: String,
        domain_hint: Option<String>,
        topic_hint: Option<String>,
    },
    Query {
        query: String,
        domain_filter: Option<String>,
    },
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Curate { .. } => TaskKind::Curate,
            Task::Query { .. } => TaskKind::Query,
        }
    }
}

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRole {
    /// A tool result fed back to the engine.
    Feedback,
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryMessage {
    pub fn feedback(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Feedback,
            content: content.into(),
        }
    }
}

/// Everything the engine sees on one turn.
#[derive(Debug, Clone, Copy)]
pub struct EngineTurn<'a> {
    pub task: &'a Task,
    /// Tree rendering taken once at the start of the run.
    pub tree_structure: &'a str,
    pub history: &'a [HistoryMessage],
    /// Zero-based turn number.
    pub iteration: usize,
}

/// Produces exactly one tool request per turn.
///
/// Calls may take arbitrarily long; an error ends the run as failed.
#[async_trait]
pub trait ReasoningEngine: Send {
    async fn next_request(&mut self, turn: EngineTurn<'_>) -> EngineResult<ToolRequest>;
}

#[async_trait]
impl<E: ReasoningEngine + ?Sized> ReasoningEngine for Box<E> {
    async fn next_request(&mut self, turn: EngineTurn<'_>) -> EngineResult<ToolRequest> {
        (**self).next_request(turn).await
    }
}
