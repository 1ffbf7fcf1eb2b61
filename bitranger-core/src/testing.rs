//! Testing utilities.
//!
//! This module provides tools for integration testing:
//! - `ScriptedEngine` for deterministic runs without API calls
//! - `TestHarness` for a throwaway, initialized project root

use crate::agent::{AgentRunner, EngineTurn, ReasoningEngine, Task, ToolRequest};
use crate::config::InitOptions;
use crate::error::{EngineError, EngineResult};
use crate::tree::{ContextTreeStore, NamespacePath, CONTEXT_FILENAME};
use async_trait::async_trait;
use std::collections::VecDeque;
use tempfile::TempDir;

/// One scripted engine reply.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    Request(ToolRequest),
    /// Fail the call with a network error carrying this message.
    Fail(String),
}

/// What the engine was shown on one turn.
#[derive(Debug, Clone)]
pub struct RecordedTurn {
    pub iteration: usize,
    pub task: Task,
    pub tree_structure: String,
    pub history_len: usize,
    pub last_feedback: Option<String>,
}

/// A reasoning engine that replays scripted replies.
///
/// Once the script is used up it repeats the fallback request if one was
/// set, and otherwise fails with `NoToolRequest`.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    steps: VecDeque<ScriptedStep>,
    fallback: Option<ToolRequest>,
    turns: Vec<RecordedTurn>,
}

impl ScriptedEngine {
    /// Reply with `requests` in order.
    pub fn new(requests: Vec<ToolRequest>) -> Self {
        Self {
            steps: requests.into_iter().map(ScriptedStep::Request).collect(),
            ..Default::default()
        }
    }

    /// Reply with `request` forever.
    pub fn repeating(request: ToolRequest) -> Self {
        Self {
            fallback: Some(request),
            ..Default::default()
        }
    }

    /// Fail on the first call.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::default().then_fail(message)
    }

    /// Queue a request after the current script.
    pub fn then(mut self, request: ToolRequest) -> Self {
        self.steps.push_back(ScriptedStep::Request(request));
        self
    }

    /// Queue a failure after the current script.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.steps.push_back(ScriptedStep::Fail(message.into()));
        self
    }

    /// Every turn seen so far.
    pub fn turns(&self) -> &[RecordedTurn] {
        &self.turns
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    async fn next_request(&mut self, turn: EngineTurn<'_>) -> EngineResult<ToolRequest> {
        self.turns.push(RecordedTurn {
            iteration: turn.iteration,
            task: turn.task.clone(),
            tree_structure: turn.tree_structure.to_string(),
            history_len: turn.history.len(),
            last_feedback: turn.history.last().map(|m| m.content.clone()),
        });

        match self.steps.pop_front() {
            Some(ScriptedStep::Request(request)) => Ok(request),
            Some(ScriptedStep::Fail(message)) => Err(EngineError::Network(message)),
            None => self.fallback.clone().ok_or(EngineError::NoToolRequest),
        }
    }
}

/// An initialized project in a temporary directory.
pub struct TestHarness {
    pub store: ContextTreeStore,
    // Dropped last; removes the directory.
    _dir: TempDir,
}

impl TestHarness {
    /// A project initialized with the single domain `testing`.
    pub async fn new() -> Self {
        Self::with_domains(["testing"]).await
    }

    /// A project initialized with the given domains.
    pub async fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = ContextTreeStore::new(dir.path());
        store
            .initialize(InitOptions::new().with_domains(domains))
            .await
            .expect("Failed to initialize test project");
        Self { store, _dir: dir }
    }

    /// A runner over this project's store.
    pub fn runner<E: ReasoningEngine>(&self, engine: E) -> AgentRunner<E> {
        AgentRunner::new(self.store.clone(), engine)
    }

    /// Write `content` as the `context.md` of `path` (`domain/topic[/subtopic]`).
    pub async fn write_context(&self, path: &str, content: &str) {
        let node = parse_node(path);
        self.store
            .write_memory(&node, CONTEXT_FILENAME, content)
            .await
            .expect("Failed to write test document");
    }

    /// The `context.md` of `path`, if it exists.
    pub async fn read_context(&self, path: &str) -> Option<String> {
        self.store
            .read_memory(&parse_node(path), CONTEXT_FILENAME)
            .await
            .ok()
    }
}

fn parse_node(path: &str) -> NamespacePath {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [domain, topic] => NamespacePath::new(*domain, *topic),
        [domain, topic, subtopic] => NamespacePath::new(*domain, *topic).with_subtopic(*subtopic),
        _ => panic!("expected domain/topic[/subtopic], got {path}"),
    }
}

/// A `done` request with no payload.
pub fn done() -> ToolRequest {
    ToolRequest::Done {
        results: Vec::new(),
        summary: None,
    }
}
