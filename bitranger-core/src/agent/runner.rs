//! The bounded request/execute/feedback loop.

use super::engine::{EngineTurn, HistoryMessage, ReasoningEngine, Task};
use super::executor::{ToolExecutor, ToolResult};
use super::tools::{RetrievedContext, ToolRequest, WriteAction};
use crate::tree::{normalize_filename, ContextTreeStore};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Default iteration cap for one run.
pub const MAX_ITERATIONS: usize = 20;

/// A document written during a curation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenFile {
    pub domain: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub filename: String,
    pub action: WriteAction,
}

/// Outcome of a curation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurateResult {
    pub success: bool,
    pub iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Summary from the engine's `done`, if it gave one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub tool_calls: Vec<ToolResult>,
    pub written_files: Vec<WrittenFile>,
}

/// Outcome of a query run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub success: bool,
    pub results: Vec<RetrievedContext>,
    pub summary: String,
    pub iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tool_calls: Vec<ToolResult>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The engine sent `done` on this (1-based) iteration.
    Completed {
        iterations: usize,
        results: Vec<RetrievedContext>,
        summary: Option<String>,
    },
    /// The cap was reached without `done`.
    Exhausted { iterations: usize },
    /// The engine (or the initial tree rendering) failed.
    Failed { error: String },
}

/// Everything a run produced, whatever its outcome.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub tool_calls: Vec<ToolResult>,
    pub written_files: Vec<WrittenFile>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { .. })
    }

    /// `i + 1` on completion, the cap on exhaustion, tool-call count on failure.
    pub fn iterations(&self) -> usize {
        match &self.outcome {
            RunOutcome::Completed { iterations, .. } | RunOutcome::Exhausted { iterations } => {
                *iterations
            }
            RunOutcome::Failed { .. } => self.tool_calls.len(),
        }
    }

    pub fn error(&self) -> Option<String> {
        match &self.outcome {
            RunOutcome::Completed { .. } => None,
            RunOutcome::Exhausted { iterations } => Some(format!(
                "Maximum iterations ({iterations}) reached without completion"
            )),
            RunOutcome::Failed { error } => Some(error.clone()),
        }
    }
}

/// Drives a [`ReasoningEngine`] against the context tree.
pub struct AgentRunner<E: ReasoningEngine> {
    executor: ToolExecutor,
    engine: E,
    max_iterations: usize,
}

impl<E: ReasoningEngine> AgentRunner<E> {
    pub fn new(store: ContextTreeStore, engine: E) -> Self {
        Self {
            executor: ToolExecutor::new(store),
            engine,
            max_iterations: MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn store(&self) -> &ContextTreeStore {
        self.executor.store()
    }

    /// Store `content` in the tree, guided by optional hints.
    pub async fn curate(
        &mut self,
        content: &str,
        domain_hint: Option<&str>,
        topic_hint: Option<&str>,
    ) -> CurateResult {
        let task = Task::Curate {
            content: content.to_string(),
            domain_hint: domain_hint.map(str::to_string),
            topic_hint: topic_hint.map(str::to_string),
        };
        let report = self.run(&task).await;

        let summary = match &report.outcome {
            RunOutcome::Completed { summary, .. } => summary.clone(),
            _ => None,
        };
        CurateResult {
            success: report.success(),
            iterations: report.iterations(),
            error: report.error(),
            summary,
            tool_calls: report.tool_calls,
            written_files: report.written_files,
        }
    }

    /// Answer `query` from the tree, optionally restricted to one domain.
    pub async fn query(&mut self, query: &str, domain_filter: Option<&str>) -> QueryResult {
        let task = Task::Query {
            query: query.to_string(),
            domain_filter: domain_filter.map(str::to_string),
        };
        let report = self.run(&task).await;

        let (results, summary) = match &report.outcome {
            RunOutcome::Completed {
                results, summary, ..
            } => (results.clone(), summary.clone().unwrap_or_default()),
            _ => (Vec::new(), String::new()),
        };
        QueryResult {
            success: report.success(),
            results,
            summary,
            iterations: report.iterations(),
            error: report.error(),
            tool_calls: report.tool_calls,
        }
    }

    /// Run the loop for `task` until `done`, the cap, or an engine error.
    pub async fn run(&mut self, task: &Task) -> RunReport {
        let kind = task.kind();
        let mut history: Vec<HistoryMessage> = Vec::new();
        let mut tool_calls: Vec<ToolResult> = Vec::new();
        let mut written_files: Vec<WrittenFile> = Vec::new();

        let tree_structure = match self.executor.store().get_tree_structure().await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "Failed to render context tree");
                return RunReport {
                    outcome: RunOutcome::Failed {
                        error: e.to_string(),
                    },
                    tool_calls,
                    written_files,
                };
            }
        };

        info!(kind = ?kind, max_iterations = self.max_iterations, "Starting agent run");

        for iteration in 0..self.max_iterations {
            let turn = EngineTurn {
                task,
                tree_structure: &tree_structure,
                history: &history,
                iteration,
            };
            debug!(iteration = iteration + 1, "Calling reasoning engine");

            let request = match self.engine.next_request(turn).await {
                Ok(request) => request,
                Err(e) => {
                    warn!(iteration = iteration + 1, error = %e, "Reasoning engine failed");
                    return RunReport {
                        outcome: RunOutcome::Failed {
                            error: e.to_string(),
                        },
                        tool_calls,
                        written_files,
                    };
                }
            };
            debug!(tool = request.name(), "Engine requested tool");

            if let ToolRequest::Done { results, summary } = request {
                info!(iterations = iteration + 1, "Agent signaled completion");
                return RunReport {
                    outcome: RunOutcome::Completed {
                        iterations: iteration + 1,
                        results,
                        summary,
                    },
                    tool_calls,
                    written_files,
                };
            }

            let result = if request.allowed_in(kind) {
                self.executor.execute(&request).await
            } else {
                ToolResult::rejected(
                    &request,
                    format!("{} is not available for this task", request.name()),
                )
            };
            debug!(
                output = %result.output.chars().take(100).collect::<String>(),
                "Tool result"
            );

            if !result.is_error() {
                if let Some(written) = written_file(&request) {
                    written_files.push(written);
                }
            }

            history.push(HistoryMessage::feedback(result.to_feedback()));
            tool_calls.push(result);
        }

        warn!(max_iterations = self.max_iterations, "Agent run exhausted its iterations");
        RunReport {
            outcome: RunOutcome::Exhausted {
                iterations: self.max_iterations,
            },
            tool_calls,
            written_files,
        }
    }
}

fn written_file(request: &ToolRequest) -> Option<WrittenFile> {
    match request {
        ToolRequest::WriteMemory {
            action,
            domain,
            topic,
            subtopic,
            filename,
            ..
        } => Some(WrittenFile {
            domain: domain.clone(),
            topic: topic.clone(),
            subtopic: subtopic.clone(),
            filename: normalize_filename(filename).unwrap_or_else(|_| filename.clone()),
            action: *action,
        }),
        _ => None,
    }
}
