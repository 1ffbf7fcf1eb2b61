//! Tool dispatch: one request in, one [`ToolResult`] out.
//!
//! Store failures never escape; they come back as `Error: ...` output so the
//! engine can react on its next turn.

use super::tools::{ToolRequest, WriteAction};
use crate::error::{StoreError, StoreResult};
use crate::relations::{add_relations, validate_relation};
use crate::tree::{normalize_filename, ContextTreeStore, NamespacePath};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// Prefix of every failed tool output.
pub const ERROR_PREFIX: &str = "Error: ";

/// Result envelope of one dispatched tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool_name: String,
    /// Canonical JSON of the resolved request fields.
    pub input: String,
    pub output: String,
    #[serde(skip)]
    failed: bool,
}

impl ToolResult {
    fn success(tool_name: &str, input: Value, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            input: input.to_string(),
            output: output.into(),
            failed: false,
        }
    }

    fn failure(tool_name: &str, input: Value, message: impl std::fmt::Display) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            input: input.to_string(),
            output: format!("{ERROR_PREFIX}{message}"),
            failed: true,
        }
    }

    /// A request refused without touching the store.
    pub fn rejected(request: &ToolRequest, reason: impl std::fmt::Display) -> Self {
        Self::failure(request.name(), canonical_input(request), reason)
    }

    pub fn is_error(&self) -> bool {
        self.failed
    }

    /// The history entry fed back to the engine.
    pub fn to_feedback(&self) -> String {
        format!(
            "Tool: {}\nInput: {}\nOutput:\n{}",
            self.tool_name, self.input, self.output
        )
    }
}

/// Resolved fields of a request, with defaults applied. Document content
/// is left out; keys are sorted.
pub fn canonical_input(request: &ToolRequest) -> Value {
    let mut input = match request {
        ToolRequest::ListDomains | ToolRequest::Done { .. } => json!({}),
        ToolRequest::ListTopics { domain } => json!({ "domain": domain }),
        ToolRequest::ListSubtopics { domain, topic } => json!({ "domain": domain, "topic": topic }),
        ToolRequest::ListMemories { domain, topic, .. } => {
            json!({ "domain": domain, "topic": topic })
        }
        ToolRequest::ReadMemory {
            domain,
            topic,
            filename,
            ..
        } => json!({ "domain": domain, "topic": topic, "filename": filename }),
        ToolRequest::ReadFile { path } => json!({ "path": path }),
        ToolRequest::WriteMemory {
            action,
            domain,
            topic,
            filename,
            relations,
            ..
        } => {
            let mut input = json!({
                "action": action,
                "domain": domain,
                "topic": topic,
                "filename": filename,
            });
            if !relations.is_empty() {
                input["relations"] = json!(relations);
            }
            input
        }
    };

    if let Some(subtopic) = request.namespace_path().and_then(|p| p.subtopic) {
        input["subtopic"] = Value::String(subtopic);
    }
    input
}

fn bullet_list(header: String, items: &[String]) -> String {
    if items.is_empty() {
        return format!("{header}\n(none)");
    }
    let bullets: Vec<String> = items.iter().map(|item| format!("- {item}")).collect();
    format!("{header}\n{}", bullets.join("\n"))
}

/// Bridges tool requests to the store.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    store: ContextTreeStore,
}

impl ToolExecutor {
    pub fn new(store: ContextTreeStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ContextTreeStore {
        &self.store
    }

    /// Dispatch one request. Never fails.
    pub async fn execute(&self, request: &ToolRequest) -> ToolResult {
        let tool_name = request.name();
        let input = canonical_input(request);

        match self.dispatch(request).await {
            Ok(output) => {
                debug!(tool = tool_name, input = %input, "Tool succeeded");
                ToolResult::success(tool_name, input, output)
            }
            Err(e) => {
                debug!(tool = tool_name, input = %input, error = %e, "Tool failed");
                ToolResult::failure(tool_name, input, e)
            }
        }
    }

    async fn dispatch(&self, request: &ToolRequest) -> StoreResult<String> {
        match request {
            ToolRequest::ListDomains => {
                let domains = self.store.list_domains().await?;
                Ok(bullet_list("Available domains:".to_string(), &domains))
            }
            ToolRequest::ListTopics { domain } => {
                let topics = self.store.list_topics(domain).await?;
                Ok(bullet_list(format!("Topics in {domain} domain:"), &topics))
            }
            ToolRequest::ListSubtopics { domain, topic } => {
                let subtopics = self.store.list_subtopics(domain, topic).await?;
                Ok(bullet_list(format!("Subtopics in {domain}/{topic}:"), &subtopics))
            }
            ToolRequest::ListMemories { .. } => {
                let path = node_of(request)?;
                let memories = self.store.list_memories(&path).await?;
                Ok(bullet_list(format!("Memories in {path}:"), &memories))
            }
            ToolRequest::ReadMemory { filename, .. } => {
                let path = node_of(request)?;
                self.store.read_memory(&path, filename).await
            }
            ToolRequest::ReadFile { path } => self.store.read_file(path).await,
            ToolRequest::WriteMemory {
                action,
                filename,
                content,
                relations,
                ..
            } => {
                let path = node_of(request)?;
                self.write(&path, *action, filename, content, relations).await
            }
            ToolRequest::Done { .. } => Ok("Done".to_string()),
        }
    }

    async fn write(
        &self,
        path: &NamespacePath,
        action: WriteAction,
        filename: &str,
        content: &str,
        relations: &[String],
    ) -> StoreResult<String> {
        let filename = normalize_filename(filename)?;
        let document = if relations.is_empty() {
            content.to_string()
        } else {
            add_relations(content, relations)
        };
        self.store.write_memory(path, &filename, &document).await?;

        let mut output = format!(
            "Successfully {} memory: {path}/{filename}",
            action.past_tense()
        );
        if !relations.is_empty() {
            let mut resolved = 0;
            for relation in relations {
                if validate_relation(relation, &self.store).await {
                    resolved += 1;
                }
            }
            output.push_str(&format!(
                "\nRelations: {resolved} of {} resolve to existing documents",
                relations.len()
            ));
        }
        Ok(output)
    }
}

fn node_of(request: &ToolRequest) -> StoreResult<NamespacePath> {
    let path = request
        .namespace_path()
        .ok_or_else(|| StoreError::invalid_path(request.name(), "not a node request"))?;
    path.validate()?;
    Ok(path)
}
