//! The closed set of tools the reasoning engine may request.
//!
//! Each request is one variant of [`ToolRequest`]; the wire form is a JSON
//! object tagged by `tool`. [`ContextTools`] builds the JSON schemas handed
//! to the model.

use crate::error::{EngineError, EngineResult};
use crate::tree::{NamespacePath, CONTEXT_FILENAME};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::engine::TaskKind;

fn default_filename() -> String {
    CONTEXT_FILENAME.to_string()
}

/// Whether a write creates a new document or revises an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    #[default]
    Create,
    Update,
}

impl WriteAction {
    pub fn past_tense(self) -> &'static str {
        match self {
            WriteAction::Create => "created",
            WriteAction::Update => "updated",
        }
    }
}

/// One excerpt returned by a query run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedContext {
    pub domain: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(alias = "relevant_content")]
    pub relevant_content: String,
}

/// A single tool request from the reasoning engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    ListDomains,
    ListTopics {
        domain: String,
    },
    ListSubtopics {
        domain: String,
        topic: String,
    },
    ListMemories {
        domain: String,
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtopic: Option<String>,
    },
    ReadMemory {
        domain: String,
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtopic: Option<String>,
        #[serde(default = "default_filename")]
        filename: String,
    },
    ReadFile {
        path: String,
    },
    WriteMemory {
        #[serde(default)]
        action: WriteAction,
        domain: String,
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtopic: Option<String>,
        #[serde(default = "default_filename")]
        filename: String,
        content: String,
        /// Relation tokens merged into the document's relations section.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        relations: Vec<String>,
    },
    Done {
        /// Query runs: excerpts answering the question.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        results: Vec<RetrievedContext>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
}

/// Wire names of every tool, in menu order.
pub const TOOL_NAMES: &[&str] = &[
    "list_domains",
    "list_topics",
    "list_subtopics",
    "list_memories",
    "read_memory",
    "read_file",
    "write_memory",
    "done",
];

impl ToolRequest {
    /// Wire name of this request's tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::ListDomains => "list_domains",
            ToolRequest::ListTopics { .. } => "list_topics",
            ToolRequest::ListSubtopics { .. } => "list_subtopics",
            ToolRequest::ListMemories { .. } => "list_memories",
            ToolRequest::ReadMemory { .. } => "read_memory",
            ToolRequest::ReadFile { .. } => "read_file",
            ToolRequest::WriteMemory { .. } => "write_memory",
            ToolRequest::Done { .. } => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ToolRequest::Done { .. })
    }

    /// Whether this tool is offered for the given kind of task.
    pub fn allowed_in(&self, kind: TaskKind) -> bool {
        !(kind == TaskKind::Query && matches!(self, ToolRequest::WriteMemory { .. }))
    }

    /// Namespace node addressed by node-level requests.
    pub fn namespace_path(&self) -> Option<NamespacePath> {
        match self {
            ToolRequest::ListMemories {
                domain,
                topic,
                subtopic,
            }
            | ToolRequest::ReadMemory {
                domain,
                topic,
                subtopic,
                ..
            }
            | ToolRequest::WriteMemory {
                domain,
                topic,
                subtopic,
                ..
            } => Some(
                NamespacePath::new(domain.as_str(), topic.as_str())
                    .with_optional_subtopic(subtopic.clone()),
            ),
            _ => None,
        }
    }

    /// Build a request from a model tool call (`name` plus JSON `input`).
    pub fn from_tool_use(name: &str, input: &Value) -> EngineResult<Self> {
        if !TOOL_NAMES.contains(&name) {
            return Err(EngineError::InvalidToolInput {
                tool: name.to_string(),
                reason: "unknown tool".to_string(),
            });
        }

        let mut object = match input {
            Value::Object(map) => map.clone(),
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(EngineError::InvalidToolInput {
                    tool: name.to_string(),
                    reason: format!("expected an object, got {other}"),
                })
            }
        };
        object.insert("tool".to_string(), Value::String(name.to_string()));

        serde_json::from_value(Value::Object(object)).map_err(|e| EngineError::InvalidToolInput {
            tool: name.to_string(),
            reason: e.to_string(),
        })
    }
}

/// A tool definition handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tool definitions for the context tree.
pub struct ContextTools;

impl ContextTools {
    /// The tool menu for a task kind. Query runs never see `write_memory`.
    pub fn for_task(kind: TaskKind) -> Vec<ToolDefinition> {
        let mut tools = vec![
            Self::list_domains(),
            Self::list_topics(),
            Self::list_subtopics(),
            Self::list_memories(),
            Self::read_memory(),
            Self::read_file(),
        ];
        match kind {
            TaskKind::Curate => {
                tools.push(Self::write_memory());
                tools.push(Self::curate_done());
            }
            TaskKind::Query => tools.push(Self::query_done()),
        }
        tools
    }

    fn list_domains() -> ToolDefinition {
        ToolDefinition {
            name: "list_domains".to_string(),
            description: "List every domain (top-level category) in the context tree.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    fn list_topics() -> ToolDefinition {
        ToolDefinition {
            name: "list_topics".to_string(),
            description: "List the topics inside a domain.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": {
                        "type": "string",
                        "description": "Domain name, e.g. 'testing'"
                    }
                },
                "required": ["domain"]
            }),
        }
    }

    fn list_subtopics() -> ToolDefinition {
        ToolDefinition {
            name: "list_subtopics".to_string(),
            description: "List the subtopics inside a topic.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": { "type": "string" },
                    "topic": { "type": "string" }
                },
                "required": ["domain", "topic"]
            }),
        }
    }

    fn list_memories() -> ToolDefinition {
        ToolDefinition {
            name: "list_memories".to_string(),
            description: "List the markdown documents stored at a topic or subtopic.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": { "type": "string" },
                    "topic": { "type": "string" },
                    "subtopic": {
                        "type": "string",
                        "description": "Optional subtopic; omit to list the topic itself"
                    }
                },
                "required": ["domain", "topic"]
            }),
        }
    }

    fn read_memory() -> ToolDefinition {
        ToolDefinition {
            name: "read_memory".to_string(),
            description: "Read one document from the context tree.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": { "type": "string" },
                    "topic": { "type": "string" },
                    "subtopic": { "type": "string" },
                    "filename": {
                        "type": "string",
                        "description": "Document name, defaults to context.md"
                    }
                },
                "required": ["domain", "topic"]
            }),
        }
    }

    fn read_file() -> ToolDefinition {
        ToolDefinition {
            name: "read_file".to_string(),
            description: "Read a project file. The path is relative to the project root and may not leave it.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Relative path, e.g. 'src/main.rs'"
                    }
                },
                "required": ["path"]
            }),
        }
    }

    fn write_memory() -> ToolDefinition {
        ToolDefinition {
            name: "write_memory".to_string(),
            description: "Create or update the document at a topic or subtopic. Prefer updating an existing document over creating a near-duplicate. Relations link this document to other nodes as @domain/topic or @domain/topic/subtopic.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["create", "update"]
                    },
                    "domain": { "type": "string" },
                    "topic": { "type": "string" },
                    "subtopic": { "type": "string" },
                    "filename": {
                        "type": "string",
                        "description": "Defaults to context.md"
                    },
                    "content": {
                        "type": "string",
                        "description": "Full markdown content of the document"
                    },
                    "relations": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Related nodes, e.g. ['@code_style/error-handling']"
                    }
                },
                "required": ["action", "domain", "topic", "content"]
            }),
        }
    }

    fn curate_done() -> ToolDefinition {
        ToolDefinition {
            name: "done".to_string(),
            description: "Signal that the content has been stored.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "summary": {
                        "type": "string",
                        "description": "One or two sentences on what was stored where"
                    }
                },
                "required": []
            }),
        }
    }

    fn query_done() -> ToolDefinition {
        ToolDefinition {
            name: "done".to_string(),
            description: "Return the excerpts that answer the query, most relevant first.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "results": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "domain": { "type": "string" },
                                "topic": { "type": "string" },
                                "subtopic": { "type": "string" },
                                "filename": { "type": "string" },
                                "relevantContent": {
                                    "type": "string",
                                    "description": "The passage that answers the query"
                                }
                            },
                            "required": ["domain", "topic", "relevantContent"]
                        }
                    },
                    "summary": {
                        "type": "string",
                        "description": "Short synthesized answer"
                    }
                },
                "required": ["results", "summary"]
            }),
        }
    }
}
