//! Reasoning engine backed by Claude's Messages API.
//!
//! Every turn is one non-streaming request: a system prompt for the task
//! kind, a single user message rendering the task, the tree snapshot and
//! the feedback history, and the tool menu with `tool_choice = any` so the
//! model must answer with a tool call.

use super::engine::{EngineTurn, ReasoningEngine, Task, TaskKind};
use super::tools::{ContextTools, ToolDefinition, ToolRequest};
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Model used when neither the config nor `BITRANGER_MODEL` names one.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Environment variable overriding the model.
pub const MODEL_ENV: &str = "BITRANGER_MODEL";

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Configuration for the Claude engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The model to use.
    pub model: String,

    /// Maximum tokens per response.
    pub max_tokens: usize,

    /// Temperature for generation.
    pub temperature: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: Some(0.2),
        }
    }
}

impl EngineConfig {
    /// Defaults, with the model taken from `BITRANGER_MODEL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Claude-backed [`ReasoningEngine`].
#[derive(Clone)]
pub struct ClaudeEngine {
    client: reqwest::Client,
    api_key: String,
    config: EngineConfig,
}

impl ClaudeEngine {
    /// Create an engine with an API key.
    pub fn new(api_key: impl Into<String>, config: EngineConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Create an engine from `ANTHROPIC_API_KEY` and `BITRANGER_MODEL`.
    pub fn from_env() -> EngineResult<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| EngineError::NoApiKey)?;
        if api_key.trim().is_empty() {
            return Err(EngineError::NoApiKey);
        }
        Self::new(api_key, EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn build_headers(&self) -> EngineResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| EngineError::Config(format!("Invalid API key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn build_api_request(&self, turn: &EngineTurn<'_>) -> ApiRequest {
        let kind = turn.task.kind();
        ApiRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system: system_prompt(kind).to_string(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: render_turn(turn),
            }],
            temperature: self.config.temperature,
            tools: ContextTools::for_task(kind),
            tool_choice: ApiToolChoice {
                r#type: "any".to_string(),
            },
        }
    }

    async fn send(&self, request: &ApiRequest) -> EngineResult<ApiResponse> {
        let response = self
            .client
            .post(format!("{API_BASE}/messages"))
            .headers(self.build_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Api {
                status,
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ReasoningEngine for ClaudeEngine {
    async fn next_request(&mut self, turn: EngineTurn<'_>) -> EngineResult<ToolRequest> {
        let request = self.build_api_request(&turn);
        let response = self.send(&request).await?;

        debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            "Claude usage"
        );

        let (name, input) = response
            .content
            .into_iter()
            .find_map(|block| match block {
                ApiContent::ToolUse { name, input, .. } => Some((name, input)),
                _ => None,
            })
            .ok_or(EngineError::NoToolRequest)?;

        ToolRequest::from_tool_use(&name, &input)
    }
}

fn system_prompt(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Curate => include_str!("prompts/curate.txt"),
        TaskKind::Query => include_str!("prompts/query.txt"),
    }
}

/// Render the task, tree snapshot and history as one user message.
pub fn render_turn(turn: &EngineTurn<'_>) -> String {
    let mut prompt = String::new();

    match turn.task {
        Task::Curate {
            content,
            domain_hint,
            topic_hint,
        } => {
            prompt.push_str("## Content to curate\n");
            prompt.push_str(content);
            prompt.push('\n');
            if let Some(domain) = domain_hint {
                prompt.push_str(&format!("\nDomain hint: {domain}\n"));
            }
            if let Some(topic) = topic_hint {
                prompt.push_str(&format!("Topic hint: {topic}\n"));
            }
        }
        Task::Query {
            query,
            domain_filter,
        } => {
            prompt.push_str("## Query\n");
            prompt.push_str(query);
            prompt.push('\n');
            if let Some(domain) = domain_filter {
                prompt.push_str(&format!("\nOnly search the {domain} domain.\n"));
            }
        }
    }

    prompt.push_str("\n## Context tree\n```\n");
    prompt.push_str(turn.tree_structure);
    prompt.push_str("\n```\n");

    if !turn.history.is_empty() {
        prompt.push_str("\n## Tool results so far\n");
        for (i, message) in turn.history.iter().enumerate() {
            prompt.push_str(&format!("\n### Step {}\n{}\n", i + 1, message.content));
        }
    }

    prompt
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: usize,
    system: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    tools: Vec<ToolDefinition>,
    tool_choice: ApiToolChoice,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ApiToolChoice {
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    content: Vec<ApiContent>,
    #[serde(default)]
    stop_reason: String,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text {
        #[allow(dead_code)]
        text: String,
    },
    ToolUse {
        #[allow(dead_code)]
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: usize,
    output_tokens: usize,
}
