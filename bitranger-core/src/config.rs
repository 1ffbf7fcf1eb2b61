//! Project configuration stored in `.bitranger/config.json`.

use crate::error::StoreResult;
use crate::tree::fsutil::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Current config format version.
pub const CONFIG_VERSION: &str = "1.0.0";

/// Domains created by `bitranger init` when none are given.
pub const DEFAULT_DOMAINS: &[&str] = &[
    "code_style",
    "testing",
    "structure",
    "design",
    "compliance",
    "bug_fixes",
];

/// The project-wide config artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Config format version.
    pub version: String,

    /// Human-readable project name.
    pub project_name: String,

    /// Whether the context tree is meant to be committed.
    pub git_tracking: bool,

    /// Coding-agent integrations.
    pub agents: AgentIntegrations,

    /// Context tree settings.
    pub context_tree: ContextTreeSettings,
}

/// Per-agent integration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentIntegrations {
    pub claude_code: AgentIntegration,
    pub cursor: AgentIntegration,
}

/// A single agent integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentIntegration {
    pub enabled: bool,
    /// Rules file path, relative to the project root.
    pub rules_file: String,
}

/// Context tree settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextTreeSettings {
    pub auto_organize: bool,
    pub default_domains: Vec<String>,
}

impl Default for AgentIntegrations {
    fn default() -> Self {
        Self {
            claude_code: AgentIntegration {
                enabled: true,
                rules_file: ".claude-code-rules.md".to_string(),
            },
            cursor: AgentIntegration {
                enabled: true,
                rules_file: ".cursorrules".to_string(),
            },
        }
    }
}

/// Options for initializing a project.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Project name (defaults to the project directory name).
    pub project_name: Option<String>,

    /// Whether the tree is tracked in git.
    pub git_tracking: bool,

    /// Domains to create up front (defaults to [`DEFAULT_DOMAINS`]).
    pub default_domains: Option<Vec<String>>,
}

impl InitOptions {
    /// Create options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project name.
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    /// Set the default domains.
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    /// Enable git tracking.
    pub fn with_git_tracking(mut self, enabled: bool) -> Self {
        self.git_tracking = enabled;
        self
    }

    /// Build the config for a project rooted at `project_root`.
    pub fn into_config(self, project_root: &Path) -> ProjectConfig {
        let project_name = self.project_name.unwrap_or_else(|| {
            project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "project".to_string())
        });
        let default_domains = self
            .default_domains
            .unwrap_or_else(|| DEFAULT_DOMAINS.iter().map(|d| d.to_string()).collect());

        ProjectConfig {
            version: CONFIG_VERSION.to_string(),
            project_name,
            git_tracking: self.git_tracking,
            agents: AgentIntegrations::default(),
            context_tree: ContextTreeSettings {
                auto_organize: true,
                default_domains,
            },
        }
    }
}

/// A partial update; `None` fields are left untouched.
///
/// Merging is shallow: a provided `agents` or `context_tree` replaces the
/// whole nested object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub project_name: Option<String>,
    pub git_tracking: Option<bool>,
    pub agents: Option<AgentIntegrations>,
    pub context_tree: Option<ContextTreeSettings>,
}

impl ProjectConfig {
    /// Apply a partial update.
    pub fn merge(&mut self, update: ConfigUpdate) {
        if let Some(name) = update.project_name {
            self.project_name = name;
        }
        if let Some(git) = update.git_tracking {
            self.git_tracking = git;
        }
        if let Some(agents) = update.agents {
            self.agents = agents;
        }
        if let Some(tree) = update.context_tree {
            self.context_tree = tree;
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path.as_ref(), content.as_bytes()).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> StoreResult<Self> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}
