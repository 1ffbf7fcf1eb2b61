use anyhow::Result;
use bitranger_core::rules::{write_workflow_rules, WorkflowAgent};
use bitranger_core::{ContextTreeStore, InitOptions};
use clap::{Args, ValueEnum};
use std::path::Path;

#[derive(Args)]
pub struct InitArgs {
    /// Project name (default: the directory name)
    #[arg(long)]
    pub project_name: Option<String>,

    /// Comma-separated domains to create
    #[arg(long, value_delimiter = ',')]
    pub domains: Option<Vec<String>>,

    /// Install the bitranger workflow rules for an agent
    #[arg(long, value_enum)]
    pub agent: Option<AgentChoice>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AgentChoice {
    Cursor,
    Claude,
}

impl From<AgentChoice> for WorkflowAgent {
    fn from(choice: AgentChoice) -> Self {
        match choice {
            AgentChoice::Cursor => WorkflowAgent::Cursor,
            AgentChoice::Claude => WorkflowAgent::Claude,
        }
    }
}

pub async fn run(root: &Path, args: InitArgs) -> Result<()> {
    let store = ContextTreeStore::new(root);
    if store.is_initialized().await {
        anyhow::bail!("bitranger is already initialized in this repository");
    }

    let mut options = InitOptions::new();
    if let Some(name) = args.project_name {
        options = options.with_project_name(name);
    }
    if let Some(domains) = args.domains {
        let domains: Vec<String> = domains
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        options = options.with_domains(domains);
    }

    let config = store.initialize(options).await?;

    println!("Initialized bitranger for {}", config.project_name);
    println!("  Config:       {}", store.config_path().display());
    println!("  Context tree: {}", store.tree_root().display());
    println!("  Domains:      {}", config.context_tree.default_domains.join(", "));

    if let Some(agent) = args.agent {
        let path = write_workflow_rules(root, agent.into()).await?;
        println!("  Workflow:     {}", path.display());
    }

    println!();
    println!("Next steps:");
    println!("  bitranger curate \"<something worth remembering>\"");
    println!("  bitranger query \"<question>\"");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_reinit_fails() {
        let dir = TempDir::new().unwrap();
        let args = || InitArgs {
            project_name: Some("demo".to_string()),
            domains: Some(vec!["testing".to_string(), " ".to_string()]),
            agent: Some(AgentChoice::Cursor),
        };

        run(dir.path(), args()).await.unwrap();
        let store = ContextTreeStore::new(dir.path());
        assert_eq!(store.list_domains().await.unwrap(), vec!["testing"]);
        assert!(dir.path().join(".cursor/rules/bitranger-workflow.mdc").exists());

        assert!(run(dir.path(), args()).await.is_err());
    }
}
