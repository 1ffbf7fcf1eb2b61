use super::open_store;
use anyhow::Result;
use bitranger_core::rules::{write_agent_rules, RulesTarget};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct GenRulesArgs {
    /// Which agent's rules file to generate
    #[arg(long, value_enum, default_value_t = AgentTarget::Both)]
    pub agent: AgentTarget,

    /// Write a single file here instead of the configured rules files
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Append to existing rules instead of replacing them
    #[arg(long)]
    pub merge: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentTarget {
    Cursor,
    ClaudeCode,
    Both,
}

impl AgentTarget {
    fn targets(self) -> Vec<RulesTarget> {
        match self {
            AgentTarget::Cursor => vec![RulesTarget::Cursor],
            AgentTarget::ClaudeCode => vec![RulesTarget::ClaudeCode],
            AgentTarget::Both => vec![RulesTarget::Cursor, RulesTarget::ClaudeCode],
        }
    }
}

pub async fn run(root: &Path, args: GenRulesArgs) -> Result<()> {
    let store = open_store(root).await?;
    let sources = store.get_stats().await?.documents;

    println!("Generating agent rules...");
    let written = write_agent_rules(
        &store,
        &args.agent.targets(),
        args.output.as_deref(),
        args.merge,
    )
    .await?;

    for path in written {
        println!("Generated {} ({sources} context sources)", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitranger_core::{ContextTreeStore, InitOptions, NamespacePath};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_claude_code_only() {
        let dir = TempDir::new().unwrap();
        let store = ContextTreeStore::new(dir.path());
        store
            .initialize(InitOptions::new().with_project_name("demo").with_domains(["testing"]))
            .await
            .unwrap();
        store
            .write_memory(&NamespacePath::new("testing", "unit"), "context.md", "No flaky tests.")
            .await
            .unwrap();

        let args = GenRulesArgs {
            agent: AgentTarget::ClaudeCode,
            output: None,
            merge: false,
        };
        run(dir.path(), args).await.unwrap();

        assert!(!dir.path().join(".cursorrules").exists());
        let rules = std::fs::read_to_string(dir.path().join(".claude-code-rules.md")).unwrap();
        assert!(rules.contains("No flaky tests."));
    }
}
