//! Subcommand implementations.

pub mod clear;
pub mod curate;
pub mod gen_rules;
pub mod init;
pub mod query;
pub mod status;

use anyhow::{Context, Result};
use bitranger_core::{ClaudeEngine, ContextTreeStore, StoreError};
use std::path::Path;

/// Open the store at `root`, failing if it was never initialized.
pub async fn open_store(root: &Path) -> Result<ContextTreeStore> {
    let store = ContextTreeStore::new(root);
    match store.ensure_initialized().await {
        Ok(()) => Ok(store),
        Err(StoreError::NotInitialized { .. }) => {
            anyhow::bail!("bitranger not initialized in this repository. Run 'bitranger init' first")
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the Claude engine, failing before any work when no key is set.
pub fn engine_from_env() -> Result<ClaudeEngine> {
    ClaudeEngine::from_env().context("Set ANTHROPIC_API_KEY to run the agent")
}

/// `domain/topic[/subtopic]/filename`, the location shown for a document.
pub fn document_location(domain: &str, topic: &str, subtopic: Option<&str>, filename: &str) -> String {
    match subtopic {
        Some(subtopic) => format!("{domain}/{topic}/{subtopic}/{filename}"),
        None => format!("{domain}/{topic}/{filename}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_store_requires_init() {
        let dir = TempDir::new().unwrap();
        let err = open_store(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("bitranger init"));
    }

    #[test]
    fn test_document_location() {
        assert_eq!(document_location("a", "b", None, "context.md"), "a/b/context.md");
        assert_eq!(
            document_location("a", "b", Some("c"), "context.md"),
            "a/b/c/context.md"
        );
    }
}
