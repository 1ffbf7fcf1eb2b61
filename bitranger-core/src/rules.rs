//! Rules files for coding agents, generated from the context tree.

use crate::error::StoreResult;
use crate::tree::fsutil::write_atomic;
use crate::tree::{ContextTreeStore, NamespacePath};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

const CURSOR_WORKFLOW: &str = include_str!("templates/cursor_workflow.mdc");
const CLAUDE_WORKFLOW: &str = include_str!("templates/claude_workflow.md");

/// Separator placed between existing content and merged rules.
pub const MERGE_SEPARATOR: &str = "\n\n---\n\n";

/// An agent whose rules file is configured in the project config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesTarget {
    Cursor,
    ClaudeCode,
}

/// An agent that gets a workflow template at init time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAgent {
    Cursor,
    Claude,
}

/// Render every document in the tree as one markdown rules file.
///
/// Domains and topics without documents are skipped.
pub async fn generate_rules_content(store: &ContextTreeStore) -> StoreResult<String> {
    let config = store.read_config().await?;
    let mut content = String::from("# Project Rules for AI Assistants\n\n");
    content.push_str(&format!(
        "Generated from bitranger context tree for {}\n\n",
        config.project_name
    ));

    for domain in store.list_domains().await? {
        let mut domain_section = String::new();

        for topic in store.list_topics(&domain).await? {
            let topic_path = NamespacePath::new(domain.as_str(), topic.as_str());
            let mut topic_section = render_documents(store, &topic_path).await?;

            for subtopic in store.list_subtopics(&domain, &topic).await? {
                let sub_path = topic_path.clone().with_subtopic(subtopic.as_str());
                let docs = render_documents(store, &sub_path).await?;
                if !docs.is_empty() {
                    topic_section.push_str(&format!("#### {subtopic}\n\n{docs}"));
                }
            }

            if !topic_section.is_empty() {
                domain_section.push_str(&format!("### {topic}\n\n{topic_section}"));
            }
        }

        if !domain_section.is_empty() {
            content.push_str(&format!("## {domain}\n\n{domain_section}"));
        }
    }

    Ok(content)
}

async fn render_documents(store: &ContextTreeStore, path: &NamespacePath) -> StoreResult<String> {
    let mut rendered = String::new();
    for memory in store.list_memories(path).await? {
        let body = store.read_memory(path, &memory).await?;
        rendered.push_str(&body);
        rendered.push_str("\n\n");
    }
    Ok(rendered)
}

/// Write the generated rules.
///
/// With `output`, one file is written there; otherwise one per target, at
/// the rules file path from the project config. With `merge`, existing
/// content is kept and the new rules appended after a separator.
pub async fn write_agent_rules(
    store: &ContextTreeStore,
    targets: &[RulesTarget],
    output: Option<&Path>,
    merge: bool,
) -> StoreResult<Vec<PathBuf>> {
    let rules = generate_rules_content(store).await?;

    let paths: Vec<PathBuf> = match output {
        Some(path) => vec![path.to_path_buf()],
        None => {
            let config = store.read_config().await?;
            targets
                .iter()
                .map(|target| {
                    let file = match target {
                        RulesTarget::Cursor => &config.agents.cursor.rules_file,
                        RulesTarget::ClaudeCode => &config.agents.claude_code.rules_file,
                    };
                    store.project_root().join(file)
                })
                .collect()
        }
    };

    for path in &paths {
        let content = if merge {
            match fs::read_to_string(path).await {
                Ok(existing) => format!("{existing}{MERGE_SEPARATOR}{rules}"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => rules.clone(),
                Err(e) => return Err(e.into()),
            }
        } else {
            rules.clone()
        };
        write_atomic(path, content.as_bytes()).await?;
        info!(path = %path.display(), merge, "Wrote rules file");
    }

    Ok(paths)
}

/// Install the workflow template for `agent` under the project root.
pub async fn write_workflow_rules(project_root: &Path, agent: WorkflowAgent) -> StoreResult<PathBuf> {
    let (path, template) = match agent {
        WorkflowAgent::Cursor => (
            project_root.join(".cursor/rules/bitranger-workflow.mdc"),
            CURSOR_WORKFLOW,
        ),
        WorkflowAgent::Claude => (project_root.join(".claude/bitranger/CLAUDE.md"), CLAUDE_WORKFLOW),
    };
    write_atomic(&path, template.as_bytes()).await?;
    Ok(path)
}
