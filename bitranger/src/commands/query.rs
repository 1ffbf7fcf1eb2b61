use super::{document_location, engine_from_env, open_store};
use anyhow::{Context, Result};
use bitranger_core::{AgentRunner, QueryResult};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

const NO_RESULTS: &str = "No relevant context found.\n";

#[derive(Args)]
pub struct QueryArgs {
    /// What to look for
    pub query: String,

    /// Only search this domain
    #[arg(long)]
    pub domain: Option<String>,

    #[arg(long, value_enum, default_value_t = QueryFormat::Markdown)]
    pub format: QueryFormat,

    /// Write the results to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryFormat {
    Markdown,
    Plain,
    Json,
}

pub async fn run(root: &Path, args: QueryArgs) -> Result<()> {
    let store = open_store(root).await?;
    let engine = engine_from_env()?;

    if args.format != QueryFormat::Json {
        println!("Searching context tree...");
    }

    let mut runner = AgentRunner::new(store, engine);
    let result = runner.query(&args.query, args.domain.as_deref()).await;

    let output = match args.format {
        QueryFormat::Json => serde_json::to_string_pretty(&result)?,
        QueryFormat::Markdown => render_markdown(&result),
        QueryFormat::Plain => render_plain(&result),
    };

    match &args.out {
        Some(path) => {
            tokio::fs::write(path, &output)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Results saved to {}", path.display());
        }
        None => println!("{output}"),
    }

    if let Some(warning) = failure_warning(&result) {
        eprintln!("{warning}");
    }
    Ok(())
}

/// The one stderr line reported for a run that did not complete.
fn failure_warning(result: &QueryResult) -> Option<String> {
    result.error.as_ref().map(|error| format!("Warning: {error}"))
}

fn separator() -> String {
    "━".repeat(44)
}

fn render_markdown(result: &QueryResult) -> String {
    if !result.success || result.results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let rule = separator();
    let mut out = format!(
        "Found relevant context in {} location(s):\n\n",
        result.results.len()
    );
    for ctx in &result.results {
        let mut heading = vec![ctx.domain.as_str(), ctx.topic.as_str()];
        heading.extend(ctx.subtopic.as_deref());
        heading.push(ctx.filename.as_str());
        out.push_str(&format!("{rule}\n{}\n{rule}\n\n", heading.join(" > ")));
        out.push_str(&format!("{}\n\n", ctx.relevant_content));
    }

    if !result.summary.is_empty() {
        out.push_str(&format!("{rule}\nSummary\n{rule}\n\n{}\n", result.summary));
    }
    out
}

fn render_plain(result: &QueryResult) -> String {
    if !result.success || result.results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut out = format!("Found {} result(s):\n\n", result.results.len());
    for ctx in &result.results {
        out.push_str(&format!(
            "[{}]\n{}\n\n",
            document_location(&ctx.domain, &ctx.topic, ctx.subtopic.as_deref(), &ctx.filename),
            ctx.relevant_content
        ));
    }
    if !result.summary.is_empty() {
        out.push_str(&format!("Summary: {}\n", result.summary));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitranger_core::agent::RetrievedContext;

    fn result(results: Vec<RetrievedContext>) -> QueryResult {
        QueryResult {
            success: true,
            results,
            summary: "Tests must be deterministic.".to_string(),
            iterations: 3,
            error: None,
            tool_calls: Vec::new(),
        }
    }

    fn unit_context() -> RetrievedContext {
        RetrievedContext {
            domain: "testing".to_string(),
            topic: "unit".to_string(),
            subtopic: Some("mocks".to_string()),
            filename: "context.md".to_string(),
            relevant_content: "Prefer fakes.".to_string(),
        }
    }

    #[test]
    fn test_markdown_layout() {
        let out = render_markdown(&result(vec![unit_context()]));
        let rule = "━".repeat(44);

        assert!(out.starts_with("Found relevant context in 1 location(s):\n\n"));
        assert!(out.contains(&format!("{rule}\ntesting > unit > mocks > context.md\n{rule}\n\nPrefer fakes.\n\n")));
        assert!(out.ends_with(&format!("{rule}\nSummary\n{rule}\n\nTests must be deterministic.\n")));
    }

    #[test]
    fn test_plain_layout() {
        let out = render_plain(&result(vec![unit_context()]));
        assert_eq!(
            out,
            "Found 1 result(s):\n\n[testing/unit/mocks/context.md]\nPrefer fakes.\n\nSummary: Tests must be deterministic.\n"
        );
    }

    #[test]
    fn test_empty_and_failed_runs() {
        assert_eq!(render_markdown(&result(Vec::new())), NO_RESULTS);

        let mut failed = result(vec![unit_context()]);
        failed.success = false;
        assert_eq!(render_plain(&failed), NO_RESULTS);
    }

    #[test]
    fn test_failure_warning_is_single_line() {
        assert_eq!(failure_warning(&result(Vec::new())), None);

        let mut exhausted = result(Vec::new());
        exhausted.success = false;
        exhausted.error = Some("Maximum iterations (20) reached without completion".to_string());
        assert_eq!(
            failure_warning(&exhausted).as_deref(),
            Some("Warning: Maximum iterations (20) reached without completion")
        );
    }
}
