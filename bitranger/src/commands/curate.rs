use super::{document_location, engine_from_env, open_store};
use anyhow::{Context, Result};
use bitranger_core::{AgentRunner, CurateResult};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct CurateArgs {
    /// Content to curate
    #[arg(conflicts_with = "from_file")]
    pub content: Option<String>,

    /// Read the content from a file
    #[arg(long)]
    pub from_file: Option<PathBuf>,

    /// Domain hint for categorization
    #[arg(long)]
    pub domain: Option<String>,

    /// Topic hint for categorization
    #[arg(long)]
    pub topic: Option<String>,

    #[arg(long, value_enum, default_value_t = CurateFormat::Plain)]
    pub format: CurateFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CurateFormat {
    Json,
    Plain,
}

pub async fn run(root: &Path, args: CurateArgs, verbose: bool) -> Result<()> {
    let store = open_store(root).await?;
    let engine = engine_from_env()?;

    let content = match (&args.from_file, args.content) {
        (Some(path), _) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(content)) => content,
        (None, None) => anyhow::bail!("No content provided. Usage: bitranger curate \"content\" or --from-file <path>"),
    };
    if content.trim().is_empty() {
        anyhow::bail!("No content provided");
    }

    if args.format == CurateFormat::Plain {
        println!("Analyzing context...");
    }

    let mut runner = AgentRunner::new(store, engine);
    let result = runner
        .curate(&content, args.domain.as_deref(), args.topic.as_deref())
        .await;

    if args.format == CurateFormat::Json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if verbose {
            for (i, call) in result.tool_calls.iter().enumerate() {
                eprintln!("[{}] {} {}", i + 1, call.tool_name, call.input);
            }
        }
        print_plain(&result, verbose);
    }

    if !result.success {
        anyhow::bail!(
            "Failed to curate context: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_plain(result: &CurateResult, verbose: bool) {
    if !result.success {
        if !result.tool_calls.is_empty() {
            eprintln!("Tool calls made:");
            for call in &result.tool_calls {
                eprintln!("  - {}", call.tool_name);
            }
        }
        return;
    }

    println!("Context added to the tree in {} step(s)", result.iterations);
    if let Some(summary) = &result.summary {
        println!("  {summary}");
    }

    if result.written_files.is_empty() {
        eprintln!();
        eprintln!("Warning: no files were written to the context tree.");
        if !verbose {
            eprintln!("Run with --verbose to see the agent's steps.");
        }
        return;
    }

    println!();
    println!("Changes made:");
    for file in &result.written_files {
        println!(
            "  {}: {}",
            file.action.past_tense(),
            document_location(&file.domain, &file.topic, file.subtopic.as_deref(), &file.filename)
        );
    }
}
