use super::open_store;
use anyhow::Result;
use bitranger_core::{ProjectConfig, RelationGraph, TreeStats};
use clap::Args;
use serde_json::json;
use std::path::Path;

#[derive(Args)]
pub struct StatusArgs {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(root: &Path, args: StatusArgs, verbose: bool) -> Result<()> {
    let store = open_store(root).await?;
    let config = store.read_config().await?;
    let stats = store.get_stats().await?;
    let graph = RelationGraph::build(&store).await?;

    if args.json {
        let dangling: Vec<_> = graph
            .dangling()
            .into_iter()
            .map(|edge| json!({ "source": edge.source.to_string(), "relation": edge.relation }))
            .collect();
        let status = json!({
            "location": store.tree_root().display().to_string(),
            "config": config,
            "stats": stats,
            "relations": {
                "edges": graph.edges().len(),
                "dangling": dangling,
            },
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    print!("{}", render_summary(&config, &stats));

    let dangling = graph.dangling();
    println!();
    println!("Relations: {} ({} dangling)", graph.edges().len(), dangling.len());
    for edge in dangling {
        println!("  {} -> {}", edge.source, edge.relation);
    }

    if verbose {
        println!();
        println!("{}", store.get_tree_structure().await?);
    }

    Ok(())
}

fn render_summary(config: &ProjectConfig, stats: &TreeStats) -> String {
    let mut out = format!("Project: {}\n", config.project_name);
    out.push_str(&format!("Git tracking: {}\n\n", if config.git_tracking { "on" } else { "off" }));

    out.push_str("Active integrations:\n");
    for (name, integration) in [
        ("Claude Code", &config.agents.claude_code),
        ("Cursor", &config.agents.cursor),
    ] {
        let state = if integration.enabled { "ready" } else { "disabled" };
        out.push_str(&format!("  {name}: {state} ({})\n", integration.rules_file));
    }
    out.push('\n');

    out.push_str(&format!(
        "Domains: {}  Topics: {}  Subtopics: {}  Documents: {}\n",
        stats.domains, stats.topics, stats.subtopics, stats.documents
    ));
    out.push_str(&format!("Total size: {}\n", format_size(stats.total_size)));
    match stats.last_updated {
        Some(ts) => out.push_str(&format!("Last updated: {}\n", ts.format("%Y-%m-%d %H:%M:%S UTC"))),
        None => out.push_str("Last updated: never\n"),
    }

    if !stats.domain_info.is_empty() {
        out.push('\n');
        for domain in &stats.domain_info {
            out.push_str(&format!(
                "  {:<20} {} topics, {} subtopics, {} documents\n",
                domain.name, domain.topics, domain.subtopics, domain.documents
            ));
        }
    }
    out
}

fn format_size(bytes: u64) -> String {
    match bytes {
        b if b < 1024 => format!("{b} B"),
        b if b < 1024 * 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitranger_core::InitOptions;

    #[test]
    fn test_summary_lists_integrations() {
        let mut config = InitOptions::new()
            .with_project_name("demo")
            .into_config(Path::new("/tmp/demo"));
        config.agents.cursor.enabled = false;

        let summary = render_summary(&config, &TreeStats::default());
        assert!(summary.contains(
            "Active integrations:\n  Claude Code: ready (.claude-code-rules.md)\n  Cursor: disabled (.cursorrules)\n"
        ));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
