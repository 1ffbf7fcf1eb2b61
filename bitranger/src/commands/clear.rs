use super::open_store;
use anyhow::Result;
use bitranger_core::{ContextTreeStore, NamespacePath};
use clap::Args;
use dialoguer::Confirm;
use std::path::Path;

#[derive(Args)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub force: bool,

    /// Only clear this domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Only clear this topic
    #[arg(long, requires = "domain")]
    pub topic: Option<String>,
}

pub async fn run(root: &Path, args: ClearArgs) -> Result<()> {
    let store = open_store(root).await?;
    let stats = store.get_stats().await?;

    if stats.documents == 0 {
        println!("Context tree is already empty.");
        return Ok(());
    }

    if !args.force {
        println!("This will delete curated documents. Configuration is kept.");
        println!();
        match (&args.domain, &args.topic) {
            (Some(domain), Some(topic)) => {
                let files = count_topic_documents(&store, domain, topic).await?;
                println!("Target: {domain}/{topic}");
                println!("  {files} document(s)");
            }
            (Some(domain), None) => {
                let (topics, documents) = stats
                    .domain(domain)
                    .map(|d| (d.topics, d.documents))
                    .unwrap_or_default();
                println!("Target: {domain} domain");
                println!("  {topics} topic(s)");
                println!("  {documents} document(s)");
            }
            _ => {
                println!("Current context tree:");
                println!("  {} domain(s)", stats.domains);
                println!("  {} topic(s)", stats.topics);
                println!("  {} document(s)", stats.documents);
            }
        }
        println!();

        let confirmed = Confirm::new()
            .with_prompt("Are you sure you want to continue?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = match (&args.domain, &args.topic) {
        (Some(domain), Some(topic)) => store.clear_topic(domain, topic).await?,
        (Some(domain), None) => store.clear_domain(domain).await?,
        _ => store.clear_all().await?,
    };

    println!("Removed {removed} document(s). Domains are preserved.");
    Ok(())
}

async fn count_topic_documents(store: &ContextTreeStore, domain: &str, topic: &str) -> Result<usize> {
    let topic_path = NamespacePath::new(domain, topic);
    let mut count = store.list_memories(&topic_path).await?.len();
    for subtopic in store.list_subtopics(domain, topic).await? {
        count += store
            .list_memories(&topic_path.clone().with_subtopic(subtopic))
            .await?
            .len();
    }
    Ok(count)
}
