//! bitranger: curate and query a project's context tree.
//!
//! ```bash
//! bitranger init --domains testing,design
//! bitranger curate "Integration tests hit a real database" --domain testing
//! bitranger query "how do we test the database layer?"
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{clear, curate, gen_rules, init, query, status};

#[derive(Parser)]
#[command(name = "bitranger")]
#[command(about = "Keep a project's knowledge in a context tree your coding agents can use")]
#[command(version)]
struct Cli {
    /// Repository root (default: current directory)
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Show agent steps and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize bitranger in a repository
    Init(init::InitArgs),

    /// Show the state of the context tree
    Status(status::StatusArgs),

    /// Capture content into the context tree
    Curate(curate::CurateArgs),

    /// Retrieve relevant context from the tree
    Query(query::QueryArgs),

    /// Remove curated documents, keeping the structure
    Clear(clear::ClearArgs),

    /// Generate agent rules files from the tree
    GenRules(gen_rules::GenRulesArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let root = match cli.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init(args) => init::run(&root, args).await,
        Commands::Status(args) => status::run(&root, args, cli.verbose).await,
        Commands::Curate(args) => curate::run(&root, args, cli.verbose).await,
        Commands::Query(args) => query::run(&root, args).await,
        Commands::Clear(args) => clear::run(&root, args).await,
        Commands::GenRules(args) => gen_rules::run(&root, args).await,
    }
}
