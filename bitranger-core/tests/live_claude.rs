//! Integration tests that call the real Claude API.
//!
//! These tests require ANTHROPIC_API_KEY to be set (via .env file or environment).
//! Run with: `cargo test -p bitranger-core --test live_claude -- --ignored`

use bitranger_core::agent::{AgentRunner, ClaudeEngine, EngineConfig};
use bitranger_core::testing::TestHarness;

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

fn has_api_key() -> bool {
    std::env::var("ANTHROPIC_API_KEY").is_ok()
}

fn engine() -> ClaudeEngine {
    let key = std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY");
    ClaudeEngine::new(key, EngineConfig::from_env().with_max_tokens(2048)).expect("Failed to build engine")
}

#[tokio::test]
#[ignore] // Run with: cargo test -p bitranger-core --test live_claude -- --ignored
async fn test_live_curate_then_query() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let harness = TestHarness::with_domains(["testing", "code_style"]).await;

    let mut curator = AgentRunner::new(harness.store.clone(), engine());
    let curated = curator
        .curate(
            "Unit tests must never sleep or depend on wall-clock time.",
            Some("testing"),
            None,
        )
        .await;
    assert!(curated.success, "curation failed: {:?}", curated.error);
    assert!(!curated.written_files.is_empty(), "curation should write a document");

    let mut searcher = AgentRunner::new(harness.store.clone(), engine());
    let answer = searcher.query("Can unit tests sleep?", None).await;
    assert!(answer.success, "query failed: {:?}", answer.error);
    assert!(answer.iterations <= 20);
}
