//! Cross-module properties of the context tree store.

use bitranger_core::relations::{add_relations, extract_relations, RelationGraph};
use bitranger_core::testing::TestHarness;
use bitranger_core::tree::{NamespacePath, CONTEXT_FILENAME};
use std::collections::BTreeSet;

#[tokio::test]
async fn test_stats_agree_with_listings_for_empty_domains() {
    let harness = TestHarness::with_domains(["testing", "design", "empty"]).await;
    harness.write_context("testing/unit", "a").await;

    // design had documents once; deleting them empties it again.
    harness.write_context("design/api", "b").await;
    harness.write_context("design/api/errors", "c").await;
    let api = NamespacePath::new("design", "api");
    harness.store.delete_memory(&api, CONTEXT_FILENAME).await.unwrap();
    harness
        .store
        .delete_memory(&api.with_subtopic("errors"), CONTEXT_FILENAME)
        .await
        .unwrap();

    let stats = harness.store.get_stats().await.unwrap();
    for domain in ["design", "empty"] {
        let info = stats.domain(domain).unwrap();
        assert!(harness.store.list_topics(domain).await.unwrap().is_empty());
        assert_eq!(info.topics, 0);
        assert_eq!(info.documents, 0);
    }
    assert_eq!(stats.documents, 1);
}

#[tokio::test]
async fn test_write_read_round_trip() {
    let harness = TestHarness::new().await;
    let path = NamespacePath::new("testing", "unit").with_subtopic("snapshots");
    let content = "# Snapshots\n\nReview every snapshot diff.\n\n- ünïcödé is fine\n";

    harness.store.write_memory(&path, CONTEXT_FILENAME, content).await.unwrap();
    assert_eq!(harness.store.read_memory(&path, CONTEXT_FILENAME).await.unwrap(), content);

    harness.store.write_memory(&path, CONTEXT_FILENAME, "").await.unwrap();
    assert_eq!(harness.store.read_memory(&path, CONTEXT_FILENAME).await.unwrap(), "");
}

#[tokio::test]
async fn test_clear_domain_counts_what_was_listed() {
    let harness = TestHarness::with_domains(["testing"]).await;
    harness.write_context("testing/unit", "a").await;
    harness.write_context("testing/unit/mocks", "b").await;
    harness.write_context("testing/e2e", "c").await;
    harness
        .store
        .write_memory(&NamespacePath::new("testing", "e2e"), "flaky.md", "d")
        .await
        .unwrap();

    let mut expected = 0;
    for topic in harness.store.list_topics("testing").await.unwrap() {
        let topic_path = NamespacePath::new("testing", topic.as_str());
        expected += harness.store.list_memories(&topic_path).await.unwrap().len();
        for sub in harness.store.list_subtopics("testing", &topic).await.unwrap() {
            let sub_path = topic_path.clone().with_subtopic(sub);
            expected += harness.store.list_memories(&sub_path).await.unwrap().len();
        }
    }
    assert_eq!(expected, 4);

    assert_eq!(harness.store.clear_domain("testing").await.unwrap(), expected);
    assert!(harness.store.list_topics("testing").await.unwrap().is_empty());
    assert_eq!(harness.store.list_domains().await.unwrap(), vec!["testing"]);
    assert!(harness.store.tree_root().join("testing").is_dir());
}

#[tokio::test]
async fn test_relations_survive_rewrite_through_store() {
    let harness = TestHarness::with_domains(["testing", "code_style"]).await;
    let doc = "Body\n\n## Relations\n@code_style/error-handling\n@testing/unit\n@testing/unit\n";
    harness.write_context("testing/e2e", doc).await;

    let stored = harness.read_context("testing/e2e").await.unwrap();
    let extracted = extract_relations(&stored);
    let rewritten = add_relations(&stored, &extracted);

    let before: BTreeSet<_> = extracted.into_iter().collect();
    let after: BTreeSet<_> = extract_relations(&rewritten).into_iter().collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_graph_backlinks_and_dangling() {
    let harness = TestHarness::with_domains(["testing", "code_style"]).await;
    harness
        .write_context("code_style/errors", "Use thiserror.\n\n## Relations\n@testing/unit\n")
        .await;
    harness
        .write_context("testing/unit", "Test every error variant.\n\n## Relations\n@code_style/errors\n@code_style/gone\n")
        .await;

    let graph = RelationGraph::build(&harness.store).await.unwrap();
    let errors = NamespacePath::new("code_style", "errors");
    let unit = NamespacePath::new("testing", "unit");

    assert_eq!(graph.edges().len(), 3);
    assert_eq!(graph.incoming(&errors).len(), 1);
    assert_eq!(graph.incoming(&errors)[0].source, unit);
    assert_eq!(graph.outgoing(&unit).len(), 2);

    let dangling = graph.dangling();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].target, NamespacePath::new("code_style", "gone"));
}

#[tokio::test]
async fn test_many_roots_in_one_process() {
    let a = TestHarness::with_domains(["alpha"]).await;
    let b = TestHarness::with_domains(["beta"]).await;

    assert_eq!(a.store.list_domains().await.unwrap(), vec!["alpha"]);
    assert_eq!(b.store.list_domains().await.unwrap(), vec!["beta"]);
}
