//! ASCII rendering of the tree, shown to the reasoning engine and `status -v`.

use super::path::NamespacePath;
use super::store::ContextTreeStore;
use crate::error::StoreResult;

/// Header line of every rendering.
pub const TREE_HEADER: &str = "context_tree/";

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const BLANK: &str = "    ";

/// A child of a topic: documents and subtopic directories share one ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TopicChild {
    Document(String),
    Subtopic(String),
}

impl TopicChild {
    fn name(&self) -> &str {
        match self {
            TopicChild::Document(name) | TopicChild::Subtopic(name) => name,
        }
    }
}

fn connector(is_last: bool) -> &'static str {
    if is_last {
        LAST_BRANCH
    } else {
        BRANCH
    }
}

fn continuation(is_last: bool) -> &'static str {
    if is_last {
        BLANK
    } else {
        PIPE
    }
}

impl ContextTreeStore {
    /// Render the whole tree.
    ///
    /// ```text
    /// context_tree/
    /// ├── design/
    /// └── testing/
    ///     └── unit/
    ///         ├── context.md
    ///         └── mocks/
    ///             └── context.md
    /// ```
    pub async fn get_tree_structure(&self) -> StoreResult<String> {
        let mut lines = vec![TREE_HEADER.to_string()];

        let domains = self.list_domains().await?;
        for (i, domain) in domains.iter().enumerate() {
            let domain_last = i + 1 == domains.len();
            lines.push(format!("{}{domain}/", connector(domain_last)));
            let domain_prefix = continuation(domain_last);

            let topics = self.list_topics(domain).await?;
            for (j, topic) in topics.iter().enumerate() {
                let topic_last = j + 1 == topics.len();
                lines.push(format!("{domain_prefix}{}{topic}/", connector(topic_last)));
                let topic_prefix = format!("{domain_prefix}{}", continuation(topic_last));

                let topic_path = NamespacePath::new(domain.as_str(), topic.as_str());
                let children = self.topic_children(&topic_path).await?;
                for (k, child) in children.iter().enumerate() {
                    let child_last = k + 1 == children.len();
                    match child {
                        TopicChild::Document(name) => {
                            lines.push(format!("{topic_prefix}{}{name}", connector(child_last)));
                        }
                        TopicChild::Subtopic(name) => {
                            lines.push(format!("{topic_prefix}{}{name}/", connector(child_last)));
                            let sub_prefix = format!("{topic_prefix}{}", continuation(child_last));
                            let sub_path = topic_path.clone().with_subtopic(name.as_str());
                            let docs = self.list_memories(&sub_path).await?;
                            for (m, doc) in docs.iter().enumerate() {
                                let doc_last = m + 1 == docs.len();
                                lines.push(format!("{sub_prefix}{}{doc}", connector(doc_last)));
                            }
                        }
                    }
                }
            }
        }

        Ok(lines.join("\n"))
    }

    async fn topic_children(&self, topic: &NamespacePath) -> StoreResult<Vec<TopicChild>> {
        let mut children: Vec<TopicChild> = self
            .list_memories(topic)
            .await?
            .into_iter()
            .map(TopicChild::Document)
            .collect();
        children.extend(
            self.list_subtopics(&topic.domain, &topic.topic)
                .await?
                .into_iter()
                .map(TopicChild::Subtopic),
        );
        children.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InitOptions;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_domains_sorted_with_connectors() {
        let dir = TempDir::new().unwrap();
        let store = ContextTreeStore::new(dir.path());
        store
            .initialize(InitOptions::new().with_domains(["b", "a"]))
            .await
            .unwrap();

        let tree = store.get_tree_structure().await.unwrap();
        assert_eq!(tree, "context_tree/\n├── a/\n└── b/");
    }

    #[tokio::test]
    async fn test_nested_prefixes() {
        let dir = TempDir::new().unwrap();
        let store = ContextTreeStore::new(dir.path());
        store
            .initialize(InitOptions::new().with_domains(["design", "testing"]))
            .await
            .unwrap();

        let unit = NamespacePath::new("testing", "unit");
        store.write_memory(&unit, "context.md", "x").await.unwrap();
        store
            .write_memory(&unit.clone().with_subtopic("mocks"), "context.md", "y")
            .await
            .unwrap();
        store
            .write_memory(&NamespacePath::new("design", "api"), "context.md", "z")
            .await
            .unwrap();

        let tree = store.get_tree_structure().await.unwrap();
        let expected = [
            "context_tree/",
            "├── design/",
            "│   └── api/",
            "│       └── context.md",
            "└── testing/",
            "    └── unit/",
            "        ├── context.md",
            "        └── mocks/",
            "            └── context.md",
        ]
        .join("\n");
        assert_eq!(tree, expected);
    }

    #[tokio::test]
    async fn test_empty_tree_is_header_only() {
        let dir = TempDir::new().unwrap();
        let store = ContextTreeStore::new(dir.path());
        assert_eq!(store.get_tree_structure().await.unwrap(), TREE_HEADER);
    }
}
