//! The namespace store: CRUD and listing over the on-disk context tree.

use super::fsutil::{list_names, remove_dir_if_empty, write_atomic, EntryKind};
use super::path::{normalize_filename, validate_segment, NamespacePath, DOCUMENT_EXTENSION};
use crate::config::{ConfigUpdate, InitOptions, ProjectConfig};
use crate::error::{StoreError, StoreResult};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Directory holding everything bitranger owns inside a project.
pub const BITRANGER_DIR: &str = ".bitranger";

const CONFIG_FILENAME: &str = "config.json";
const TREE_DIRNAME: &str = "context-tree";

/// Handle onto one project's context tree.
///
/// Holds nothing but the project root; every call goes to disk.
#[derive(Debug, Clone)]
pub struct ContextTreeStore {
    project_root: PathBuf,
}

impl ContextTreeStore {
    /// Create a store for the project rooted at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// `<project>/.bitranger/config.json`
    pub fn config_path(&self) -> PathBuf {
        self.project_root.join(BITRANGER_DIR).join(CONFIG_FILENAME)
    }

    /// `<project>/.bitranger/context-tree`
    pub fn tree_root(&self) -> PathBuf {
        self.project_root.join(BITRANGER_DIR).join(TREE_DIRNAME)
    }

    fn domain_dir(&self, domain: &str) -> StoreResult<PathBuf> {
        validate_segment("domain", domain)?;
        Ok(self.tree_root().join(domain))
    }

    fn topic_dir(&self, domain: &str, topic: &str) -> StoreResult<PathBuf> {
        validate_segment("topic", topic)?;
        Ok(self.domain_dir(domain)?.join(topic))
    }

    pub(crate) fn node_dir(&self, path: &NamespacePath) -> StoreResult<PathBuf> {
        path.validate()?;
        Ok(self.tree_root().join(path.relative_dir()))
    }

    // ---- config ----

    /// Whether the config artifact exists.
    pub async fn is_initialized(&self) -> bool {
        fs::metadata(self.config_path()).await.is_ok()
    }

    /// Fail with `NotInitialized` unless the config artifact exists.
    pub async fn ensure_initialized(&self) -> StoreResult<()> {
        if self.is_initialized().await {
            Ok(())
        } else {
            Err(StoreError::NotInitialized {
                root: self.project_root.clone(),
            })
        }
    }

    /// Create the tree root, the default domains and the config artifact.
    pub async fn initialize(&self, options: InitOptions) -> StoreResult<ProjectConfig> {
        if self.is_initialized().await {
            return Err(StoreError::AlreadyInitialized {
                root: self.project_root.clone(),
            });
        }

        let config = options.into_config(&self.project_root);
        for domain in &config.context_tree.default_domains {
            validate_segment("domain", domain)?;
        }

        let tree_root = self.tree_root();
        fs::create_dir_all(&tree_root).await?;
        for domain in &config.context_tree.default_domains {
            fs::create_dir_all(tree_root.join(domain)).await?;
        }
        config.save_json(self.config_path()).await?;

        info!(
            project = %config.project_name,
            domains = config.context_tree.default_domains.len(),
            "Initialized context tree"
        );
        Ok(config)
    }

    /// Load the config artifact.
    pub async fn read_config(&self) -> StoreResult<ProjectConfig> {
        self.ensure_initialized().await?;
        ProjectConfig::load_json(self.config_path()).await
    }

    /// Shallow-merge `update` into the stored config and rewrite it.
    pub async fn update_config(&self, update: ConfigUpdate) -> StoreResult<ProjectConfig> {
        let mut config = self.read_config().await?;
        config.merge(update);
        config.save_json(self.config_path()).await?;
        Ok(config)
    }

    // ---- listings ----

    pub async fn list_domains(&self) -> StoreResult<Vec<String>> {
        Ok(list_names(&self.tree_root(), EntryKind::Dir).await?)
    }

    pub async fn list_topics(&self, domain: &str) -> StoreResult<Vec<String>> {
        Ok(list_names(&self.domain_dir(domain)?, EntryKind::Dir).await?)
    }

    pub async fn list_subtopics(&self, domain: &str, topic: &str) -> StoreResult<Vec<String>> {
        Ok(list_names(&self.topic_dir(domain, topic)?, EntryKind::Dir).await?)
    }

    /// Document file names directly inside the node's directory.
    pub async fn list_memories(&self, path: &NamespacePath) -> StoreResult<Vec<String>> {
        Ok(list_names(&self.node_dir(path)?, EntryKind::File(DOCUMENT_EXTENSION)).await?)
    }

    // ---- documents ----

    pub async fn read_memory(&self, path: &NamespacePath, filename: &str) -> StoreResult<String> {
        let filename = normalize_filename(filename)?;
        let file = self.node_dir(path)?.join(&filename);
        match fs::read_to_string(&file).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                path: format!("{path}/{filename}"),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a document, replacing any previous content atomically.
    pub async fn write_memory(
        &self,
        path: &NamespacePath,
        filename: &str,
        content: &str,
    ) -> StoreResult<()> {
        let filename = normalize_filename(filename)?;
        let file = self.node_dir(path)?.join(&filename);
        write_atomic(&file, content.as_bytes()).await?;
        debug!(path = %path, filename = %filename, bytes = content.len(), "Wrote memory");
        Ok(())
    }

    /// Delete one document. The node directory, and its topic directory for
    /// a subtopic node, are removed when left empty; the domain stays.
    pub async fn delete_memory(&self, path: &NamespacePath, filename: &str) -> StoreResult<()> {
        let filename = normalize_filename(filename)?;
        let node = self.node_dir(path)?;
        let file = node.join(&filename);
        match fs::remove_file(&file).await {
            Ok(()) => {
                debug!(path = %path, filename = %filename, "Deleted memory");
                remove_dir_if_empty(&node).await;
                if path.subtopic.is_some() {
                    remove_dir_if_empty(&self.topic_dir(&path.domain, &path.topic)?).await;
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                path: format!("{path}/{filename}"),
            }),
            Err(e) => Err(e.into()),
        }
    }

    // ---- clearing ----

    /// Delete every document of a topic and its subtopics.
    ///
    /// Returns the number of documents removed. Topic and subtopic
    /// directories that end up empty are removed too.
    pub async fn clear_topic(&self, domain: &str, topic: &str) -> StoreResult<usize> {
        let topic_path = NamespacePath::new(domain, topic);
        let mut removed = self.delete_all_in(&topic_path).await?;

        for subtopic in self.list_subtopics(domain, topic).await? {
            let sub_path = topic_path.clone().with_subtopic(subtopic);
            removed += self.delete_all_in(&sub_path).await?;
            remove_dir_if_empty(&self.node_dir(&sub_path)?).await;
        }
        remove_dir_if_empty(&self.topic_dir(domain, topic)?).await;

        info!(domain, topic, removed, "Cleared topic");
        Ok(removed)
    }

    /// Clear every topic of a domain; the domain directory itself stays.
    pub async fn clear_domain(&self, domain: &str) -> StoreResult<usize> {
        let mut removed = 0;
        for topic in self.list_topics(domain).await? {
            removed += self.clear_topic(domain, &topic).await?;
        }
        Ok(removed)
    }

    /// Clear every domain.
    pub async fn clear_all(&self) -> StoreResult<usize> {
        let mut removed = 0;
        for domain in self.list_domains().await? {
            removed += self.clear_domain(&domain).await?;
        }
        Ok(removed)
    }

    async fn delete_all_in(&self, path: &NamespacePath) -> StoreResult<usize> {
        let memories = self.list_memories(path).await?;
        for memory in &memories {
            self.delete_memory(path, memory).await?;
        }
        Ok(memories.len())
    }

    // ---- project files ----

    /// Read a file relative to the project root.
    pub async fn read_file(&self, relative_path: &str) -> StoreResult<String> {
        let relative = Path::new(relative_path);
        if relative_path.is_empty() {
            return Err(StoreError::invalid_path(relative_path, "path must not be empty"));
        }
        if relative.is_absolute() {
            return Err(StoreError::invalid_path(
                relative_path,
                "path must be relative to the project root",
            ));
        }
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(StoreError::invalid_path(
                relative_path,
                "path must stay inside the project root",
            ));
        }

        match fs::read_to_string(self.project_root.join(relative)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                path: relative_path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::path::CONTEXT_FILENAME;
    use tempfile::TempDir;

    async fn initialized_store() -> (TempDir, ContextTreeStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = ContextTreeStore::new(dir.path());
        store
            .initialize(InitOptions::new().with_domains(["testing", "design"]))
            .await
            .expect("Init should succeed");
        (dir, store)
    }

    #[tokio::test]
    async fn test_initialize_creates_layout() {
        let (dir, store) = initialized_store().await;

        assert!(store.is_initialized().await);
        assert!(dir.path().join(".bitranger/config.json").exists());
        assert_eq!(store.list_domains().await.unwrap(), vec!["design", "testing"]);

        let config = store.read_config().await.unwrap();
        assert_eq!(config.context_tree.default_domains, vec!["testing", "design"]);
    }

    #[tokio::test]
    async fn test_initialize_twice_fails() {
        let (_dir, store) = initialized_store().await;
        let err = store.initialize(InitOptions::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyInitialized { .. }));
    }

    #[tokio::test]
    async fn test_read_config_before_init() {
        let dir = TempDir::new().unwrap();
        let store = ContextTreeStore::new(dir.path());
        assert!(!store.is_initialized().await);
        let err = store.read_config().await.unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized { .. }));
    }

    #[tokio::test]
    async fn test_update_config_merges() {
        let (_dir, store) = initialized_store().await;
        let updated = store
            .update_config(ConfigUpdate {
                project_name: Some("renamed".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.project_name, "renamed");
        assert_eq!(store.read_config().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let (_dir, store) = initialized_store().await;
        let path = NamespacePath::new("testing", "unit").with_subtopic("mocks");

        store
            .write_memory(&path, CONTEXT_FILENAME, "Prefer fakes over mocks.")
            .await
            .unwrap();
        assert_eq!(
            store.read_memory(&path, "context").await.unwrap(),
            "Prefer fakes over mocks."
        );
        assert_eq!(store.list_memories(&path).await.unwrap(), vec!["context.md"]);
        assert_eq!(store.list_subtopics("testing", "unit").await.unwrap(), vec!["mocks"]);

        store.delete_memory(&path, "context.md").await.unwrap();
        let err = store.read_memory(&path, "context.md").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.delete_memory(&path, "context.md").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_last_document_prunes_topic() {
        let (dir, store) = initialized_store().await;
        let unit = NamespacePath::new("testing", "unit");
        store.write_memory(&unit, CONTEXT_FILENAME, "a").await.unwrap();
        store.delete_memory(&unit, CONTEXT_FILENAME).await.unwrap();

        assert!(store.list_topics("testing").await.unwrap().is_empty());
        let stats = store.get_stats().await.unwrap();
        let testing = stats.domain("testing").unwrap();
        assert_eq!(testing.topics, 0);
        assert_eq!(testing.documents, 0);
        assert!(dir.path().join(".bitranger/context-tree/testing").is_dir());

        let mocks = unit.clone().with_subtopic("mocks");
        store.write_memory(&mocks, CONTEXT_FILENAME, "b").await.unwrap();
        store.delete_memory(&mocks, CONTEXT_FILENAME).await.unwrap();
        assert!(store.list_topics("testing").await.unwrap().is_empty());

        store.write_memory(&unit, CONTEXT_FILENAME, "c").await.unwrap();
        store.write_memory(&mocks, CONTEXT_FILENAME, "d").await.unwrap();
        store.delete_memory(&unit, CONTEXT_FILENAME).await.unwrap();
        assert_eq!(store.list_subtopics("testing", "unit").await.unwrap(), vec!["mocks"]);
    }

    #[tokio::test]
    async fn test_missing_listings_are_empty() {
        let dir = TempDir::new().unwrap();
        let store = ContextTreeStore::new(dir.path());
        assert!(store.list_domains().await.unwrap().is_empty());
        assert!(store.list_topics("nope").await.unwrap().is_empty());
        assert!(store
            .list_memories(&NamespacePath::new("a", "b"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_segments_rejected() {
        let (_dir, store) = initialized_store().await;
        let err = store
            .write_memory(&NamespacePath::new("..", "escape"), "context.md", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
        assert!(store.list_topics("a/b").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_topic_counts_subtopics() {
        let (dir, store) = initialized_store().await;
        let topic = NamespacePath::new("testing", "unit");
        store.write_memory(&topic, "context.md", "a").await.unwrap();
        store.write_memory(&topic, "extra.md", "b").await.unwrap();
        store
            .write_memory(&topic.clone().with_subtopic("mocks"), "context.md", "c")
            .await
            .unwrap();

        assert_eq!(store.clear_topic("testing", "unit").await.unwrap(), 3);
        assert!(store.list_topics("testing").await.unwrap().is_empty());
        assert!(dir.path().join(".bitranger/context-tree/testing").is_dir());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (_dir, store) = initialized_store().await;
        store
            .write_memory(&NamespacePath::new("testing", "unit"), "context.md", "a")
            .await
            .unwrap();
        store
            .write_memory(&NamespacePath::new("design", "api"), "context.md", "b")
            .await
            .unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert_eq!(store.list_domains().await.unwrap(), vec!["design", "testing"]);
        assert_eq!(store.clear_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_file_guards() {
        let (dir, store) = initialized_store().await;
        std::fs::write(dir.path().join("README.md"), "# hello").unwrap();

        assert_eq!(store.read_file("README.md").await.unwrap(), "# hello");
        assert!(store.read_file("missing.txt").await.unwrap_err().is_not_found());
        assert!(matches!(
            store.read_file("../etc/passwd").await.unwrap_err(),
            StoreError::InvalidPath { .. }
        ));
        assert!(matches!(
            store.read_file("/etc/passwd").await.unwrap_err(),
            StoreError::InvalidPath { .. }
        ));
    }
}
