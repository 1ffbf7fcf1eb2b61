//! The `## Relations` section of a document and the graph it induces.
//!
//! A relation is a token `@domain/topic` or `@domain/topic/subtopic` listed
//! under a level-2 `Relations` heading. Extraction is purely syntactic;
//! validity means the target node holds a `context.md`.

use crate::error::{RelationError, StoreResult};
use crate::tree::{ContextTreeStore, NamespacePath, CONTEXT_FILENAME};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

static RELATIONS_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^##\s+relations\s*$").expect("valid regex"));

static RELATION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i-u)@([a-z_]+)/([a-z_-]+)(?:/([a-z_-]+))?").expect("valid regex")
});

static RELATION_EXACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i-u)^@([a-z_]+)/([a-z_-]+)(?:/([a-z_-]+))?$").expect("valid regex")
});

/// Byte ranges of the relations section: the heading line starts at
/// `start`, its body spans `body_start..end`.
struct Section {
    start: usize,
    body_start: usize,
    end: usize,
}

fn is_level2_heading(line: &str) -> bool {
    line.starts_with("##") && !line.starts_with("###")
}

fn find_relations_section(doc: &str) -> Option<Section> {
    let mut offset = 0;
    let mut heading: Option<(usize, usize)> = None;

    for line in doc.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let text = line.trim_end_matches(['\n', '\r']);

        match heading {
            None if RELATIONS_HEADING.is_match(text) => heading = Some((line_start, offset)),
            None => {}
            Some((start, body_start)) if is_level2_heading(text) => {
                return Some(Section {
                    start,
                    body_start,
                    end: line_start,
                })
            }
            Some(_) => {}
        }
    }

    heading.map(|(start, body_start)| Section {
        start,
        body_start,
        end: doc.len(),
    })
}

/// Every relation token in the document's relations section, in order,
/// duplicates kept. No section means no relations.
pub fn extract_relations(doc: &str) -> Vec<String> {
    let Some(section) = find_relations_section(doc) else {
        return Vec::new();
    };
    RELATION_TOKEN
        .find_iter(&doc[section.body_start..section.end])
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse a whole token into the node it points at.
pub fn resolve_relation_path(token: &str) -> Result<NamespacePath, RelationError> {
    let caps = RELATION_EXACT
        .captures(token)
        .ok_or_else(|| RelationError::Malformed(token.to_string()))?;
    let path = NamespacePath::new(&caps[1], &caps[2])
        .with_optional_subtopic(caps.get(3).map(|m| m.as_str().to_string()));
    Ok(path)
}

/// Whether `token` resolves to a node that holds a `context.md`.
///
/// Any read failure counts as "does not exist".
pub async fn validate_relation(token: &str, store: &ContextTreeStore) -> bool {
    match resolve_relation_path(token) {
        Ok(path) => store.read_memory(&path, CONTEXT_FILENAME).await.is_ok(),
        Err(_) => false,
    }
}

/// A relation that resolves to an existing document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidRelation {
    pub relation: String,
    pub path: NamespacePath,
}

/// The document's relations that point at existing documents, in order.
pub async fn get_valid_relations(doc: &str, store: &ContextTreeStore) -> Vec<ValidRelation> {
    let mut valid = Vec::new();
    for relation in extract_relations(doc) {
        let Ok(path) = resolve_relation_path(&relation) else {
            continue;
        };
        if store.read_memory(&path, CONTEXT_FILENAME).await.is_ok() {
            valid.push(ValidRelation { relation, path });
        } else {
            debug!(relation = %relation, "Dropping unresolved relation");
        }
    }
    valid
}

/// `\n## Relations\n` followed by one token per line; empty input gives "".
pub fn format_relations_section<S: AsRef<str>>(relations: &[S]) -> String {
    if relations.is_empty() {
        return String::new();
    }
    let mut section = String::from("\n## Relations\n");
    for relation in relations {
        section.push_str(relation.as_ref());
        section.push('\n');
    }
    section
}

/// Merge `new` into the document's relations section.
///
/// Existing relations come first, then new ones in the order given, without
/// duplicates. The old section is removed, the rest trimmed, and a fresh
/// section appended. Tokens are not validated.
pub fn add_relations<S: AsRef<str>>(doc: &str, new: &[S]) -> String {
    let mut seen = HashSet::new();
    let merged: Vec<String> = extract_relations(doc)
        .into_iter()
        .chain(new.iter().map(|r| r.as_ref().to_string()))
        .filter(|r| seen.insert(r.clone()))
        .collect();

    let without_section = match find_relations_section(doc) {
        Some(section) => format!("{}{}", &doc[..section.start], &doc[section.end..]),
        None => doc.to_string(),
    };

    format!(
        "{}{}",
        without_section.trim(),
        format_relations_section(&merged)
    )
}

/// One extracted relation, from the node whose `context.md` lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationEdge {
    pub source: NamespacePath,
    pub relation: String,
    pub target: NamespacePath,
    /// Whether the target holds a `context.md`.
    pub resolved: bool,
}

/// Directed graph over every node that holds a `context.md`.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    nodes: BTreeSet<NamespacePath>,
    edges: Vec<RelationEdge>,
}

impl RelationGraph {
    /// Read every `context.md` in the tree and collect its relations.
    pub async fn build(store: &ContextTreeStore) -> StoreResult<Self> {
        let mut documents = Vec::new();

        for domain in store.list_domains().await? {
            for topic in store.list_topics(&domain).await? {
                let topic_path = NamespacePath::new(domain.as_str(), topic.as_str());
                let mut nodes = vec![topic_path.clone()];
                for subtopic in store.list_subtopics(&domain, &topic).await? {
                    nodes.push(topic_path.clone().with_subtopic(subtopic));
                }

                for node in nodes {
                    let memories = store.list_memories(&node).await?;
                    if memories.iter().any(|m| m == CONTEXT_FILENAME) {
                        let content = store.read_memory(&node, CONTEXT_FILENAME).await?;
                        documents.push((node, content));
                    }
                }
            }
        }

        let nodes: BTreeSet<NamespacePath> = documents.iter().map(|(n, _)| n.clone()).collect();
        let mut edges = Vec::new();
        for (source, content) in &documents {
            for relation in extract_relations(content) {
                let Ok(target) = resolve_relation_path(&relation) else {
                    continue;
                };
                edges.push(RelationEdge {
                    source: source.clone(),
                    resolved: nodes.contains(&target),
                    relation,
                    target,
                });
            }
        }

        debug!(nodes = nodes.len(), edges = edges.len(), "Built relation graph");
        Ok(Self { nodes, edges })
    }

    /// Nodes holding a `context.md`, sorted.
    pub fn nodes(&self) -> impl Iterator<Item = &NamespacePath> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> &[RelationEdge] {
        &self.edges
    }

    /// Edges listed by `node`.
    pub fn outgoing(&self, node: &NamespacePath) -> Vec<&RelationEdge> {
        self.edges.iter().filter(|e| &e.source == node).collect()
    }

    /// Backlinks: edges pointing at `node`.
    pub fn incoming(&self, node: &NamespacePath) -> Vec<&RelationEdge> {
        self.edges.iter().filter(|e| &e.target == node).collect()
    }

    /// Edges whose target holds no `context.md`.
    pub fn dangling(&self) -> Vec<&RelationEdge> {
        self.edges.iter().filter(|e| !e.resolved).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InitOptions;
    use tempfile::TempDir;

    const DOC: &str = "# Error handling\n\nUse Result everywhere.\n\n## Relations\n@code_style/error-handling\n- see @testing/unit/mocks too\n@testing/unit\n\n## Notes\n@design/ignored\n";

    #[test]
    fn test_extract_stops_at_next_heading() {
        assert_eq!(
            extract_relations(DOC),
            vec![
                "@code_style/error-handling",
                "@testing/unit/mocks",
                "@testing/unit"
            ]
        );
    }

    #[test]
    fn test_extract_heading_case_and_subheadings() {
        let doc = "intro\n## RELATIONS\n### nested\n@a/b\n@a/b\n";
        assert_eq!(extract_relations(doc), vec!["@a/b", "@a/b"]);
        assert!(extract_relations("no section @a/b").is_empty());
        assert!(extract_relations("### Relations\n@a/b").is_empty());
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve_relation_path("@testing/unit-tests/api").unwrap(),
            NamespacePath::new("testing", "unit-tests").with_subtopic("api")
        );
        assert_eq!(
            resolve_relation_path("@testing/unit").unwrap(),
            NamespacePath::new("testing", "unit")
        );
        assert!(resolve_relation_path("@my-domain/topic").is_err());
        assert!(resolve_relation_path("testing/unit").is_err());
        assert!(resolve_relation_path("@a/b/c/d").is_err());
    }

    #[test]
    fn test_token_case_folding_is_ascii_only() {
        // U+212A KELVIN SIGN and U+017F LATIN SMALL LETTER LONG S fold to k and s.
        let doc = "## Relations\n@\u{212A}ey/topic\n@te\u{017F}t/unit\n@Design/API\n";
        assert_eq!(extract_relations(doc), vec!["@Design/API"]);
        assert!(resolve_relation_path("@\u{212A}ey/topic").is_err());
        assert!(resolve_relation_path("@testing/\u{017F}napshots").is_err());
        assert!(resolve_relation_path("@TESTING/Unit").is_ok());
    }

    #[test]
    fn test_format_section() {
        assert_eq!(format_relations_section::<&str>(&[]), "");
        assert_eq!(
            format_relations_section(&["@a/b", "@c/d"]),
            "\n## Relations\n@a/b\n@c/d\n"
        );
    }

    #[test]
    fn test_add_relations_merges_in_order() {
        let doc = "Body text\n\n## Relations\n@a/b\n";
        let updated = add_relations(doc, &["@c/d", "@a/b"]);
        assert_eq!(updated, "Body text\n## Relations\n@a/b\n@c/d\n");
    }

    #[test]
    fn test_add_relations_keeps_trailing_sections() {
        let updated = add_relations(DOC, &["@design/api"]);
        assert!(updated.contains("## Notes\n@design/ignored"));
        assert!(updated.ends_with("## Relations\n@code_style/error-handling\n@testing/unit/mocks\n@testing/unit\n@design/api\n"));
    }

    #[test]
    fn test_add_relations_empty_union() {
        assert_eq!(add_relations::<&str>("  just text \n", &[]), "just text");
    }

    #[test]
    fn test_add_extracted_is_stable() {
        let extracted = extract_relations(DOC);
        let rewritten = add_relations(DOC, &extracted);
        let unique: BTreeSet<_> = extracted.into_iter().collect();
        let again: BTreeSet<_> = extract_relations(&rewritten).into_iter().collect();
        assert_eq!(unique, again);
    }

    #[tokio::test]
    async fn test_validation_and_graph() {
        let dir = TempDir::new().unwrap();
        let store = ContextTreeStore::new(dir.path());
        store
            .initialize(InitOptions::new().with_domains(["testing", "design"]))
            .await
            .unwrap();

        let unit = NamespacePath::new("testing", "unit");
        let api = NamespacePath::new("design", "api");
        store
            .write_memory(&unit, CONTEXT_FILENAME, "Unit rules\n## Relations\n@design/api\n@design/missing\n")
            .await
            .unwrap();
        store
            .write_memory(&api, CONTEXT_FILENAME, "API rules")
            .await
            .unwrap();

        assert!(validate_relation("@design/api", &store).await);
        assert!(!validate_relation("@design/missing", &store).await);
        assert!(!validate_relation("not a relation", &store).await);

        let doc = store.read_memory(&unit, CONTEXT_FILENAME).await.unwrap();
        let valid = get_valid_relations(&doc, &store).await;
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].path, api);

        let graph = RelationGraph::build(&store).await.unwrap();
        assert_eq!(graph.nodes().count(), 2);
        assert_eq!(graph.outgoing(&unit).len(), 2);
        assert_eq!(graph.incoming(&api).len(), 1);
        assert_eq!(graph.dangling().len(), 1);
        assert_eq!(graph.dangling()[0].relation, "@design/missing");
    }
}
