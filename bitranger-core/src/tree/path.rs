//! Namespace paths: `domain/topic[/subtopic]`.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Extension shared by every document in the tree.
pub const DOCUMENT_EXTENSION: &str = ".md";

/// Canonical document name for a namespace node.
pub const CONTEXT_FILENAME: &str = "context.md";

/// Identity of a node in the context tree.
///
/// Equality is structural. Each node maps onto exactly one directory under
/// the tree root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespacePath {
    pub domain: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
}

impl NamespacePath {
    /// A topic-level node.
    pub fn new(domain: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            topic: topic.into(),
            subtopic: None,
        }
    }

    /// Descend to a subtopic of this node's topic.
    pub fn with_subtopic(mut self, subtopic: impl Into<String>) -> Self {
        self.subtopic = Some(subtopic.into());
        self
    }

    /// Set or clear the subtopic.
    pub fn with_optional_subtopic(mut self, subtopic: Option<String>) -> Self {
        self.subtopic = subtopic;
        self
    }

    /// The topic node that owns this one (itself when already topic-level).
    pub fn topic_node(&self) -> Self {
        Self::new(self.domain.clone(), self.topic.clone())
    }

    /// Check every segment.
    pub fn validate(&self) -> StoreResult<()> {
        validate_segment("domain", &self.domain)?;
        validate_segment("topic", &self.topic)?;
        if let Some(subtopic) = &self.subtopic {
            validate_segment("subtopic", subtopic)?;
        }
        Ok(())
    }

    /// Directory of this node relative to the tree root.
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(&self.domain);
        dir.push(&self.topic);
        if let Some(subtopic) = &self.subtopic {
            dir.push(subtopic);
        }
        dir
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.topic)?;
        if let Some(subtopic) = &self.subtopic {
            write!(f, "/{subtopic}")?;
        }
        Ok(())
    }
}

/// Reject anything that is not a single, plain path component.
pub fn validate_segment(kind: &str, segment: &str) -> StoreResult<()> {
    let reason = if segment.is_empty() {
        Some(format!("{kind} must not be empty"))
    } else if segment == "." || segment == ".." {
        Some(format!("{kind} must not be a relative directory"))
    } else if segment.contains(['/', '\\']) {
        Some(format!("{kind} must be a single path segment"))
    } else if segment.contains('\0') {
        Some(format!("{kind} contains a NUL byte"))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::invalid_path(segment, reason)),
        None => Ok(()),
    }
}

/// Append the document extension when missing, and validate the result.
pub fn normalize_filename(filename: &str) -> StoreResult<String> {
    validate_segment("filename", filename)?;
    if filename.ends_with(DOCUMENT_EXTENSION) {
        Ok(filename.to_string())
    } else {
        Ok(format!("{filename}{DOCUMENT_EXTENSION}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_dir() {
        let path = NamespacePath::new("testing", "unit");
        assert_eq!(path.to_string(), "testing/unit");
        assert_eq!(path.relative_dir(), PathBuf::from("testing/unit"));

        let nested = path.with_subtopic("mocks");
        assert_eq!(nested.to_string(), "testing/unit/mocks");
        assert_eq!(nested.relative_dir(), PathBuf::from("testing/unit/mocks"));
        assert_eq!(nested.topic_node(), NamespacePath::new("testing", "unit"));
    }

    #[test]
    fn test_structural_equality() {
        let a = NamespacePath::new("a", "b").with_subtopic("c");
        let b = NamespacePath::new("a".to_string(), "b".to_string()).with_subtopic("c");
        assert_eq!(a, b);
        assert_ne!(a, NamespacePath::new("a", "b"));
    }

    #[test]
    fn test_segment_validation() {
        assert!(validate_segment("domain", "code_style").is_ok());
        assert!(validate_segment("topic", "error-handling").is_ok());
        assert!(validate_segment("domain", "").is_err());
        assert!(validate_segment("domain", "..").is_err());
        assert!(validate_segment("topic", "a/b").is_err());
        assert!(NamespacePath::new("ok", "..").validate().is_err());
    }

    #[test]
    fn test_normalize_filename() {
        assert_eq!(normalize_filename("context").unwrap(), "context.md");
        assert_eq!(normalize_filename("context.md").unwrap(), "context.md");
        assert!(normalize_filename("../context.md").is_err());
    }
}
