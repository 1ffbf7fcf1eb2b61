//! The context tree: a `domain/topic[/subtopic]` hierarchy of markdown
//! documents under `<project>/.bitranger/context-tree`.

pub(crate) mod fsutil;
pub mod path;
pub mod render;
pub mod stats;
pub mod store;

pub use path::{
    normalize_filename, validate_segment, NamespacePath, CONTEXT_FILENAME, DOCUMENT_EXTENSION,
};
pub use render::TREE_HEADER;
pub use stats::{DomainStats, TreeStats};
pub use store::{ContextTreeStore, BITRANGER_DIR};
