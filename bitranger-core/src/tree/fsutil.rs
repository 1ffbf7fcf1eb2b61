//! Filesystem helpers shared by the store and the config artifact.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Which directory entries a listing keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Dir,
    /// Regular files whose name ends with the given suffix.
    File(&'static str),
}

/// Sorted entry names of `dir`, or an empty list when `dir` does not exist.
///
/// Hidden entries are skipped. Any other IO failure is returned, so callers
/// that aggregate never produce partial results.
pub(crate) async fn list_names(dir: &Path, kind: EntryKind) -> io::Result<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().await?;
        let keep = match kind {
            EntryKind::Dir => file_type.is_dir(),
            EntryKind::File(suffix) => file_type.is_file() && name.ends_with(suffix),
        };
        if keep {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Write `bytes` to `path` through a temp file in the same directory and a
/// rename, creating parent directories first.
///
/// A concurrent reader sees either the previous content or the new content.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_sibling(path);
    let result = async {
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, path).await
    }
    .await;

    if result.is_err() {
        if let Err(e) = fs::remove_file(&temp_path).await {
            debug!(path = %temp_path.display(), error = %e, "temp file cleanup failed");
        }
    }
    result
}

/// Remove `dir` if it is empty; anything else is left alone.
pub(crate) async fn remove_dir_if_empty(dir: &Path) {
    if let Err(e) = fs::remove_dir(dir).await {
        debug!(dir = %dir.display(), error = %e, "directory kept");
    }
}

/// `context.md` → `.context.md.<uuid>.tmp`; hidden, so listings skip it.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()))
}
