//! Corpus scanning.

use docrag_core::DocumentKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// A recognized file in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute or caller-relative path used to read the file
    pub path: PathBuf,
    /// Path relative to the corpus root, `/`-separated
    pub source: String,
    pub kind: DocumentKind,
}

/// Walk `root` recursively and list files with a recognized extension.
///
/// Hidden entries (names starting with `.`) are skipped. The result is sorted
/// by source. A missing root yields an empty list.
pub async fn scan_corpus(root: &Path) -> std::io::Result<Vec<SourceFile>> {
    if !fs::try_exists(root).await? {
        warn!("Data directory {:?} does not exist", root);
        return Ok(vec![]);
    }

    let mut files = walk(root, vec![root.to_path_buf()]).await?;
    files.sort_by(|a, b| a.source.cmp(&b.source));
    debug!("Found {} files under {:?}", files.len(), root);
    Ok(files)
}

/// Collect recognized files under each directory in `pending`.
///
/// Only a failure to read `root` itself is an error; unreadable
/// subdirectories and entries are logged and skipped.
async fn walk(root: &Path, mut pending: Vec<PathBuf>) -> std::io::Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if dir.as_path() == root => return Err(e),
            Err(e) => {
                warn!("Skipping unreadable directory {:?}: {}", dir, e);
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped listing {:?}: {}", dir, e);
                    break;
                }
            };

            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }

            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }

            match DocumentKind::from_path(&path) {
                Some(kind) => {
                    let source = source_name(root, &path);
                    files.push(SourceFile { path, source, kind });
                }
                None => debug!("Ignoring unrecognized file {:?}", path),
            }
        }
    }

    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Path relative to `root`, joined with `/` on every platform.
fn source_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
