//! Persisting and loading a [`VectorIndex`].
//!
//! An index lives in a directory as a single `index.json`. Writes go to a
//! uniquely named temporary file in the same directory that is then renamed
//! over `index.json`, so readers see either the old or the new index.

use docrag_core::StoreError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::index::{VectorIndex, FORMAT_VERSION};

/// File name of the persisted index inside its directory.
pub const INDEX_FILE: &str = "index.json";

/// Path of the index file inside `dir`.
#[must_use]
pub fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

impl VectorIndex {
    /// Write the whole index into `dir`, replacing any previous index.
    pub async fn persist(&self, dir: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(dir).await?;

        let bytes = serde_json::to_vec(self)
            .map_err(|e| StoreError::Persist(format!("failed to serialize index: {e}")))?;

        let tmp = dir.join(format!(".{INDEX_FILE}.{}.tmp", Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, index_path(dir)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::Persist(format!("failed to replace index file: {e}")));
        }

        info!(
            "Persisted index of {} chunks to {:?} ({} bytes)",
            self.len(),
            dir,
            bytes.len()
        );
        Ok(())
    }

    /// Read the index persisted in `dir`.
    ///
    /// A missing or unusable index is [`StoreError::IndexNotFound`]; callers
    /// treat it as "no index yet" and rebuild.
    pub async fn load(dir: &Path) -> Result<Self, StoreError> {
        let path = index_path(dir);
        let not_found = |reason: String| StoreError::IndexNotFound {
            path: dir.to_path_buf(),
            reason,
        };

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No index file at {:?}", path);
                return Err(not_found(format!("missing {INDEX_FILE}")));
            }
            Err(e) => return Err(e.into()),
        };

        let index: VectorIndex = serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Index at {:?} is malformed: {}", path, e);
            not_found(format!("malformed {INDEX_FILE}: {e}"))
        })?;

        index.validate().map_err(not_found)?;

        info!(
            "Loaded index of {} chunks from {:?} (model {})",
            index.len(),
            dir,
            index.model()
        );
        Ok(index)
    }

    fn validate(&self) -> Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.entries.is_empty() {
            return Err("index has no entries".to_string());
        }
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.embedding.len() != self.dimension)
        {
            return Err(format!(
                "entry {} has dimension {}, index declares {}",
                entry.chunk_id,
                entry.embedding.len(),
                self.dimension
            ));
        }
        Ok(())
    }
}
