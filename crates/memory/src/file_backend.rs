//! File-based turn store: one pretty-printed JSON document.
//!
//! Layout: `{"conversations": [...], "user_preferences": {...}}`, readable by
//! hand and compatible with `memory.json` files from earlier versions.
//!
//! Storage location: `~/.jarvis/memory.json` unless configured otherwise.

use async_trait::async_trait;
use jarvis_core::error::MemoryError;
use jarvis_core::memory::{MemoryDocument, TurnStore};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A JSON-file-backed store for the memory document.
///
/// The whole document is rewritten on every save. Writes go to a sibling
/// temp file first and are renamed into place, so a crash mid-write leaves
/// the previous document intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Where an unparsable document is moved so the next save cannot
    /// overwrite it.
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "memory.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TurnStore for JsonFileStore {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn load(&self) -> Result<MemoryDocument, MemoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            // File doesn't exist yet, start empty
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MemoryDocument::default());
            }
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(MemoryDocument::default());
        }

        let document: MemoryDocument = match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                let aside = self.corrupt_path();
                match tokio::fs::rename(&self.path, &aside).await {
                    Ok(()) => warn!(
                        path = %self.path.display(),
                        moved_to = %aside.display(),
                        "Unparsable memory file set aside"
                    ),
                    Err(rename_err) => warn!(
                        path = %self.path.display(),
                        error = %rename_err,
                        "Failed to set aside unparsable memory file"
                    ),
                }
                return Err(MemoryError::Corrupt(format!("{}: {e}", self.path.display())));
            }
        };

        debug!(
            path = %self.path.display(),
            turns = document.conversations.len(),
            "Memory file loaded"
        );
        Ok(document)
    }

    async fn save(&self, document: &MemoryDocument) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(document).map_err(|e| {
            MemoryError::Storage(format!("Failed to serialize memory document: {e}"))
        })?;

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to replace memory file: {e}")))?;

        Ok(())
    }
}
