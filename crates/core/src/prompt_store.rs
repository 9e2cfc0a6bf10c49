//! Prompt Store
//!
//! Holds the single operator-configured persona string. The file-backed store
//! keeps it as `{"prompt": "..."}` and replaces the whole file on every write,
//! so concurrent readers see either the old or the new value, never a partial
//! one. Writers are serialized so only one temp file is in flight at a time.

use crate::persona::{Preset, UnknownPreset};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum PromptStoreError {
    #[error("prompt store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("prompt store file {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    UnknownPreset(#[from] UnknownPreset),
}

/// Read/write access to the persona instruction.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Returns the configured persona, or an empty string if none was ever set.
    async fn get(&self) -> Result<String, PromptStoreError>;

    /// Replaces the configured persona.
    async fn set(&self, prompt: String) -> Result<(), PromptStoreError>;
}

/// Writes the named preset's instruction into `store` and returns it.
///
/// An unknown name is reported without touching the store.
pub async fn apply_preset(
    store: &dyn PromptStore,
    name: &str,
) -> Result<&'static str, PromptStoreError> {
    let preset: Preset = name.parse()?;
    let instruction = preset.instruction();
    store.set(instruction.to_string()).await?;
    info!(preset = %preset, "Preset applied");
    Ok(instruction)
}

#[derive(Serialize, Deserialize, Default)]
struct PromptRecord {
    #[serde(default)]
    prompt: String,
}

/// A `PromptStore` persisted as a single JSON record on disk.
pub struct FilePromptStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePromptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PromptStoreError {
        PromptStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads the record, or `None` if the file does not exist yet.
    async fn read_record(&self) -> Result<Option<PromptRecord>, PromptStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PromptStoreError::Malformed {
                path: self.path.clone(),
                source,
            })
    }

    /// Writes the record to a sibling temp file, then renames it into place.
    ///
    /// Callers must hold `write_lock`.
    async fn write_record(&self, record: &PromptRecord) -> Result<(), PromptStoreError> {
        let json = serde_json::to_vec(record).map_err(|source| PromptStoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "prompt_store.json".into());
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[async_trait]
impl PromptStore for FilePromptStore {
    async fn get(&self) -> Result<String, PromptStoreError> {
        if let Some(record) = self.read_record().await? {
            return Ok(record.prompt);
        }

        let _guard = self.write_lock.lock().await;
        // Another caller may have created or set it while we waited.
        if let Some(record) = self.read_record().await? {
            return Ok(record.prompt);
        }
        debug!(path = %self.path.display(), "Prompt store missing, creating it");
        self.write_record(&PromptRecord::default()).await?;
        Ok(String::new())
    }

    async fn set(&self, prompt: String) -> Result<(), PromptStoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_record(&PromptRecord { prompt }).await?;
        info!(path = %self.path.display(), "Prompt updated");
        Ok(())
    }
}

/// A `PromptStore` kept in memory, for tests and local development.
#[derive(Default)]
pub struct InMemoryPromptStore {
    prompt: RwLock<String>,
}

impl InMemoryPromptStore {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: RwLock::new(prompt.into()),
        }
    }
}

#[async_trait]
impl PromptStore for InMemoryPromptStore {
    async fn get(&self) -> Result<String, PromptStoreError> {
        Ok(self.prompt.read().await.clone())
    }

    async fn set(&self, prompt: String) -> Result<(), PromptStoreError> {
        *self.prompt.write().await = prompt;
        Ok(())
    }
}
