//! Persistence layer for tokens, vehicle identity and settings
//!
//! The companion keeps everything it must remember across restarts in a flat
//! string key/value store. `FileStore` writes a JSON object to disk on every
//! change; `MemoryStore` backs tests and ephemeral runs.

use crate::error::Result;
use crate::logging::get_logger;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Opaque get/set/remove store
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// JSON-file backed store with write-through semantics
pub struct FileStore {
    file_path: PathBuf,
    values: BTreeMap<String, String>,
    logger: crate::logging::StructuredLogger,
}

impl FileStore {
    /// Open the store, loading existing contents if the file is present
    pub fn open<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let logger = get_logger("persistence");
        let file_path = file_path.as_ref().to_path_buf();

        let values = if file_path.exists() {
            let contents = std::fs::read_to_string(&file_path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                let values: BTreeMap<String, String> = serde_json::from_str(&contents)?;
                logger.info(&format!("Loaded {} persisted keys", values.len()));
                values
            }
        } else {
            logger.info("No persistent store found, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            file_path,
            values,
            logger,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.file_path, contents)?;
        self.logger.debug("Saved persistent store to disk");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}
