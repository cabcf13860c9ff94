//! Key/value storage tiers backing the persistence layer.
//!
//! A tier stores raw strings under string keys, like browser storage. The
//! durable tier survives restarts; the session tier lives as long as one tab.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait StorageTier: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process tier. Clones share the same backing map, which is how two
/// sessions in one process observe the same durable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTier {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageTier for MemoryTier {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory tier lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory tier lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory tier lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Durable tier writing one file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileTier {
    root: PathBuf,
}

impl FileTier {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last write time of an entry, if it exists.
    pub fn modified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("Failed reading metadata for {:?}", path))?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

impl StorageTier for FileTier {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)
            .with_context(|| format!("Failed reading storage entry {:?}", path))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed creating storage directory {:?}", self.root))?;
        let path = self.path_for(key);
        let mut file = fs::File::create(&path)
            .with_context(|| format!("Failed opening storage entry {:?}", path))?;
        file.write_all(value.as_bytes())
            .with_context(|| format!("Failed writing storage entry {:?}", path))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed removing storage entry {:?}", path))?;
        }
        Ok(())
    }
}
