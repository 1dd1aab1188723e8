//! Per-user archive storage.
//!
//! Each user owns a small key space:
//! - `watch-history-{year}`: JSON array of that year's entries
//! - `watch-history`: every imported entry, kept as a backup
//! - `available-years`: JSON array of years, most recent first

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use wrapped_common::{Result, UserId, WatchHistoryEntry, WrappedError};

/// Key of the undifferentiated backup.
pub const BACKUP_KEY: &str = "watch-history";

/// Key of the available-years list.
pub const AVAILABLE_YEARS_KEY: &str = "available-years";

/// Key holding one year's entries.
pub fn year_key(year: i32) -> String {
    format!("watch-history-{year}")
}

/// Key-value storage scoped by user.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Reads a raw value; `None` when the key does not exist.
    async fn read(&self, user: &UserId, key: &str) -> Result<Option<String>>;

    /// Writes a raw value, replacing any previous one.
    async fn write(&self, user: &UserId, key: &str, value: String) -> Result<()>;

    /// Loads one year's entries, failing with `NoData` when absent.
    async fn load_year(&self, user: &UserId, year: i32) -> Result<Vec<WatchHistoryEntry>> {
        let raw = self
            .read(user, &year_key(year))
            .await?
            .ok_or_else(|| WrappedError::no_data(year))?;
        let entries: Vec<WatchHistoryEntry> = serde_json::from_str(&raw)?;
        debug!(user = %user, year, entries = entries.len(), "Loaded year");
        Ok(entries)
    }

    /// Persists one year's entries.
    async fn save_year(
        &self,
        user: &UserId,
        year: i32,
        entries: &[WatchHistoryEntry],
    ) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.write(user, &year_key(year), raw).await
    }

    /// Persists the undifferentiated backup.
    async fn save_backup(&self, user: &UserId, entries: &[WatchHistoryEntry]) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.write(user, BACKUP_KEY, raw).await
    }

    /// Years with stored entries, most recent first; empty when none.
    async fn available_years(&self, user: &UserId) -> Result<Vec<i32>> {
        match self.read(user, AVAILABLE_YEARS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persists the available-years list, sorted most recent first.
    async fn save_available_years(&self, user: &UserId, years: &[i32]) -> Result<()> {
        let mut years = years.to_vec();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        let raw = serde_json::to_string(&years)?;
        self.write(user, AVAILABLE_YEARS_KEY, raw).await
    }
}

/// Stores each key as `<data_dir>/<user>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileArchiveStore {
    root: PathBuf,
}

impl FileArchiveStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, user: &UserId, key: &str) -> PathBuf {
        self.root.join(user.as_str()).join(format!("{key}.json"))
    }
}

#[async_trait]
impl ArchiveStore for FileArchiveStore {
    #[instrument(skip(self), fields(user = %user))]
    async fn read(&self, user: &UserId, key: &str) -> Result<Option<String>> {
        let path = self.path_for(user, key);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WrappedError::storage_with_source(
                format!("Failed to read {}", path.display()),
                e,
            )),
        }
    }

    #[instrument(skip(self, value), fields(user = %user, bytes = value.len()))]
    async fn write(&self, user: &UserId, key: &str, value: String) -> Result<()> {
        let path = self.path_for(user, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                WrappedError::storage_with_source(
                    format!("Failed to create {}", parent.display()),
                    e,
                )
            })?;
        }

        // Readers never observe a partially written value.
        let temp = path.with_extension("json.tmp");
        tokio::fs::write(&temp, value).await.map_err(|e| {
            WrappedError::storage_with_source(format!("Failed to write {}", temp.display()), e)
        })?;
        tokio::fs::rename(&temp, &path).await.map_err(|e| {
            WrappedError::storage_with_source(format!("Failed to replace {}", path.display()), e)
        })?;
        debug!(path = %path.display(), "Wrote archive key");
        Ok(())
    }
}

/// In-memory store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryArchiveStore {
    values: RwLock<HashMap<(UserId, String), String>>,
}

impl MemoryArchiveStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all users.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchiveStore {
    async fn read(&self, user: &UserId, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(&(user.clone(), key.to_string())).cloned())
    }

    async fn write(&self, user: &UserId, key: &str, value: String) -> Result<()> {
        self.values
            .write()
            .insert((user.clone(), key.to_string()), value);
        Ok(())
    }
}
