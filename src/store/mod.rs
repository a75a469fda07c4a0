// src/store/mod.rs
pub mod json_file;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone};

use crate::error::StoreError;

pub use json_file::JsonFileStore;

/// Persistent record of delivered items.
#[async_trait::async_trait]
pub trait SeenStore: Send + Sync {
    /// `key` is an identifier or a title, depending on the dedup key in use.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
    /// Duplicate inserts are tolerated.
    async fn insert(&self, identifier: &str, title: &str) -> Result<(), StoreError>;
}

/// In-process store. Both columns are matched by `exists`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    keys: Mutex<HashSet<String>>,
    inserts: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(identifier, title)` pair inserted so far, in order.
    pub fn inserted(&self) -> Vec<(String, String)> {
        self.inserts.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl SeenStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.keys.lock().expect("store mutex poisoned").contains(key))
    }

    async fn insert(&self, identifier: &str, title: &str) -> Result<(), StoreError> {
        {
            let mut keys = self.keys.lock().expect("store mutex poisoned");
            keys.insert(identifier.to_string());
            keys.insert(title.to_string());
        }
        self.inserts
            .lock()
            .expect("store mutex poisoned")
            .push((identifier.to_string(), title.to_string()));
        Ok(())
    }
}

/// Write the run timestamp to `path` (`%Y-%m-%d %H:%M:%S`).
pub async fn write_last_check<Tz>(path: &Path, at: &DateTime<Tz>) -> Result<(), StoreError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, at.format("%Y-%m-%d %H:%M:%S").to_string()).await?;
    Ok(())
}
