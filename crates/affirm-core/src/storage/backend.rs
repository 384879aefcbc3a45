//! Storage backend seam for the settings store.
//!
//! A backend is a small persistent object store keyed by record id, plus a
//! key-value side table for bookkeeping such as the active-record pointer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::settings::{AffirmationSettings, SettingsId};

/// Persistent object store for settings records.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether data survives a process restart.
    fn is_durable(&self) -> bool;

    /// Open the underlying storage and bring its schema up to date.
    ///
    /// Called exactly once, before any other method.
    async fn init(&self) -> Result<(), StoreError>;

    async fn get(&self, id: &SettingsId) -> Result<Option<AffirmationSettings>, StoreError>;

    /// All readable records in insertion order. Records that fail to decode
    /// are skipped with a warning.
    async fn get_all(&self) -> Result<Vec<AffirmationSettings>, StoreError>;

    /// Insert or replace by id in a single write.
    async fn put(&self, record: &AffirmationSettings) -> Result<(), StoreError>;

    /// Remove a record. Absent ids are not an error.
    async fn delete(&self, id: &SettingsId) -> Result<(), StoreError>;

    /// Remove every record and bookkeeping value without reading them.
    async fn clear(&self) -> Result<(), StoreError>;

    async fn meta_get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set or, with `None`, clear a bookkeeping value.
    async fn meta_set(&self, key: &str, value: Option<&str>) -> Result<(), StoreError>;
}

/// In-process backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<AffirmationSettings>>,
    meta: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("memory backend lock poisoned".into())
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_durable(&self) -> bool {
        false
    }

    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, id: &SettingsId) -> Result<Option<AffirmationSettings>, StoreError> {
        let records = self.records.lock().map_err(|_| Self::poisoned())?;
        Ok(records.iter().find(|r| &r.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<AffirmationSettings>, StoreError> {
        let records = self.records.lock().map_err(|_| Self::poisoned())?;
        Ok(records.clone())
    }

    async fn put(&self, record: &AffirmationSettings) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| Self::poisoned())?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    async fn delete(&self, id: &SettingsId) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| Self::poisoned())?;
        records.retain(|r| &r.id != id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.lock().map_err(|_| Self::poisoned())?.clear();
        self.meta.lock().map_err(|_| Self::poisoned())?.clear();
        Ok(())
    }

    async fn meta_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let meta = self.meta.lock().map_err(|_| Self::poisoned())?;
        Ok(meta.get(key).cloned())
    }

    async fn meta_set(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        let mut meta = self.meta.lock().map_err(|_| Self::poisoned())?;
        match value {
            Some(v) => {
                meta.insert(key.to_string(), v.to_string());
            }
            None => {
                meta.remove(key);
            }
        }
        Ok(())
    }
}
