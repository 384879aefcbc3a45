//! The settings store.
//!
//! Wraps a [`SettingsBackend`] with the record-level rules: ids are assigned
//! here, voice speed is clamped on every write, an empty store is seeded with
//! defaults, and one record is tracked as the active settings.

use chrono::Utc;
use tokio::sync::Mutex;

use super::backend::{MemoryBackend, SettingsBackend};
use crate::error::StoreError;
use crate::settings::{AffirmationSettings, RecordDefaults, SettingsDraft, SettingsId, SettingsPatch};

/// Key of the active-record pointer in the backend's side table.
const ACTIVE_ID_KEY: &str = "active_settings_id";

/// Persistent store for affirmation settings records.
///
/// A store only exists after [`SettingsStore::initialize`] has completed, so
/// every operation runs against a ready backend. Writes are serialized by an
/// internal lock; concurrent updates to the same record resolve as last
/// writer wins.
pub struct SettingsStore {
    backend: Box<dyn SettingsBackend>,
    write_lock: Mutex<()>,
    seed: RecordDefaults,
}

impl SettingsStore {
    /// Open `backend` and return a ready store.
    ///
    /// If the backend cannot be opened, the store falls back to an in-memory
    /// backend so callers can keep working; [`is_durable`](Self::is_durable)
    /// reports the degradation.
    pub async fn initialize(backend: Box<dyn SettingsBackend>) -> Self {
        let backend = match backend.init().await {
            Ok(()) => {
                tracing::info!(backend = backend.name(), "settings store initialized");
                backend
            }
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    error = %e,
                    "settings storage unavailable; falling back to in-memory defaults"
                );
                Box::new(MemoryBackend::new()) as Box<dyn SettingsBackend>
            }
        };
        Self {
            backend,
            write_lock: Mutex::new(()),
            seed: RecordDefaults::default(),
        }
    }

    /// Voice settings for records the store creates itself.
    pub fn with_defaults(mut self, seed: RecordDefaults) -> Self {
        self.seed = seed;
        self
    }

    pub fn defaults(&self) -> &RecordDefaults {
        &self.seed
    }

    /// A ready store that never persists.
    pub async fn in_memory() -> Self {
        Self::initialize(Box::new(MemoryBackend::new())).await
    }

    /// Whether records survive a restart.
    pub fn is_durable(&self) -> bool {
        self.backend.is_durable()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Persist `draft` under a fresh id and make it the active record.
    pub async fn create(&self, draft: SettingsDraft) -> Result<AffirmationSettings, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.create_locked(draft).await
    }

    async fn create_locked(&self, draft: SettingsDraft) -> Result<AffirmationSettings, StoreError> {
        let record = AffirmationSettings::from_draft(SettingsId::generate(), draft);
        self.backend.put(&record).await?;
        self.backend
            .meta_set(ACTIVE_ID_KEY, Some(record.id.as_str()))
            .await?;
        tracing::info!(id = %record.id, "settings record created");
        Ok(record)
    }

    /// All stored records.
    ///
    /// An empty store is seeded with one default record, which is persisted
    /// so its id can be updated.
    pub async fn list(&self) -> Result<Vec<AffirmationSettings>, StoreError> {
        let records = self.backend.get_all().await?;
        if !records.is_empty() {
            return Ok(records);
        }

        let _guard = self.write_lock.lock().await;
        // Another writer may have seeded while we waited.
        let records = self.backend.get_all().await?;
        if !records.is_empty() {
            return Ok(records);
        }
        tracing::info!("settings store empty; seeding defaults");
        let seeded = self
            .create_locked(SettingsDraft::seeded(Utc::now(), &self.seed))
            .await?;
        Ok(vec![seeded])
    }

    /// Fetch one record by id.
    pub async fn get(&self, id: &SettingsId) -> Result<AffirmationSettings, StoreError> {
        self.backend
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// The record the application should use.
    ///
    /// Follows the active pointer; when it is unset or dangling, the first
    /// listed record becomes active.
    pub async fn active(&self) -> Result<AffirmationSettings, StoreError> {
        if let Some(id) = self.backend.meta_get(ACTIVE_ID_KEY).await? {
            match self.backend.get(&SettingsId::from(id)).await {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => {}
                Err(StoreError::Corrupt { id, message }) => {
                    tracing::warn!(%id, %message, "active settings record unreadable");
                }
                Err(e) => return Err(e),
            }
        }

        let first = self
            .list()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("seeded store returned no records".into()))?;
        self.backend
            .meta_set(ACTIVE_ID_KEY, Some(first.id.as_str()))
            .await?;
        tracing::debug!(id = %first.id, "active settings pointer repaired");
        Ok(first)
    }

    /// Point the active settings at an existing record.
    pub async fn set_active(&self, id: &SettingsId) -> Result<AffirmationSettings, StoreError> {
        let _guard = self.write_lock.lock().await;
        let record = self.get(id).await?;
        self.backend.meta_set(ACTIVE_ID_KEY, Some(id.as_str())).await?;
        Ok(record)
    }

    /// Merge `patch` onto the stored record and write it back.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if no record has `id`.
    pub async fn update(
        &self,
        id: &SettingsId,
        patch: &SettingsPatch,
    ) -> Result<AffirmationSettings, StoreError> {
        self.modify(id, |_| patch.clone()).await
    }

    /// Atomic read-modify-write: `f` sees the current record and returns the
    /// patch to apply.
    pub async fn modify<F>(&self, id: &SettingsId, f: F) -> Result<AffirmationSettings, StoreError>
    where
        F: FnOnce(&AffirmationSettings) -> SettingsPatch + Send,
    {
        let _guard = self.write_lock.lock().await;
        let existing = self.get(id).await?;
        let patch = f(&existing);
        let merged = patch.apply_to(&existing);
        if merged != existing {
            self.backend.put(&merged).await?;
        }
        tracing::debug!(%id, "settings record updated");
        Ok(merged)
    }

    /// Remove a record. Deleting an unknown id is a no-op.
    pub async fn delete(&self, id: &SettingsId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.backend.delete(id).await?;
        if self.backend.meta_get(ACTIVE_ID_KEY).await?.as_deref() == Some(id.as_str()) {
            self.backend.meta_set(ACTIVE_ID_KEY, None).await?;
        }
        tracing::info!(%id, "settings record deleted");
        Ok(())
    }

    /// Delete every record, readable or not, and start over with defaults.
    pub async fn reset(&self) -> Result<AffirmationSettings, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.backend.clear().await?;
        tracing::info!("settings store cleared");
        self.create_locked(SettingsDraft::seeded(Utc::now(), &self.seed))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MAX_VOICE_SPEED, MIN_VOICE_SPEED};
    use crate::storage::SqliteBackend;
    use proptest::prelude::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn draft(text: &str) -> SettingsDraft {
        SettingsDraft {
            affirmation_text: text.to_string(),
            ..SettingsDraft::defaults(Utc::now())
        }
    }

    struct BrokenBackend;

    #[async_trait::async_trait]
    impl SettingsBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn is_durable(&self) -> bool {
            true
        }
        async fn init(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("storage disabled".into()))
        }
        async fn get(&self, _: &SettingsId) -> Result<Option<AffirmationSettings>, StoreError> {
            unreachable!("store must not use a backend that failed init")
        }
        async fn get_all(&self) -> Result<Vec<AffirmationSettings>, StoreError> {
            unreachable!("store must not use a backend that failed init")
        }
        async fn put(&self, _: &AffirmationSettings) -> Result<(), StoreError> {
            unreachable!("store must not use a backend that failed init")
        }
        async fn delete(&self, _: &SettingsId) -> Result<(), StoreError> {
            unreachable!("store must not use a backend that failed init")
        }
        async fn clear(&self) -> Result<(), StoreError> {
            unreachable!("store must not use a backend that failed init")
        }
        async fn meta_get(&self, _: &str) -> Result<Option<String>, StoreError> {
            unreachable!("store must not use a backend that failed init")
        }
        async fn meta_set(&self, _: &str, _: Option<&str>) -> Result<(), StoreError> {
            unreachable!("store must not use a backend that failed init")
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids() {
        let store = SettingsStore::in_memory().await;
        let a = store.create(draft("one")).await.unwrap();
        let b = store.create(draft("two")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_clamps_voice_speed() {
        let store = SettingsStore::in_memory().await;
        let mut d = draft("fast");
        d.voice_speed = 9.0;
        let record = store.create(d).await.unwrap();
        assert_eq!(record.voice_speed, MAX_VOICE_SPEED);
    }

    #[tokio::test]
    async fn list_seeds_empty_store_with_persisted_default() {
        let store = SettingsStore::in_memory().await;
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].affirmation_text, "write your affirmation here");

        // The seeded record is real: it can be updated.
        let patch = SettingsPatch {
            daily_goal: Some(5),
            ..Default::default()
        };
        let updated = store.update(&listed[0].id, &patch).await.unwrap();
        assert_eq!(updated.daily_goal, 5);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = SettingsStore::in_memory().await;
        let result = store
            .update(&SettingsId::from("missing"), &SettingsPatch::default())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_merges_and_keeps_id() {
        let store = SettingsStore::in_memory().await;
        let record = store.create(draft("before")).await.unwrap();
        let patch = SettingsPatch {
            affirmation_text: Some("after".into()),
            voice_speed: Some(0.1),
            ..Default::default()
        };
        let updated = store.update(&record.id, &patch).await.unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.affirmation_text, "after");
        assert_eq!(updated.voice_speed, MIN_VOICE_SPEED);
        assert_eq!(updated.daily_goal, record.daily_goal);
        assert_eq!(store.get(&record.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_clears_pointer() {
        let store = SettingsStore::in_memory().await;
        let first = store.create(draft("first")).await.unwrap();
        let second = store.create(draft("second")).await.unwrap();
        assert_eq!(store.active().await.unwrap().id, second.id);

        store.delete(&second.id).await.unwrap();
        store.delete(&second.id).await.unwrap();
        assert_eq!(store.active().await.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn set_active_switches_and_rejects_unknown() {
        let store = SettingsStore::in_memory().await;
        let first = store.create(draft("first")).await.unwrap();
        store.create(draft("second")).await.unwrap();

        store.set_active(&first.id).await.unwrap();
        assert_eq!(store.active().await.unwrap().id, first.id);
        assert!(matches!(
            store.set_active(&SettingsId::from("ghost")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reset_leaves_single_default() {
        let store = SettingsStore::in_memory().await;
        store.create(draft("a")).await.unwrap();
        store.create(draft("b")).await.unwrap();
        let fresh = store.reset().await.unwrap();
        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, fresh.id);
        assert_eq!(store.active().await.unwrap().id, fresh.id);
    }

    #[tokio::test]
    async fn seeding_and_reset_use_configured_defaults() {
        let seed = RecordDefaults {
            voice_name: "Daniel".into(),
            voice_speed: 1.5,
        };
        let store = SettingsStore::in_memory().await.with_defaults(seed);
        let seeded = store.active().await.unwrap();
        assert_eq!(seeded.voice_name, "Daniel");
        assert_eq!(seeded.voice_speed, 1.5);

        store.create(draft("other")).await.unwrap();
        let fresh = store.reset().await.unwrap();
        assert_eq!(fresh.voice_name, "Daniel");
        assert_eq!(fresh.voice_speed, 1.5);
        assert_eq!(store.list().await.unwrap(), vec![fresh]);
    }

    #[tokio::test]
    async fn corrupt_row_does_not_block_recovery() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.db");

        let store = SettingsStore::initialize(Box::new(SqliteBackend::new(&path))).await;
        let good = store.create(draft("good")).await.unwrap();
        drop(store);

        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO affirmation_settings (id, body, created_at) VALUES ('bad', 'not json', 0);
             DELETE FROM kv;",
        )
        .unwrap();
        drop(conn);

        let store = SettingsStore::initialize(Box::new(SqliteBackend::new(&path))).await;
        assert!(store.is_durable());
        assert_eq!(store.list().await.unwrap(), vec![good.clone()]);
        assert_eq!(store.active().await.unwrap().id, good.id);

        // A pointer at the unreadable row is repaired too.
        store.set_active(&good.id).await.unwrap();
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute("UPDATE kv SET value = 'bad' WHERE key = 'active_settings_id'", [])
            .unwrap();
        drop(conn);
        assert_eq!(store.active().await.unwrap().id, good.id);

        let fresh = store.reset().await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![fresh]);
        let conn = rusqlite::Connection::open(&path).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM affirmation_settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn unavailable_backend_degrades_to_memory() {
        let store = SettingsStore::initialize(Box::new(BrokenBackend)).await;
        assert!(!store.is_durable());
        assert_eq!(store.backend_name(), "memory");
        let active = store.active().await.unwrap();
        assert_eq!(active.daily_goal, 100);
    }

    #[tokio::test]
    async fn concurrent_modifies_do_not_lose_increments() {
        let store = Arc::new(SettingsStore::initialize(Box::new(SqliteBackend::in_memory())).await);
        let id = store.active().await.unwrap().id;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .modify(&id, |r| SettingsPatch {
                        daily_count: Some(r.daily_count + 1),
                        ..Default::default()
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get(&id).await.unwrap().daily_count, 10);
    }

    proptest! {
        #[test]
        fn stored_voice_speed_is_clamped(speed in -5.0f64..5.0) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = SettingsStore::in_memory().await;
                let id = store.active().await.unwrap().id;
                let patch = SettingsPatch { voice_speed: Some(speed), ..Default::default() };
                store.update(&id, &patch).await.unwrap();
                let stored = store.get(&id).await.unwrap();
                assert_eq!(stored.voice_speed, speed.clamp(MIN_VOICE_SPEED, MAX_VOICE_SPEED));
            });
        }
    }
}
