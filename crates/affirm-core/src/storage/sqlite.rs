//! SQLite-backed settings storage.
//!
//! Records are stored as JSON bodies keyed by id, so adding a field to the
//! record never needs a schema migration. Blocking rusqlite calls run on the
//! tokio blocking pool.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use super::backend::SettingsBackend;
use super::migrations;
use crate::error::StoreError;
use crate::settings::{AffirmationSettings, SettingsId};

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Settings storage in a single SQLite database file.
pub struct SqliteBackend {
    location: Location,
    conn: OnceLock<Arc<Mutex<Connection>>>,
}

impl SqliteBackend {
    /// Backend for the database at `path`. Nothing is opened until `init`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: OnceLock::new(),
        }
    }

    /// Backend on a private in-memory database (for tests).
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: OnceLock::new(),
        }
    }

    fn open_connection(location: &Location) -> Result<Connection, StoreError> {
        let conn = match location {
            Location::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::Unavailable(format!("{}: {e}", parent.display()))
                    })?;
                }
                Connection::open(path)
                    .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?
            }
            Location::Memory => Connection::open_in_memory()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
        };
        migrations::migrate(&conn).map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        Ok(conn)
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self
            .conn
            .get()
            .cloned()
            .ok_or_else(|| StoreError::Unavailable("database not initialized".into()))?;
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("connection lock poisoned".into()))?;
            f(&guard)
        })
        .await?
    }

    fn decode(id: String, body: &str) -> Result<AffirmationSettings, StoreError> {
        let mut record: AffirmationSettings =
            serde_json::from_str(body).map_err(|e| StoreError::Corrupt {
                id: id.clone(),
                message: e.to_string(),
            })?;
        record.id = SettingsId::from(id);
        Ok(record)
    }
}

#[async_trait]
impl SettingsBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn is_durable(&self) -> bool {
        matches!(self.location, Location::File(_))
    }

    async fn init(&self) -> Result<(), StoreError> {
        if self.conn.get().is_some() {
            return Ok(());
        }
        let location = self.location.clone();
        let conn = tokio::task::spawn_blocking(move || Self::open_connection(&location)).await??;
        let _ = self.conn.set(Arc::new(Mutex::new(conn)));
        tracing::debug!(location = ?self.location, "sqlite settings database ready");
        Ok(())
    }

    async fn get(&self, id: &SettingsId) -> Result<Option<AffirmationSettings>, StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM affirmation_settings WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            body.map(|b| Self::decode(id, &b)).transpose()
        })
        .await
    }

    async fn get_all(&self) -> Result<Vec<AffirmationSettings>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, body FROM affirmation_settings ORDER BY created_at, id")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut records = Vec::new();
            for row in rows {
                let (id, body) = row?;
                match Self::decode(id, &body) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!(error = %e, "skipping unreadable settings record"),
                }
            }
            Ok(records)
        })
        .await
    }

    async fn put(&self, record: &AffirmationSettings) -> Result<(), StoreError> {
        let id = record.id.as_str().to_string();
        let body = serde_json::to_string(record).map_err(|e| StoreError::Backend(e.to_string()))?;
        tracing::debug!(%id, "sqlite put");
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO affirmation_settings (id, body, created_at)
                 VALUES (?1, ?2, COALESCE((SELECT MAX(created_at) FROM affirmation_settings), 0) + 1)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body",
                params![id, body],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &SettingsId) -> Result<(), StoreError> {
        let id = id.as_str().to_string();
        tracing::debug!(%id, "sqlite delete");
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM affirmation_settings WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        tracing::debug!("sqlite clear");
        self.with_conn(|conn| {
            conn.execute_batch("DELETE FROM affirmation_settings; DELETE FROM kv;")?;
            Ok(())
        })
        .await
    }

    async fn meta_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn meta_set(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.map(str::to_string);
        self.with_conn(move |conn| {
            match value {
                Some(v) => conn.execute(
                    "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                    params![key, v],
                )?,
                None => conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?,
            };
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsDraft;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(id: &str) -> AffirmationSettings {
        AffirmationSettings::from_draft(SettingsId::from(id), SettingsDraft::defaults(Utc::now()))
    }

    #[tokio::test]
    async fn operations_before_init_report_unavailable() {
        let backend = SqliteBackend::in_memory();
        let result = backend.get_all().await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn put_get_roundtrip_keeps_insertion_order() {
        let backend = SqliteBackend::in_memory();
        backend.init().await.unwrap();
        backend.put(&record("zeta")).await.unwrap();
        backend.put(&record("alpha")).await.unwrap();

        let mut updated = record("zeta");
        updated.current_streak = 3;
        backend.put(&updated).await.unwrap();

        let all = backend.get_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
        assert_eq!(all[0].current_streak, 3);

        let fetched = backend.get(&SettingsId::from("alpha")).await.unwrap();
        assert!(fetched.is_some());
        assert!(backend.get(&SettingsId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.db");

        let backend = SqliteBackend::new(&path);
        backend.init().await.unwrap();
        backend.put(&record("keep")).await.unwrap();
        backend.meta_set("active_settings_id", Some("keep")).await.unwrap();
        drop(backend);

        let reopened = SqliteBackend::new(&path);
        reopened.init().await.unwrap();
        assert!(reopened.is_durable());
        assert_eq!(reopened.get_all().await.unwrap().len(), 1);
        assert_eq!(
            reopened.meta_get("active_settings_id").await.unwrap().as_deref(),
            Some("keep")
        );
    }

    #[tokio::test]
    async fn unopenable_path_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let backend = SqliteBackend::new(blocker.join("nested").join("settings.db"));
        let result = backend.init().await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn corrupt_body_is_reported_and_skipped_in_listing() {
        let backend = SqliteBackend::in_memory();
        backend.init().await.unwrap();
        backend
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO affirmation_settings (id, body, created_at) VALUES ('bad', 'not json', 1)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let result = backend.get(&SettingsId::from("bad")).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));

        backend.put(&record("good")).await.unwrap();
        let all = backend.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id.as_str(), "good");

        backend.clear().await.unwrap();
        let rows: i64 = backend
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM affirmation_settings", [], |row| {
                    row.get(0)
                })?)
            })
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }
}
