mod backend;
mod config;
pub mod migrations;
mod sqlite;
mod store;

pub use backend::{MemoryBackend, SettingsBackend};
pub use config::{AppConfig, BackendKind, LoggingConfig, PracticeConfig, SpeechConfig, StorageConfig};
pub use sqlite::SqliteBackend;
pub use store::SettingsStore;

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::settings::RecordDefaults;

/// Returns the data directory, creating it if needed.
///
/// `AFFIRM_DATA_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/affirm[-dev]/`, with `AFFIRM_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("AFFIRM_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("AFFIRM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("affirm-dev")
            } else {
                base_dir.join("affirm")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Build the configured backend and run the one-time initialization.
///
/// When the durable backend cannot be opened the returned store runs on an
/// in-memory backend instead; check [`SettingsStore::is_durable`].
pub async fn open_store(config: &AppConfig) -> SettingsStore {
    open_backend(&config.storage)
        .await
        .with_defaults(RecordDefaults::from(&config.speech))
}

async fn open_backend(config: &StorageConfig) -> SettingsStore {
    match config.backend {
        BackendKind::Memory => SettingsStore::initialize(Box::new(MemoryBackend::new())).await,
        BackendKind::Sqlite => {
            let path = match data_dir() {
                Ok(dir) => dir.join(&config.database_file),
                Err(e) => {
                    tracing::warn!(error = %e, "no data directory; settings will not persist");
                    return SettingsStore::initialize(Box::new(MemoryBackend::new())).await;
                }
            };
            SettingsStore::initialize(Box::new(SqliteBackend::new(path))).await
        }
    }
}
