//! Application root.
//!
//! Owns the store for the lifetime of one launch and runs the load-time
//! rollover exactly once, before anything renders progress.

use chrono::{DateTime, Local, TimeZone};

use crate::error::StoreError;
use crate::settings::AffirmationSettings;
use crate::storage::{open_store, AppConfig, SettingsStore};
use crate::streak::{Rollover, StreakEngine};

pub struct App {
    pub config: AppConfig,
    store: SettingsStore,
    launch_rollover: Rollover,
}

impl App {
    /// Open the configured store and apply today's rollover.
    pub async fn launch(config: AppConfig) -> Result<(Self, AffirmationSettings), StoreError> {
        let store = open_store(&config).await;
        Self::with_store(config, store, &Local::now()).await
    }

    /// Launch on an already initialized store at a given instant.
    pub async fn with_store<Tz>(
        config: AppConfig,
        store: SettingsStore,
        now: &DateTime<Tz>,
    ) -> Result<(Self, AffirmationSettings), StoreError>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        let (record, rollover) = StreakEngine::run_on_load(&store, now).await?;
        let app = Self {
            config,
            store,
            launch_rollover: rollover,
        };
        Ok((app, record))
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// What the launch-time rollover decided.
    pub fn launch_rollover(&self) -> Rollover {
        self.launch_rollover
    }

    /// Re-read the active record.
    pub async fn active(&self) -> Result<AffirmationSettings, StoreError> {
        self.store.active().await
    }
}
