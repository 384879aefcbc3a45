//! # Affirm Core Library
//!
//! Core logic for a daily spoken-affirmation practice app. The CLI binary is a
//! thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Settings**: a single active settings record (text, voice, goals, counters)
//! - **Storage**: [`SettingsStore`] over a pluggable async backend (SQLite or
//!   in-memory) plus TOML-based configuration
//! - **Streak**: once-per-load calendar-day rollover of the practice streak
//! - **Practice**: counter adjustments and looped playback
//! - **Transfer**: versioned JSON export/import with migration
//! - **Speech**: the playback capability consumed by the practice screen
//!
//! ## Key Components
//!
//! - [`App`]: launch sequence (open store, roll over, hand back the record)
//! - [`SettingsStore`]: record persistence
//! - [`StreakEngine`]: rollover decision
//! - [`VoiceService`]: utterance state over a [`SpeechEngine`]

pub mod app;
pub mod error;
pub mod practice;
pub mod settings;
pub mod speech;
pub mod storage;
pub mod streak;
pub mod transfer;

pub use app::App;
pub use error::{ConfigError, CoreError, ImportError, SpeechError, StoreError, ValidationError};
pub use practice::Progress;
pub use settings::{AffirmationSettings, RecordDefaults, SettingsDraft, SettingsId, SettingsPatch};
pub use speech::{SpeechEngine, Utterance, VoiceConfig, VoiceService};
pub use storage::{AppConfig, SettingsStore};
pub use streak::{Rollover, StreakEngine};
pub use transfer::ExportFormat;
