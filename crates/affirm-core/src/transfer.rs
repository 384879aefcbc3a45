//! Settings export and import.
//!
//! Exports wrap the active record in a versioned envelope:
//!
//! ```json
//! { "version": 2, "settings": { "affirmation_text": "...", ... } }
//! ```
//!
//! Imports accept the envelope (versions 1 and 2), a bare record, or an array
//! whose first element is a record. Every successful import creates a new
//! record with a fresh id; an existing record is never overwritten.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ImportError, StoreError};
use crate::settings::{AffirmationSettings, SettingsDraft, DEFAULT_VOICE_NAME};
use crate::storage::SettingsStore;

/// Envelope version written by [`export`].
pub const CURRENT_VERSION: u64 = 2;

/// Suggested file name for exported settings.
pub const EXPORT_FILE_NAME: &str = "affirmation_settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// `{version, settings}` envelope.
    #[default]
    Envelope,
    /// The bare record.
    Raw,
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u64,
    settings: &'a AffirmationSettings,
}

/// Serialize one record.
pub fn export_record(
    record: &AffirmationSettings,
    format: ExportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Envelope => serde_json::to_string_pretty(&Envelope {
            version: CURRENT_VERSION,
            settings: record,
        }),
        ExportFormat::Raw => serde_json::to_string_pretty(record),
    }
}

/// Serialize the active record.
pub async fn export(store: &SettingsStore, format: ExportFormat) -> Result<String, StoreError> {
    let record = store.active().await?;
    export_record(&record, format).map_err(|e| StoreError::Backend(e.to_string()))
}

/// Decode import text into a validated draft without touching storage.
///
/// Version 2 payloads without a voice get [`DEFAULT_VOICE_NAME`].
pub fn parse_import(text: &str) -> Result<SettingsDraft, ImportError> {
    parse_import_with_voice(text, DEFAULT_VOICE_NAME)
}

/// Like [`parse_import`], backfilling a missing voice with `default_voice`.
pub fn parse_import_with_voice(
    text: &str,
    default_voice: &str,
) -> Result<SettingsDraft, ImportError> {
    let parsed: Value = serde_json::from_str(text)
        .map_err(|e| ImportError::InvalidFormat(format!("not valid JSON: {e}")))?;

    let settings = match parsed {
        Value::Object(mut obj) => match obj.remove("version") {
            Some(version) => {
                let number = version.as_f64().ok_or_else(|| {
                    ImportError::InvalidFormat("envelope version must be a number".into())
                })?;
                let settings = obj.remove("settings").ok_or_else(|| {
                    ImportError::InvalidFormat("envelope has no settings".into())
                })?;
                // 2 and 2.0 are the same version.
                if number == 1.0 {
                    settings
                } else if number == 2.0 {
                    migrate_v2(settings, default_voice)
                } else {
                    return Err(ImportError::UnsupportedVersion(version.to_string()));
                }
            }
            None => Value::Object(obj),
        },
        Value::Array(items) => items.into_iter().next().ok_or_else(|| {
            ImportError::InvalidFormat("array contains no settings".into())
        })?,
        _ => {
            return Err(ImportError::InvalidFormat(
                "expected an object or an array".into(),
            ))
        }
    };

    if !settings.is_object() {
        return Err(ImportError::InvalidFormat("settings must be an object".into()));
    }
    let draft: SettingsDraft = serde_json::from_value(settings)
        .map_err(|e| ImportError::InvalidFormat(format!("unrecognized settings: {e}")))?;
    draft.validate()?;
    Ok(draft)
}

/// Version 2 payloads may omit `voice_name`; absent or null gets the default voice.
fn migrate_v2(mut settings: Value, default_voice: &str) -> Value {
    if let Value::Object(obj) = &mut settings {
        let missing = obj.get("voice_name").map_or(true, Value::is_null);
        if missing {
            obj.insert(
                "voice_name".to_string(),
                Value::String(default_voice.to_string()),
            );
        }
    }
    settings
}

/// Parse `text` and store it as a new, active record.
///
/// On any error the store is left unchanged.
pub async fn import(store: &SettingsStore, text: &str) -> Result<AffirmationSettings, ImportError> {
    let draft = match parse_import_with_voice(text, &store.defaults().voice_name) {
        Ok(draft) => draft,
        Err(e) => {
            tracing::warn!(error = %e, "settings import rejected");
            return Err(e);
        }
    };
    let record = store.create(draft).await?;
    tracing::info!(id = %record.id, "settings imported");
    Ok(record)
}
