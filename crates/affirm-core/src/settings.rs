//! The affirmation settings record.
//!
//! A single logical record per device holds the affirmation text, voice
//! parameters, goals and practice counters. Field names on the wire match the
//! JSON files produced by earlier versions of the app, so exported files keep
//! importing across releases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ValidationError;

/// Lower bound for playback rate.
pub const MIN_VOICE_SPEED: f64 = 0.5;
/// Upper bound for playback rate.
pub const MAX_VOICE_SPEED: f64 = 2.0;
pub const DEFAULT_VOICE_SPEED: f64 = 1.0;
pub const DEFAULT_VOICE_NAME: &str = "Samantha";
pub const DEFAULT_AFFIRMATION_TEXT: &str = "write your affirmation here";
pub const DEFAULT_DAILY_GOAL: u32 = 100;
pub const DEFAULT_STREAK_GOAL: u32 = 30;

/// Clamp a playback rate into `[MIN_VOICE_SPEED, MAX_VOICE_SPEED]`.
///
/// Non-finite input falls back to [`DEFAULT_VOICE_SPEED`].
pub fn clamp_voice_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.clamp(MIN_VOICE_SPEED, MAX_VOICE_SPEED)
    } else {
        DEFAULT_VOICE_SPEED
    }
}

/// Opaque identifier of a stored settings record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsId(String);

impl SettingsId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SettingsId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SettingsId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SettingsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Voice settings given to records the store creates on its own: the
/// first-launch seed, a reset, and imports missing a voice.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDefaults {
    pub voice_name: String,
    pub voice_speed: f64,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            voice_name: DEFAULT_VOICE_NAME.to_string(),
            voice_speed: DEFAULT_VOICE_SPEED,
        }
    }
}

/// Settings fields without an identity.
///
/// This is what callers hand to `SettingsStore::create` and what an import
/// decodes into; any `id` present in imported JSON is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDraft {
    pub affirmation_text: String,
    pub daily_goal: u32,
    pub streak_goal: u32,
    pub voice_speed: f64,
    #[serde(default)]
    pub voice_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_practice_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub daily_count: u32,
}

impl SettingsDraft {
    /// First-launch defaults, stamped as practiced at `now`.
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self::seeded(now, &RecordDefaults::default())
    }

    /// Default record using the configured voice.
    pub fn seeded(now: DateTime<Utc>, seed: &RecordDefaults) -> Self {
        Self {
            affirmation_text: DEFAULT_AFFIRMATION_TEXT.to_string(),
            daily_goal: DEFAULT_DAILY_GOAL,
            streak_goal: DEFAULT_STREAK_GOAL,
            voice_speed: clamp_voice_speed(seed.voice_speed),
            voice_name: seed.voice_name.clone(),
            last_practice_date: Some(now),
            current_streak: 0,
            daily_count: 0,
        }
    }

    /// Check the fields a user or an import file can get wrong.
    ///
    /// Voice speed is not range-checked here; it is clamped on write.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.affirmation_text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        if self.daily_goal == 0 {
            return Err(ValidationError::NonPositiveGoal { field: "daily_goal" });
        }
        if self.streak_goal == 0 {
            return Err(ValidationError::NonPositiveGoal { field: "streak_goal" });
        }
        if !self.voice_speed.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: "voice_speed".into(),
                message: "must be a finite number".into(),
            });
        }
        Ok(())
    }
}

/// A stored settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffirmationSettings {
    pub id: SettingsId,
    pub affirmation_text: String,
    pub daily_goal: u32,
    pub streak_goal: u32,
    pub voice_speed: f64,
    #[serde(default)]
    pub voice_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_practice_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub daily_count: u32,
}

impl AffirmationSettings {
    /// Attach an identity to a draft. Voice speed is clamped.
    pub fn from_draft(id: SettingsId, draft: SettingsDraft) -> Self {
        Self {
            id,
            affirmation_text: draft.affirmation_text,
            daily_goal: draft.daily_goal,
            streak_goal: draft.streak_goal,
            voice_speed: clamp_voice_speed(draft.voice_speed),
            voice_name: draft.voice_name,
            last_practice_date: draft.last_practice_date,
            current_streak: draft.current_streak,
            daily_count: draft.daily_count,
        }
    }

    pub fn to_draft(&self) -> SettingsDraft {
        SettingsDraft {
            affirmation_text: self.affirmation_text.clone(),
            daily_goal: self.daily_goal,
            streak_goal: self.streak_goal,
            voice_speed: self.voice_speed,
            voice_name: self.voice_name.clone(),
            last_practice_date: self.last_practice_date,
            current_streak: self.current_streak,
            daily_count: self.daily_count,
        }
    }
}

/// Partial update merged onto an existing record.
///
/// Absent fields are left untouched. The id can never be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affirmation_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak_goal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_practice_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_count: Option<u32>,
}

impl SettingsPatch {
    /// Validate the user-editable fields that are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(text) = &self.affirmation_text {
            if text.trim().is_empty() {
                return Err(ValidationError::EmptyText);
            }
        }
        if self.daily_goal == Some(0) {
            return Err(ValidationError::NonPositiveGoal { field: "daily_goal" });
        }
        if self.streak_goal == Some(0) {
            return Err(ValidationError::NonPositiveGoal { field: "streak_goal" });
        }
        Ok(())
    }

    /// Merge onto `record`, clamping voice speed.
    pub fn apply_to(&self, record: &AffirmationSettings) -> AffirmationSettings {
        let mut merged = record.clone();
        if let Some(text) = &self.affirmation_text {
            merged.affirmation_text = text.clone();
        }
        if let Some(goal) = self.daily_goal {
            merged.daily_goal = goal;
        }
        if let Some(goal) = self.streak_goal {
            merged.streak_goal = goal;
        }
        if let Some(speed) = self.voice_speed {
            merged.voice_speed = clamp_voice_speed(speed);
        }
        if let Some(name) = &self.voice_name {
            merged.voice_name = name.clone();
        }
        if let Some(date) = self.last_practice_date {
            merged.last_practice_date = Some(date);
        }
        if let Some(streak) = self.current_streak {
            merged.current_streak = streak;
        }
        if let Some(count) = self.daily_count {
            merged.daily_count = count;
        }
        merged
    }

    /// Build a patch that sets one user-editable field from text input.
    ///
    /// Counters and the practice date are not editable this way.
    pub fn from_field(field: &str, value: &str) -> Result<Self, ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: field.to_string(),
            message,
        };
        let mut patch = Self::default();
        match field {
            "affirmation_text" => patch.affirmation_text = Some(value.to_string()),
            "daily_goal" => {
                patch.daily_goal = Some(value.parse().map_err(|e| invalid(format!("{e}")))?)
            }
            "streak_goal" => {
                patch.streak_goal = Some(value.parse().map_err(|e| invalid(format!("{e}")))?)
            }
            "voice_speed" => {
                patch.voice_speed = Some(value.parse().map_err(|e| invalid(format!("{e}")))?)
            }
            "voice_name" => patch.voice_name = Some(value.to_string()),
            _ => return Err(invalid("not an editable settings field".into())),
        }
        patch.validate()?;
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record() -> AffirmationSettings {
        AffirmationSettings::from_draft(SettingsId::from("fixed"), SettingsDraft::defaults(Utc::now()))
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_voice_speed(0.1), MIN_VOICE_SPEED);
        assert_eq!(clamp_voice_speed(3.0), MAX_VOICE_SPEED);
        assert_eq!(clamp_voice_speed(1.25), 1.25);
        assert_eq!(clamp_voice_speed(f64::NAN), DEFAULT_VOICE_SPEED);
        assert_eq!(clamp_voice_speed(f64::INFINITY), DEFAULT_VOICE_SPEED);
    }

    #[test]
    fn defaults_are_valid() {
        let draft = SettingsDraft::defaults(Utc::now());
        assert!(draft.validate().is_ok());
        assert_eq!(draft.daily_goal, 100);
        assert_eq!(draft.streak_goal, 30);
        assert_eq!(draft.voice_name, "Samantha");
    }

    #[test]
    fn seeded_uses_configured_voice() {
        let seed = RecordDefaults {
            voice_name: "Daniel".into(),
            voice_speed: 3.0,
        };
        let draft = SettingsDraft::seeded(Utc::now(), &seed);
        assert_eq!(draft.voice_name, "Daniel");
        assert_eq!(draft.voice_speed, MAX_VOICE_SPEED);
        assert_eq!(draft.daily_goal, DEFAULT_DAILY_GOAL);
    }

    #[test]
    fn validate_rejects_blank_text_and_zero_goals() {
        let mut draft = SettingsDraft::defaults(Utc::now());
        draft.affirmation_text = "   ".into();
        assert_eq!(draft.validate(), Err(ValidationError::EmptyText));

        let mut draft = SettingsDraft::defaults(Utc::now());
        draft.streak_goal = 0;
        assert_eq!(
            draft.validate(),
            Err(ValidationError::NonPositiveGoal { field: "streak_goal" })
        );
    }

    #[test]
    fn patch_leaves_absent_fields_untouched() {
        let base = record();
        let patch = SettingsPatch {
            daily_goal: Some(12),
            ..Default::default()
        };
        let merged = patch.apply_to(&base);
        assert_eq!(merged.daily_goal, 12);
        assert_eq!(merged.id, base.id);
        assert_eq!(merged.affirmation_text, base.affirmation_text);
        assert_eq!(merged.current_streak, base.current_streak);
    }

    #[test]
    fn from_field_parses_and_rejects() {
        let patch = SettingsPatch::from_field("voice_speed", "1.5").unwrap();
        assert_eq!(patch.voice_speed, Some(1.5));
        assert!(SettingsPatch::from_field("daily_goal", "0").is_err());
        assert!(SettingsPatch::from_field("daily_goal", "ten").is_err());
        assert!(SettingsPatch::from_field("current_streak", "4").is_err());
        assert!(SettingsPatch::from_field("affirmation_text", "").is_err());
    }

    #[test]
    fn decodes_legacy_json_record() {
        let json = r#"{
            "id": "8f0e",
            "affirmation_text": "I am awesome!",
            "daily_goal": 15,
            "streak_goal": 30,
            "voice_speed": 1.2,
            "last_practice_date": "2024-11-02T08:15:00.000Z",
            "current_streak": 5,
            "daily_count": 8
        }"#;
        let record: AffirmationSettings = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_str(), "8f0e");
        assert_eq!(record.voice_name, "");
        assert_eq!(record.daily_count, 8);
        assert!(record.last_practice_date.is_some());
    }

    proptest! {
        #[test]
        fn patched_voice_speed_always_in_range(speed in -10.0f64..10.0) {
            let patch = SettingsPatch { voice_speed: Some(speed), ..Default::default() };
            let merged = patch.apply_to(&record());
            prop_assert!(merged.voice_speed >= MIN_VOICE_SPEED);
            prop_assert!(merged.voice_speed <= MAX_VOICE_SPEED);
            prop_assert_eq!(merged.voice_speed, speed.clamp(MIN_VOICE_SPEED, MAX_VOICE_SPEED));
        }
    }
}
