//! Practice actions and progress.
//!
//! Counter changes from the practice screen go through the store's atomic
//! read-modify-write, so two quick presses never lose an increment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CoreError, StoreError};
use crate::settings::{AffirmationSettings, SettingsId, SettingsPatch};
use crate::speech::{SpeechEngine, VoiceService};
use crate::storage::SettingsStore;

/// Progress toward the daily and streak goals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub daily_count: u32,
    pub daily_goal: u32,
    pub current_streak: u32,
    pub streak_goal: u32,
}

impl Progress {
    pub fn of(record: &AffirmationSettings) -> Self {
        Self {
            daily_count: record.daily_count,
            daily_goal: record.daily_goal,
            current_streak: record.current_streak,
            streak_goal: record.streak_goal,
        }
    }

    pub fn daily_goal_met(&self) -> bool {
        self.daily_count >= self.daily_goal
    }

    pub fn streak_goal_met(&self) -> bool {
        self.current_streak >= self.streak_goal
    }

    /// Fraction of the daily goal done, capped at 1.0.
    pub fn daily_ratio(&self) -> f64 {
        ratio(self.daily_count, self.daily_goal)
    }

    pub fn streak_ratio(&self) -> f64 {
        ratio(self.current_streak, self.streak_goal)
    }
}

fn ratio(done: u32, goal: u32) -> f64 {
    if goal == 0 {
        return 1.0;
    }
    (f64::from(done) / f64::from(goal)).min(1.0)
}

/// Apply `delta` to today's count, flooring at zero.
pub fn adjusted_count(count: u32, delta: i64) -> u32 {
    let next = i64::from(count).saturating_add(delta).max(0);
    u32::try_from(next).unwrap_or(u32::MAX)
}

/// Manual +/- adjustment. Streak and practice date are untouched.
pub async fn adjust_daily_count(
    store: &SettingsStore,
    id: &SettingsId,
    delta: i64,
) -> Result<AffirmationSettings, StoreError> {
    store
        .modify(id, |record| SettingsPatch {
            daily_count: Some(adjusted_count(record.daily_count, delta)),
            ..Default::default()
        })
        .await
}

/// Count one repetition and stamp `now` as the last practice, so the next
/// load's rollover sees "practiced today".
pub async fn record_play(
    store: &SettingsStore,
    id: &SettingsId,
    now: DateTime<Utc>,
) -> Result<AffirmationSettings, StoreError> {
    store
        .modify(id, |record| SettingsPatch {
            daily_count: Some(adjusted_count(record.daily_count, 1)),
            last_practice_date: Some(now),
            ..Default::default()
        })
        .await
}

/// Speak the affirmation `repetitions` times, counting each one.
///
/// Waits `pause` between repetitions. Returns the record after the last
/// counted repetition.
pub async fn play_loop<E: SpeechEngine>(
    store: &SettingsStore,
    voice: &mut VoiceService<E>,
    id: &SettingsId,
    repetitions: u32,
    pause: Duration,
) -> Result<AffirmationSettings, CoreError> {
    let mut latest = store.get(id).await?;
    for n in 0..repetitions {
        if n > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        voice.speak()?;
        latest = record_play(store, id, Utc::now()).await?;
        tracing::debug!(repetition = n + 1, count = latest.daily_count, "repetition counted");
    }
    Ok(latest)
}
