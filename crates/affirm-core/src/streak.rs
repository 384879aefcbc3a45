//! Daily streak rollover.
//!
//! Runs once per application load. Calendar days are compared in the time
//! zone of the supplied `now`, so a practice late in the evening and a load
//! early the next morning count as consecutive days for the user, whatever
//! the UTC offset.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::settings::{AffirmationSettings, SettingsPatch};
use crate::storage::SettingsStore;

/// Outcome of comparing the last practice date with today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rollover {
    /// Already practiced today; counters are left alone.
    SameDay,
    /// Last practice was yesterday; the streak grows.
    Continued { streak: u32 },
    /// A gap of two or more days, or no practice on record.
    Broken { previous_streak: u32 },
}

impl Rollover {
    pub fn changed(&self) -> bool {
        !matches!(self, Rollover::SameDay)
    }
}

/// Decides how counters change when a new calendar day starts.
pub struct StreakEngine;

impl StreakEngine {
    /// Compare `record.last_practice_date` against `now`.
    pub fn evaluate<Tz: TimeZone>(record: &AffirmationSettings, now: &DateTime<Tz>) -> Rollover {
        let today = now.date_naive();
        let last_day = record
            .last_practice_date
            .map(|last| last.with_timezone(&now.timezone()).date_naive());

        match last_day {
            Some(day) if day == today => Rollover::SameDay,
            Some(day) if Some(day) == previous_day(today) => Rollover::Continued {
                streak: record.current_streak.saturating_add(1),
            },
            _ => Rollover::Broken {
                previous_streak: record.current_streak,
            },
        }
    }

    /// The patch that applies `rollover`, or `None` when nothing changes.
    pub fn patch_for<Tz: TimeZone>(rollover: Rollover, now: &DateTime<Tz>) -> Option<SettingsPatch> {
        let stamp = now.with_timezone(&Utc);
        let streak = match rollover {
            Rollover::SameDay => return None,
            Rollover::Continued { streak } => streak,
            Rollover::Broken { .. } => 0,
        };
        Some(SettingsPatch {
            current_streak: Some(streak),
            daily_count: Some(0),
            last_practice_date: Some(stamp),
            ..Default::default()
        })
    }

    /// Evaluate and apply a rollover to `record` without touching storage.
    pub fn roll<Tz: TimeZone>(
        record: &AffirmationSettings,
        now: &DateTime<Tz>,
    ) -> (AffirmationSettings, Rollover) {
        let rollover = Self::evaluate(record, now);
        let next = match Self::patch_for(rollover, now) {
            Some(patch) => patch.apply_to(record),
            None => record.clone(),
        };
        (next, rollover)
    }

    /// Run the load-time check against the active record and write back any
    /// correction. Returns the record as re-read from the store.
    pub async fn run_on_load<Tz>(
        store: &SettingsStore,
        now: &DateTime<Tz>,
    ) -> Result<(AffirmationSettings, Rollover), StoreError>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        let record = store.active().await?;
        let rollover = Self::evaluate(&record, now);

        match Self::patch_for(rollover, now) {
            Some(patch) => {
                store.update(&record.id, &patch).await?;
                tracing::info!(id = %record.id, ?rollover, "streak rollover applied");
            }
            None => tracing::debug!(id = %record.id, "practiced today; no rollover"),
        }

        let refreshed = store.get(&record.id).await?;
        Ok((refreshed, rollover))
    }
}

fn previous_day(day: NaiveDate) -> Option<NaiveDate> {
    day.checked_sub_days(Days::new(1))
}
