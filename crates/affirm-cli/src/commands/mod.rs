pub mod config;
pub mod practice;
pub mod records;
pub mod settings;
pub mod status;
pub mod transfer;

use affirm_core::AffirmationSettings;
use affirm_core::Progress;

/// Two-line progress summary shared by several commands.
pub(crate) fn print_progress(record: &AffirmationSettings) {
    let progress = Progress::of(record);
    let daily_mark = if progress.daily_goal_met() { " (goal met)" } else { "" };
    let streak_mark = if progress.streak_goal_met() { " (goal met)" } else { "" };
    println!(
        "Today: {} / {}{daily_mark}",
        progress.daily_count, progress.daily_goal
    );
    println!(
        "Streak: {} / {} days{streak_mark}",
        progress.current_streak, progress.streak_goal
    );
}
