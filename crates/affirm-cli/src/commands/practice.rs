//! Practice commands: playback and manual count adjustment.

use affirm_core::practice;
use affirm_core::{AffirmationSettings, App, VoiceService};
use clap::Subcommand;
use std::time::Duration;

use crate::speech::TerminalSpeech;

#[derive(Subcommand)]
pub enum PracticeAction {
    /// Speak the affirmation and count each repetition
    Play {
        /// Number of repetitions (loop mode when greater than 1)
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Speak the affirmation once without counting it
    Preview,
    /// Add one to today's count
    Increment,
    /// Subtract one from today's count (never below zero)
    Decrement,
}

fn voice_for(app: &App, record: &AffirmationSettings) -> VoiceService<TerminalSpeech> {
    let default_voice = app.config.speech.default_voice.clone();
    let mut voices = vec![default_voice.clone()];
    if !record.voice_name.is_empty() && record.voice_name != default_voice {
        voices.push(record.voice_name.clone());
    }
    VoiceService::for_settings(TerminalSpeech::new(voices, default_voice), record)
}

pub async fn run(
    app: &App,
    record: AffirmationSettings,
    action: PracticeAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let updated = match action {
        PracticeAction::Play { repeat } => {
            let max = app.config.practice.max_repetitions.max(1);
            let repetitions = repeat.clamp(1, max);
            if repetitions < repeat {
                eprintln!("warning: repetitions capped at {max}");
            }
            let pause = Duration::from_millis(app.config.practice.loop_pause_ms);
            let mut voice = voice_for(app, &record);
            practice::play_loop(app.store(), &mut voice, &record.id, repetitions, pause).await?
        }
        PracticeAction::Preview => {
            let mut voice = voice_for(app, &record);
            voice.speak()?;
            return Ok(());
        }
        PracticeAction::Increment => {
            practice::adjust_daily_count(app.store(), &record.id, 1).await?
        }
        PracticeAction::Decrement => {
            practice::adjust_daily_count(app.store(), &record.id, -1).await?
        }
    };

    super::print_progress(&updated);
    Ok(())
}
