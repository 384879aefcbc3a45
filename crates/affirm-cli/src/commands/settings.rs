use affirm_core::{AffirmationSettings, App, SettingsPatch};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the active settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one field: affirmation_text, daily_goal, streak_goal, voice_speed, voice_name
    Set {
        field: String,
        value: String,
    },
    /// Discard all records and start over with defaults
    Reset,
}

fn print_settings(record: &AffirmationSettings) {
    println!("Affirmation: {}", record.affirmation_text);
    println!("Daily goal:  {}", record.daily_goal);
    println!("Streak goal: {} days", record.streak_goal);
    let voice = if record.voice_name.is_empty() {
        "(default)"
    } else {
        record.voice_name.as_str()
    };
    println!("Voice:       {voice}");
    println!("Voice speed: {}x", record.voice_speed);
    match record.last_practice_date {
        Some(date) => println!("Last practice: {}", date.to_rfc3339()),
        None => println!("Last practice: never"),
    }
}

pub async fn run(
    app: &App,
    record: AffirmationSettings,
    action: SettingsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SettingsAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_settings(&record);
            }
        }
        SettingsAction::Set { field, value } => {
            let patch = SettingsPatch::from_field(&field, &value)?;
            let updated = app.store().update(&record.id, &patch).await?;
            if let Some(requested) = patch.voice_speed {
                if requested != updated.voice_speed {
                    eprintln!("note: voice_speed clamped to {}", updated.voice_speed);
                }
            }
            println!("ok");
        }
        SettingsAction::Reset => {
            let fresh = app.store().reset().await?;
            println!("settings reset to defaults");
            print_settings(&fresh);
        }
    }
    Ok(())
}
