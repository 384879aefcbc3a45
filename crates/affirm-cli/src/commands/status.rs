use affirm_core::{AffirmationSettings, App, Progress, Rollover};
use clap::Args;
use serde::Serialize;

#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    settings: &'a AffirmationSettings,
    progress: Progress,
    rollover: Rollover,
    durable: bool,
}

pub fn run(
    app: &App,
    record: AffirmationSettings,
    args: StatusArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        let report = StatusReport {
            settings: &record,
            progress: Progress::of(&record),
            rollover: app.launch_rollover(),
            durable: app.store().is_durable(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let rollover = app.launch_rollover();
    if rollover.changed() {
        match rollover {
            Rollover::Continued { streak } => println!("New day! Streak continues: {streak} days"),
            Rollover::Broken { previous_streak } if previous_streak > 0 => {
                println!("Streak reset (was {previous_streak} days)")
            }
            _ => println!("New day, fresh start."),
        }
        println!();
    }

    super::print_progress(&record);
    println!();
    println!("{}", record.affirmation_text);
    Ok(())
}
