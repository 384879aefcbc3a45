use affirm_core::{App, SettingsId};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum RecordsAction {
    /// List stored settings records; the active one is marked with '*'
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a record (no error if it does not exist)
    Delete { id: String },
    /// Make a record the active settings
    Activate { id: String },
}

pub async fn run(app: &App, action: RecordsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RecordsAction::List { json } => {
            let records = app.store().list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            let active = app.active().await?;
            for record in records {
                let mark = if record.id == active.id { "*" } else { " " };
                println!(
                    "{mark} {}  streak {:>3}  today {:>3}  {}",
                    record.id, record.current_streak, record.daily_count, record.affirmation_text
                );
            }
        }
        RecordsAction::Delete { id } => {
            app.store().delete(&SettingsId::from(id)).await?;
            println!("ok");
        }
        RecordsAction::Activate { id } => {
            let record = app.store().set_active(&SettingsId::from(id)).await?;
            println!("active: {}", record.id);
        }
    }
    Ok(())
}
