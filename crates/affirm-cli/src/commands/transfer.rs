//! Export/import commands.

use affirm_core::transfer::{self, EXPORT_FILE_NAME};
use affirm_core::{App, ExportFormat};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ExportArgs {
    /// Write to this file instead of stdout (a directory gets affirmation_settings.json)
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Write the bare record without the versioned envelope
    #[arg(long)]
    raw: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file produced by `export` or by an earlier version of the app
    path: PathBuf,
}

pub async fn export(app: &App, args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let format = if args.raw {
        ExportFormat::Raw
    } else {
        ExportFormat::Envelope
    };
    let json = transfer::export(app.store(), format).await?;

    match args.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(EXPORT_FILE_NAME)
            } else {
                path
            };
            std::fs::write(&path, json)?;
            eprintln!("exported to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub async fn import(app: &App, args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.path)?;
    let record = transfer::import(app.store(), &text).await?;
    println!("imported as {}", record.id);
    super::print_progress(&record);
    Ok(())
}
