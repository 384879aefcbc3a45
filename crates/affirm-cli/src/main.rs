use affirm_core::storage::BackendKind;
use affirm_core::{App, AppConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod speech;

#[derive(Parser)]
#[command(name = "affirm", version, about = "Daily spoken affirmation practice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommand),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Commands that open the settings store.
#[derive(Subcommand)]
enum StoreCommand {
    /// Show today's progress and streak
    Status(commands::status::StatusArgs),
    /// Play the affirmation and adjust today's count
    Practice {
        #[command(subcommand)]
        action: commands::practice::PracticeAction,
    },
    /// Edit the active settings record
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Manage stored settings records
    Records {
        #[command(subcommand)]
        action: commands::records::RecordsAction,
    },
    /// Export the active settings as JSON
    Export(commands::transfer::ExportArgs),
    /// Import settings from a JSON file
    Import(commands::transfer::ImportArgs),
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_with_app(
    command: StoreCommand,
    config: AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let wants_durable = config.storage.backend == BackendKind::Sqlite;
    let (app, record) = App::launch(config).await?;
    tracing::debug!(
        backend = app.store().backend_name(),
        record = %record.id,
        "app launched"
    );
    if wants_durable && !app.store().is_durable() {
        eprintln!("warning: settings storage unavailable; changes will not be saved");
    }

    match command {
        StoreCommand::Status(args) => commands::status::run(&app, record, args),
        StoreCommand::Practice { action } => commands::practice::run(&app, record, action).await,
        StoreCommand::Settings { action } => commands::settings::run(&app, record, action).await,
        StoreCommand::Records { action } => commands::records::run(&app, action).await,
        StoreCommand::Export(args) => commands::transfer::export(&app, args).await,
        StoreCommand::Import(args) => commands::transfer::import(&app, args).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: {e}; using default configuration");
            AppConfig::default()
        }
    };
    init_tracing(&config);

    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Store(command) => run_with_app(command, config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
