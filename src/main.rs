use clap::Parser;
use console::style;
use std::path::Path;

use ghostkey::cli::commands::{codes, init, watch};
use ghostkey::cli::{Cli, Commands};
use ghostkey::config::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(Settings::default_config_path);

    match cli.command {
        // Init writes the file every other command reads
        Commands::Init { force } => {
            ghostkey::logging::init();
            init::run_init(&config_path, force)
        }
        Commands::Status => codes::run_status(&load_settings(&config_path)?),
        Commands::Peek => codes::run_peek(&load_settings(&config_path)?),
        Commands::Next => codes::run_next(&load_settings(&config_path)?),
        Commands::Add { codes: inputs } => codes::run_add(&load_settings(&config_path)?, inputs),
        Commands::ResetIndex { to } => codes::run_reset_index(&load_settings(&config_path)?, to),
        Commands::Config => init::run_config(&load_settings(&config_path)?, &config_path),
        Commands::Watch => {
            let settings = load_settings(&config_path)?;
            watch::run(config_path, settings).await
        }
    }
}

/// Load settings and start logging with the configured filter.
fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    let settings = Settings::load_from(config_path)?;
    ghostkey::logging::init_with_config(&settings.logging);
    ghostkey::debug_event!("cli", "config", "{}", config_path.display());
    Ok(settings)
}
