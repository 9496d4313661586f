//! Init and Config commands.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Settings;
use crate::storage::CodeStore;

/// Write a default settings file, then create the storage it points at.
///
/// Storage is bootstrapped from the effective settings, so environment
/// overrides of the storage paths apply.
pub fn run_init(config_path: &Path, force: bool) -> Result<()> {
    Settings::init_config_file(config_path, force)?;
    println!("Created configuration file at: {}", config_path.display());

    let settings = Settings::load_from(config_path)?;
    let store = CodeStore::from_settings(&settings);
    store
        .bootstrap_if_needed()
        .context("Failed to create storage")?;

    println!("Codes file: {}", settings.storage.codes_path.display());
    println!("Edit the configuration file to customize your settings.");
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn run_config(config: &Settings, config_path: &Path) -> Result<()> {
    println!("Current Configuration ({}):", config_path.display());
    println!("{}", "=".repeat(50));
    let toml_str = toml::to_string_pretty(config).context("Error displaying config")?;
    println!("{toml_str}");
    Ok(())
}
