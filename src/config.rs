//! Configuration module for ghostkey.
//!
//! Settings are built once at startup and passed by reference. Layers:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (config path only)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `GK_` and use double
//! underscores to separate nested levels:
//! - `GK_THRESHOLDS__YELLOW=50` sets `thresholds.yellow`
//! - `GK_STORAGE__CONSUME_MODE=indexed` sets `storage.consume_mode`
//! - `GK_WATCHER__DEBOUNCE_MS=80` sets `watcher.debounce_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::band::Thresholds;
use crate::storage::{ConsumeMode, StorePaths};

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV_VAR: &str = "GHOSTKEY_CONFIG";

const ENV_PREFIX: &str = "GK_";
const APP_DIR: &str = "ghostkey";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Configuration file already exists at {0}. Use --force to overwrite")]
    AlreadyExists(PathBuf),

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Where codes (and the cursor index) live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remaining-count cutoffs for the color bands
    #[serde(default)]
    pub thresholds: Thresholds,

    /// How a code is delivered to the focused application
    #[serde(default)]
    pub paste: PasteConfig,

    /// Global hotkey that triggers a paste
    #[serde(default)]
    pub hotkey: HotkeyConfig,

    /// File watcher timings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Plain-text codes file, one code per line
    #[serde(default = "default_codes_path")]
    pub codes_path: PathBuf,

    /// JSON cursor file (indexed mode only)
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// `destructive` removes consumed codes, `indexed` advances a cursor
    #[serde(default)]
    pub consume_mode: ConsumeMode,
}

impl StorageConfig {
    pub fn paths(&self) -> StorePaths {
        StorePaths::new(self.codes_path.clone(), self.index_path.clone())
    }
}

/// Keystroke strategy used by the paste action.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PasteMethod {
    /// Put the code on the clipboard and send Cmd+V.
    #[default]
    Clipboard,
    /// Type the digits one key at a time.
    TypeDigits,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PasteConfig {
    #[serde(default)]
    pub method: PasteMethod,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Command,
    Option,
    Control,
    Shift,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HotkeyConfig {
    /// Virtual key code (16 = Y on ANSI layouts)
    #[serde(default = "default_hotkey_code")]
    pub code: u32,

    #[serde(default = "default_hotkey_modifiers")]
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatcherConfig {
    /// Quiet period before a burst of writes triggers one reload
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Delay before re-opening a file that was deleted or renamed over
    #[serde(default = "default_rebind_delay_ms")]
    pub rebind_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
fn default_codes_path() -> PathBuf {
    default_data_dir().join("codes.txt")
}
fn default_index_path() -> PathBuf {
    default_data_dir().join("index.json")
}
fn default_hotkey_code() -> u32 {
    16
}
fn default_hotkey_modifiers() -> Vec<Modifier> {
    vec![Modifier::Control, Modifier::Option, Modifier::Command]
}
fn default_debounce_ms() -> u64 {
    50
}
fn default_rebind_delay_ms() -> u64 {
    100
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            storage: StorageConfig::default(),
            thresholds: Thresholds::default(),
            paste: PasteConfig::default(),
            hotkey: HotkeyConfig::default(),
            watcher: WatcherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            codes_path: default_codes_path(),
            index_path: default_index_path(),
            consume_mode: ConsumeMode::default(),
        }
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            code: default_hotkey_code(),
            modifiers: default_hotkey_modifiers(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            rebind_delay_ms: default_rebind_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Default settings file: `<config dir>/ghostkey/settings.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("settings.toml")
    }

    /// Load configuration from all sources.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore becomes a dot for nested keys
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)?;

        settings
            .thresholds
            .validate()
            .map_err(ConfigError::InvalidThresholds)?;

        Ok(settings)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string).map_err(write_err)?;

        Ok(())
    }

    /// Write a default settings file unless one exists (or `force`).
    pub fn init_config_file(path: impl AsRef<Path>, force: bool) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !force && path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }

        let settings = Settings::default();
        settings.save(path)?;
        Ok(settings)
    }
}
