//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

fn heading(text: &str) -> String {
    if console::colors_enabled() {
        console::style(text).cyan().bold().to_string()
    } else {
        text.to_string()
    }
}

/// Help text with a quick-start section up front.
fn create_custom_help() -> String {
    let mut help = String::new();

    help.push_str(&format!("{}\n", heading("Quick Start:")));
    help.push_str("  $ ghostkey init                  # Write settings, create the codes file\n");
    help.push_str("  $ ghostkey add 123456 654321     # Append codes\n");
    help.push_str("  $ ghostkey next                  # Print the next code and consume it\n");
    help.push_str("  $ ghostkey watch                 # Follow edits and warn when low\n\n");

    help.push_str("Hand out one-time codes in order from a plain-text file.\n\n");

    help.push_str(&heading("Usage:"));
    help.push_str(" ghostkey [OPTIONS] <COMMAND>\n\n");

    help.push_str(&format!("{}\n", heading("Commands:")));
    help.push_str("  init          Write a default settings file and create storage\n");
    help.push_str("  status        Show remaining codes and the color band\n");
    help.push_str("  peek          Print the next code without consuming it\n");
    help.push_str("  next          Deliver the next code and consume it (alias: paste)\n");
    help.push_str("  add           Append codes (from arguments or stdin)\n");
    help.push_str("  reset-index   Move the cursor (indexed mode only)\n");
    help.push_str("  config        Display active settings\n");
    help.push_str("  watch         Reload on file changes and report status\n");
    help.push_str("  help          Print this message or the help of the given subcommand(s)\n\n");

    help.push_str(&format!("{}\n", heading("Options:")));
    help.push_str("  -c, --config <CONFIG>  Path to settings.toml [env: GHOSTKEY_CONFIG]\n");
    help.push_str("  -h, --help             Print help\n");
    help.push_str("  -V, --version          Print version\n");

    help
}

/// One-time code queue
#[derive(Parser, Debug)]
#[command(
    name = "ghostkey",
    version = env!("CARGO_PKG_VERSION"),
    about = "One-time code queue",
    long_about = "Hand out one-time codes in order from a plain-text file.",
    next_line_help = true,
    styles = clap_cargo_style(),
    override_help = create_custom_help()
)]
pub struct Cli {
    /// Path to settings.toml
    #[arg(short, long, global = true, env = "GHOSTKEY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default settings file and create the storage files
    Init {
        /// Overwrite an existing settings file
        #[arg(short, long)]
        force: bool,
    },

    /// Show remaining codes and the color band
    Status,

    /// Print the next code without consuming it
    Peek,

    /// Deliver the next code and consume it
    #[command(alias = "paste")]
    Next,

    /// Append codes to the end of the queue
    Add {
        /// Codes to append; read from stdin (one per line) when omitted
        codes: Vec<String>,
    },

    /// Move the cursor (indexed mode only)
    ResetIndex {
        /// New cursor position, clamped to the number of codes
        #[arg(long, default_value_t = 0)]
        to: usize,
    },

    /// Display active settings
    Config,

    /// Reload on file changes and report status until Ctrl-C
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_paste_alias() {
        let cli = Cli::try_parse_from(["ghostkey", "paste"]).unwrap();
        assert!(matches!(cli.command, Commands::Next));
    }

    #[test]
    fn test_add_and_reset_args() {
        let cli = Cli::try_parse_from(["ghostkey", "add", "123456", "7654321"]).unwrap();
        match cli.command {
            Commands::Add { codes } => assert_eq!(codes, vec!["123456", "7654321"]),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["ghostkey", "reset-index", "--to", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::ResetIndex { to: 3 }));

        let cli = Cli::try_parse_from(["ghostkey", "reset-index"]).unwrap();
        assert!(matches!(cli.command, Commands::ResetIndex { to: 0 }));
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["ghostkey", "status", "--config", "/tmp/gk.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/gk.toml")));
    }

    #[test]
    fn test_config_env_var_name() {
        let command = Cli::command();
        let arg = command
            .get_arguments()
            .find(|a| a.get_id() == "config")
            .unwrap();
        assert_eq!(
            arg.get_env(),
            Some(std::ffi::OsStr::new(crate::config::CONFIG_ENV_VAR))
        );
    }
}
