//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module and returns
//! `anyhow::Result` so `main` can report failures uniformly.

pub mod codes;
pub mod init;
pub mod watch;
