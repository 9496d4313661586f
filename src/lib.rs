//! ghostkey: a local queue of one-time codes.
//!
//! Codes live in a plain-text file, one per line. The store hands them
//! out in order, the watcher reloads when the file changes underneath,
//! and the status monitor warns as the supply runs low.

pub mod band;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod logging;
pub mod notifications;
pub mod paste;
pub mod status;
pub mod storage;
pub mod utils;
pub mod watcher;

pub use band::{BandTracker, ColorBand, Thresholds};
pub use config::Settings;
pub use daemon::{Daemon, SettingsChange};
pub use notifications::{Alert, AlertBroadcaster, Notifier};
pub use paste::{CodeSink, PasteOutcome, StdoutSink, paste_next};
pub use status::{StatusMonitor, StatusReport};
pub use storage::{CodeStore, ConsumeMode, StorageError, StorageResult, StorePaths};
pub use watcher::{ChangeKind, ChangeSource, FileWatcher, ManualSource, NotifySource, WatchError};
