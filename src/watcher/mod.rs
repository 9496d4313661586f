//! File watching with debounce and rebind-on-replace.
//!
//! Editors rarely write a file in place: they write a temp file and
//! rename it over the original, or delete and recreate it. A watch bound
//! to the old file goes quiet after that, so the watcher re-opens it.
//!
//! # Architecture
//!
//! ```text
//! FileWatcher
//!   - one ChangeSource watch per path (NotifySource or ManualSource)
//!   - Debouncer for write bursts
//!   - rebind queue for delete/rename
//!         |
//!     on_change()
//! ```

mod debouncer;
mod error;
mod file_watcher;
mod source;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use file_watcher::{FileWatcher, FileWatcherBuilder};
pub use source::{
    ChangeEvent, ChangeKind, ChangeSource, EventSender, ManualSource, NotifySource, WatchHandle,
};
