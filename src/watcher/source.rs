//! Change sources: where file events come from.
//!
//! `FileWatcher` only needs a way to start watching a single path and a
//! way to stop. `NotifySource` does this with the OS watcher,
//! `ManualSource` lets callers inject events themselves.

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::WatchError;

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Content changed in place.
    Write,
    /// The file was deleted.
    Remove,
    /// The file was renamed, or something was renamed over it.
    Rename,
}

impl ChangeKind {
    /// Map a notify event kind; `None` for events that never need a reload.
    pub fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Rename),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) | EventKind::Create(_) => Some(ChangeKind::Write),
            EventKind::Remove(_) => Some(ChangeKind::Remove),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The watched path (not necessarily the path notify reported).
    pub path: PathBuf,
    pub kind: ChangeKind,
}

pub type EventSender = mpsc::UnboundedSender<ChangeEvent>;

/// Live watch on one path; dropping it stops the watch.
pub struct WatchHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop watching now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Capability to watch a single path.
pub trait ChangeSource: Send + Sync + 'static {
    /// Start watching `path`, sending every relevant change to `events`.
    fn watch(&self, path: &Path, events: EventSender) -> Result<WatchHandle, WatchError>;
}

/// OS-backed source: one `notify::RecommendedWatcher` per path.
///
/// The watch is bound to the file itself, so once the file is replaced by
/// a rename the watch goes stale and must be re-established.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifySource;

impl ChangeSource for NotifySource {
    fn watch(&self, path: &Path, events: EventSender) -> Result<WatchHandle, WatchError> {
        let watched = path.to_path_buf();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if let Some(kind) = ChangeKind::from_event_kind(&event.kind) {
                        let _ = events.send(ChangeEvent {
                            path: watched.clone(),
                            kind,
                        });
                    }
                }
                Err(e) => {
                    tracing::error!("[watcher] file watch error: {e}");
                }
            }
        })?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(WatchHandle::new(move || drop(watcher)))
    }
}

#[derive(Debug, Default)]
struct ManualState {
    next_id: u64,
    subscribers: HashMap<PathBuf, Vec<(u64, EventSender)>>,
    watch_calls: HashMap<PathBuf, usize>,
    unavailable: HashSet<PathBuf>,
}

/// In-process source driven by `emit`.
///
/// Clones share state, so one clone can be handed to a `FileWatcher`
/// while another injects events and inspects active watches.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    inner: Arc<Mutex<ManualState>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every live watch on `path`.
    ///
    /// Returns how many watches received it.
    pub fn emit(&self, path: impl AsRef<Path>, kind: ChangeKind) -> usize {
        let path = path.as_ref();
        let state = self.inner.lock();
        let Some(subscribers) = state.subscribers.get(path) else {
            return 0;
        };

        subscribers
            .iter()
            .filter(|(_, tx)| {
                tx.send(ChangeEvent {
                    path: path.to_path_buf(),
                    kind,
                })
                .is_ok()
            })
            .count()
    }

    /// Make `watch` fail for `path`, as if it could not be opened.
    pub fn set_unavailable(&self, path: impl AsRef<Path>, unavailable: bool) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.inner.lock();
        if unavailable {
            state.unavailable.insert(path);
        } else {
            state.unavailable.remove(&path);
        }
    }

    /// Number of live watches on `path`.
    pub fn active_watches(&self, path: impl AsRef<Path>) -> usize {
        self.inner
            .lock()
            .subscribers
            .get(path.as_ref())
            .map_or(0, Vec::len)
    }

    /// Number of live watches across all paths.
    pub fn total_active(&self) -> usize {
        self.inner.lock().subscribers.values().map(Vec::len).sum()
    }

    /// How many times a watch on `path` was successfully established.
    pub fn watch_calls(&self, path: impl AsRef<Path>) -> usize {
        self.inner
            .lock()
            .watch_calls
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }
}

impl ChangeSource for ManualSource {
    fn watch(&self, path: &Path, events: EventSender) -> Result<WatchHandle, WatchError> {
        let mut state = self.inner.lock();
        if state.unavailable.contains(path) {
            return Err(WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: "unavailable".to_string(),
            });
        }

        let id = state.next_id;
        state.next_id += 1;
        state
            .subscribers
            .entry(path.to_path_buf())
            .or_default()
            .push((id, events));
        *state.watch_calls.entry(path.to_path_buf()).or_default() += 1;

        let inner = Arc::clone(&self.inner);
        let path = path.to_path_buf();
        Ok(WatchHandle::new(move || {
            let mut state = inner.lock();
            if let Some(subscribers) = state.subscribers.get_mut(&path) {
                subscribers.retain(|(sub_id, _)| *sub_id != id);
                if subscribers.is_empty() {
                    state.subscribers.remove(&path);
                }
            }
        }))
    }
}
