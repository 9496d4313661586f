//! Debounced, rebinding file watcher.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep, sleep_until};

use super::debouncer::Debouncer;
use super::error::WatchError;
use super::source::{ChangeEvent, ChangeKind, ChangeSource, EventSender, NotifySource, WatchHandle};
use crate::config::WatcherConfig;

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct Bindings {
    /// Paths the owner asked for, in order, without duplicates.
    paths: Vec<PathBuf>,
    /// Live watches; a path that could not be opened has no entry.
    handles: HashMap<PathBuf, WatchHandle>,
}

/// State shared between the `FileWatcher` handle and its event loop.
struct Shared {
    source: Box<dyn ChangeSource>,
    bindings: Mutex<Bindings>,
    events: EventSender,
}

impl Shared {
    fn bind(&self, bindings: &mut Bindings, path: &Path) {
        match self.source.watch(path, self.events.clone()) {
            Ok(handle) => {
                crate::debug_event!("watcher", "watching", "{}", path.display());
                bindings.handles.insert(path.to_path_buf(), handle);
            }
            Err(e) => {
                crate::debug_event!("watcher", "skipped", "{e}");
            }
        }
    }

    /// Drop every watch, then watch `paths`. Returns the number of live watches.
    fn replace_all(&self, paths: Vec<PathBuf>) -> usize {
        let mut bindings = self.bindings.lock();
        bindings.handles.clear();

        let mut seen = HashSet::new();
        bindings.paths = paths
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        for path in bindings.paths.clone() {
            self.bind(&mut bindings, &path);
        }
        bindings.handles.len()
    }

    /// Recreate the watch on `path`. False when the path is no longer tracked.
    fn rebind(&self, path: &Path) -> bool {
        let mut bindings = self.bindings.lock();
        if !bindings.paths.iter().any(|p| p == path) {
            return false;
        }
        bindings.handles.remove(path);
        self.bind(&mut bindings, path);
        true
    }

    fn shutdown(&self) {
        let mut bindings = self.bindings.lock();
        bindings.handles.clear();
        bindings.paths.clear();
    }
}

/// Watches a set of files and invokes a callback once per logical change.
///
/// - Writes are debounced: a burst of events yields one callback.
/// - Delete/rename (the save pattern of most editors) re-opens the watch on
///   the same path after a short delay, then invokes the callback.
/// - Dropping the watcher cancels every underlying watch.
pub struct FileWatcher {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl FileWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> FileWatcherBuilder {
        FileWatcherBuilder::new()
    }

    /// Tear down all watches and watch `paths` instead.
    ///
    /// Paths that cannot be opened are skipped. Returns the number of live
    /// watches.
    pub fn update_paths(&self, paths: Vec<PathBuf>) -> usize {
        let active = self.shared.replace_all(paths);
        crate::log_event!("watcher", "updated paths", "{active} watched");
        active
    }

    /// Paths currently requested (watched or not).
    pub fn paths(&self) -> Vec<PathBuf> {
        self.shared.bindings.lock().paths.clone()
    }

    /// Number of live underlying watches.
    pub fn active_count(&self) -> usize {
        self.shared.bindings.lock().handles.len()
    }

    /// Stop watching. Equivalent to dropping the watcher.
    pub fn cancel(self) {}
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.task.abort();
        self.shared.shutdown();
    }
}

/// Event loop owned by the spawned task.
struct WatchLoop {
    shared: Arc<Shared>,
    events_rx: mpsc::UnboundedReceiver<ChangeEvent>,
    rebind_tx: mpsc::UnboundedSender<PathBuf>,
    rebind_rx: mpsc::UnboundedReceiver<PathBuf>,
    pending_rebinds: HashSet<PathBuf>,
    debouncer: Debouncer,
    rebind_delay: Duration,
    on_change: Callback,
}

impl WatchLoop {
    async fn run(mut self) {
        loop {
            let deadline = self.debouncer.next_deadline();

            tokio::select! {
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }

                Some(path) = self.rebind_rx.recv() => {
                    self.handle_rebind(path);
                }

                _ = wait_until(deadline) => {
                    let ready = self.debouncer.take_ready();
                    if !ready.is_empty() {
                        crate::debug_event!("watcher", "settled", "{} paths", ready.len());
                        (self.on_change)();
                    }
                }
            }
        }
    }

    fn handle_event(&mut self, event: ChangeEvent) {
        match event.kind {
            ChangeKind::Write => {
                self.debouncer.record(event.path);
            }
            ChangeKind::Remove | ChangeKind::Rename => {
                // The old descriptor is stale; a pending write on it is moot
                self.debouncer.remove(&event.path);
                if self.pending_rebinds.insert(event.path.clone()) {
                    crate::debug_event!(
                        "watcher",
                        "replaced",
                        "{:?} {}",
                        event.kind,
                        event.path.display()
                    );
                    let tx = self.rebind_tx.clone();
                    let delay = self.rebind_delay;
                    tokio::spawn(async move {
                        sleep(delay).await;
                        let _ = tx.send(event.path);
                    });
                }
            }
        }
    }

    fn handle_rebind(&mut self, path: PathBuf) {
        self.pending_rebinds.remove(&path);
        self.debouncer.remove(&path);

        if self.shared.rebind(&path) {
            crate::log_event!("watcher", "rebound", "{}", path.display());
            (self.on_change)();
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Builder for constructing a FileWatcher.
pub struct FileWatcherBuilder {
    source: Option<Box<dyn ChangeSource>>,
    paths: Vec<PathBuf>,
    debounce_ms: u64,
    rebind_delay_ms: u64,
}

impl FileWatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        let timings = WatcherConfig::default();
        Self {
            source: None,
            paths: Vec::new(),
            debounce_ms: timings.debounce_ms,
            rebind_delay_ms: timings.rebind_delay_ms,
        }
    }

    /// Use a specific change source (defaults to `NotifySource`).
    pub fn source(mut self, source: impl ChangeSource) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Add a path to watch.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Add several paths to watch.
    pub fn paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.paths.extend(paths);
        self
    }

    /// Set the debounce duration in milliseconds.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the delay before re-opening a replaced file.
    pub fn rebind_delay_ms(mut self, ms: u64) -> Self {
        self.rebind_delay_ms = ms;
        self
    }

    /// Take both timings from the `[watcher]` settings.
    pub fn timings(self, config: &WatcherConfig) -> Self {
        self.debounce_ms(config.debounce_ms)
            .rebind_delay_ms(config.rebind_delay_ms)
    }

    /// Start watching. Must be called from within a tokio runtime.
    pub fn spawn(
        self,
        on_change: impl Fn() + Send + Sync + 'static,
    ) -> Result<FileWatcher, WatchError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| WatchError::InitFailed {
                reason: e.to_string(),
            })?;

        let source: Box<dyn ChangeSource> = match self.source {
            Some(source) => source,
            None => Box::new(NotifySource),
        };
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (rebind_tx, rebind_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            source,
            bindings: Mutex::new(Bindings::default()),
            events: events_tx,
        });

        let requested = self.paths.len();
        let active = shared.replace_all(self.paths);
        crate::log_event!("watcher", "started", "{active} of {requested} paths");

        let watch_loop = WatchLoop {
            shared: Arc::clone(&shared),
            events_rx,
            rebind_tx,
            rebind_rx,
            pending_rebinds: HashSet::new(),
            debouncer: Debouncer::new(self.debounce_ms),
            rebind_delay: Duration::from_millis(self.rebind_delay_ms),
            on_change: Arc::new(on_change),
        };

        let task = runtime.spawn(watch_loop.run());
        Ok(FileWatcher { shared, task })
    }
}

impl Default for FileWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
