//! State behind `ghostkey watch`.
//!
//! Owns the store and the status monitor and knows how to apply a
//! reloaded settings file. The command layer wires file watchers to it.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::Settings;
use crate::notifications::AlertBroadcaster;
use crate::status::{StatusMonitor, StatusReport};
use crate::storage::{CodeStore, StorageResult};

const ALERT_CAPACITY: usize = 16;

/// Which parts of the settings differ between two loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsChange {
    /// Codes/index location or consume mode.
    pub storage: bool,
    pub thresholds: bool,
    /// Debounce or rebind timings.
    pub watcher: bool,
}

impl SettingsChange {
    pub fn between(old: &Settings, new: &Settings) -> Self {
        Self {
            storage: old.storage != new.storage,
            thresholds: old.thresholds != new.thresholds,
            watcher: old.watcher != new.watcher,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.storage || self.thresholds || self.watcher)
    }
}

pub struct Daemon {
    settings: Mutex<Settings>,
    store: Arc<CodeStore>,
    monitor: StatusMonitor<AlertBroadcaster>,
}

impl Daemon {
    /// Bootstrap storage and load the codes.
    pub fn start(settings: Settings) -> StorageResult<Self> {
        let store = Arc::new(CodeStore::from_settings(&settings));
        store.bootstrap_if_needed()?;
        store.load_all();

        let monitor = StatusMonitor::new(
            settings.thresholds,
            AlertBroadcaster::new(ALERT_CAPACITY),
        );

        Ok(Self {
            settings: Mutex::new(settings),
            store,
            monitor,
        })
    }

    pub fn store(&self) -> &Arc<CodeStore> {
        &self.store
    }

    pub fn alerts(&self) -> &AlertBroadcaster {
        self.monitor.notifier()
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().clone()
    }

    /// Classify the current remaining count.
    pub fn refresh(&self) -> StatusReport {
        self.monitor.refresh(self.store.remaining())
    }

    /// Re-read the backing files, then refresh.
    pub fn reload_codes(&self) -> StatusReport {
        self.store.load_all();
        self.refresh()
    }

    /// Adopt `new` settings, relocating storage if it moved.
    ///
    /// A failed bootstrap at the new location is logged; the store still
    /// points there and reads it as empty until the files appear.
    pub fn apply_settings(&self, new: Settings) -> SettingsChange {
        let mut current = self.settings.lock();
        let change = SettingsChange::between(&current, &new);

        if change.storage {
            self.store.relocate(new.storage.paths(), new.storage.consume_mode);
            if let Err(e) = self.store.bootstrap_if_needed() {
                tracing::error!("[daemon] failed to prepare new storage: {e}");
            }
            self.store.load_all();
        }

        if change.thresholds {
            crate::log_event!(
                "daemon",
                "thresholds",
                "{}/{}/{}",
                new.thresholds.yellow,
                new.thresholds.orange,
                new.thresholds.red
            );
            self.monitor.set_thresholds(new.thresholds);
        }

        *current = new;
        change
    }
}
