//! File-backed queue of one-time codes.
//!
//! `CodeStore` is the single authority for the codes file (and the index
//! file in indexed mode). All operations run under one mutex, so a
//! watcher-triggered reload can never interleave with a paste or an
//! append.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::codes::{self, CODES_FILE_HEADER};
use super::error::{StorageError, StorageResult};
use super::metadata::{IndexFile, compute_checksum};
use super::persistence::{atomic_write, ensure_private_dir, read_text};
use crate::config::Settings;

/// How consumed codes are tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumeMode {
    /// Consuming deletes the code from the codes file.
    #[default]
    Destructive,
    /// Consuming advances a cursor persisted in the index file.
    Indexed,
}

/// Locations of the backing files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub codes: PathBuf,
    pub index: PathBuf,
}

impl StorePaths {
    pub fn new(codes: impl Into<PathBuf>, index: impl Into<PathBuf>) -> Self {
        Self {
            codes: codes.into(),
            index: index.into(),
        }
    }
}

/// Point-in-time copy of the in-memory state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub codes: Vec<String>,
    pub next_index: usize,
    pub checksum: String,
}

impl StoreSnapshot {
    pub fn remaining(&self) -> usize {
        self.codes.len().saturating_sub(self.next_index)
    }
}

#[derive(Debug)]
struct StoreState {
    paths: StorePaths,
    mode: ConsumeMode,
    codes: Vec<String>,
    checksum: String,
    /// Always 0 in destructive mode.
    next_index: usize,
}

impl StoreState {
    fn remaining(&self) -> usize {
        self.codes.len().saturating_sub(self.next_index)
    }

    /// Current codes file text; a missing file reads as empty.
    fn read_codes_text(&self) -> StorageResult<String> {
        Ok(read_text(&self.paths.codes)?.unwrap_or_default())
    }

    fn set_codes(&mut self, codes: Vec<String>) {
        self.checksum = compute_checksum(&codes);
        self.codes = codes;
        self.next_index = self.next_index.min(self.codes.len());
    }

    /// Persist the cursor; failures are logged, never propagated.
    fn write_index(&self) {
        if self.mode != ConsumeMode::Indexed {
            return;
        }
        let index = IndexFile::new(self.next_index, self.checksum.clone());
        if let Err(e) = index.save(&self.paths.index) {
            tracing::error!("[store] failed to write index: {e}");
        }
    }

    fn load(&mut self) {
        let text = self.read_codes_text().unwrap_or_else(|e| {
            tracing::warn!("[store] {e}; treating the codes file as empty");
            String::new()
        });
        let codes = codes::parse_codes(&text);
        self.checksum = compute_checksum(&codes);
        self.codes = codes;

        if self.mode == ConsumeMode::Destructive {
            self.next_index = 0;
            return;
        }

        let stored = IndexFile::load_or_default(&self.paths.index);
        let next_index = stored.next_index.min(self.codes.len());
        if stored.codes_checksum != self.checksum || stored.next_index > self.codes.len() {
            crate::debug_event!(
                "store",
                "reconciled cursor",
                "{} -> {next_index} ({} codes)",
                stored.next_index,
                self.codes.len()
            );
        }
        self.next_index = next_index;

        if !stored.matches(self.next_index, &self.checksum) {
            self.write_index();
        }
    }
}

/// Serialized, file-backed code queue.
#[derive(Debug)]
pub struct CodeStore {
    state: Mutex<StoreState>,
}

impl CodeStore {
    /// Create a store. Nothing is read until `load_all`.
    pub fn new(paths: StorePaths, mode: ConsumeMode) -> Self {
        Self {
            state: Mutex::new(StoreState {
                paths,
                mode,
                codes: Vec::new(),
                checksum: compute_checksum(&[]),
                next_index: 0,
            }),
        }
    }

    /// Create a store from the storage section of the settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.storage.paths(), settings.storage.consume_mode)
    }

    /// Ensure the storage directory and backing files exist.
    ///
    /// Idempotent: existing files are never touched.
    pub fn bootstrap_if_needed(&self) -> StorageResult<()> {
        let state = self.state.lock();

        for path in [&state.paths.codes, &state.paths.index] {
            if let Some(parent) = non_empty_parent(path) {
                ensure_private_dir(parent)?;
            }
        }

        if !state.paths.codes.exists() {
            atomic_write(&state.paths.codes, CODES_FILE_HEADER.as_bytes())?;
            crate::log_event!("store", "created", "{}", state.paths.codes.display());
        }

        if state.mode == ConsumeMode::Indexed && !state.paths.index.exists() {
            IndexFile::new(0, "").save(&state.paths.index)?;
            crate::log_event!("store", "created", "{}", state.paths.index.display());
        }

        Ok(())
    }

    /// Re-read the backing files and reconcile the cursor.
    ///
    /// Never fails: unreadable or malformed files yield an empty list.
    pub fn load_all(&self) {
        let mut state = self.state.lock();
        state.load();
        crate::debug_event!(
            "store",
            "loaded",
            "{} codes, {} remaining",
            state.codes.len(),
            state.remaining()
        );
    }

    /// Next code to hand out, without consuming it.
    pub fn peek_next(&self) -> Option<String> {
        let state = self.state.lock();
        state.codes.get(state.next_index).cloned()
    }

    /// Consume exactly one code from the front of the queue.
    ///
    /// Returns `false` when the queue is empty; the files are not touched
    /// in that case.
    pub fn consume_next(&self) -> bool {
        let mut state = self.state.lock();
        match state.mode {
            ConsumeMode::Indexed => advance_cursor(&mut state),
            ConsumeMode::Destructive => {
                let Some(head) = state.codes.first().cloned() else {
                    return false;
                };
                remove_code(&mut state, &head)
            }
        }
    }

    /// Consume `code`, which was handed out by an earlier `peek_next`.
    ///
    /// The store may have reloaded since the peek. Destructive mode removes
    /// the first line holding `code`, not whatever is now at the head.
    /// Indexed mode only advances while the cursor still points at `code`.
    pub fn consume_delivered(&self, code: &str) -> bool {
        let mut state = self.state.lock();
        match state.mode {
            ConsumeMode::Indexed => {
                if state.codes.get(state.next_index).map(String::as_str) != Some(code) {
                    crate::debug_event!("store", "cursor moved off the delivered code");
                    return false;
                }
                advance_cursor(&mut state)
            }
            ConsumeMode::Destructive => remove_code(&mut state, code),
        }
    }

    /// Validate and append a code to the end of the codes file.
    ///
    /// Blank input is ignored (`Ok(false)`); anything else that is not
    /// 6 to 10 ASCII digits is rejected with a storage error. A codes file
    /// that cannot be decoded is left alone and reported as `FileRead`.
    pub fn append(&self, input: &str) -> StorageResult<bool> {
        let Some(code) = codes::validate_code(input)? else {
            return Ok(false);
        };

        let mut state = self.state.lock();
        let text = codes::with_appended(&state.read_codes_text()?, &code);
        atomic_write(&state.paths.codes, text.as_bytes())?;

        state.set_codes(codes::parse_codes(&text));
        state.write_index();

        crate::debug_event!("store", "appended", "{} codes", state.codes.len());
        Ok(true)
    }

    /// Set the cursor explicitly (indexed mode only), clamped to the list.
    pub fn reset_index(&self, to: usize) -> StorageResult<usize> {
        let mut state = self.state.lock();
        if state.mode != ConsumeMode::Indexed {
            return Err(StorageError::Unsupported {
                operation: "reset_index",
            });
        }
        state.next_index = to.min(state.codes.len());
        state.write_index();
        Ok(state.next_index)
    }

    /// Switch to new backing files and reload from them.
    pub fn relocate(&self, paths: StorePaths, mode: ConsumeMode) {
        let mut state = self.state.lock();
        crate::log_event!("store", "relocated", "{}", paths.codes.display());
        state.paths = paths;
        state.mode = mode;
        state.next_index = 0;
        state.load();
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().remaining()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock();
        StoreSnapshot {
            codes: state.codes.clone(),
            next_index: state.next_index,
            checksum: state.checksum.clone(),
        }
    }

    pub fn paths(&self) -> StorePaths {
        self.state.lock().paths.clone()
    }

    pub fn mode(&self) -> ConsumeMode {
        self.state.lock().mode
    }

    /// Files a watcher should observe for this store.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let state = self.state.lock();
        let mut paths = vec![state.paths.codes.clone()];
        if state.mode == ConsumeMode::Indexed {
            paths.push(state.paths.index.clone());
        }
        paths
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn advance_cursor(state: &mut StoreState) -> bool {
    if state.next_index >= state.codes.len() {
        return false;
    }
    state.next_index += 1;
    state.write_index();
    true
}

/// Destructive consume: drop the first line holding `code` on disk.
fn remove_code(state: &mut StoreState, code: &str) -> bool {
    let text = match state.read_codes_text() {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("[store] not rewriting codes file: {e}");
            return false;
        }
    };

    match codes::without_first(&text, code) {
        Some(rewritten) => {
            if let Err(e) = atomic_write(&state.paths.codes, rewritten.as_bytes()) {
                tracing::error!("[store] failed to consume code: {e}");
                return false;
            }
            state.set_codes(codes::parse_codes(&rewritten));
        }
        None => {
            // Already removed by an external edit; the disk is authoritative.
            crate::debug_event!("store", "code missing on disk, refreshing");
            state.set_codes(codes::parse_codes(&text));
        }
    }
    true
}
