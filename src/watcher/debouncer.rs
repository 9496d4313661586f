//! Shared debouncing logic for file change events.
//!
//! Editors often emit several write events per save; debouncing turns
//! such a burst into a single reload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::time::{Duration, Instant};

/// Debounces file change events by path.
///
/// Records change timestamps and returns paths that have been stable
/// for the configured duration. Uses the tokio clock so paused-time
/// tests stay deterministic.
#[derive(Debug)]
pub struct Debouncer {
    /// Pending changes: path -> last change timestamp.
    pending: HashMap<PathBuf, Instant>,
    /// How long a file must be stable before processing.
    duration: Duration,
}

impl Debouncer {
    /// Create a new debouncer with the given duration in milliseconds.
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a file change event.
    ///
    /// Resets the debounce timer for this path.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    /// Remove a path from pending (e.g., when the file is being rebound).
    pub fn remove(&mut self, path: &Path) {
        self.pending.remove(path);
    }

    /// Take all paths that have been stable for the debounce duration.
    ///
    /// Returns paths ready for processing and removes them from pending.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push(path.clone());
                false // Remove from pending
            } else {
                true // Keep in pending
            }
        });

        ready
    }

    /// Earliest instant at which some pending path becomes ready.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .min()
            .map(|last_change| *last_change + self.duration)
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, sleep};

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_basic() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("/test/codes.txt");
        debouncer.record(path.clone());

        // Immediately after, nothing should be ready
        assert!(debouncer.take_ready().is_empty());
        assert!(debouncer.has_pending());

        // Wait for debounce period
        sleep(Duration::from_millis(60)).await;

        // Now it should be ready
        let ready = debouncer.take_ready();
        assert_eq!(ready, vec![path]);
        assert!(!debouncer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_resets_on_new_change() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("/test/codes.txt");
        debouncer.record(path.clone());

        advance(Duration::from_millis(30)).await;

        // Record again - should reset the timer
        debouncer.record(path.clone());

        // 60ms from first, but only 30ms from second
        advance(Duration::from_millis(30)).await;
        assert!(debouncer.take_ready().is_empty());

        advance(Duration::from_millis(30)).await;
        assert_eq!(debouncer.take_ready().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_deadline_tracks_oldest() {
        let mut debouncer = Debouncer::new(50);
        assert!(debouncer.next_deadline().is_none());

        let start = Instant::now();
        debouncer.record(PathBuf::from("/test/codes.txt"));
        advance(Duration::from_millis(20)).await;
        debouncer.record(PathBuf::from("/test/index.json"));

        assert_eq!(
            debouncer.next_deadline(),
            Some(start + Duration::from_millis(50))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_remove() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("/test/codes.txt");
        debouncer.record(path.clone());
        assert!(debouncer.has_pending());

        debouncer.remove(&path);
        assert!(!debouncer.has_pending());
        assert!(debouncer.next_deadline().is_none());
    }
}
