//! Remaining-count status with downgrade notifications.

use parking_lot::Mutex;

use crate::band::{BandTracker, ColorBand, Thresholds};
use crate::notifications::Notifier;

/// Result of one status refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub band: ColorBand,
    pub remaining: usize,
    /// A downgrade notification was sent for this refresh.
    pub notified: bool,
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.band.symbol(), self.remaining)
    }
}

#[derive(Debug)]
struct MonitorState {
    thresholds: Thresholds,
    tracker: BandTracker,
}

/// Classifies remaining counts and notifies on band downgrades.
pub struct StatusMonitor<N> {
    state: Mutex<MonitorState>,
    notifier: N,
}

impl<N: Notifier> StatusMonitor<N> {
    pub fn new(thresholds: Thresholds, notifier: N) -> Self {
        Self {
            state: Mutex::new(MonitorState {
                thresholds,
                tracker: BandTracker::new(),
            }),
            notifier,
        }
    }

    /// Classify `remaining`, notifying when the band got strictly worse.
    pub fn refresh(&self, remaining: usize) -> StatusReport {
        let band;
        let notified;
        {
            let mut state = self.state.lock();
            band = ColorBand::from_remaining(remaining, &state.thresholds);
            notified = state.tracker.observe(band);
        }

        if notified {
            self.notifier.notify_threshold(band, remaining);
        }

        StatusReport {
            band,
            remaining,
            notified,
        }
    }

    /// Swap thresholds; the last observed band is kept.
    pub fn set_thresholds(&self, thresholds: Thresholds) {
        self.state.lock().thresholds = thresholds;
    }

    pub fn thresholds(&self) -> Thresholds {
        self.state.lock().thresholds
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(ColorBand, usize)>>);

    impl Notifier for Recorder {
        fn notify_threshold(&self, band: ColorBand, remaining: usize) {
            self.0.lock().push((band, remaining));
        }
    }

    #[test]
    fn test_notifies_on_each_downgrade() {
        let monitor = StatusMonitor::new(Thresholds::default(), Recorder::default());

        // green -> yellow -> green -> yellow, then yellow twice
        for remaining in [120, 100, 101, 95, 60, 41] {
            monitor.refresh(remaining);
        }

        let sent = monitor.notifier().0.lock().clone();
        assert_eq!(
            sent,
            vec![(ColorBand::Yellow, 100), (ColorBand::Yellow, 95)]
        );
    }

    #[test]
    fn test_report_display() {
        let monitor = StatusMonitor::new(Thresholds::default(), Recorder::default());
        let report = monitor.refresh(5);
        assert_eq!(report.band, ColorBand::Red);
        assert!(!report.notified);
        assert_eq!(report.to_string(), "🔴 5");
    }

    #[test]
    fn test_threshold_change_can_trigger_downgrade() {
        let monitor = StatusMonitor::new(Thresholds::default(), Recorder::default());
        assert_eq!(monitor.refresh(50).band, ColorBand::Yellow);

        monitor.set_thresholds(Thresholds::new(200, 60, 10));
        let report = monitor.refresh(50);
        assert_eq!(report.band, ColorBand::Orange);
        assert!(report.notified);
        assert_eq!(monitor.thresholds(), Thresholds::new(200, 60, 10));
    }
}
