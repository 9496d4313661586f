//! Low-stock alerts.
//!
//! A `Notifier` is told about band downgrades. `AlertBroadcaster` fans
//! alerts out to any number of listeners (the watch command prints them)
//! and logs each one.

use tokio::sync::broadcast;

use crate::band::ColorBand;

/// Receives `(band, remaining)` whenever the band gets strictly worse.
pub trait Notifier: Send + Sync {
    fn notify_threshold(&self, band: ColorBand, remaining: usize);
}

/// A single low-stock alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub band: ColorBand,
    pub remaining: usize,
}

impl Alert {
    /// Human-readable text; green never produces an alert.
    pub fn message(&self) -> Option<String> {
        let remaining = self.remaining;
        match self.band {
            ColorBand::Green => None,
            ColorBand::Yellow => Some(format!("Getting low: {remaining} codes left.")),
            ColorBand::Orange => Some(format!("Running low: {remaining} codes left.")),
            ColorBand::Red => Some(format!("CRITICAL: only {remaining} codes left!")),
        }
    }
}

/// Broadcasts alerts to subscribers.
#[derive(Clone)]
pub struct AlertBroadcaster {
    sender: broadcast::Sender<Alert>,
}

impl AlertBroadcaster {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.sender.subscribe()
    }
}

impl Notifier for AlertBroadcaster {
    fn notify_threshold(&self, band: ColorBand, remaining: usize) {
        let alert = Alert { band, remaining };
        let Some(message) = alert.message() else {
            return;
        };

        tracing::warn!("[alert] {message}");
        if self.sender.send(alert).is_err() {
            // No receivers, this is fine
            crate::debug_event!("alert", "dropped", "no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let msg = |band, remaining| Alert { band, remaining }.message();
        assert_eq!(msg(ColorBand::Green, 500), None);
        assert_eq!(
            msg(ColorBand::Yellow, 80).as_deref(),
            Some("Getting low: 80 codes left.")
        );
        assert_eq!(
            msg(ColorBand::Orange, 30).as_deref(),
            Some("Running low: 30 codes left.")
        );
        assert_eq!(
            msg(ColorBand::Red, 2).as_deref(),
            Some("CRITICAL: only 2 codes left!")
        );
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let broadcaster = AlertBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();

        broadcaster.notify_threshold(ColorBand::Orange, 12);
        broadcaster.notify_threshold(ColorBand::Green, 400);

        let alert = rx.recv().await.unwrap();
        assert_eq!(
            alert,
            Alert {
                band: ColorBand::Orange,
                remaining: 12
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_without_subscribers() {
        let broadcaster = AlertBroadcaster::new(1);
        broadcaster.notify_threshold(ColorBand::Red, 0);
    }
}
