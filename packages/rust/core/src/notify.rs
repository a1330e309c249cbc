//! User-facing notifications.
//!
//! Every terminal outcome produces exactly one [`Notification`]. The host
//! decides how to show it (toast, stderr line, ...); the core only hands it
//! to a [`Notifier`] and mirrors it into the log.

use std::sync::Mutex;

use pageguide_shared::{Notification, Severity};
use tracing::{info, warn};

/// Delivery sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Log `notification`, then hand it to `notifier`.
pub fn publish(notifier: &dyn Notifier, notification: Notification) {
    match notification.severity {
        Severity::Info => info!(target: "pageguide::notify", message = %notification.message),
        Severity::Warning => warn!(target: "pageguide::notify", message = %notification.message),
    }
    notifier.notify(notification);
}

/// Keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order() {
        let rec = RecordingNotifier::new();
        publish(&rec, Notification::info("one"));
        publish(&rec, Notification::warning("two"));
        let all = rec.notifications();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].severity, Severity::Info);
        assert_eq!(rec.last().map(|n| n.message), Some("two".to_string()));
    }
}
