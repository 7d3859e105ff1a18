//! User-facing notifications raised at mutation and fetch boundaries.
//!
//! Every remote outcome surfaces here: successes as short confirmations,
//! failures with the source's message verbatim. The channel is unbounded and
//! fire-and-forget; a dropped receiver (headless use, tests that don't care)
//! just discards notifications.

use tokio::sync::mpsc;
use tracing::warn;

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub detail: Option<String>,
    pub severity: Severity,
}

/// Sending half handed to the stores; cheap to clone.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiver the UI drains.
    pub fn channel() -> (Notifier, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx }, rx)
    }

    pub fn info(&self, title: impl Into<String>) {
        self.push(title.into(), None, Severity::Info);
    }

    pub fn info_with(&self, title: impl Into<String>, detail: impl Into<String>) {
        self.push(title.into(), Some(detail.into()), Severity::Info);
    }

    /// Raise an error notification carrying the failure's message verbatim.
    pub fn error(&self, title: impl Into<String>, err: &dyn std::fmt::Display) {
        let title = title.into();
        let detail = err.to_string();
        warn!(%title, %detail, "remote operation failed");
        self.push(title, Some(detail), Severity::Error);
    }

    fn push(&self, title: String, detail: Option<String>, severity: Severity) {
        let _ = self.tx.send(Notification {
            title,
            detail,
            severity,
        });
    }
}
