//! Notification sink for user-visible cart errors.
//!
//! The cart reports each failed operation exactly once, fire-and-forget. Only
//! the message string and the structured kind cross this boundary.

use tokio::sync::mpsc;

use crate::error::CartErrorKind;

/// A user-visible error notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Structured kind for programmatic handling.
    pub kind: CartErrorKind,
    /// Message to show the shopper.
    pub message: String,
}

/// Receives user-visible errors.
pub trait Notifier: Send + Sync {
    /// Report an error. Must not block or fail.
    fn report_error(&self, kind: CartErrorKind, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(CartErrorKind, &str) + Send + Sync,
{
    fn report_error(&self, kind: CartErrorKind, message: &str) {
        self(kind, message);
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn report_error(&self, kind: CartErrorKind, message: &str) {
        tracing::warn!(kind = ?kind, "{message}");
    }
}

/// Forwards notifications to a channel, e.g. a UI task showing toasts.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// A notifier and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn report_error(&self, kind: CartErrorKind, message: &str) {
        let notification = Notification {
            kind,
            message: message.to_string(),
        };
        // A dropped receiver just means nobody is listening anymore.
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}
