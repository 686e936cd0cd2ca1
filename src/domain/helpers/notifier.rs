use std::sync::Arc;

use tracing::{error, info};

/// A user-visible message raised by a state manager or the checkout flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::Success(message.to_owned()));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::Error(message.to_owned()));
    }
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Server side there is no toast to raise, so notifications end up in the log.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(message) => info!(notification = "success", "{message}"),
            Notification::Error(message) => error!(notification = "error", "{message}"),
        }
    }
}
