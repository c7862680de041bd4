//! Client wake-up notifications.
//!
//! A notification tells connected clients to check in early so they pick up
//! new or changed hunts. Delivery is best effort: a client that misses the
//! signal still sees the hunt on its next regular poll.

mod client;

pub use client::{ClientNotifier, WakeUp, DEFAULT_WAKEUP_CAPACITY};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when notifying clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Invalid client pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Notification transport error: {0}")]
    Transport(String),
}

impl NotifyError {
    /// Returns the error kind as a static string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::Transport(_) => "transport",
        }
    }
}

/// Signals connected clients whose id matches a pattern.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Wakes every connected client whose id matches the regular expression
    /// `pattern`. Returns how many clients were signalled.
    async fn notify_matching(&self, pattern: &str) -> Result<usize, NotifyError>;
}
