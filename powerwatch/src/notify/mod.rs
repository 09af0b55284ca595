//! Delivery of human-facing messages.

pub mod messages;
mod webhook;

pub use webhook::WebhookNotifier;

use async_trait::async_trait;

use crate::tracing::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// Sends formatted text to the user. Failures are reported, not retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Writes messages to the log. Used when no notification endpoint is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        info!(text, "Notification");
        Ok(())
    }
}
