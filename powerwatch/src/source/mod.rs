//! Sources of raw power-presence samples.

mod http;

pub use http::HttpSampleSource;

use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("no boolean at {pointer} in status response")]
    MissingField { pointer: String },

    #[error("poll timed out after {0:?}")]
    Timeout(Duration),
}

/// Supplies the current reachability of the watched device.
///
/// `Ok(true)` means the device answered as online, i.e. power is present.
/// Callers bound each poll with a timeout; implementations need not.
#[async_trait]
pub trait SampleSource: Send + Sync {
    async fn poll(&self) -> Result<bool, SourceError>;
}
