//! Persistence of the state record and the segment log.
//!
//! The state record and the log are saved independently, without a
//! transaction spanning both. A crash between the two writes is recovered
//! by the scheduler guards and by pruning being safe to repeat.

mod json_file;
mod memory;
mod record;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use record::StateRecord;

use std::path::PathBuf;

use crate::timeline::LogEntry;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Narrow persistence interface used by the monitor.
///
/// `load_*` return `Ok(None)`/empty when nothing has been saved yet.
pub trait Store: Send {
    fn load_state(&self) -> Result<Option<StateRecord>, StoreError>;

    fn load_log(&self) -> Result<Vec<LogEntry>, StoreError>;

    fn save_state(&mut self, record: &StateRecord) -> Result<(), StoreError>;

    /// Replace the persisted log with `entries`.
    fn save_log(&mut self, entries: &[LogEntry]) -> Result<(), StoreError>;
}
