use std::sync::Arc;

use parking_lot::Mutex;

use super::{StateRecord, Store, StoreError};
use crate::timeline::LogEntry;

#[derive(Debug, Default)]
struct Contents {
    state: Option<StateRecord>,
    log: Vec<LogEntry>,
    fail_writes: bool,
    state_writes: usize,
    log_writes: usize,
}

/// In-memory store. Clones share contents, so a test can keep a handle
/// after moving the store into a monitor.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Arc<Mutex<Contents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(state: Option<StateRecord>, log: Vec<LogEntry>) -> Self {
        let store = Self::default();
        {
            let mut contents = store.contents.lock();
            contents.state = state;
            contents.log = log;
        }
        store
    }

    /// Make subsequent saves fail, to exercise the in-memory fallback.
    pub fn set_fail_writes(&self, fail: bool) {
        self.contents.lock().fail_writes = fail;
    }

    pub fn state(&self) -> Option<StateRecord> {
        self.contents.lock().state.clone()
    }

    pub fn log(&self) -> Vec<LogEntry> {
        self.contents.lock().log.clone()
    }

    pub fn state_writes(&self) -> usize {
        self.contents.lock().state_writes
    }

    pub fn log_writes(&self) -> usize {
        self.contents.lock().log_writes
    }
}

impl Store for MemoryStore {
    fn load_state(&self) -> Result<Option<StateRecord>, StoreError> {
        Ok(self.contents.lock().state.clone())
    }

    fn load_log(&self) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self.contents.lock().log.clone())
    }

    fn save_state(&mut self, record: &StateRecord) -> Result<(), StoreError> {
        let mut contents = self.contents.lock();
        if contents.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        contents.state = Some(record.clone());
        contents.state_writes += 1;
        Ok(())
    }

    fn save_log(&mut self, entries: &[LogEntry]) -> Result<(), StoreError> {
        let mut contents = self.contents.lock();
        if contents.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        contents.log = entries.to_vec();
        contents.log_writes += 1;
        Ok(())
    }
}
