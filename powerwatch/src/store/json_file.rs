use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{StateRecord, Store, StoreError};
use crate::timeline::LogEntry;

const STATE_FILE: &str = "state.json";
const LOG_FILE: &str = "log.json";

/// `state.json` and `log.json` in one directory.
///
/// Every save goes through write-to-temp + fsync + rename, so a crash
/// leaves either the old or the new file, never a truncated one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    fn write<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        what: &'static str,
        value: &T,
    ) -> Result<(), StoreError> {
        let data =
            serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode { what, source })?;
        fs::create_dir_all(&self.dir).map_err(|source| io_err(&self.dir, source))?;
        write_atomic(path, &data)?;

        // fsync the directory so the rename itself survives a crash
        #[cfg(unix)]
        {
            if let Ok(dir) = File::open(&self.dir) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}

impl Store for JsonFileStore {
    fn load_state(&self) -> Result<Option<StateRecord>, StoreError> {
        read_json(&self.state_path())
    }

    fn load_log(&self) -> Result<Vec<LogEntry>, StoreError> {
        Ok(read_json(&self.log_path())?.unwrap_or_default())
    }

    fn save_state(&mut self, record: &StateRecord) -> Result<(), StoreError> {
        self.write(&self.state_path(), "state record", record)
    }

    fn save_log(&mut self, entries: &[LogEntry]) -> Result<(), StoreError> {
        self.write(&self.log_path(), "segment log", entries)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(io_err(path, source)),
    };

    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("json.tmp");

    let mut file = File::create(&tmp_path).map_err(|source| io_err(&tmp_path, source))?;
    file.write_all(data)
        .map_err(|source| io_err(&tmp_path, source))?;
    file.sync_all().map_err(|source| io_err(&tmp_path, source))?;

    fs::rename(&tmp_path, path).map_err(|source| io_err(path, source))
}

fn io_err(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
