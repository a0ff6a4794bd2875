//! Persistence of the last successful query timestamp.
//!
//! The record is a tiny JSON document written atomically (temp file, then
//! rename). Anything unreadable, empty or zero reads back as "no prior query",
//! which at worst costs one extra query.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::time::Timestamp;

/// Key-value persistence for the freshness record.
pub trait FreshnessStore: Send + Sync {
    /// Record the time of the latest successful query.
    fn save_last_success(&self, timestamp: Timestamp) -> Result<(), StoreError>;

    /// Time of the latest successful query, if a valid one is stored.
    fn load_last_success(&self) -> Option<Timestamp>;
}

/// In-process store; forgets everything on restart.
#[derive(Debug, Default)]
pub struct MemoryFreshnessStore {
    last: Mutex<Option<Timestamp>>,
}

impl MemoryFreshnessStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a timestamp.
    pub fn with_last_success(timestamp: Timestamp) -> Self {
        Self {
            last: Mutex::new(Some(timestamp)),
        }
    }
}

impl FreshnessStore for MemoryFreshnessStore {
    fn save_last_success(&self, timestamp: Timestamp) -> Result<(), StoreError> {
        *self.last.lock() = Some(timestamp);
        Ok(())
    }

    fn load_last_success(&self) -> Option<Timestamp> {
        *self.last.lock()
    }
}

/// On-disk freshness record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreshnessRecord {
    /// Library version that wrote the record.
    pub version: String,

    /// Epoch milliseconds of the last successful query; 0 means none.
    pub last_success_ms: i64,
}

/// JSON-file-backed store that survives restarts.
#[derive(Debug)]
pub struct FileFreshnessStore {
    path: PathBuf,
    /// Serializes writers within this process.
    write_lock: Mutex<()>,
}

impl FileFreshnessStore {
    /// Store backed by the given file; the file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the record.
    pub fn read_record(&self) -> io::Result<FreshnessRecord> {
        let data = fs::read(&self.path)?;
        serde_json::from_slice(&data).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to parse freshness record: {}", e),
            )
        })
    }
}

impl FreshnessStore for FileFreshnessStore {
    fn save_last_success(&self, timestamp: Timestamp) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let record = FreshnessRecord {
            version: crate::VERSION.to_string(),
            last_success_ms: timestamp.as_millis(),
        };

        let temp_path = self.path.with_extension("tmp");
        {
            let file = fs::File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &record)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            last_success = %timestamp,
            "Saved freshness record"
        );
        Ok(())
    }

    fn load_last_success(&self) -> Option<Timestamp> {
        match self.read_record() {
            Ok(record) => Timestamp::from_persisted(record.last_success_ms),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable freshness record"
                );
                None
            }
        }
    }
}

/// Default location of the freshness record.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("sunposition").join("last_query.json"))
}
