use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::error::RecordError;

/// The persisted best score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    #[serde(default)]
    pub high_score: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Local>>,
}

impl HighScoreRecord {
    /// Raises the high score to `score` if it beats it, stamping the update time.
    fn raise(&mut self, score: u32, now: DateTime<Local>) -> bool {
        if score <= self.high_score {
            return false;
        }
        self.high_score = score;
        self.last_updated = Some(now);
        self.created_at.get_or_insert(now);
        true
    }
}

/// Storage for the best score across sessions.
///
/// Neither method fails: unreadable storage loads as an empty record, and write
/// failures are logged.
pub trait RecordStore {
    fn load(&self) -> HighScoreRecord;

    /// Persists `score` and returns true iff it beats the stored high score.
    fn record_if_higher(&self, score: u32) -> bool;
}

/// JSON file under the state directory.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::record_path().unwrap_or_else(|| PathBuf::from("cloudtype_record.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<HighScoreRecord, RecordError> {
        let bytes = fs::read(&self.path).map_err(|source| RecordError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write(&self, record: &HighScoreRecord) -> Result<(), RecordError> {
        let io_err = |source| RecordError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_vec_pretty(record)?;
        fs::write(&self.path, data).map_err(io_err)
    }
}

impl RecordStore for FileRecordStore {
    fn load(&self) -> HighScoreRecord {
        match self.read() {
            Ok(record) => record,
            Err(RecordError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                HighScoreRecord::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable high score record, starting from zero");
                HighScoreRecord::default()
            }
        }
    }

    fn record_if_higher(&self, score: u32) -> bool {
        let mut record = self.load();
        if !record.raise(score, Local::now()) {
            return false;
        }

        match self.write(&record) {
            Ok(()) => info!(score, path = %self.path.display(), "new high score saved"),
            Err(e) => warn!(score, error = %e, "failed to save new high score"),
        }
        true
    }
}

/// In-memory store, for tests and runs that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    record: RefCell<HighScoreRecord>,
    writes: Cell<usize>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_high_score(high_score: u32) -> Self {
        Self {
            record: RefCell::new(HighScoreRecord {
                high_score,
                ..HighScoreRecord::default()
            }),
            writes: Cell::new(0),
        }
    }

    /// How many times a higher score was written.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load(&self) -> HighScoreRecord {
        self.record.borrow().clone()
    }

    fn record_if_higher(&self, score: u32) -> bool {
        let raised = self.record.borrow_mut().raise(score, Local::now());
        if raised {
            self.writes.set(self.writes.get() + 1);
        }
        raised
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_zero() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::with_path(dir.path().join("record.json"));
        assert_eq!(store.load(), HighScoreRecord::default());
        assert_eq!(store.load().high_score, 0);
    }

    #[test]
    fn test_corrupt_file_loads_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record.json");
        fs::write(&path, "{ high_score: lots").unwrap();

        let store = FileRecordStore::with_path(&path);
        assert_eq!(store.load().high_score, 0);
    }

    #[test]
    fn test_record_if_higher_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("record.json");
        let store = FileRecordStore::with_path(&path);

        assert!(store.record_if_higher(50));
        assert!(!store.record_if_higher(40));
        assert!(!store.record_if_higher(50));

        let reopened = FileRecordStore::with_path(&path);
        let record = reopened.load();
        assert_eq!(record.high_score, 50);
        assert!(record.last_updated.is_some());
        assert!(record.created_at.is_some());
    }

    #[test]
    fn test_lower_score_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record.json");
        let store = FileRecordStore::with_path(&path);

        assert!(!store.record_if_higher(0));
        assert!(!path.exists());
    }

    #[test]
    fn test_persisted_layout_is_readable_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record.json");
        let store = FileRecordStore::with_path(&path);
        store.record_if_higher(73);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["high_score"], 73);
        assert!(value["last_updated"].is_string());
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record.json");
        fs::write(&path, r#"{ "high_score": 12 }"#).unwrap();

        let record = FileRecordStore::with_path(&path).load();
        assert_eq!(record.high_score, 12);
        assert_eq!(record.last_updated, None);
    }

    #[test]
    fn test_raise_keeps_created_at() {
        let mut record = HighScoreRecord::default();
        let first = Local::now();
        assert!(record.raise(10, first));
        let later = first + chrono::Duration::seconds(5);
        assert!(record.raise(20, later));
        assert_eq!(record.created_at, Some(first));
        assert_eq!(record.last_updated, Some(later));
    }

    #[test]
    fn test_memory_store_counts_writes() {
        let store = MemoryRecordStore::with_high_score(30);
        assert!(!store.record_if_higher(30));
        assert!(store.record_if_higher(31));
        assert_eq!(store.writes(), 1);
        assert_eq!(store.load().high_score, 31);
    }
}
