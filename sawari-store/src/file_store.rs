use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sawari_core::DomainError;

/// The three persisted collections. Each one is a single JSON file mapping
/// generated id to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Holds,
    Payments,
    Passengers,
}

impl RecordKind {
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Holds => "booking_holds.json",
            RecordKind::Payments => "payment_sessions.json",
            RecordKind::Passengers => "passenger_records.json",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store i/o failed on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("duplicate record id: {0}")]
    Duplicate(String),

    #[error("version conflict on {id}: expected {expected}, found {found}")]
    Conflict {
        id: String,
        expected: u64,
        found: u64,
    },
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DomainError::NotFound(id),
            StoreError::Duplicate(id) => {
                DomainError::Conflict(format!("duplicate record id: {id}"))
            }
            conflict @ StoreError::Conflict { .. } => DomainError::Conflict(conflict.to_string()),
            other => DomainError::Internal(other.to_string()),
        }
    }
}

/// Record envelope carrying the optimistic-concurrency version. Updates
/// must present the version they read; a mismatch means another writer got
/// there first and the caller must re-read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}

/// Handle to the shared on-disk store. Clones share one process-local lock;
/// every mutation is a read-modify-write of a single record followed by an
/// eager flush of its collection file. Nothing here serializes writers in
/// *other* processes sharing the same directory.
#[derive(Clone)]
pub struct StoreHandle {
    dir: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl StoreHandle {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir: Arc::new(dir),
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Read a whole collection file as raw JSON. Missing file means empty.
    pub(crate) fn read_raw(&self, file_name: &str) -> Result<BTreeMap<String, Value>, StoreError> {
        let path = self.path_for(file_name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Corrupt { path, source })
    }

    pub(crate) fn write_raw(
        &self,
        file_name: &str,
        map: &BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        let path = self.path_for(file_name);
        let text = serde_json::to_string_pretty(map).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text).map_err(|source| StoreError::Io { path, source })
    }

    pub(crate) fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn decode<T: DeserializeOwned>(id: &str, value: &Value) -> Result<Versioned<T>, StoreError> {
        serde_json::from_value(value.clone()).map_err(|source| StoreError::Corrupt {
            path: PathBuf::from(id),
            source,
        })
    }

    /// Load the full mapping for a kind.
    pub fn load_all<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
    ) -> Result<BTreeMap<String, Versioned<T>>, StoreError> {
        let _guard = self.guard();
        let raw = self.read_raw(kind.file_name())?;
        raw.iter()
            .map(|(id, value)| Ok((id.clone(), Self::decode(id, value)?)))
            .collect()
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        id: &str,
    ) -> Result<Option<Versioned<T>>, StoreError> {
        let _guard = self.guard();
        let raw = self.read_raw(kind.file_name())?;
        raw.get(id).map(|value| Self::decode(id, value)).transpose()
    }

    /// Insert a fresh record at version 1. Fails if the id already exists.
    pub fn insert<T: Serialize>(
        &self,
        kind: RecordKind,
        id: &str,
        record: &T,
    ) -> Result<u64, StoreError> {
        let _guard = self.guard();
        let mut raw = self.read_raw(kind.file_name())?;
        if raw.contains_key(id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        raw.insert(id.to_string(), Self::encode(id, 1, record)?);
        self.write_raw(kind.file_name(), &raw)?;
        Ok(1)
    }

    /// Replace an existing record, enforcing the version the caller read.
    /// Returns the new version.
    pub fn update<T: Serialize>(
        &self,
        kind: RecordKind,
        id: &str,
        expected_version: u64,
        record: &T,
    ) -> Result<u64, StoreError> {
        let _guard = self.guard();
        let mut raw = self.read_raw(kind.file_name())?;
        let current = raw
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let found = current
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if found != expected_version {
            return Err(StoreError::Conflict {
                id: id.to_string(),
                expected: expected_version,
                found,
            });
        }
        let next = expected_version + 1;
        raw.insert(id.to_string(), Self::encode(id, next, record)?);
        self.write_raw(kind.file_name(), &raw)?;
        Ok(next)
    }

    /// Insert or replace without a version check. Used where overwrite is
    /// the documented behavior (passenger re-attach).
    pub fn upsert<T: Serialize>(
        &self,
        kind: RecordKind,
        id: &str,
        record: &T,
    ) -> Result<u64, StoreError> {
        let _guard = self.guard();
        let mut raw = self.read_raw(kind.file_name())?;
        let next = raw
            .get(id)
            .and_then(|v| v.get("version"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
            + 1;
        raw.insert(id.to_string(), Self::encode(id, next, record)?);
        self.write_raw(kind.file_name(), &raw)?;
        Ok(next)
    }

    /// Remove a record. Returns whether it existed.
    pub fn remove(&self, kind: RecordKind, id: &str) -> Result<bool, StoreError> {
        let _guard = self.guard();
        let mut raw = self.read_raw(kind.file_name())?;
        let existed = raw.remove(id).is_some();
        if existed {
            self.write_raw(kind.file_name(), &raw)?;
        }
        Ok(existed)
    }

    fn encode<T: Serialize>(id: &str, version: u64, record: &T) -> Result<Value, StoreError> {
        serde_json::to_value(Versioned {
            version,
            record,
        })
        .map_err(|source| StoreError::Corrupt {
            path: PathBuf::from(id),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Note {
        text: String,
    }

    fn store() -> (TempDir, StoreHandle) {
        let dir = TempDir::new().unwrap();
        let handle = StoreHandle::open(dir.path()).unwrap();
        (dir, handle)
    }

    #[test]
    fn test_insert_get_roundtrip() {
        let (_dir, store) = store();
        let note = Note {
            text: "hello".to_string(),
        };
        let version = store.insert(RecordKind::Holds, "HOLD_1001", &note).unwrap();
        assert_eq!(version, 1);

        let loaded: Versioned<Note> = store.get(RecordKind::Holds, "HOLD_1001").unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.record, note);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let (_dir, store) = store();
        let note = Note {
            text: "x".to_string(),
        };
        store.insert(RecordKind::Holds, "HOLD_1001", &note).unwrap();
        let err = store
            .insert(RecordKind::Holds, "HOLD_1001", &note)
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn test_stale_update_conflicts() {
        let (_dir, store) = store();
        let note = Note {
            text: "v1".to_string(),
        };
        store.insert(RecordKind::Payments, "PAY_5001", &note).unwrap();

        let updated = Note {
            text: "v2".to_string(),
        };
        let version = store
            .update(RecordKind::Payments, "PAY_5001", 1, &updated)
            .unwrap();
        assert_eq!(version, 2);

        // A writer still holding version 1 must be refused.
        let err = store
            .update(RecordKind::Payments, "PAY_5001", 1, &note)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_persistence_is_eager() {
        let dir = TempDir::new().unwrap();
        let note = Note {
            text: "durable".to_string(),
        };
        {
            let store = StoreHandle::open(dir.path()).unwrap();
            store
                .insert(RecordKind::Passengers, "HOLD_1001", &note)
                .unwrap();
        }
        // A second handle over the same directory sees the flushed write.
        let store = StoreHandle::open(dir.path()).unwrap();
        let loaded: Versioned<Note> = store
            .get(RecordKind::Passengers, "HOLD_1001")
            .unwrap()
            .unwrap();
        assert_eq!(loaded.record, note);
    }

    #[test]
    fn test_remove() {
        let (_dir, store) = store();
        let note = Note {
            text: "gone".to_string(),
        };
        store.insert(RecordKind::Holds, "HOLD_1001", &note).unwrap();
        assert!(store.remove(RecordKind::Holds, "HOLD_1001").unwrap());
        assert!(!store.remove(RecordKind::Holds, "HOLD_1001").unwrap());
        let loaded: Option<Versioned<Note>> = store.get(RecordKind::Holds, "HOLD_1001").unwrap();
        assert!(loaded.is_none());
    }
}
