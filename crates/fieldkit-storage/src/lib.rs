//! Durable state for field sessions, behind a small key-value port.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub mod checklist;
pub mod file;
pub mod memory;
pub mod observations;
pub mod samples;
pub mod sqlite;

pub use checklist::ChecklistStore;
pub use file::FileKv;
pub use memory::MemoryKv;
pub use observations::ObservationStore;
pub use samples::SampleTracker;
pub use sqlite::SqliteKv;

pub const OBSERVATIONS_KEY: &str = "soilObservations";
pub const SAMPLES_TAKEN_KEY: &str = "samplesTaken";
pub const CHECKLIST_KEY: &str = "equipmentChecklist";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("corrupt value under key {key}: {message}")]
    Corrupt { key: String, message: String },
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
}

/// String-keyed durable storage. Writes must be complete when `set` or
/// `remove` returns.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<K: KvStore + ?Sized> KvStore for Arc<K> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

pub(crate) fn load_json<K, T>(kv: &K, key: &str) -> Result<Option<T>, StorageError>
where
    K: KvStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(raw) = kv.get(key)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| StorageError::Corrupt {
            key: key.to_string(),
            message: err.to_string(),
        })
}

pub(crate) fn save_json<K, T>(kv: &K, key: &str, value: &T) -> Result<(), StorageError>
where
    K: KvStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw =
        serde_json::to_string(value).map_err(|err| StorageError::Serialization(err.to_string()))?;
    kv.set(key, &raw)
}
