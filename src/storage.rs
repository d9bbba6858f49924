use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub const TASKS_KEY: &str = "one-thing-tasks-v1";
pub const LOGS_KEY: &str = "one-thing-logs-v1";
pub const THEME_KEY: &str = "one-thing-theme";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse record {key}: {source}")]
    JsonDecode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record {key}: {source}")]
    JsonEncode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key/value persistence. Every `set` replaces the whole record.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir).map_err(io_err)?;
        }

        // Stage then rename; readers never see a partial record.
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(io_err)?;
        fs::rename(&staging, &path).map_err(io_err)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::JsonDecode {
            key: key.to_string(),
            source,
        })
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::JsonEncode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::domain::{Task, default_tasks};

    use super::{FileStore, KeyValueStore, MemoryStore, StorageError, TASKS_KEY, load_json, save_json};

    #[test]
    fn file_store_reads_missing_key_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_round_trips_task_lists() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));

        let mut tasks = default_tasks();
        tasks[2].is_active = false;
        save_json(&mut store, TASKS_KEY, &tasks).unwrap();

        let loaded: Vec<Task> = load_json(&store, TASKS_KEY).unwrap().unwrap();
        assert_eq!(loaded, tasks);
        assert!(dir.path().join("nested").join("one-thing-tasks-v1.json").exists());
    }

    #[test]
    fn empty_list_round_trips() {
        let mut store = MemoryStore::new();
        save_json(&mut store, TASKS_KEY, &Vec::<Task>::new()).unwrap();
        let loaded: Option<Vec<Task>> = load_json(&store, TASKS_KEY).unwrap();
        assert_eq!(loaded, Some(Vec::new()));
    }

    #[test]
    fn corrupt_record_reports_decode_error() {
        let mut store = MemoryStore::new();
        store.set(TASKS_KEY, "{not json").unwrap();
        let err = load_json::<Vec<Task>>(&store, TASKS_KEY).unwrap_err();
        assert!(matches!(err, StorageError::JsonDecode { .. }));
    }
}
