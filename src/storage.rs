use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;

/// Durable string key-value storage backed by a single JSON file. Every write
/// replaces the file atomically.
#[derive(Debug)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, String>>,
}

impl LocalStorage {
    #[tracing::instrument(skip(path))]
    pub fn open(path: impl AsRef<Path>) -> Result<LocalStorage, Error> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(contents) => serde_json::from_slice(&contents)?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        debug!(keys = values.len(), "opened local storage");

        Ok(LocalStorage {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    pub fn in_memory() -> LocalStorage {
        LocalStorage {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    /// The file is written before the in-memory value changes, so a failed
    /// write leaves both untouched.
    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), Error> {
        let mut values = self.values();
        let mut updated = values.clone();
        updated.insert(key.to_string(), value.into());
        self.persist(&updated)?;
        *values = updated;

        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), Error> {
        let mut values = self.values();
        if !values.contains_key(key) {
            return Ok(());
        }

        let mut updated = values.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *values = updated;

        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Error> {
        let value = serde_json::to_string(value)?;
        self.set(key, value)
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), Error> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temporary = path.with_extension("json.tmp");
        fs::write(&temporary, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&temporary, path)?;

        Ok(())
    }
}
