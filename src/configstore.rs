//! Persistent key/value store for local session state.
//!
//! Values are kept as JSON in a single file next to the application
//! configuration. Every mutation is written back to disk immediately so the
//! state survives process restarts.

use crate::configuration::{Configuration, ConfigurationError};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

pub const DEFAULT_CONFIGSTORE_FILE_NAME: &str = "configstore.json";

#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("configuration store at {0:?} does not contain a JSON object")]
    NotAnObject(PathBuf),
    #[error("{0}")]
    ConfigurationError(#[from] ConfigurationError),
}

#[derive(Debug)]
pub struct ConfigStore {
    file_path: PathBuf,
    values: Map<String, Value>,
}

impl ConfigStore {
    /// Open the store in the default configuration directory
    pub fn open_default() -> Result<Self, ConfigStoreError> {
        let mut file_path = Configuration::get_default_configuration_directory()?;
        file_path.push(DEFAULT_CONFIGSTORE_FILE_NAME);
        Self::open(file_path)
    }

    /// Open the store backed by the given file. A missing file is an empty store.
    pub fn open(file_path: PathBuf) -> Result<Self, ConfigStoreError> {
        let values = if file_path.exists() {
            debug!("Loading configuration store from {}", file_path.display());
            let content = fs::read_to_string(&file_path)?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                match serde_json::from_str::<Value>(&content)? {
                    Value::Object(values) => values,
                    _ => return Err(ConfigStoreError::NotAnObject(file_path)),
                }
            }
        } else {
            Map::new()
        };

        Ok(Self { file_path, values })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|value| !value.is_null())
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigStoreError> {
        self.set_all([(key, value)])
    }

    /// Set several keys with a single write. On failure neither the file nor
    /// the in-memory values change.
    pub fn set_all<'a, I>(&mut self, entries: I) -> Result<(), ConfigStoreError>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut values = self.values.clone();
        for (key, value) in entries {
            trace!("Setting configuration store key {}", key);
            values.insert(key.to_string(), value);
        }
        self.commit(values)
    }

    pub fn delete(&mut self, key: &str) -> Result<(), ConfigStoreError> {
        self.delete_all([key])
    }

    /// Remove several keys with a single write
    pub fn delete_all<'a, I>(&mut self, keys: I) -> Result<(), ConfigStoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut values = self.values.clone();
        let mut changed = false;
        for key in keys {
            trace!("Deleting configuration store key {}", key);
            changed |= values.remove(key).is_some();
        }
        if changed {
            self.commit(values)?;
        }
        Ok(())
    }

    fn commit(&mut self, values: Map<String, Value>) -> Result<(), ConfigStoreError> {
        Self::save(&self.file_path, &values)?;
        self.values = values;
        Ok(())
    }

    /// Write to a sibling file first so a failed write never leaves a
    /// truncated store behind
    fn save(file_path: &Path, values: &Map<String, Value>) -> Result<(), ConfigStoreError> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)?;
        let staging_path = file_path.with_extension("json.tmp");
        if let Err(e) = fs::write(&staging_path, content) {
            let _ = fs::remove_file(&staging_path);
            return Err(e.into());
        }
        fs::rename(&staging_path, file_path)?;
        Ok(())
    }
}
