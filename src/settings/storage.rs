//! ==============================================================================
//! storage.rs - durable local cache for user settings
//! ==============================================================================
//!
//! purpose:
//!     one key, one json document. the store reads it once at startup and
//!     rewrites it after every update.
//!
//! implementations:
//!     - FileStorage: `<dir>/aqms-settings.json`, atomic temp-file + rename
//!     - MemoryStorage: process-local slot for tests and `--no-cache` runs
//!
//! ==============================================================================

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Cache key; also the file stem used by `FileStorage`.
pub const SETTINGS_KEY: &str = "aqms-settings";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("settings cache i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("settings cache unavailable: {0}")]
    Unavailable(String),
}

pub trait SettingsStorage: Send + Sync {
    /// Raw cached document, `None` when nothing was ever written.
    fn read(&self) -> Result<Option<String>, StorageError>;
    fn write(&self, contents: &str) -> Result<(), StorageError>;
}

impl<T: SettingsStorage + ?Sized> SettingsStorage for Box<T> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        (**self).write(contents)
    }
}

impl<T: SettingsStorage + ?Sized> SettingsStorage for Arc<T> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        (**self).write(contents)
    }
}

// ==============================================================================
// file storage
// ==============================================================================

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/aqms-settings.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{}.json", SETTINGS_KEY)))
    }

    /// Platform config dir, e.g. `~/.config/aqms` on linux.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aqms"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file, then renames over the target.
    fn write(&self, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

// ==============================================================================
// memory storage
// ==============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(contents.into())),
        }
    }

    /// Current raw contents.
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SettingsStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        assert!(storage.read().unwrap().is_none());
    }

    #[test]
    fn file_storage_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path().join("nested"));

        storage.write(r#"{"theme":"light"}"#).unwrap();
        assert_eq!(storage.read().unwrap().as_deref(), Some(r#"{"theme":"light"}"#));
        assert!(storage.path().ends_with("aqms-settings.json"));
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn file_storage_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        storage.write("first").unwrap();
        storage.write("second").unwrap();
        assert_eq!(storage.read().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn memory_storage_starts_empty() {
        let storage = MemoryStorage::new();
        assert!(storage.read().unwrap().is_none());
        storage.write("x").unwrap();
        assert_eq!(storage.contents().as_deref(), Some("x"));
    }
}
