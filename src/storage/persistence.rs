//! File-backed persistence medium for the overlay.

use super::KeyValueStore;
use crate::core::{Result, SyncError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Stores every key as its own JSON file under `data_dir`.
///
/// Writes land in a temporary file in the same directory which is synced
/// and then renamed over the target, so readers see either the old blob or
/// the new one.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    data_dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Location of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", file_stem(key)))
    }
}

fn file_stem(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        format!("_{}", stem)
    } else {
        stem
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                SyncError::OverlayCorrupt(format!(
                    "File '{}' is not valid UTF-8: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::OverlayCorrupt(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            SyncError::OverlayWrite(format!(
                "Failed to create data directory '{}': {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let path = self.path_for(key);
        let mut temp = NamedTempFile::new_in(&self.data_dir)
            .map_err(|e| SyncError::OverlayWrite(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(value.as_bytes())
            .map_err(|e| SyncError::OverlayWrite(format!("Failed to write temp file: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| SyncError::OverlayWrite(format!("Failed to sync temp file: {}", e)))?;
        temp.persist(&path).map_err(|e| {
            SyncError::OverlayWrite(format!(
                "Failed to move temp file over '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(())
    }
}
