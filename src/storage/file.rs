use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ClientError, Result};

/// A JSON file holding every storage slot as one object.
///
/// Writes go to a sibling temp file which is synced and then renamed over
/// the previous file. Readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a handle for `path`. Nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all slots.
    ///
    /// A missing or empty file is an empty store.
    pub fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        sonic_rs::from_str(&content).map_err(|e| {
            ClientError::Storage(format!("{} is not a valid storage file: {}", self.path.display(), e))
        })
    }

    /// Replaces the file contents with `slots`.
    pub fn save(&self, slots: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = sonic_rs::to_string(slots)?;

        let tmp_path = self.temp_path();
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!("Storage file written: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "storage.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
