use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};

use crate::store::schema::ProgressData;

const PROGRESS_FILE: &str = "progress.json";

/// Best-effort persistence gateway. Reads and writes a single JSON blob;
/// every failure path degrades to defaults or a dropped write so a broken
/// disk never interrupts a practice session.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("woodshed");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => T::default(),
            }
        } else {
            T::default()
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load the progress blob. Missing file, unreadable file, malformed
    /// JSON and stale schema versions all resolve to the default.
    pub fn load_progress(&self) -> ProgressData {
        let data: ProgressData = self.load(PROGRESS_FILE);
        if data.needs_reset() {
            ProgressData::default()
        } else {
            data
        }
    }

    /// Write the progress blob. Failures are logged and dropped — this is
    /// a cache, not a durable store.
    pub fn save_progress(&self, data: &ProgressData) {
        if let Err(e) = self.save(PROGRESS_FILE, data) {
            log::warn!("dropping progress write: {e}");
        }
    }
}
