use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,
    #[serde(default = "default_audio_enabled")]
    pub audio_enabled: bool,
    #[serde(default = "default_style")]
    pub default_style: String,
}

fn default_master_volume() -> f32 {
    0.7
}
fn default_audio_enabled() -> bool {
    true
}
fn default_style() -> String {
    "straight".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            master_volume: default_master_volume(),
            audio_enabled: default_audio_enabled(),
            default_style: default_style(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("woodshed")
            .join("config.toml")
    }

    /// Clamp out-of-range values after deserialization so a hand-edited
    /// config can never push a bad gain into the audio path.
    pub fn normalize(&mut self) {
        if !self.master_volume.is_finite() {
            self.master_volume = default_master_volume();
        }
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        if self.default_style.trim().is_empty() {
            self.default_style = default_style();
        }
    }
}
