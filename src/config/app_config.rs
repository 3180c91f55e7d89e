use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::input::ButtonMapping;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory scanned for `*.mp3` songs.
    pub music_dir: PathBuf,
    pub high_score_path: PathBuf,
    /// Three-line delay/volume file.
    pub calibration_path: PathBuf,
    /// Rolling log file directory. Console only when unset.
    pub log_dir: Option<PathBuf>,
    /// Countdown before a song starts (ms).
    pub countdown_ms: u64,
    pub buttons: ButtonMapping,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            music_dir: PathBuf::from("data/music/"),
            high_score_path: PathBuf::from("data/log/highscore.txt"),
            calibration_path: PathBuf::from("data/log/config.txt"),
            log_dir: None,
            countdown_ms: 3000,
            buttons: ButtonMapping::default(),
        }
    }
}

impl AppConfig {
    /// Per-user config location, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("com", "follow-rhythm", "follow-rhythm") {
            Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
            None => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Loads config from a specified path.
    /// Returns default config if file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Saves config to a specified path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
