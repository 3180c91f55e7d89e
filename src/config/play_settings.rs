//! Player timing and volume settings.
//!
//! Persisted as three labeled lines:
//!
//! ```text
//! Config Delay:12.5
//! Music Vol:1
//! SFX Vol:0.8
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Upper bound of both volume settings.
pub const MAX_VOLUME: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaySettings {
    /// Systematic input latency subtracted when judging presses (ms).
    pub calibration_offset_ms: f64,
    pub music_volume: f32,
    pub sfx_volume: f32,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            calibration_offset_ms: 0.0,
            music_volume: 1.0,
            sfx_volume: 1.0,
        }
    }
}

impl PlaySettings {
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, MAX_VOLUME);
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, MAX_VOLUME);
    }

    /// Parse the three-line format. Anything else yields `None`.
    pub fn parse(content: &str) -> Option<Self> {
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let [delay, music, sfx] = lines.as_slice() else {
            return None;
        };
        let mut settings = Self {
            calibration_offset_ms: labeled_value(delay)?,
            ..Self::default()
        };
        settings.set_music_volume(labeled_value(music)? as f32);
        settings.set_sfx_volume(labeled_value(sfx)? as f32);
        Some(settings)
    }

    pub fn to_text(&self) -> String {
        format!(
            "Config Delay:{}\nMusic Vol:{}\nSFX Vol:{}",
            self.calibration_offset_ms, self.music_volume, self.sfx_volume
        )
    }

    /// Load from disk. A missing or malformed file gives the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        Self::parse(&content).unwrap_or_else(|| {
            debug!(path = %path.display(), "ignoring malformed settings file");
            Self::default()
        })
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_text())
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
        Ok(())
    }

    /// Save, logging a warning instead of failing.
    pub fn save_or_warn<P: AsRef<Path>>(&self, path: P) -> bool {
        match self.save_to(path) {
            Ok(()) => true,
            Err(e) => {
                warn!("{e:#}");
                false
            }
        }
    }
}

fn labeled_value(line: &str) -> Option<f64> {
    let (_, value) = line.split_once(':')?;
    value.trim().parse().ok()
}
