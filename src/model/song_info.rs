use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::chart::parse_time_ms;

/// Song metadata read from the attributes of an info file's root element.
///
/// ```xml
/// <SongInfo name="Track" author="Artist" length="3:12" difficulty="Hard"/>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongInfo {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@author")]
    pub author: String,
    #[serde(rename = "@album")]
    pub album: String,
    #[serde(rename = "@link")]
    pub link: String,
    #[serde(rename = "@genres")]
    pub genres: String,
    /// Song length as `M:SS`.
    #[serde(rename = "@length")]
    pub length: String,
    #[serde(rename = "@difficulty")]
    pub difficulty: String,
    /// Background image reference.
    #[serde(rename = "@background")]
    pub background: String,
}

impl Default for SongInfo {
    fn default() -> Self {
        Self {
            name: "Null".to_string(),
            author: "Null".to_string(),
            album: "Null".to_string(),
            link: "Null".to_string(),
            genres: String::new(),
            length: "00:00".to_string(),
            difficulty: "-".to_string(),
            background: "White".to_string(),
        }
    }
}

impl SongInfo {
    pub fn parse(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml).context("failed to parse song info XML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path)
            .with_context(|| format!("failed to read song info: {}", path.display()))?;
        Self::parse(&xml).with_context(|| format!("invalid song info: {}", path.display()))
    }

    /// Song length in milliseconds, or 0 if `length` does not parse.
    pub fn length_ms(&self) -> u64 {
        parse_time_ms(&self.length).unwrap_or(0)
    }
}
