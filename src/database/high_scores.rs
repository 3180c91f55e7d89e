use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Best score per song name, persisted as `name<TAB>score` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighScoreTable {
    scores: BTreeMap<String, i64>,
}

impl HighScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text format. Lines without exactly two fields, or with a
    /// non-numeric score, are skipped.
    pub fn parse(content: &str) -> Self {
        let mut table = Self::new();
        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            let fields: Vec<&str> = line.split('\t').collect();
            let [name, score] = fields.as_slice() else {
                if !line.is_empty() {
                    debug!("skipping malformed high score line");
                }
                continue;
            };
            match score.trim().parse::<i64>() {
                Ok(score) => {
                    table.scores.insert(name.to_string(), score);
                }
                Err(_) => debug!(song = *name, "skipping unparseable high score"),
            }
        }
        table
    }

    pub fn to_text(&self) -> String {
        self.scores
            .iter()
            .map(|(name, score)| format!("{name}\t{score}\n"))
            .collect()
    }

    /// Load from disk. A missing file is an empty table.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read high scores: {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_text())
            .with_context(|| format!("failed to write high scores: {}", path.display()))?;
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

    pub fn get(&self, name: &str) -> Option<i64> {
        self.scores.get(name).copied()
    }

    /// Store `score` for `name`, overwriting.
    pub fn set(&mut self, name: &str, score: i64) {
        self.scores.insert(name.to_string(), score);
    }

    /// Keep the larger of the stored and given score. Returns true when the
    /// stored value changed.
    pub fn record(&mut self, name: &str, score: i64) -> bool {
        match self.scores.get(name) {
            Some(&best) if best >= score => false,
            _ => {
                self.scores.insert(name.to_string(), score);
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.scores.iter().map(|(k, &v)| (k.as_str(), v))
    }
}
