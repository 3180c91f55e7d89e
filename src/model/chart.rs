//! Note chart loading.
//!
//! A chart is a tab-separated text file with one header line followed by one
//! row per note: `name  start  duration  ...` (six fields). `name[0]` selects
//! the side and, for notes with a duration, `name[1]` selects the stick
//! direction.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::model::note::{Direction, Laterality, Note};

/// Number of tab-separated fields in a chart row.
pub const CHART_FIELD_COUNT: usize = 6;

/// Parse a `M:SS.mmm` time string into milliseconds.
///
/// The fraction is read as decimal seconds: a fraction shorter than three
/// digits is right-padded (`.5` is 500 ms, `.05` is 50 ms), digits past the
/// third are dropped. This differs from reading the fraction as a whole
/// number of milliseconds (`.05` as 5 ms); both agree on `.mmm` fractions.
/// A missing fraction is zero and a string without `:` is plain seconds.
/// Times that overflow a `u64` of milliseconds are rejected.
pub fn parse_time_ms(text: &str) -> Option<u64> {
    let text = text.trim();
    let (minutes, rest) = match text.split_once(':') {
        Some((m, rest)) => (m.trim().parse::<u64>().ok()?, rest),
        None => (0, text),
    };
    let (seconds, fraction) = match rest.split_once('.') {
        Some((s, f)) => (s, f),
        None => (rest, ""),
    };
    let seconds = seconds.trim().parse::<u64>().ok()?;
    let millis = parse_fraction_ms(fraction)?;
    minutes
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

fn parse_fraction_ms(fraction: &str) -> Option<u64> {
    let fraction = fraction.trim();
    if fraction.is_empty() {
        return Some(0);
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: String = fraction.chars().chain("000".chars()).take(3).collect();
    digits.parse().ok()
}

/// Build a note from a chart row's name, start and duration.
pub fn note_from_fields(name: &str, start_ms: u64, duration_ms: u64) -> Note {
    let mut chars = name.trim().chars();
    let laterality = chars
        .next()
        .map(Laterality::from_tag)
        .unwrap_or(Laterality::Right);
    if duration_ms == 0 {
        return Note::single(start_ms, laterality);
    }
    let direction = match chars.next().and_then(Direction::from_tag) {
        Some(Direction::Up) => Direction::Up,
        _ => Direction::Down,
    };
    Note::sustained(start_ms, duration_ms, laterality, direction)
}

fn parse_row(line: &str) -> Option<Note> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != CHART_FIELD_COUNT {
        return None;
    }
    let start_ms = parse_time_ms(fields[1])?;
    let duration_ms = parse_time_ms(fields[2])?;
    Some(note_from_fields(fields[0], start_ms, duration_ms))
}

/// Parse chart text. The first line is a header; malformed rows are skipped.
pub fn parse_chart(content: &str) -> Vec<Note> {
    let mut notes: Vec<Note> = Vec::new();
    for (line_no, line) in content.lines().enumerate().skip(1) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let Some(note) = parse_row(line) else {
            debug!(line = line_no + 1, "skipping malformed chart row");
            continue;
        };
        if let Some(prev) = notes.last()
            && note.start_ms() < prev.start_ms()
        {
            debug!(
                line = line_no + 1,
                start_ms = note.start_ms(),
                "chart row is earlier than the previous row"
            );
        }
        notes.push(note);
    }
    notes
}

/// Load a chart file. A missing or empty file is an error.
pub fn load_chart(path: &Path) -> Result<Vec<Note>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read chart: {}", path.display()))?;
    if content.trim().is_empty() {
        bail!("chart is empty: {}", path.display());
    }
    Ok(parse_chart(&content))
}
