use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::database::high_scores::HighScoreTable;
use crate::model::song::{AUDIO_EXTENSION, Song};

/// Audio stem of the looping track used for calibration.
pub const CALIBRATION_SONG: &str = "Calibration";

/// All songs of a music directory plus the calibration track.
///
/// Also keeps the high score table the songs were loaded from, so entries for
/// songs outside this directory survive a save.
#[derive(Debug, Clone, Default)]
pub struct SongLibrary {
    songs: Vec<Song>,
    calibration: Option<Song>,
    stored_scores: HighScoreTable,
}

impl SongLibrary {
    pub fn new(songs: Vec<Song>, calibration: Option<Song>) -> Self {
        Self {
            songs,
            calibration,
            stored_scores: HighScoreTable::new(),
        }
    }

    /// Load every `*.mp3` in `music_dir`, sorted by name.
    pub fn scan(music_dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(music_dir)
            .with_context(|| format!("failed to read music directory: {}", music_dir.display()))?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_audio_extension(path))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();

        let mut songs = Vec::new();
        let mut calibration = None;
        for name in names {
            let song = Song::load(music_dir, &name);
            if name == CALIBRATION_SONG {
                calibration = Some(song.into_single_notes_only());
            } else {
                songs.push(song);
            }
        }
        info!(
            dir = %music_dir.display(),
            songs = songs.len(),
            calibration = calibration.is_some(),
            "scanned music directory"
        );
        Ok(Self::new(songs, calibration))
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn song(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn song_mut(&mut self, index: usize) -> Option<&mut Song> {
        self.songs.get_mut(index)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.songs.iter().position(|s| s.name() == name)
    }

    pub fn calibration(&self) -> Option<&Song> {
        self.calibration.as_ref()
    }

    pub fn calibration_mut(&mut self) -> Option<&mut Song> {
        self.calibration.as_mut()
    }

    /// Copy stored high scores onto the songs and keep the table.
    pub fn apply_high_scores(&mut self, table: HighScoreTable) {
        for song in &mut self.songs {
            song.set_high_score(table.get(song.name()).unwrap_or(0));
        }
        self.stored_scores = table;
    }

    /// The stored table with every song's best score merged in, for saving.
    pub fn high_scores(&self) -> HighScoreTable {
        let mut table = self.stored_scores.clone();
        for song in &self.songs {
            table.record(song.name(), song.high_score());
        }
        table
    }

    /// Forget every high score, including those of songs not in the library.
    pub fn clear_high_scores(&mut self) {
        self.stored_scores.clear();
        for song in &mut self.songs {
            song.set_high_score(0);
        }
    }
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::song::{info_path, notes_path};

    const CHART: &str = "h\nL\t0:01.000\t0:00.000\ta\tb\tc\nRU\t0:02.000\t0:00.500\ta\tb\tc\n";

    fn make_music_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        fs::create_dir_all(dir.path().join("info")).unwrap();
        for name in names {
            fs::write(dir.path().join(format!("{name}.mp3")), b"").unwrap();
            fs::write(notes_path(dir.path(), name), CHART).unwrap();
            fs::write(
                info_path(dir.path(), name),
                format!(r#"<SongInfo name="{name}"/>"#),
            )
            .unwrap();
        }
        fs::write(dir.path().join("readme.txt"), b"").unwrap();
        dir
    }

    #[test]
    fn scan_finds_sorted_songs_and_calibration() {
        let dir = make_music_dir(&["Beta", "Alpha", "Calibration"]);
        let library = SongLibrary::scan(dir.path()).unwrap();
        let names: Vec<_> = library.songs().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        let calibration = library.calibration().unwrap();
        assert_eq!(calibration.total_notes(), 1);
        assert_eq!(library.find("Beta"), Some(1));
        assert_eq!(library.song(0).unwrap().total_notes(), 2);
    }

    #[test]
    fn scan_keeps_invalid_songs() {
        let dir = make_music_dir(&["Good"]);
        fs::write(dir.path().join("Broken.mp3"), b"").unwrap();
        let library = SongLibrary::scan(dir.path()).unwrap();
        assert_eq!(library.len(), 2);
        assert!(!library.song(0).unwrap().is_valid());
        assert!(library.song(1).unwrap().is_valid());
    }

    #[test]
    fn scan_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SongLibrary::scan(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn high_scores_flow_through() {
        let dir = make_music_dir(&["A", "B"]);
        let mut library = SongLibrary::scan(dir.path()).unwrap();
        let mut table = HighScoreTable::new();
        table.set("A", 900);
        library.apply_high_scores(table);
        assert_eq!(library.song(0).unwrap().high_score(), 900);
        assert_eq!(library.song(1).unwrap().high_score(), 0);

        let saved = library.high_scores();
        assert_eq!(saved.get("A"), Some(900));
        assert_eq!(saved.get("B"), Some(0));

        library.clear_high_scores();
        assert_eq!(library.song(0).unwrap().high_score(), 0);
        assert_eq!(library.high_scores().get("A"), Some(0));
    }

    #[test]
    fn saving_keeps_scores_of_songs_in_other_directories() {
        let dir = make_music_dir(&["A"]);
        let mut library = SongLibrary::scan(dir.path()).unwrap();
        library.apply_high_scores(HighScoreTable::parse("Other\t9000\nA\t10\n"));
        library.song_mut(0).unwrap().set_high_score(250);

        let saved = library.high_scores();
        assert_eq!(saved.to_text(), "A\t250\nOther\t9000\n");
    }

    #[test]
    fn saving_never_lowers_a_stored_score() {
        let dir = make_music_dir(&["A"]);
        let mut library = SongLibrary::scan(dir.path()).unwrap();
        library.apply_high_scores(HighScoreTable::parse("A\t500\n"));
        library.song_mut(0).unwrap().set_high_score(100);
        assert_eq!(library.high_scores().get("A"), Some(500));
    }
}
