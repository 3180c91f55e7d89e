use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::model::chart::load_chart;
use crate::model::note::Note;
use crate::model::song_info::SongInfo;
use crate::play::calibration::CalibrationTracker;
use crate::play::scoring::ScoreBoard;
use crate::play::timeline::Timeline;
use crate::traits::input::ControllerFrame;
use crate::traits::judge_sink::JudgeSink;

/// Audio file extension of songs in a music directory.
pub const AUDIO_EXTENSION: &str = "mp3";

pub fn audio_path(music_dir: &Path, name: &str) -> PathBuf {
    music_dir.join(format!("{name}.{AUDIO_EXTENSION}"))
}

pub fn notes_path(music_dir: &Path, name: &str) -> PathBuf {
    music_dir.join("notes").join(format!("{name}.csv"))
}

pub fn info_path(music_dir: &Path, name: &str) -> PathBuf {
    music_dir.join("info").join(format!("{name}.xml"))
}

/// A playable song: metadata, note timeline and running score.
#[derive(Debug, Clone)]
pub struct Song {
    name: String,
    audio_path: PathBuf,
    info: SongInfo,
    valid: bool,
    timeline: Timeline,
    scoreboard: ScoreBoard,
    high_score: i64,
}

impl Song {
    /// Load `<name>` from a music directory. Missing or broken metadata or
    /// notes leave the song in the list but mark it invalid.
    pub fn load(music_dir: &Path, name: &str) -> Self {
        let mut valid = true;
        let info = match SongInfo::load(&info_path(music_dir, name)) {
            Ok(info) => info,
            Err(e) => {
                warn!("song {name}: {e:#}");
                valid = false;
                SongInfo::default()
            }
        };
        let notes = match load_chart(&notes_path(music_dir, name)) {
            Ok(notes) => notes,
            Err(e) => {
                warn!("song {name}: {e:#}");
                valid = false;
                Vec::new()
            }
        };
        info!(song = name, notes = notes.len(), valid, "loaded song");
        Self {
            name: name.to_string(),
            audio_path: audio_path(music_dir, name),
            info,
            valid,
            timeline: Timeline::new(notes),
            scoreboard: ScoreBoard::new(),
            high_score: 0,
        }
    }

    /// Build a song from parts already in memory.
    pub fn from_notes(name: &str, info: SongInfo, notes: Vec<Note>) -> Self {
        Self {
            name: name.to_string(),
            audio_path: PathBuf::from(format!("{name}.{AUDIO_EXTENSION}")),
            info,
            valid: true,
            timeline: Timeline::new(notes),
            scoreboard: ScoreBoard::new(),
            high_score: 0,
        }
    }

    /// Invalid placeholder, as if its files failed to load.
    pub fn invalid(name: &str) -> Self {
        let mut song = Self::from_notes(name, SongInfo::default(), Vec::new());
        song.valid = false;
        song
    }

    /// Drop sustained notes; calibration only measures presses.
    pub fn into_single_notes_only(self) -> Self {
        let notes = self
            .timeline
            .notes()
            .iter()
            .filter(|n| !n.is_sustained())
            .cloned()
            .collect();
        Self {
            timeline: Timeline::new(notes),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    pub fn info(&self) -> &SongInfo {
        &self.info
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn scoreboard(&self) -> &ScoreBoard {
        &self.scoreboard
    }

    pub fn total_notes(&self) -> usize {
        self.timeline.len()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.timeline.elapsed_ms()
    }

    pub fn high_score(&self) -> i64 {
        self.high_score
    }

    pub fn set_high_score(&mut self, score: i64) {
        self.high_score = score;
    }

    /// Fraction of the song played, from the metadata length.
    pub fn progress(&self) -> f32 {
        let length = self.info.length_ms();
        if length == 0 {
            return 0.0;
        }
        (self.elapsed_ms() as f32 / length as f32).min(1.0)
    }

    /// Reset note and score state for a fresh play-through.
    pub fn before_play(&mut self) {
        self.timeline.reset();
        self.scoreboard.reset();
    }

    /// Close a play-through: end the running combo and unregister notes.
    pub fn after_play(&mut self) {
        self.scoreboard.break_combo();
        self.timeline.stop();
    }

    /// Whether the current score beats the stored high score.
    pub fn is_new_record(&self) -> bool {
        self.scoreboard.score > self.high_score
    }

    /// Fold the current score into the high score. Returns true on a new record.
    pub fn update_high_score(&mut self) -> bool {
        let new_record = self.is_new_record();
        if new_record {
            self.high_score = self.scoreboard.score;
        }
        new_record
    }

    /// Advance to the audio position. Judgments go to the calibration tracker
    /// when one is given, otherwise to the song's scoreboard.
    pub fn advance(&mut self, elapsed_ms: u64, calibration: Option<&mut CalibrationTracker>) {
        let sink: &mut dyn JudgeSink = match calibration {
            Some(tracker) => tracker,
            None => &mut self.scoreboard,
        };
        self.timeline.advance(elapsed_ms, sink);
    }

    /// Route one controller frame to the active notes.
    pub fn handle_input(
        &mut self,
        frame: &ControllerFrame,
        calibration_offset_ms: f64,
        calibration: Option<&mut CalibrationTracker>,
    ) {
        let sink: &mut dyn JudgeSink = match calibration {
            Some(tracker) => tracker,
            None => &mut self.scoreboard,
        };
        for press in frame.press_events() {
            self.timeline
                .dispatch_press(press, calibration_offset_ms, &mut *sink);
        }
        for hold in frame.hold_events() {
            self.timeline.dispatch_hold(hold);
        }
    }

    /// Select-screen summary.
    pub fn info_text(&self) -> String {
        format!(
            "Name:   {}\nAuthor: {}\nAlbum:  {}\nGenres: {}\nLength: {}\nScore:  {}\nDifficulty: {}",
            self.info.name,
            self.info.author,
            self.info.album,
            self.info.genres,
            self.info.length,
            self.high_score,
            self.info.difficulty
        )
    }

    pub fn ending_text(&self) -> String {
        self.scoreboard.ending_text(self.total_notes())
    }

    pub fn hud_text(&self) -> String {
        self.scoreboard.hud_text()
    }
}
