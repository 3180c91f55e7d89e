//! Playback session state machine.
//!
//! ```text
//! Idle --start_song--> Countdown --timer--> Playing --end of track--> Finished
//!                                           |    ^                      |
//!                                     pause |    | resume / restart     | confirm
//!                                           v    |                      v
//!                                           Paused --quit-----------> Idle
//! ```
//!
//! Calibration skips the countdown, loops its track and never finishes.

use anyhow::Result;
use tracing::{debug, info};

use crate::config::PlaySettings;
use crate::database::SongLibrary;
use crate::error::GameError;
use crate::input::ButtonMapping;
use crate::model::song::Song;
use crate::play::calibration::CalibrationTracker;
use crate::traits::audio::{AudioBackend, EndOfTrackSignal, PlaybackId};
use crate::traits::input::ControllerFrame;

/// Default countdown before a song starts (ms).
pub const COUNTDOWN_MS: u64 = 3000;

/// Notice shown after a rejected song selection.
pub const SONG_INVALID_NOTICE: &str = "Song Invalid!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Countdown,
    Playing,
    Paused,
    Finished,
}

/// Result of one session step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    None,
    Changed {
        from: SessionState,
        to: SessionState,
    },
}

/// Which song the session is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongSlot {
    Library(usize),
    Calibration,
}

#[derive(Debug, Clone, Copy)]
struct CurrentPlay {
    slot: SongSlot,
    playback: Option<PlaybackId>,
    countdown_started_ms: u64,
}

/// Owns the song library, the audio backend and the single current song.
pub struct PlaySession<A: AudioBackend> {
    audio: A,
    end_of_track: EndOfTrackSignal,
    library: SongLibrary,
    settings: PlaySettings,
    buttons: ButtonMapping,
    countdown_ms: u64,
    state: SessionState,
    current: Option<CurrentPlay>,
    calibration: CalibrationTracker,
    notice: Option<&'static str>,
    new_record: bool,
}

impl<A: AudioBackend> PlaySession<A> {
    pub fn new(audio: A, library: SongLibrary, settings: PlaySettings) -> Self {
        let end_of_track = audio.end_of_track();
        Self {
            audio,
            end_of_track,
            library,
            settings,
            buttons: ButtonMapping::default(),
            countdown_ms: COUNTDOWN_MS,
            state: SessionState::Idle,
            current: None,
            calibration: CalibrationTracker::new(),
            notice: None,
            new_record: false,
        }
    }

    pub fn with_buttons(mut self, buttons: ButtonMapping) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_countdown_ms(mut self, countdown_ms: u64) -> Self {
        self.countdown_ms = countdown_ms;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &PlaySettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PlaySettings {
        &mut self.settings
    }

    pub fn library(&self) -> &SongLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut SongLibrary {
        &mut self.library
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn calibration(&self) -> &CalibrationTracker {
        &self.calibration
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(
            self.current,
            Some(CurrentPlay {
                slot: SongSlot::Calibration,
                ..
            })
        )
    }

    pub fn current_slot(&self) -> Option<SongSlot> {
        self.current.map(|c| c.slot)
    }

    pub fn current_playback(&self) -> Option<PlaybackId> {
        self.current.and_then(|c| c.playback)
    }

    pub fn current_song(&self) -> Option<&Song> {
        match self.current?.slot {
            SongSlot::Library(index) => self.library.song(index),
            SongSlot::Calibration => self.library.calibration(),
        }
    }

    fn current_song_mut(&mut self) -> Option<&mut Song> {
        match self.current?.slot {
            SongSlot::Library(index) => self.library.song_mut(index),
            SongSlot::Calibration => self.library.calibration_mut(),
        }
    }

    /// Transient notice for the UI, e.g. after selecting an invalid song.
    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Whether the finished play-through beat the stored high score.
    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    /// Milliseconds left in the countdown.
    pub fn countdown_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        if self.state != SessionState::Countdown {
            return None;
        }
        let started = self.current?.countdown_started_ms;
        Some(self.countdown_ms.saturating_sub(now_ms.saturating_sub(started)))
    }

    fn set_state(&mut self, to: SessionState) -> StateTransition {
        let from = self.state;
        if from == to {
            return StateTransition::None;
        }
        debug!(?from, ?to, "session state");
        self.state = to;
        StateTransition::Changed { from, to }
    }

    fn require(&self, operation: &'static str, state: SessionState) -> Result<()> {
        if self.state != state {
            return Err(GameError::InvalidState {
                operation,
                state: self.state,
            }
            .into());
        }
        Ok(())
    }

    // =========================================================================
    // Song lifecycle
    // =========================================================================

    /// Select a song from the library and start its countdown.
    pub fn start_song(&mut self, index: usize, now_ms: u64) -> Result<StateTransition> {
        self.require("start a song", SessionState::Idle)?;
        let count = self.library.len();
        let Some(song) = self.library.song(index) else {
            return Err(GameError::SongIndexOutOfRange { index, count }.into());
        };
        if !song.is_valid() {
            self.notice = Some(SONG_INVALID_NOTICE);
            return Err(GameError::SongInvalid {
                name: song.name().to_string(),
            }
            .into());
        }
        info!(song = song.name(), "starting song");
        self.notice = None;
        self.new_record = false;
        self.current = Some(CurrentPlay {
            slot: SongSlot::Library(index),
            playback: None,
            countdown_started_ms: now_ms,
        });
        Ok(self.set_state(SessionState::Countdown))
    }

    fn begin_playback(&mut self, looped: bool) -> Result<()> {
        let volume = self.settings.music_volume;
        let Some(song) = self.current_song_mut() else {
            return Ok(());
        };
        song.before_play();
        let path = song.audio_path().to_path_buf();
        let sound = self.audio.load_sound(&path)?;
        let playback = self.audio.play(sound, looped, volume)?;
        if let Some(current) = self.current.as_mut() {
            current.playback = Some(playback);
        }
        Ok(())
    }

    /// Stop the current audio and unregister the song's notes.
    fn end_current(&mut self) -> Result<()> {
        if let Some(playback) = self.current.as_mut().and_then(|c| c.playback.take()) {
            self.audio.stop(playback)?;
        }
        if let Some(song) = self.current_song_mut() {
            song.after_play();
        }
        Ok(())
    }

    /// Abort whatever is running and return to Idle. Scores are not recorded.
    pub fn stop(&mut self) -> Result<StateTransition> {
        self.end_current()?;
        self.current = None;
        Ok(self.set_state(SessionState::Idle))
    }

    /// Drain the end-of-track signal. Notifications for playbacks other than
    /// the current one are discarded.
    fn drain_end_of_track(&mut self) -> Result<StateTransition> {
        let Some(ended) = self.end_of_track.take() else {
            return Ok(StateTransition::None);
        };
        let is_current = self.current_playback() == Some(ended);
        let playing = matches!(self.state, SessionState::Playing | SessionState::Paused);
        if !is_current || !playing || self.is_calibrating() {
            debug!(?ended, "ignoring stale end of track");
            return Ok(StateTransition::None);
        }
        self.end_current()?;
        let mut new_record = false;
        if let Some(song) = self.current_song() {
            new_record = song.is_new_record();
            info!(song = song.name(), score = song.scoreboard().score, "song finished");
        }
        self.new_record = new_record;
        Ok(self.set_state(SessionState::Finished))
    }

    /// Advance the session to `now_ms` of wall time and apply one controller
    /// frame. Song time comes from the audio backend.
    pub fn update(&mut self, now_ms: u64, frame: &ControllerFrame) -> Result<StateTransition> {
        let drained = self.drain_end_of_track()?;
        if drained != StateTransition::None {
            return Ok(drained);
        }

        match self.state {
            SessionState::Idle | SessionState::Paused => Ok(StateTransition::None),
            SessionState::Countdown => {
                let started = self.current.map_or(now_ms, |c| c.countdown_started_ms);
                if now_ms.saturating_sub(started) < self.countdown_ms {
                    return Ok(StateTransition::None);
                }
                self.begin_playback(false)?;
                Ok(self.set_state(SessionState::Playing))
            }
            SessionState::Playing => {
                if !self.is_calibrating() && frame.was_just_pressed(self.buttons.pause_button()) {
                    return self.pause();
                }
                self.play_frame(frame)?;
                Ok(StateTransition::None)
            }
            SessionState::Finished => {
                if frame.was_just_pressed(self.buttons.confirm_button()) {
                    return self.confirm_finish();
                }
                Ok(StateTransition::None)
            }
        }
    }

    fn play_frame(&mut self, frame: &ControllerFrame) -> Result<()> {
        let Some(current) = self.current else {
            return Ok(());
        };
        let Some(playback) = current.playback else {
            return Ok(());
        };
        let elapsed_ms = self.audio.position_ms(playback)?;
        let offset = self.settings.calibration_offset_ms;
        let (song, mut tracker) = match current.slot {
            SongSlot::Library(index) => (self.library.song_mut(index), None),
            SongSlot::Calibration => (self.library.calibration_mut(), Some(&mut self.calibration)),
        };
        if let Some(song) = song {
            song.advance(elapsed_ms, tracker.as_deref_mut());
            song.handle_input(frame, offset, tracker.as_deref_mut());
        }
        Ok(())
    }

    // =========================================================================
    // Pause menu
    // =========================================================================

    pub fn pause(&mut self) -> Result<StateTransition> {
        self.require("pause", SessionState::Playing)?;
        if self.is_calibrating() {
            return Ok(StateTransition::None);
        }
        if let Some(playback) = self.current_playback() {
            self.audio.set_paused(playback, true)?;
        }
        Ok(self.set_state(SessionState::Paused))
    }

    pub fn resume(&mut self) -> Result<StateTransition> {
        self.require("resume", SessionState::Paused)?;
        if let Some(playback) = self.current_playback() {
            self.audio.set_paused(playback, false)?;
        }
        Ok(self.set_state(SessionState::Playing))
    }

    /// Stop the paused song and play it again from time 0.
    pub fn restart(&mut self) -> Result<StateTransition> {
        self.require("restart", SessionState::Paused)?;
        if !matches!(self.current_slot(), Some(SongSlot::Library(_))) {
            return Ok(StateTransition::None);
        }
        self.end_current()?;
        self.new_record = false;
        self.begin_playback(false)?;
        Ok(self.set_state(SessionState::Playing))
    }

    /// Leave the paused song without an ending screen.
    pub fn quit(&mut self) -> Result<StateTransition> {
        self.require("quit", SessionState::Paused)?;
        self.stop()
    }

    /// Leave the ending screen, recording the high score.
    pub fn confirm_finish(&mut self) -> Result<StateTransition> {
        self.require("confirm", SessionState::Finished)?;
        if let Some(song) = self.current_song_mut()
            && song.update_high_score()
        {
            info!(song = song.name(), score = song.high_score(), "new high score");
        }
        self.current = None;
        Ok(self.set_state(SessionState::Idle))
    }

    /// Ending text of the finished song.
    pub fn ending_text(&self) -> Option<String> {
        if self.state != SessionState::Finished {
            return None;
        }
        self.current_song().map(Song::ending_text)
    }

    // =========================================================================
    // Calibration
    // =========================================================================

    /// Loop the calibration track and start measuring press offsets.
    pub fn start_calibration(&mut self, now_ms: u64) -> Result<StateTransition> {
        self.require("calibrate", SessionState::Idle)?;
        if self.library.calibration().is_none() {
            return Err(GameError::NoCalibrationSong.into());
        }
        self.calibration.reset();
        self.current = Some(CurrentPlay {
            slot: SongSlot::Calibration,
            playback: None,
            countdown_started_ms: now_ms,
        });
        self.begin_playback(true)?;
        Ok(self.set_state(SessionState::Playing))
    }

    /// Stop calibrating. With `apply`, the measured average becomes the
    /// calibration offset. Returns the average.
    pub fn stop_calibration(&mut self, apply: bool) -> Result<f64> {
        if !self.is_calibrating() {
            return Err(GameError::InvalidState {
                operation: "stop calibration",
                state: self.state,
            }
            .into());
        }
        self.stop()?;
        let average = self.calibration.average_delta_ms();
        if apply && self.calibration.count() > 0 {
            info!(offset_ms = average, "applied calibration");
            self.settings.calibration_offset_ms = average;
        }
        Ok(average)
    }
}
