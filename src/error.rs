use thiserror::Error;

use crate::play::session::SessionState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Song invalid: {name}")]
    SongInvalid { name: String },

    #[error("Song index {index} out of range ({count} songs)")]
    SongIndexOutOfRange { index: usize, count: usize },

    #[error("No calibration song in the music directory")]
    NoCalibrationSong,

    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}
