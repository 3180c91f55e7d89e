// Song catalogue and score persistence.

mod high_scores;
mod library;

pub use high_scores::HighScoreTable;
pub use library::{CALIBRATION_SONG, SongLibrary};
