// Judging, scoring and the playback session.

pub mod autoplay;
pub mod calibration;
pub mod judge;
pub mod scoring;
pub mod session;
pub mod timeline;

pub use autoplay::ScriptedInput;
pub use calibration::CalibrationTracker;
pub use judge::{Judgment, combo_multiplier, sustain_multiplier};
pub use scoring::{LastJudgment, ScoreBoard};
pub use session::{PlaySession, SessionState, SongSlot, StateTransition};
pub use timeline::{ClaimedPress, NoteStatus, Timeline};
