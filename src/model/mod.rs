// Charts, notes and song metadata.

pub mod chart;
pub mod note;
pub mod song;
pub mod song_info;

pub use chart::{load_chart, parse_chart};
pub use note::{Direction, Laterality, Note, ScoreReport, SingleNote, SustainedNote};
pub use song::Song;
pub use song_info::SongInfo;
