// Seams between the engine and its collaborators.

pub mod audio;
pub mod input;
pub mod judge_sink;
pub mod time;
