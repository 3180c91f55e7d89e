pub mod config;
pub mod database;
pub mod error;
pub mod input;
pub mod model;
pub mod play;
pub mod traits;
pub mod util;
