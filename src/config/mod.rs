mod app_config;
mod play_settings;

pub use app_config::AppConfig;
pub use play_settings::{MAX_VOLUME, PlaySettings};
