// follow-rhythm: headless runner for the note timing and scoring engine.
//
// Plays songs on a simulated audio clock with scripted controller input.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use follow_rhythm::config::{AppConfig, PlaySettings};
use follow_rhythm::database::{HighScoreTable, SongLibrary};
use follow_rhythm::play::{PlaySession, ScriptedInput, SessionState};
use follow_rhythm::traits::audio::{AudioBackend, MockAudio};
use follow_rhythm::traits::input::{ControllerFrame, InputProvider};
use follow_rhythm::traits::time::{SteppedClock, TimeProvider};
use follow_rhythm::util::init_logging;

/// Minimum audio after the last note window closes.
const TAIL_MS: u64 = 2000;

#[derive(Parser, Debug)]
#[command(name = "follow-rhythm", about = "Rhythm game note timing and scoring engine")]
struct Args {
    /// Path to the JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the songs in the music directory.
    List {
        #[arg(long)]
        music_dir: Option<PathBuf>,
    },
    /// Autoplay one song and record its score.
    Play {
        /// Song name (audio file stem).
        name: String,

        #[arg(long)]
        music_dir: Option<PathBuf>,

        /// Override the calibration offset (ms).
        #[arg(long, allow_hyphen_values = true)]
        offset_ms: Option<f64>,

        /// Simulation step (ms).
        #[arg(long, default_value_t = 10)]
        step_ms: u64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load_from(&config_path)?;
    init_logging(config.log_dir.as_deref(), args.verbose)?;
    info!(path = %config_path.display(), "follow-rhythm starting");

    match args.command {
        Command::List { music_dir } => {
            let music_dir = music_dir.unwrap_or_else(|| config.music_dir.clone());
            list_songs(&config, music_dir)
        }
        Command::Play {
            name,
            music_dir,
            offset_ms,
            step_ms,
        } => {
            let music_dir = music_dir.unwrap_or_else(|| config.music_dir.clone());
            play_song(&config, music_dir, &name, offset_ms, step_ms)
        }
    }
}

fn load_library(config: &AppConfig, music_dir: &Path) -> Result<SongLibrary> {
    let mut library = SongLibrary::scan(music_dir)?;
    let scores = HighScoreTable::load_from(&config.high_score_path)?;
    library.apply_high_scores(scores);
    info!(path = %music_dir.display(), songs = library.len(), "library loaded");
    Ok(library)
}

fn list_songs(config: &AppConfig, music_dir: PathBuf) -> Result<()> {
    let library = load_library(config, &music_dir)?;
    for song in library.songs() {
        let status = if song.is_valid() { "ok" } else { "invalid" };
        println!("[{status}] {}", song.name());
        println!("{}\n", song.info_text());
    }
    if library.calibration().is_none() {
        warn!("no calibration track in {}", music_dir.display());
    }
    Ok(())
}

fn play_song(
    config: &AppConfig,
    music_dir: PathBuf,
    name: &str,
    offset_ms: Option<f64>,
    step_ms: u64,
) -> Result<()> {
    if step_ms == 0 {
        bail!("--step-ms must be positive");
    }
    let library = load_library(config, &music_dir)?;
    let index = library
        .find(name)
        .with_context(|| format!("no song named {name} in {}", music_dir.display()))?;

    let mut settings = PlaySettings::load_from(&config.calibration_path);
    if let Some(offset) = offset_ms {
        settings.calibration_offset_ms = offset;
    }

    let Some(song) = library.song(index) else {
        bail!("song index {index} out of range");
    };
    let last_note_end = song
        .timeline()
        .notes()
        .iter()
        .map(|n| n.window_end())
        .max()
        .unwrap_or(0);
    let length_ms = song.info().length_ms().max(last_note_end.saturating_add(TAIL_MS));
    let mut autoplay = ScriptedInput::from_notes(song.timeline().notes());
    let mut audio = MockAudio::new(length_ms);
    audio.set_sound_length(song.audio_path(), length_ms);

    let mut session = PlaySession::new(audio, library, settings)
        .with_buttons(config.buttons.clone())
        .with_countdown_ms(config.countdown_ms);
    let mut clock = SteppedClock::new(step_ms);
    let started_ms = clock.now_ms();
    session.start_song(index, started_ms)?;

    let deadline_ms = config.countdown_ms.saturating_add(length_ms).saturating_add(TAIL_MS);
    while session.state() != SessionState::Finished {
        if clock.since(started_ms) > deadline_ms {
            bail!("song {name} did not finish by {deadline_ms} ms");
        }
        let now = clock.tick();
        let frame = match session.current_playback() {
            Some(playback) if session.state() == SessionState::Playing => {
                session.audio_mut().advance(clock.step_ms());
                let position = session.audio().position_ms(playback)?;
                autoplay.poll_frame(position)
            }
            _ => ControllerFrame::idle(),
        };
        session.update(now, &frame)?;
    }

    if let Some(text) = session.ending_text() {
        println!("{text}");
    }
    let new_record = session.is_new_record();
    let confirm = ControllerFrame::idle().with_pressed(config.buttons.confirm_button());
    session.update(clock.now_ms(), &confirm)?;
    if new_record {
        println!("New record!");
    }
    session
        .library()
        .high_scores()
        .save_or_warn(&config.high_score_path);
    Ok(())
}
