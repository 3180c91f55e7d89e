use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, bail};

/// Handle for referencing loaded sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub u64);

/// Handle for one playback of a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub u64);

/// Single-slot notification that a playback reached its end.
///
/// The audio side calls [`notify`](Self::notify) from whatever thread it runs
/// on; the update loop drains it with [`take`](Self::take) at the start of the
/// next tick. A newer notification overwrites an undrained one.
#[derive(Debug, Clone, Default)]
pub struct EndOfTrackSignal {
    slot: Arc<AtomicU64>,
}

impl EndOfTrackSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self, playback: PlaybackId) {
        self.slot.store(playback.0.wrapping_add(1), Ordering::Release);
    }

    pub fn take(&self) -> Option<PlaybackId> {
        match self.slot.swap(0, Ordering::AcqRel) {
            0 => None,
            raw => Some(PlaybackId(raw - 1)),
        }
    }
}

/// Abstraction over audio backends.
/// Implementations: MockAudio (headless runs and testing).
pub trait AudioBackend {
    fn load_sound(&mut self, path: &Path) -> Result<SoundId>;

    /// Start a playback. `volume` is in 0.0..=2.0.
    fn play(&mut self, id: SoundId, looped: bool, volume: f32) -> Result<PlaybackId>;
    fn stop(&mut self, playback: PlaybackId) -> Result<()>;
    fn set_paused(&mut self, playback: PlaybackId, paused: bool) -> Result<()>;
    fn set_volume(&mut self, playback: PlaybackId, volume: f32) -> Result<()>;

    /// Current playback position in milliseconds.
    fn position_ms(&self, playback: PlaybackId) -> Result<u64>;

    /// Signal raised when a non-looping playback ends by itself.
    fn end_of_track(&self) -> EndOfTrackSignal;
}

#[derive(Debug, Clone)]
struct MockPlayback {
    length_ms: u64,
    position_ms: u64,
    looped: bool,
    paused: bool,
    volume: f32,
    ended: bool,
}

/// Audio backend with a manually advanced clock.
#[derive(Debug, Default)]
pub struct MockAudio {
    default_length_ms: u64,
    lengths: HashMap<PathBuf, u64>,
    sounds: Vec<u64>,
    playbacks: HashMap<PlaybackId, MockPlayback>,
    next_playback: u64,
    signal: EndOfTrackSignal,
}

impl MockAudio {
    /// Every loaded sound lasts `default_length_ms` unless overridden.
    pub fn new(default_length_ms: u64) -> Self {
        Self {
            default_length_ms,
            ..Default::default()
        }
    }

    pub fn set_sound_length(&mut self, path: impl Into<PathBuf>, length_ms: u64) {
        self.lengths.insert(path.into(), length_ms);
    }

    /// Advance every running playback by `delta_ms`. Non-looping playbacks
    /// that reach their end raise the end-of-track signal once.
    pub fn advance(&mut self, delta_ms: u64) {
        for (&id, pb) in self.playbacks.iter_mut() {
            if pb.paused || pb.ended {
                continue;
            }
            let next = pb.position_ms + delta_ms;
            if next < pb.length_ms {
                pb.position_ms = next;
            } else if pb.looped && pb.length_ms > 0 {
                pb.position_ms = next % pb.length_ms;
            } else {
                pb.position_ms = pb.length_ms;
                pb.ended = true;
                self.signal.notify(id);
            }
        }
    }

    /// Jump a playback to `position_ms`.
    pub fn seek(&mut self, playback: PlaybackId, position_ms: u64) -> Result<()> {
        let pb = self.playback_mut(playback)?;
        pb.position_ms = position_ms.min(pb.length_ms);
        Ok(())
    }

    pub fn is_paused(&self, playback: PlaybackId) -> bool {
        self.playbacks.get(&playback).is_some_and(|pb| pb.paused)
    }

    pub fn volume(&self, playback: PlaybackId) -> Option<f32> {
        self.playbacks.get(&playback).map(|pb| pb.volume)
    }

    /// Number of playbacks that have not been stopped.
    pub fn playing_count(&self) -> usize {
        self.playbacks.len()
    }

    fn playback_mut(&mut self, playback: PlaybackId) -> Result<&mut MockPlayback> {
        match self.playbacks.get_mut(&playback) {
            Some(pb) => Ok(pb),
            None => bail!("unknown playback {:?}", playback),
        }
    }
}

impl AudioBackend for MockAudio {
    fn load_sound(&mut self, path: &Path) -> Result<SoundId> {
        let length = self
            .lengths
            .get(path)
            .copied()
            .unwrap_or(self.default_length_ms);
        self.sounds.push(length);
        Ok(SoundId(self.sounds.len() as u64 - 1))
    }

    fn play(&mut self, id: SoundId, looped: bool, volume: f32) -> Result<PlaybackId> {
        let Some(&length_ms) = self.sounds.get(id.0 as usize) else {
            bail!("unknown sound {:?}", id);
        };
        let playback = PlaybackId(self.next_playback);
        self.next_playback += 1;
        self.playbacks.insert(
            playback,
            MockPlayback {
                length_ms,
                position_ms: 0,
                looped,
                paused: false,
                volume,
                ended: false,
            },
        );
        Ok(playback)
    }

    fn stop(&mut self, playback: PlaybackId) -> Result<()> {
        self.playbacks.remove(&playback);
        Ok(())
    }

    fn set_paused(&mut self, playback: PlaybackId, paused: bool) -> Result<()> {
        self.playback_mut(playback)?.paused = paused;
        Ok(())
    }

    fn set_volume(&mut self, playback: PlaybackId, volume: f32) -> Result<()> {
        self.playback_mut(playback)?.volume = volume;
        Ok(())
    }

    fn position_ms(&self, playback: PlaybackId) -> Result<u64> {
        match self.playbacks.get(&playback) {
            Some(pb) => Ok(pb.position_ms),
            None => bail!("unknown playback {:?}", playback),
        }
    }

    fn end_of_track(&self) -> EndOfTrackSignal {
        self.signal.clone()
    }
}
