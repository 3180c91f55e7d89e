/// Source of wall-clock time for the session's countdown and menus.
/// Song time is read from the audio backend instead.
pub trait TimeProvider {
    fn now_ms(&self) -> u64;
}

/// Clock that moves only in fixed steps, for headless runs.
///
/// Every `tick` advances by the same step, so a run is repeatable frame for
/// frame regardless of host speed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteppedClock {
    now_ms: u64,
    step_ms: u64,
}

impl SteppedClock {
    /// A clock at zero. A zero step is raised to 1 ms so `tick` always moves.
    pub fn new(step_ms: u64) -> Self {
        Self {
            now_ms: 0,
            step_ms: step_ms.max(1),
        }
    }

    pub fn step_ms(&self) -> u64 {
        self.step_ms
    }

    /// Move forward one step and return the new time.
    pub fn tick(&mut self) -> u64 {
        self.now_ms = self.now_ms.saturating_add(self.step_ms);
        self.now_ms
    }

    /// Jump to an absolute time.
    pub fn jump_to(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Milliseconds since `earlier`, zero if `earlier` is in the future.
    pub fn since(&self, earlier_ms: u64) -> u64 {
        self.now_ms.saturating_sub(earlier_ms)
    }
}

impl TimeProvider for SteppedClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
