use serde::{Deserialize, Serialize};

use crate::play::judge::{HOLD_DEAD_ZONE, RENDER_LEAD_MS, SCORE_DELTA_MS, sustain_multiplier};
use crate::traits::input::{HoldEvent, PressEvent};

/// Controller side that judges a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Laterality {
    Left,
    Right,
}

impl Laterality {
    /// Parse from the first character of a chart note name.
    /// `L`/`l` is left, anything else is right.
    pub fn from_tag(c: char) -> Self {
        if c.eq_ignore_ascii_case(&'l') {
            Laterality::Left
        } else {
            Laterality::Right
        }
    }
}

/// Stick direction required by a sustained note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Parse from the second character of a chart note name.
    pub fn from_tag(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'u' => Some(Direction::Up),
            'd' => Some(Direction::Down),
            _ => None,
        }
    }

    /// Direction of a stick deflection, or `None` inside the dead zone.
    pub fn from_axis(axis: f32) -> Option<Self> {
        if axis.abs() < HOLD_DEAD_ZONE {
            None
        } else if axis > 0.0 {
            Some(Direction::Up)
        } else {
            Some(Direction::Down)
        }
    }
}

/// Outcome of judging one note, handed to the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreReport {
    /// Accuracy in 0.0..=100.0.
    pub rank: f64,
    /// Extra multiplier applied after combo scaling.
    pub multiplier: f64,
    /// Signed press offset from the note start (ms), for calibration.
    /// Only single notes carry one.
    pub delta_ms: Option<i64>,
}

/// A note judged by one shoulder press.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleNote {
    start_ms: u64,
    laterality: Laterality,
    hit: bool,
}

impl SingleNote {
    pub fn new(start_ms: u64, laterality: Laterality) -> Self {
        Self {
            start_ms,
            laterality,
            hit: false,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.hit
    }

    fn on_press(
        &mut self,
        event: PressEvent,
        elapsed_ms: u64,
        calibration_offset_ms: f64,
    ) -> Option<ScoreReport> {
        if self.hit || event.laterality != self.laterality {
            return None;
        }
        let delta = elapsed_ms as i64 - self.start_ms as i64;
        let error = (delta as f64 - calibration_offset_ms).abs() / SCORE_DELTA_MS as f64;
        if error >= 1.0 {
            return None;
        }
        self.hit = true;
        Some(ScoreReport {
            rank: (1.0 - error) * 100.0,
            multiplier: 1.0,
            delta_ms: Some(delta),
        })
    }
}

/// A note judged by holding a stick in one direction for its duration.
#[derive(Debug, Clone, PartialEq)]
pub struct SustainedNote {
    start_ms: u64,
    duration_ms: u64,
    laterality: Laterality,
    direction: Direction,
    actual_start_ms: Option<u64>,
    actual_end_ms: Option<u64>,
}

impl SustainedNote {
    pub fn new(
        start_ms: u64,
        duration_ms: u64,
        laterality: Laterality,
        direction: Direction,
    ) -> Self {
        Self {
            start_ms,
            duration_ms,
            laterality,
            direction,
            actual_start_ms: None,
            actual_end_ms: None,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// When the hold was opened, if it was.
    pub fn actual_start_ms(&self) -> Option<u64> {
        self.actual_start_ms
    }

    /// When the hold was closed, if it was.
    pub fn actual_end_ms(&self) -> Option<u64> {
        self.actual_end_ms
    }

    fn on_hold(&mut self, event: HoldEvent, elapsed_ms: u64) {
        if self.actual_end_ms.is_some() || event.laterality != self.laterality {
            return;
        }
        let holding = self.actual_start_ms.is_some();
        let Some(direction) = Direction::from_axis(event.axis) else {
            if holding {
                self.actual_end_ms = Some(elapsed_ms);
            }
            return;
        };
        if self.start_ms > elapsed_ms.saturating_add(SCORE_DELTA_MS) {
            return;
        }
        if direction == self.direction {
            if !holding {
                self.actual_start_ms = Some(elapsed_ms);
            }
        } else if holding {
            self.actual_end_ms = Some(elapsed_ms);
        }
    }

    fn finalize(&mut self, elapsed_ms: u64) -> Option<ScoreReport> {
        let start = self.actual_start_ms?;
        let end = *self.actual_end_ms.get_or_insert(elapsed_ms);
        let held_ms = end.saturating_sub(start) as f64;
        let held_fraction = if self.duration_ms == 0 {
            0.0
        } else {
            held_ms / self.duration_ms as f64 - 1.0
        };
        let accuracy = (1.0 - held_fraction.abs()).clamp(0.0, 1.0);
        Some(ScoreReport {
            rank: accuracy * accuracy * 100.0,
            multiplier: sustain_multiplier(self.duration_ms),
            delta_ms: None,
        })
    }
}

/// A timed scoring unit of a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Single(SingleNote),
    Sustained(SustainedNote),
}

impl Note {
    pub fn single(start_ms: u64, laterality: Laterality) -> Self {
        Note::Single(SingleNote::new(start_ms, laterality))
    }

    pub fn sustained(
        start_ms: u64,
        duration_ms: u64,
        laterality: Laterality,
        direction: Direction,
    ) -> Self {
        Note::Sustained(SustainedNote::new(start_ms, duration_ms, laterality, direction))
    }

    /// Song time at which the note is judged on time (ms).
    pub fn start_ms(&self) -> u64 {
        match self {
            Note::Single(n) => n.start_ms,
            Note::Sustained(n) => n.start_ms,
        }
    }

    pub fn laterality(&self) -> Laterality {
        match self {
            Note::Single(n) => n.laterality,
            Note::Sustained(n) => n.laterality,
        }
    }

    pub fn is_sustained(&self) -> bool {
        matches!(self, Note::Sustained(_))
    }

    /// First song time at which the note is visible.
    pub fn window_start(&self) -> u64 {
        self.start_ms().saturating_sub(RENDER_LEAD_MS)
    }

    /// Song time at which the note's window closes.
    pub fn window_end(&self) -> u64 {
        match self {
            Note::Single(n) => n.start_ms.saturating_add(SCORE_DELTA_MS),
            Note::Sustained(n) => n.start_ms.saturating_add(n.duration_ms),
        }
    }

    /// `(window_start, window_end)`.
    pub fn window(&self) -> (u64, u64) {
        (self.window_start(), self.window_end())
    }

    /// Whether `elapsed_ms` lies inside `[window_start, window_end)`.
    pub fn is_in_window(&self, elapsed_ms: u64) -> bool {
        self.window_start() <= elapsed_ms && elapsed_ms < self.window_end()
    }

    /// Whether the note has earned a judgment in its current pass.
    pub fn is_scored(&self) -> bool {
        match self {
            Note::Single(n) => n.hit,
            Note::Sustained(n) => n.actual_start_ms.is_some(),
        }
    }

    /// Clear judging state when the note enters its window.
    pub fn on_become_visible(&mut self) {
        match self {
            Note::Single(n) => n.hit = false,
            Note::Sustained(n) => {
                n.actual_start_ms = None;
                n.actual_end_ms = None;
            }
        }
    }

    /// Offer a press to the note. Returns a report when the note claims it.
    pub fn on_press(
        &mut self,
        event: PressEvent,
        elapsed_ms: u64,
        calibration_offset_ms: f64,
    ) -> Option<ScoreReport> {
        match self {
            Note::Single(n) => n.on_press(event, elapsed_ms, calibration_offset_ms),
            Note::Sustained(_) => None,
        }
    }

    /// Feed a stick sample to the note.
    pub fn on_hold(&mut self, event: HoldEvent, elapsed_ms: u64) {
        if let Note::Sustained(n) = self {
            n.on_hold(event, elapsed_ms);
        }
    }

    /// Close the note's window. Sustained notes that were held produce
    /// their final report here.
    pub fn on_become_expired(&mut self, elapsed_ms: u64) -> Option<ScoreReport> {
        match self {
            Note::Single(_) => None,
            Note::Sustained(n) => n.finalize(elapsed_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn press(laterality: Laterality) -> PressEvent {
        PressEvent { laterality }
    }

    fn hold(laterality: Laterality, axis: f32) -> HoldEvent {
        HoldEvent { laterality, axis }
    }

    // =========================================================================
    // Windows
    // =========================================================================

    #[test]
    fn single_window() {
        let note = Note::single(5000, Laterality::Left);
        assert_eq!(note.window(), (2000, 5500));
    }

    #[test]
    fn window_end_saturates_at_the_end_of_time() {
        let single = Note::single(u64::MAX - 10, Laterality::Left);
        assert_eq!(single.window_end(), u64::MAX);
        let sustained = Note::sustained(u64::MAX - 10, 500, Laterality::Right, Direction::Up);
        assert_eq!(sustained.window_end(), u64::MAX);
        assert!(sustained.window_start() <= sustained.start_ms());
    }

    #[test]
    fn window_start_clamps_to_zero() {
        let note = Note::single(1000, Laterality::Right);
        assert_eq!(note.window_start(), 0);
        let note = Note::sustained(200, 800, Laterality::Right, Direction::Up);
        assert_eq!(note.window(), (0, 1000));
    }

    #[test]
    fn is_in_window_is_half_open() {
        let note = Note::single(5000, Laterality::Left);
        assert!(!note.is_in_window(1999));
        assert!(note.is_in_window(2000));
        assert!(note.is_in_window(5499));
        assert!(!note.is_in_window(5500));
    }

    #[test]
    fn tags() {
        assert_eq!(Laterality::from_tag('L'), Laterality::Left);
        assert_eq!(Laterality::from_tag('l'), Laterality::Left);
        assert_eq!(Laterality::from_tag('R'), Laterality::Right);
        assert_eq!(Laterality::from_tag('x'), Laterality::Right);
        assert_eq!(Direction::from_tag('U'), Some(Direction::Up));
        assert_eq!(Direction::from_tag('d'), Some(Direction::Down));
        assert_eq!(Direction::from_tag('1'), None);
    }

    #[test]
    fn axis_dead_zone() {
        assert_eq!(Direction::from_axis(0.0), None);
        assert_eq!(Direction::from_axis(0.29), None);
        assert_eq!(Direction::from_axis(-0.29), None);
        assert_eq!(Direction::from_axis(0.3), Some(Direction::Up));
        assert_eq!(Direction::from_axis(-0.9), Some(Direction::Down));
    }

    // =========================================================================
    // Single note judging
    // =========================================================================

    #[test]
    fn single_hit_on_time_is_rank_100() {
        let mut note = Note::single(1000, Laterality::Left);
        let report = note.on_press(press(Laterality::Left), 1000, 0.0).unwrap();
        assert_eq!(report.rank, 100.0);
        assert_eq!(report.multiplier, 1.0);
        assert_eq!(report.delta_ms, Some(0));
        assert!(note.is_scored());
    }

    #[test]
    fn single_rank_falls_off_linearly() {
        let mut note = Note::single(1000, Laterality::Left);
        let report = note.on_press(press(Laterality::Left), 1250, 0.0).unwrap();
        assert_eq!(report.rank, 50.0);
        assert_eq!(report.delta_ms, Some(250));

        let mut early = Note::single(1000, Laterality::Left);
        let report = early.on_press(press(Laterality::Left), 900, 0.0).unwrap();
        assert!((report.rank - 80.0).abs() < 1e-9);
        assert_eq!(report.delta_ms, Some(-100));
    }

    #[test]
    fn single_rejects_outside_tolerance() {
        let mut note = Note::single(1000, Laterality::Left);
        assert!(note.on_press(press(Laterality::Left), 500, 0.0).is_none());
        assert!(note.on_press(press(Laterality::Left), 1500, 0.0).is_none());
        assert!(!note.is_scored());
    }

    #[test]
    fn single_rejects_wrong_side_and_second_press() {
        let mut note = Note::single(1000, Laterality::Left);
        assert!(note.on_press(press(Laterality::Right), 1000, 0.0).is_none());
        assert!(note.on_press(press(Laterality::Left), 1000, 0.0).is_some());
        assert!(note.on_press(press(Laterality::Left), 1010, 0.0).is_none());
    }

    #[test]
    fn calibration_offset_shifts_the_target() {
        let mut note = Note::single(1000, Laterality::Right);
        let report = note.on_press(press(Laterality::Right), 1080, 80.0).unwrap();
        assert_eq!(report.rank, 100.0);
        assert_eq!(report.delta_ms, Some(80));
    }

    #[test]
    fn single_ignores_holds_and_expires_silently() {
        let mut note = Note::single(1000, Laterality::Left);
        note.on_hold(hold(Laterality::Left, 1.0), 1000);
        assert!(!note.is_scored());
        assert!(note.on_become_expired(1500).is_none());
    }

    #[test]
    fn visibility_resets_hit() {
        let mut note = Note::single(1000, Laterality::Left);
        note.on_press(press(Laterality::Left), 1000, 0.0);
        note.on_become_visible();
        assert!(!note.is_scored());
    }

    // =========================================================================
    // Sustained note judging
    // =========================================================================

    fn make_sustained() -> Note {
        Note::sustained(2000, 1000, Laterality::Right, Direction::Up)
    }

    #[test]
    fn full_hold_is_rank_100() {
        let mut note = make_sustained();
        note.on_hold(hold(Laterality::Right, 1.0), 2000);
        note.on_hold(hold(Laterality::Right, 0.0), 3000);
        let report = note.on_become_expired(3000).unwrap();
        assert_eq!(report.rank, 100.0);
        assert_eq!(report.multiplier, 4.0);
        assert_eq!(report.delta_ms, None);
    }

    #[test]
    fn half_hold_is_squared() {
        let mut note = make_sustained();
        note.on_hold(hold(Laterality::Right, 1.0), 2000);
        note.on_hold(hold(Laterality::Right, 0.1), 2500);
        let report = note.on_become_expired(3000).unwrap();
        assert_eq!(report.rank, 25.0);
    }

    #[test]
    fn hold_still_open_at_expiry_ends_then() {
        let mut note = make_sustained();
        note.on_hold(hold(Laterality::Right, 0.9), 2200);
        let report = note.on_become_expired(3000).unwrap();
        assert!((report.rank - 64.0).abs() < 1e-9);
        if let Note::Sustained(n) = &note {
            assert_eq!(n.actual_end_ms(), Some(3000));
        }
    }

    #[test]
    fn overlong_hold_rank_is_clamped_at_zero() {
        let mut note = Note::sustained(1000, 100, Laterality::Left, Direction::Down);
        note.on_hold(hold(Laterality::Left, -1.0), 600);
        let report = note.on_become_expired(1100).unwrap();
        assert_eq!(report.rank, 0.0);
    }

    #[test]
    fn hold_too_early_is_ignored() {
        let mut note = make_sustained();
        note.on_hold(hold(Laterality::Right, 1.0), 1499);
        assert!(!note.is_scored());
        note.on_hold(hold(Laterality::Right, 1.0), 1500);
        assert!(note.is_scored());
    }

    #[test]
    fn wrong_direction_does_not_open() {
        let mut note = make_sustained();
        note.on_hold(hold(Laterality::Right, -1.0), 2000);
        assert!(!note.is_scored());
        assert!(note.on_become_expired(3000).is_none());
    }

    #[test]
    fn wrong_direction_closes_open_hold() {
        let mut note = make_sustained();
        note.on_hold(hold(Laterality::Right, 1.0), 2000);
        note.on_hold(hold(Laterality::Right, -1.0), 2600);
        if let Note::Sustained(n) = &note {
            assert_eq!(n.actual_end_ms(), Some(2600));
        }
        // A closed hold never reopens.
        note.on_hold(hold(Laterality::Right, 1.0), 2700);
        if let Note::Sustained(n) = &note {
            assert_eq!(n.actual_start_ms(), Some(2000));
            assert_eq!(n.actual_end_ms(), Some(2600));
        }
    }

    #[test]
    fn other_side_is_ignored() {
        let mut note = make_sustained();
        note.on_hold(hold(Laterality::Left, 1.0), 2000);
        assert!(!note.is_scored());
    }

    #[test]
    fn sustained_ignores_presses() {
        let mut note = make_sustained();
        assert!(note.on_press(press(Laterality::Right), 2000, 0.0).is_none());
    }

    #[test]
    fn hold_opened_at_time_zero_counts() {
        let mut note = Note::sustained(0, 500, Laterality::Left, Direction::Up);
        note.on_hold(hold(Laterality::Left, 1.0), 0);
        assert!(note.is_scored());
    }

    // =========================================================================
    // Properties
    // =========================================================================

    proptest! {
        #[test]
        fn window_contains_start(
            start in 0u64..10_000_000,
            duration in 0u64..100_000,
            single in any::<bool>(),
        ) {
            let note = if single {
                Note::single(start, Laterality::Left)
            } else {
                Note::sustained(start, duration, Laterality::Left, Direction::Up)
            };
            prop_assert!(note.window_start() <= note.start_ms());
            prop_assert!(note.start_ms() <= note.window_end());
        }

        #[test]
        fn single_rank_is_bounded(start in 1000u64..100_000, offset in -600i64..600) {
            let mut note = Note::single(start, Laterality::Left);
            let elapsed = (start as i64 + offset) as u64;
            if let Some(report) = note.on_press(press(Laterality::Left), elapsed, 0.0) {
                prop_assert!(report.rank > 0.0 && report.rank <= 100.0);
            }
        }
    }
}
