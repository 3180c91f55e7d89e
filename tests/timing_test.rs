//! Note windows, judging and timeline ordering.

use follow_rhythm::model::{Direction, Laterality, Note};
use follow_rhythm::play::{NoteStatus, ScoreBoard, Timeline};
use follow_rhythm::traits::input::{HoldEvent, PressEvent};
use proptest::prelude::*;

fn press(laterality: Laterality) -> PressEvent {
    PressEvent { laterality }
}

fn hold(laterality: Laterality, axis: f32) -> HoldEvent {
    HoldEvent { laterality, axis }
}

/// The render window always contains the note start.
#[test]
fn test_window_contains_start() {
    let notes = [
        Note::single(0, Laterality::Left),
        Note::single(1000, Laterality::Right),
        Note::sustained(2500, 0, Laterality::Left, Direction::Up),
        Note::sustained(10_000, 4000, Laterality::Right, Direction::Down),
    ];
    for note in &notes {
        let (start, end) = note.window();
        assert!(start <= note.start_ms());
        assert!(note.start_ms() <= end);
    }
}

proptest! {
    #[test]
    fn test_window_contains_start_for_any_note(
        start in 0u64..1_000_000,
        duration in 0u64..60_000,
        left in any::<bool>(),
    ) {
        let laterality = if left { Laterality::Left } else { Laterality::Right };
        let notes = [
            Note::single(start, laterality),
            Note::sustained(start, duration, laterality, Direction::Up),
        ];
        for note in &notes {
            prop_assert!(note.window_start() <= note.start_ms());
            prop_assert!(note.start_ms() <= note.window_end());
        }
    }
}

/// A press exactly on time with no offset ranks 100.
#[test]
fn test_on_time_press_ranks_100() {
    let mut timeline = Timeline::new(vec![Note::single(1000, Laterality::Left)]);
    let mut board = ScoreBoard::new();
    timeline.advance(1000, &mut board);
    let claim = timeline
        .dispatch_press(press(Laterality::Left), 0.0, &mut board)
        .unwrap();
    assert_eq!(claim.report.rank, 100.0);
    assert_eq!(claim.report.delta_ms, Some(0));
}

/// An unpressed note retires at start + 500 and breaks the combo.
#[test]
fn test_unpressed_note_retires_at_window_end() {
    let mut timeline = Timeline::new(vec![
        Note::single(500, Laterality::Right),
        Note::single(1000, Laterality::Left),
    ]);
    let mut board = ScoreBoard::new();
    timeline.advance(500, &mut board);
    timeline.dispatch_press(press(Laterality::Right), 0.0, &mut board);
    assert_eq!(board.combo, 1);

    timeline.advance(1499, &mut board);
    assert_eq!(timeline.status(1), Some(NoteStatus::Active));
    assert_eq!(board.combo, 1);

    timeline.advance(1500, &mut board);
    assert_eq!(timeline.status(1), Some(NoteStatus::Retired));
    assert_eq!(board.combo, 0);
    assert_eq!(board.max_combo, 1);
}

/// Holding the stick for exactly the note duration ranks 100.
#[test]
fn test_full_hold_ranks_100() {
    let mut timeline = Timeline::new(vec![Note::sustained(
        1000,
        400,
        Laterality::Left,
        Direction::Down,
    )]);
    let mut board = ScoreBoard::new();
    timeline.advance(1000, &mut board);
    timeline.dispatch_hold(hold(Laterality::Left, -1.0));
    timeline.advance(1400, &mut board);
    timeline.dispatch_hold(hold(Laterality::Left, 0.0));

    let last = board.last_judgment().unwrap();
    assert_eq!(last.rank, 100.0);
    assert_eq!(board.perfect_count, 1);
}

/// Releasing halfway through a hold ranks 25.
#[test]
fn test_half_hold_ranks_25() {
    let mut timeline = Timeline::new(vec![Note::sustained(
        1000,
        1000,
        Laterality::Right,
        Direction::Up,
    )]);
    let mut board = ScoreBoard::new();
    timeline.advance(1000, &mut board);
    timeline.dispatch_hold(hold(Laterality::Right, 1.0));
    timeline.advance(1500, &mut board);
    timeline.dispatch_hold(hold(Laterality::Right, 0.0));
    timeline.advance(2000, &mut board);

    let last = board.last_judgment().unwrap();
    assert!((last.rank - 25.0).abs() < 1e-9);
    assert_eq!(board.combo, 0);
}

/// A stick held in the wrong direction never opens the hold.
#[test]
fn test_wrong_direction_is_a_miss() {
    let mut timeline = Timeline::new(vec![Note::sustained(
        1000,
        500,
        Laterality::Left,
        Direction::Up,
    )]);
    let mut board = ScoreBoard::new();
    board.report_rank(100.0, 1.0);
    timeline.advance(1000, &mut board);
    timeline.dispatch_hold(hold(Laterality::Left, -1.0));
    timeline.advance(1500, &mut board);
    assert_eq!(board.combo, 0);
    assert_eq!(timeline.missed_count(), 1);
}

/// Two notes at the same time and side are claimed one press at a time,
/// in chart order.
#[test]
fn test_simultaneous_notes_are_claimed_fifo() {
    let mut timeline = Timeline::new(vec![
        Note::single(1000, Laterality::Left),
        Note::single(1000, Laterality::Left),
    ]);
    let mut board = ScoreBoard::new();
    timeline.advance(1000, &mut board);
    assert_eq!(timeline.active_indices(), &[0, 1]);

    let first = timeline
        .dispatch_press(press(Laterality::Left), 0.0, &mut board)
        .unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(board.judged_count(), 1);
    assert!(!timeline.notes()[1].is_scored());

    let second = timeline
        .dispatch_press(press(Laterality::Left), 0.0, &mut board)
        .unwrap();
    assert_eq!(second.index, 1);
}

/// Going back in time re-admits notes without activating one twice.
#[test]
fn test_rewind_readmits_without_duplicates() {
    let mut timeline = Timeline::new(vec![
        Note::single(1000, Laterality::Left),
        Note::single(2000, Laterality::Right),
        Note::single(8000, Laterality::Left),
    ]);
    let mut board = ScoreBoard::new();
    timeline.advance(1600, &mut board);
    assert_eq!(timeline.active_indices(), &[1]);
    assert_eq!(timeline.status(0), Some(NoteStatus::Retired));

    timeline.advance(1200, &mut board);
    let mut active = timeline.active_indices().to_vec();
    active.sort_unstable();
    assert_eq!(active, vec![0, 1]);
    assert_eq!(timeline.status(2), Some(NoteStatus::Pending));

    timeline.advance(1300, &mut board);
    assert_eq!(timeline.active_indices().len(), 2);
}

/// A note whose whole window is jumped over breaks the combo exactly once.
#[test]
fn test_jumped_over_note_breaks_combo_once() {
    let mut timeline = Timeline::new(vec![
        Note::single(100, Laterality::Left),
        Note::single(5000, Laterality::Right),
    ]);
    let mut board = ScoreBoard::new();
    timeline.advance(100, &mut board);
    timeline.dispatch_press(press(Laterality::Left), 0.0, &mut board);
    timeline.advance(700, &mut board);
    assert_eq!(board.combo, 1);

    timeline.advance(20_000, &mut board);
    assert_eq!(board.combo, 0);
    assert_eq!(board.max_combo, 1);
    assert_eq!(timeline.skipped_count(), 1);
    assert_eq!(timeline.missed_count(), 1);
    assert!(timeline.is_exhausted());
}

/// Calibration offset shifts the on-time point.
#[test]
fn test_calibration_offset_shifts_judgment() {
    let mut timeline = Timeline::new(vec![Note::single(1000, Laterality::Right)]);
    let mut board = ScoreBoard::new();
    timeline.advance(1080, &mut board);
    let claim = timeline
        .dispatch_press(press(Laterality::Right), 80.0, &mut board)
        .unwrap();
    assert_eq!(claim.report.rank, 100.0);
    assert_eq!(claim.report.delta_ms, Some(80));
}
