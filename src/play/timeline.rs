//! Note lifecycle driver.
//!
//! The timeline owns a song's notes in chart order and moves each one through
//! `Pending -> Active -> Retired` as playback time advances. Active notes
//! receive input in the order they were activated.

use tracing::debug;

use crate::model::note::{Note, ScoreReport};
use crate::traits::input::{HoldEvent, PressEvent};
use crate::traits::judge_sink::JudgeSink;

/// Lifecycle state of one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStatus {
    /// Window not yet reached.
    Pending,
    /// Visible and receiving input.
    Active,
    /// Window closed.
    Retired,
}

/// A press that a note claimed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimedPress {
    pub index: usize,
    pub report: ScoreReport,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    notes: Vec<Note>,
    status: Vec<NoteStatus>,
    /// Indices of active notes in activation order.
    active: Vec<usize>,
    /// Every note before this index is Active or Retired.
    cursor: usize,
    elapsed_ms: u64,
    /// Notes retired without a judgment since the last reset.
    missed_count: u32,
    /// Notes force-expired because their whole window was skipped.
    skipped_count: u32,
}

impl Timeline {
    pub fn new(notes: Vec<Note>) -> Self {
        let status = vec![NoteStatus::Pending; notes.len()];
        Self {
            notes,
            status,
            active: Vec::new(),
            cursor: 0,
            elapsed_ms: 0,
            missed_count: 0,
            skipped_count: 0,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn status(&self, index: usize) -> Option<NoteStatus> {
        self.status.get(index).copied()
    }

    /// Active note indices in activation order.
    pub fn active_indices(&self) -> &[usize] {
        &self.active
    }

    /// Active notes with their indices, for rendering.
    pub fn visible_notes(&self) -> impl Iterator<Item = (usize, &Note)> + '_ {
        self.active.iter().map(|&i| (i, &self.notes[i]))
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn missed_count(&self) -> u32 {
        self.missed_count
    }

    pub fn skipped_count(&self) -> u32 {
        self.skipped_count
    }

    /// Whether every note has been admitted and retired.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.notes.len() && self.active.is_empty()
    }

    /// Return every note to Pending and rewind to time 0.
    pub fn reset(&mut self) {
        self.status.fill(NoteStatus::Pending);
        self.active.clear();
        self.cursor = 0;
        self.elapsed_ms = 0;
        self.missed_count = 0;
        self.skipped_count = 0;
    }

    /// Unregister every active note without judging it.
    pub fn stop(&mut self) {
        for &i in &self.active {
            self.status[i] = NoteStatus::Pending;
        }
        self.active.clear();
        self.cursor = 0;
        self.elapsed_ms = 0;
    }

    /// Move playback to `elapsed_ms`: retire closed windows, then admit
    /// opened ones. A decrease in time is treated as a rewind.
    pub fn advance(&mut self, elapsed_ms: u64, sink: &mut dyn JudgeSink) {
        if elapsed_ms < self.elapsed_ms {
            self.rewind(elapsed_ms);
        }
        self.elapsed_ms = elapsed_ms;
        self.retire_closed(sink);
        self.admit_opened(sink);
    }

    fn retire_closed(&mut self, sink: &mut dyn JudgeSink) {
        let elapsed = self.elapsed_ms;
        let mut k = 0;
        while k < self.active.len() {
            let i = self.active[k];
            if elapsed >= self.notes[i].window_end() {
                self.active.remove(k);
                self.retire(i, sink);
            } else {
                k += 1;
            }
        }
    }

    fn admit_opened(&mut self, sink: &mut dyn JudgeSink) {
        let elapsed = self.elapsed_ms;
        while let Some(note) = self.notes.get(self.cursor) {
            if note.window_start() > elapsed {
                break;
            }
            let i = self.cursor;
            self.cursor += 1;
            if self.status[i] != NoteStatus::Pending {
                continue;
            }
            if elapsed < note.window_end() {
                self.notes[i].on_become_visible();
                self.status[i] = NoteStatus::Active;
                self.active.push(i);
            } else {
                // The whole window fell between two updates.
                debug!(index = i, elapsed_ms = elapsed, "note window skipped");
                self.notes[i].on_become_visible();
                self.skipped_count += 1;
                self.retire(i, sink);
            }
        }
    }

    fn retire(&mut self, index: usize, sink: &mut dyn JudgeSink) {
        let note = &mut self.notes[index];
        if !note.is_scored() {
            sink.break_combo();
            self.missed_count += 1;
        }
        if let Some(report) = note.on_become_expired(self.elapsed_ms) {
            sink.report(report);
        }
        self.status[index] = NoteStatus::Retired;
    }

    fn rewind(&mut self, elapsed_ms: u64) {
        debug!(from_ms = self.elapsed_ms, to_ms = elapsed_ms, "timeline rewind");
        let notes = &mut self.notes;
        let status = &mut self.status;
        self.active.retain(|&i| {
            if notes[i].window_start() > elapsed_ms {
                status[i] = NoteStatus::Pending;
                false
            } else {
                // Still visible after the jump; play it again from scratch.
                notes[i].on_become_visible();
                true
            }
        });
        for (i, note) in self.notes.iter().enumerate() {
            if self.status[i] == NoteStatus::Retired && note.window_end() > elapsed_ms {
                self.status[i] = NoteStatus::Pending;
            }
        }
        self.cursor = 0;
    }

    /// Offer a press to the active notes in activation order. The first note
    /// that accepts it claims it.
    pub fn dispatch_press(
        &mut self,
        event: PressEvent,
        calibration_offset_ms: f64,
        sink: &mut dyn JudgeSink,
    ) -> Option<ClaimedPress> {
        let elapsed = self.elapsed_ms;
        for &i in &self.active {
            if let Some(report) = self.notes[i].on_press(event, elapsed, calibration_offset_ms) {
                sink.report(report);
                return Some(ClaimedPress { index: i, report });
            }
        }
        None
    }

    /// Deliver a stick sample to every active note.
    pub fn dispatch_hold(&mut self, event: HoldEvent) {
        let elapsed = self.elapsed_ms;
        for &i in &self.active {
            self.notes[i].on_hold(event, elapsed);
        }
    }
}
