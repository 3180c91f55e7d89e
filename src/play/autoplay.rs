//! Scripted controller input that plays a chart perfectly.

use crate::input::XboxButton;
use crate::model::note::{Direction, Laterality, Note};
use crate::traits::input::{ControllerFrame, InputProvider};

/// Pre-computed autoplay event.
#[derive(Debug, Clone, Copy, PartialEq)]
enum AutoplayAction {
    Press(Laterality),
    Hold {
        laterality: Laterality,
        direction: Direction,
        until_ms: u64,
    },
}

#[derive(Debug, Clone, Copy)]
struct AutoplayEvent {
    time_ms: u64,
    action: AutoplayAction,
}

#[derive(Debug, Clone, Copy, Default)]
struct StickHold {
    direction: Option<Direction>,
    until_ms: u64,
}

/// Input provider that presses every single note on time and holds every
/// sustained note for its full duration.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    events: Vec<AutoplayEvent>,
    current_index: usize,
    last_poll_ms: Option<u64>,
    /// Stick holds indexed by side (left, right).
    sticks: [StickHold; 2],
}

impl ScriptedInput {
    pub fn from_notes(notes: &[Note]) -> Self {
        let mut events: Vec<AutoplayEvent> = notes
            .iter()
            .map(|note| {
                let action = match note {
                    Note::Single(_) => AutoplayAction::Press(note.laterality()),
                    Note::Sustained(n) => AutoplayAction::Hold {
                        laterality: note.laterality(),
                        direction: n.direction(),
                        until_ms: note.start_ms().saturating_add(n.duration_ms()),
                    },
                };
                AutoplayEvent {
                    time_ms: note.start_ms(),
                    action,
                }
            })
            .collect();
        events.sort_by_key(|e| e.time_ms);

        Self {
            events,
            current_index: 0,
            last_poll_ms: None,
            sticks: [StickHold::default(); 2],
        }
    }

    /// Number of scripted events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Forget progress, e.g. after the song looped.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.last_poll_ms = None;
        self.sticks = [StickHold::default(); 2];
    }

    fn side(laterality: Laterality) -> usize {
        match laterality {
            Laterality::Left => 0,
            Laterality::Right => 1,
        }
    }

    fn stick_axis(&self, laterality: Laterality, now_ms: u64) -> f32 {
        let hold = self.sticks[Self::side(laterality)];
        match hold.direction {
            Some(Direction::Up) if now_ms < hold.until_ms => 1.0,
            Some(Direction::Down) if now_ms < hold.until_ms => -1.0,
            _ => 0.0,
        }
    }
}

impl InputProvider for ScriptedInput {
    fn poll_frame(&mut self, now_ms: u64) -> ControllerFrame {
        if self.last_poll_ms.is_some_and(|last| now_ms < last) {
            self.reset();
        }
        self.last_poll_ms = Some(now_ms);

        let mut frame = ControllerFrame::idle();
        while let Some(event) = self.events.get(self.current_index) {
            if event.time_ms > now_ms {
                break;
            }
            match event.action {
                AutoplayAction::Press(Laterality::Left) => {
                    frame = frame.with_pressed(XboxButton::LeftShoulder);
                }
                AutoplayAction::Press(Laterality::Right) => {
                    frame = frame.with_pressed(XboxButton::RightShoulder);
                }
                AutoplayAction::Hold {
                    laterality,
                    direction,
                    until_ms,
                } => {
                    self.sticks[Self::side(laterality)] = StickHold {
                        direction: Some(direction),
                        until_ms,
                    };
                }
            }
            self.current_index += 1;
        }

        let left = self.stick_axis(Laterality::Left, now_ms);
        let right = self.stick_axis(Laterality::Right, now_ms);
        frame.with_sticks(left, right)
    }
}
