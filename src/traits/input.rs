use crate::input::XboxButton;
use crate::model::note::Laterality;

/// A discrete press on one side of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent {
    pub laterality: Laterality,
}

/// One sample of a stick's vertical deflection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldEvent {
    pub laterality: Laterality,
    /// Vertical axis in -1.0..=1.0, positive is up.
    pub axis: f32,
}

/// Controller state sampled once per frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerFrame {
    pub connected: bool,
    /// Buttons that went down since the previous frame.
    pub just_pressed: Vec<XboxButton>,
    pub left_stick_y: f32,
    pub right_stick_y: f32,
}

impl ControllerFrame {
    /// A connected controller at rest.
    pub fn idle() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    pub fn with_pressed(mut self, button: XboxButton) -> Self {
        if !self.just_pressed.contains(&button) {
            self.just_pressed.push(button);
        }
        self
    }

    pub fn with_sticks(mut self, left_y: f32, right_y: f32) -> Self {
        self.left_stick_y = left_y;
        self.right_stick_y = right_y;
        self
    }

    pub fn was_just_pressed(&self, button: XboxButton) -> bool {
        self.connected && self.just_pressed.contains(&button)
    }

    /// Shoulder presses as note press events: LB is left, RB is right.
    pub fn press_events(&self) -> Vec<PressEvent> {
        let mut events = Vec::new();
        if self.was_just_pressed(XboxButton::LeftShoulder) {
            events.push(PressEvent {
                laterality: Laterality::Left,
            });
        }
        if self.was_just_pressed(XboxButton::RightShoulder) {
            events.push(PressEvent {
                laterality: Laterality::Right,
            });
        }
        events
    }

    /// One hold sample per stick.
    pub fn hold_events(&self) -> Vec<HoldEvent> {
        if !self.connected {
            return Vec::new();
        }
        vec![
            HoldEvent {
                laterality: Laterality::Left,
                axis: self.left_stick_y,
            },
            HoldEvent {
                laterality: Laterality::Right,
                axis: self.right_stick_y,
            },
        ]
    }
}

/// Abstraction over controller sources.
/// Implementations: ScriptedInput (autoplay from a chart).
pub trait InputProvider {
    /// Sample the controller for the frame at `now_ms` of song time.
    fn poll_frame(&mut self, now_ms: u64) -> ControllerFrame;
}
