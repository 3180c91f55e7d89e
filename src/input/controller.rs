use serde::{Deserialize, Serialize};

/// Xbox-style controller buttons that can be bound to menu actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XboxButton {
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    Start,
    Back,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl XboxButton {
    /// Returns all buttons in display order.
    pub fn all() -> &'static [XboxButton] {
        &[
            XboxButton::A,
            XboxButton::B,
            XboxButton::X,
            XboxButton::Y,
            XboxButton::LeftShoulder,
            XboxButton::RightShoulder,
            XboxButton::Start,
            XboxButton::Back,
            XboxButton::DpadUp,
            XboxButton::DpadDown,
            XboxButton::DpadLeft,
            XboxButton::DpadRight,
        ]
    }

    /// Config name of the button.
    pub fn name(self) -> &'static str {
        match self {
            XboxButton::A => "A",
            XboxButton::B => "B",
            XboxButton::X => "X",
            XboxButton::Y => "Y",
            XboxButton::LeftShoulder => "LB",
            XboxButton::RightShoulder => "RB",
            XboxButton::Start => "Start",
            XboxButton::Back => "Back",
            XboxButton::DpadUp => "DpadUp",
            XboxButton::DpadDown => "DpadDown",
            XboxButton::DpadLeft => "DpadLeft",
            XboxButton::DpadRight => "DpadRight",
        }
    }

    /// Look a button up by its config name. Unknown names map to `A`.
    pub fn from_name(name: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|b| b.name() == name.trim())
            .unwrap_or(XboxButton::A)
    }
}

/// Menu action bindings, stored by button name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ButtonMapping {
    pub confirm: String,
    pub back: String,
    pub pause: String,
}

impl Default for ButtonMapping {
    fn default() -> Self {
        Self {
            confirm: "A".to_string(),
            back: "Back".to_string(),
            pause: "Start".to_string(),
        }
    }
}

impl ButtonMapping {
    pub fn confirm_button(&self) -> XboxButton {
        XboxButton::from_name(&self.confirm)
    }

    pub fn back_button(&self) -> XboxButton {
        XboxButton::from_name(&self.back)
    }

    pub fn pause_button(&self) -> XboxButton {
        XboxButton::from_name(&self.pause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trip() {
        for &button in XboxButton::all() {
            assert_eq!(XboxButton::from_name(button.name()), button);
        }
    }

    #[test]
    fn unknown_name_falls_back_to_a() {
        assert_eq!(XboxButton::from_name("Guide"), XboxButton::A);
        assert_eq!(XboxButton::from_name(""), XboxButton::A);
    }

    #[test]
    fn default_mapping() {
        let mapping = ButtonMapping::default();
        assert_eq!(mapping.confirm_button(), XboxButton::A);
        assert_eq!(mapping.back_button(), XboxButton::Back);
        assert_eq!(mapping.pause_button(), XboxButton::Start);
    }

    #[test]
    fn partial_mapping_json_uses_defaults() {
        let mapping: ButtonMapping = serde_json::from_str(r#"{"pause":"Y"}"#).unwrap();
        assert_eq!(mapping.pause_button(), XboxButton::Y);
        assert_eq!(mapping.confirm_button(), XboxButton::A);
    }
}
