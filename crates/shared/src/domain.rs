use std::fmt;

use serde::{Deserialize, Serialize};

/// Value the fall sensor reports when a fall has been detected. Only an exact
/// match counts; anything else (including `"yes"` or a missing field) is normal.
pub const FALL_DETECTED_MARKER: &str = "YES";

pub fn is_fall_alert(fall_detected: Option<&str>) -> bool {
    fall_detected == Some(FALL_DETECTED_MARKER)
}

/// Canned caregiver replies offered as one-tap buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedAction {
    OnMyWay,
    HelpArranged,
}

impl PredefinedAction {
    pub const ALL: [PredefinedAction; 2] = [PredefinedAction::OnMyWay, PredefinedAction::HelpArranged];

    pub fn label(self) -> &'static str {
        match self {
            PredefinedAction::OnMyWay => "I am on my way",
            PredefinedAction::HelpArranged => "Help is arranged",
        }
    }
}

impl fmt::Display for PredefinedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaregiverStatus {
    #[default]
    Idle,
    OnTheWay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LightState {
    On,
    #[default]
    Off,
}
