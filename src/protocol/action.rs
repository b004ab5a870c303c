//! Control action vocabulary.
//!
//! The remote actuator understands a closed set of action names. They are
//! sent verbatim in the `command` field of a control payload.
//!
//! | Group | Actions |
//! |-------|---------|
//! | Movement | `move/up`, `move/down`, `move/left`, `move/right` |
//! | Tilt | `tilt_up`, `tilt_down` |
//! | Pan | `pan_left`, `pan_right` |
//! | Zoom | `zoom_in`, `zoom_out` |
//! | Discrete | `stop`, `reset`, `preset/home` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Neutral slider position. Levels above emit the positive action, levels
/// below emit the negative one.
pub const SLIDER_MIDPOINT: u8 = 50;

/// Upper bound of a slider level.
pub const SLIDER_MAX: u8 = 100;

// ============================================================================
// Action
// ============================================================================

/// A control action understood by the camera rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move the view up.
    #[serde(rename = "move/up")]
    MoveUp,
    /// Move the view down.
    #[serde(rename = "move/down")]
    MoveDown,
    /// Move the view left.
    #[serde(rename = "move/left")]
    MoveLeft,
    /// Move the view right.
    #[serde(rename = "move/right")]
    MoveRight,
    /// Tilt the camera up.
    #[serde(rename = "tilt_up")]
    TiltUp,
    /// Tilt the camera down.
    #[serde(rename = "tilt_down")]
    TiltDown,
    /// Pan the camera left.
    #[serde(rename = "pan_left")]
    PanLeft,
    /// Pan the camera right.
    #[serde(rename = "pan_right")]
    PanRight,
    /// Zoom in.
    #[serde(rename = "zoom_in")]
    ZoomIn,
    /// Zoom out.
    #[serde(rename = "zoom_out")]
    ZoomOut,
    /// Stop all motion.
    #[serde(rename = "stop")]
    Stop,
    /// Return pan/tilt/zoom to neutral.
    #[serde(rename = "reset")]
    Reset,
    /// Go to the home preset.
    #[serde(rename = "preset/home")]
    PresetHome,
}

impl Action {
    /// Every action in the vocabulary.
    pub const ALL: [Action; 13] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveLeft,
        Action::MoveRight,
        Action::TiltUp,
        Action::TiltDown,
        Action::PanLeft,
        Action::PanRight,
        Action::ZoomIn,
        Action::ZoomOut,
        Action::Stop,
        Action::Reset,
        Action::PresetHome,
    ];

    /// Returns the wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::MoveUp => "move/up",
            Action::MoveDown => "move/down",
            Action::MoveLeft => "move/left",
            Action::MoveRight => "move/right",
            Action::TiltUp => "tilt_up",
            Action::TiltDown => "tilt_down",
            Action::PanLeft => "pan_left",
            Action::PanRight => "pan_right",
            Action::ZoomIn => "zoom_in",
            Action::ZoomOut => "zoom_out",
            Action::Stop => "stop",
            Action::Reset => "reset",
            Action::PresetHome => "preset/home",
        }
    }

    /// Returns `true` for actions that make sense to repeat while held.
    ///
    /// `stop`, `reset` and `preset/home` are one-shot.
    #[inline]
    #[must_use]
    pub const fn is_continuous(self) -> bool {
        !matches!(self, Action::Stop | Action::Reset | Action::PresetHome)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::unknown_action(s))
    }
}

// ============================================================================
// Axis
// ============================================================================

/// A proportional control axis driven by a slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Zoom: `zoom_in` above midpoint, `zoom_out` below.
    Zoom,
    /// Tilt: `tilt_up` above midpoint, `tilt_down` below.
    Tilt,
    /// Pan: `pan_right` above midpoint, `pan_left` below.
    Pan,
}

impl Axis {
    /// All slider axes.
    pub const ALL: [Axis; 3] = [Axis::Zoom, Axis::Tilt, Axis::Pan];

    /// Action emitted for levels above the midpoint.
    #[must_use]
    pub const fn positive(self) -> Action {
        match self {
            Axis::Zoom => Action::ZoomIn,
            Axis::Tilt => Action::TiltUp,
            Axis::Pan => Action::PanRight,
        }
    }

    /// Action emitted for levels below the midpoint.
    #[must_use]
    pub const fn negative(self) -> Action {
        match self {
            Axis::Zoom => Action::ZoomOut,
            Axis::Tilt => Action::TiltDown,
            Axis::Pan => Action::PanLeft,
        }
    }

    /// Maps a slider level to its directional action.
    ///
    /// Returns `None` at exactly [`SLIDER_MIDPOINT`].
    #[must_use]
    pub fn action_for(self, level: u8) -> Option<Action> {
        match level.cmp(&SLIDER_MIDPOINT) {
            std::cmp::Ordering::Greater => Some(self.positive()),
            std::cmp::Ordering::Less => Some(self.negative()),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Zoom => "zoom",
            Axis::Tilt => "tilt",
            Axis::Pan => "pan",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_wire_names_parse_back() {
        for action in Action::ALL {
            let parsed: Action = action.as_str().parse().expect("known action");
            assert_eq!(parsed, action);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Action::PresetHome).expect("serialize");
        assert_eq!(json, "\"preset/home\"");

        let action: Action = serde_json::from_str("\"move/left\"").expect("deserialize");
        assert_eq!(action, Action::MoveLeft);
    }

    #[test]
    fn test_unknown_action() {
        let err = "roll_left".parse::<Action>().unwrap_err();
        assert!(matches!(err, Error::UnknownAction { ref action } if action == "roll_left"));
    }

    #[test]
    fn test_one_shot_actions() {
        assert!(Action::TiltUp.is_continuous());
        assert!(Action::MoveDown.is_continuous());
        assert!(!Action::Stop.is_continuous());
        assert!(!Action::Reset.is_continuous());
        assert!(!Action::PresetHome.is_continuous());
    }

    #[test]
    fn test_midpoint_is_silent() {
        for axis in Axis::ALL {
            assert_eq!(axis.action_for(SLIDER_MIDPOINT), None);
        }
    }

    #[test]
    fn test_axis_pairs() {
        assert_eq!(Axis::Zoom.action_for(80), Some(Action::ZoomIn));
        assert_eq!(Axis::Zoom.action_for(10), Some(Action::ZoomOut));
        assert_eq!(Axis::Tilt.action_for(51), Some(Action::TiltUp));
        assert_eq!(Axis::Tilt.action_for(49), Some(Action::TiltDown));
        assert_eq!(Axis::Pan.action_for(100), Some(Action::PanRight));
        assert_eq!(Axis::Pan.action_for(0), Some(Action::PanLeft));
    }

    proptest! {
        #[test]
        fn prop_level_side_selects_direction(level in 0u8..=SLIDER_MAX) {
            for axis in Axis::ALL {
                let action = axis.action_for(level);
                if level > SLIDER_MIDPOINT {
                    prop_assert_eq!(action, Some(axis.positive()));
                } else if level < SLIDER_MIDPOINT {
                    prop_assert_eq!(action, Some(axis.negative()));
                } else {
                    prop_assert_eq!(action, None);
                }
            }
        }
    }
}
