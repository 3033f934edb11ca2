//! Alert action definitions.
//!
//! A rendered alert offers these actions. Invoking one posts the mapped
//! [`ControlAction`] to the controller through its handle.

use std::fmt;

use crate::types::ControlAction;

/// Alert action identifiers.
pub mod action_ids {
    /// Action ID for skipping the current break.
    pub const SKIP_BREAK: &str = "SKIP_BREAK";
    /// Action ID for pausing or resuming the timer.
    pub const TOGGLE_PAUSE: &str = "TOGGLE_PAUSE";
}

/// Actions offered on every alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertAction {
    /// "Skip Break"
    SkipBreak,
    /// "Pause" or "Resume", depending on the paused flag
    TogglePause,
}

impl AlertAction {
    /// All actions, in display order.
    pub const ALL: [AlertAction; 2] = [AlertAction::SkipBreak, AlertAction::TogglePause];

    /// Returns the stable identifier for this action.
    pub fn id(&self) -> &'static str {
        match self {
            AlertAction::SkipBreak => action_ids::SKIP_BREAK,
            AlertAction::TogglePause => action_ids::TOGGLE_PAUSE,
        }
    }

    /// Parses an action identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            action_ids::SKIP_BREAK => Some(AlertAction::SkipBreak),
            action_ids::TOGGLE_PAUSE => Some(AlertAction::TogglePause),
            _ => None,
        }
    }

    /// Returns the button label shown on an alert with the given paused flag.
    pub fn label(&self, paused: bool) -> &'static str {
        match self {
            AlertAction::SkipBreak => "Skip Break",
            AlertAction::TogglePause if paused => "Resume",
            AlertAction::TogglePause => "Pause",
        }
    }

    /// Returns the controller command this action triggers.
    ///
    /// Pause/resume is resolved by the controller at the time the action
    /// arrives, not when the alert was rendered.
    pub fn control_action(&self) -> ControlAction {
        match self {
            AlertAction::SkipBreak => ControlAction::SkipBreak,
            AlertAction::TogglePause => ControlAction::TogglePause,
        }
    }
}

impl fmt::Display for AlertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
