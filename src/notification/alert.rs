//! Alert events emitted by the controller on session start.

use crate::types::{Phase, TimerState};

use super::actions::AlertAction;

/// Kind of alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// A Focus session has started
    FocusStarted,
    /// A Break session has started
    BreakStarted,
}

impl AlertKind {
    /// Returns the alert kind announcing the start of `phase`.
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Focus => AlertKind::FocusStarted,
            Phase::Break => AlertKind::BreakStarted,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::FocusStarted => "Focus started",
            AlertKind::BreakStarted => "Break started",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AlertKind::FocusStarted => "The focus session has begun.",
            AlertKind::BreakStarted => "The break session has begun.",
        }
    }
}

/// A discrete notify event handed to the [`Notifier`](super::Notifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub phase: Phase,
    pub title: String,
    pub message: String,
    pub remaining_seconds: u32,
    pub paused: bool,
}

impl Alert {
    /// Builds the alert for `kind` from the state the transition committed.
    pub fn new(kind: AlertKind, state: &TimerState) -> Self {
        Self {
            kind,
            phase: state.phase,
            title: kind.title().to_string(),
            message: kind.message().to_string(),
            remaining_seconds: state.remaining_seconds,
            paused: state.paused,
        }
    }

    /// Returns the actions a renderer must offer, with their labels.
    pub fn actions(&self) -> Vec<(AlertAction, &'static str)> {
        AlertAction::ALL
            .iter()
            .map(|action| (*action, action.label(self.paused)))
            .collect()
    }
}
