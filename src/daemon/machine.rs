//! Pure transition function of the phase timer.
//!
//! [`next`] computes the new [`TimerState`], what to do with the clock and
//! which alert to raise. It performs no side effects; the controller applies
//! the result.

use crate::notification::AlertKind;
use crate::types::{ControlAction, Phase, TimerState};

/// Anything that can change the timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// A user command
    Control(ControlAction),
    /// A clock tick from the current countdown
    Tick { remaining_seconds: u32 },
    /// Expiry of the current countdown
    Expired,
}

/// What the controller must do with the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockAction {
    /// Leave the running countdown alone
    Keep,
    /// Stop the countdown
    Cancel,
    /// Stop the countdown and start a new one
    Restart { duration_secs: u32 },
}

/// Result of applying one [`Input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: TimerState,
    pub clock: ClockAction,
    pub alert: Option<AlertKind>,
}

/// Computes the transition for `input`, or `None` if it does not apply in `state`.
pub fn next(state: &TimerState, input: Input) -> Option<Transition> {
    match input {
        Input::Control(ControlAction::StartFocus) => Some(start_session(Phase::Focus)),
        Input::Control(ControlAction::Pause) => pause(state),
        Input::Control(ControlAction::Resume) => resume(state),
        Input::Control(ControlAction::Reset) => Some(Transition {
            state: TimerState::new(),
            clock: ClockAction::Cancel,
            alert: None,
        }),
        Input::Control(ControlAction::SkipBreak) => {
            (state.phase == Phase::Break).then(|| start_session(Phase::Focus))
        }
        Input::Control(ControlAction::TogglePause) => {
            if state.running {
                pause(state)
            } else {
                resume(state)
            }
        }
        Input::Tick { remaining_seconds } => tick(state, remaining_seconds),
        Input::Expired => state.running.then(|| start_session(state.phase.next())),
    }
}

/// Fresh running session of `phase` with a restarted clock and its alert.
fn start_session(phase: Phase) -> Transition {
    let state = TimerState::session(phase);
    Transition {
        clock: ClockAction::Restart {
            duration_secs: state.remaining_seconds,
        },
        alert: Some(AlertKind::for_phase(phase)),
        state,
    }
}

fn pause(state: &TimerState) -> Option<Transition> {
    if !state.running {
        return None;
    }
    Some(Transition {
        state: TimerState {
            running: false,
            paused: true,
            ..*state
        },
        clock: ClockAction::Cancel,
        alert: None,
    })
}

fn resume(state: &TimerState) -> Option<Transition> {
    if !state.paused {
        return None;
    }
    Some(Transition {
        state: TimerState {
            running: true,
            paused: false,
            ..*state
        },
        clock: ClockAction::Restart {
            duration_secs: state.remaining_seconds,
        },
        alert: None,
    })
}

fn tick(state: &TimerState, remaining_seconds: u32) -> Option<Transition> {
    // Remaining time never goes back up while running.
    if !state.running || remaining_seconds > state.remaining_seconds {
        return None;
    }
    Some(Transition {
        state: TimerState {
            remaining_seconds,
            ..*state
        },
        clock: ClockAction::Keep,
        alert: None,
    })
}

// ============================================================================
// Tests
// ============================================================================
