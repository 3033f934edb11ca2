//! Core data types for the Pomodoro cycle timer.
//!
//! This module defines the data structures used for:
//! - Phase and timer state
//! - Derived status for display
//! - IPC request/response serialization

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Length of every Focus and Break phase, in seconds.
pub const PHASE_DURATION_SECS: u32 = 60;

/// Socket location relative to the home directory.
const SOCKET_RELATIVE_PATH: &str = ".pomodoro-cycle/pomodoro-cycle.sock";

/// Returns the default daemon socket path (`~/.pomodoro-cycle/pomodoro-cycle.sock`).
///
/// Falls back to the temp directory when no home directory is known.
pub fn default_socket_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(SOCKET_RELATIVE_PATH)
}

/// Formats seconds as `MM:SS`.
pub fn format_remaining(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// Phase
// ============================================================================

/// The two alternating phases of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Work interval
    #[default]
    Focus,
    /// Rest interval
    Break,
}

impl Phase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::Break => "break",
        }
    }

    /// Returns the phase that follows this one on expiry.
    pub fn next(&self) -> Phase {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }
}

// ============================================================================
// TimerStatus
// ============================================================================

/// Controller state derived from a [`TimerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    FocusIdle,
    FocusRunning,
    FocusPaused,
    BreakRunning,
    BreakPaused,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::FocusIdle => "focus_idle",
            TimerStatus::FocusRunning => "focus_running",
            TimerStatus::FocusPaused => "focus_paused",
            TimerStatus::BreakRunning => "break_running",
            TimerStatus::BreakPaused => "break_paused",
        }
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// The single source of truth for the timer.
///
/// Only the transition function in `daemon::machine` produces new values;
/// everything else reads snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Current phase
    pub phase: Phase,
    /// Remaining seconds in the current phase
    pub remaining_seconds: u32,
    /// Whether the countdown is ticking
    pub running: bool,
    /// Whether the countdown is suspended
    pub paused: bool,
    /// Whether the "skip break" action is offered
    pub skip_available: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerState {
    /// Creates the idle Focus state every process starts in.
    pub const fn new() -> Self {
        Self {
            phase: Phase::Focus,
            remaining_seconds: PHASE_DURATION_SECS,
            running: false,
            paused: false,
            skip_available: false,
        }
    }

    /// Creates a freshly started, running session of the given phase.
    pub const fn session(phase: Phase) -> Self {
        Self {
            phase,
            remaining_seconds: PHASE_DURATION_SECS,
            running: true,
            paused: false,
            skip_available: matches!(phase, Phase::Break),
        }
    }

    /// Returns the derived controller status.
    pub fn status(&self) -> TimerStatus {
        match (self.phase, self.running, self.paused) {
            (Phase::Focus, true, _) => TimerStatus::FocusRunning,
            (Phase::Focus, false, true) => TimerStatus::FocusPaused,
            (Phase::Focus, false, false) => TimerStatus::FocusIdle,
            (Phase::Break, _, true) => TimerStatus::BreakPaused,
            (Phase::Break, _, false) => TimerStatus::BreakRunning,
        }
    }

    /// Returns the remaining time as `MM:SS`.
    pub fn remaining_display(&self) -> String {
        format_remaining(self.remaining_seconds)
    }

    /// Returns true if the state satisfies the timer invariants.
    pub fn is_consistent(&self) -> bool {
        !(self.running && self.paused) && (!self.skip_available || self.phase == Phase::Break)
    }
}

// ============================================================================
// ControlAction
// ============================================================================

/// User-invokable commands on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    /// Start (or restart) a Focus session from any state
    StartFocus,
    /// Pause a running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Return to the idle Focus state
    Reset,
    /// Leave the current break for a new Focus session
    SkipBreak,
    /// Pause if running, resume if paused
    TogglePause,
}

impl ControlAction {
    /// Returns the name used in logs and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::StartFocus => "start",
            ControlAction::Pause => "pause",
            ControlAction::Resume => "resume",
            ControlAction::Reset => "reset",
            ControlAction::SkipBreak => "skip",
            ControlAction::TogglePause => "toggle",
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start (or restart) a Focus session
    Start,
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Return to the idle Focus state
    Reset,
    /// Skip the current break
    Skip,
    /// Pause if running, resume if paused
    Toggle,
    /// Query the current state
    Status,
}

impl IpcRequest {
    /// Returns the controller action this request maps to, or `None` for queries.
    pub fn control_action(&self) -> Option<ControlAction> {
        match self {
            IpcRequest::Start => Some(ControlAction::StartFocus),
            IpcRequest::Pause => Some(ControlAction::Pause),
            IpcRequest::Resume => Some(ControlAction::Resume),
            IpcRequest::Reset => Some(ControlAction::Reset),
            IpcRequest::Skip => Some(ControlAction::SkipBreak),
            IpcRequest::Toggle => Some(ControlAction::TogglePause),
            IpcRequest::Status => None,
        }
    }
}

/// Response data for IPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current phase
    pub phase: Phase,
    /// Derived status
    pub state: TimerStatus,
    /// Remaining seconds
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u32,
    /// Remaining time as `MM:SS`
    pub remaining: String,
    /// Running flag
    pub running: bool,
    /// Paused flag
    pub paused: bool,
    /// Skip-available flag
    #[serde(rename = "skipAvailable")]
    pub skip_available: bool,
}

impl ResponseData {
    /// Creates response data from timer state.
    pub fn from_timer_state(state: &TimerState) -> Self {
        Self {
            phase: state.phase,
            state: state.status(),
            remaining_seconds: state.remaining_seconds,
            remaining: state.remaining_display(),
            running: state.running,
            paused: state.paused,
            skip_available: state.skip_available,
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if this is an error response.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

// ============================================================================
// Tests
// ============================================================================
