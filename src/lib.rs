//! Pomodoro Cycle Library
//!
//! This library provides the core functionality for the Pomodoro cycle timer.
//! It includes:
//! - A pure Focus/Break transition function and the controller that drives it
//! - An epoch-tagged one-second countdown clock
//! - Observable timer state for any number of readers
//! - An alert boundary with actionable "Skip Break" / "Pause" alerts
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities

pub mod cli;
pub mod daemon;
pub mod notification;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    ControlAction, IpcRequest, IpcResponse, Phase, ResponseData, TimerState, TimerStatus,
    PHASE_DURATION_SECS,
};

pub use daemon::{
    spawn_controller, ClockEvent, CommandOutcome, ControllerError, ControllerHandle, ManualClock,
    PhaseClock, PomodoroController, StateObserver, TokioClock,
};

pub use notification::{
    spawn_dispatcher, Alert, AlertAction, AlertKind, LogNotifier, MockNotifier,
    NotificationError, Notifier,
};
