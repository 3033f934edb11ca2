//! Display utilities for the Pomodoro cycle CLI.
//!
//! This module provides formatted output for:
//! - Command outcomes
//! - Error messages
//! - Status display
//! - The single-line `watch` view

use crate::types::{IpcResponse, Phase, ResponseData, TimerStatus};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the outcome of a control command.
    pub fn show_outcome(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("{} {}", Self::outcome_marker(response), response.message);
        }
        if let Some(data) = &response.data {
            println!("  {}", Self::summary_line(data));
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("Pomodoro cycle status");
        println!("─────────────────────");

        match &response.data {
            Some(data) => {
                for line in Self::status_lines(data) {
                    println!("{}", line);
                }
            }
            None => println!("No timer state available"),
        }
    }

    /// Redraws the `watch` line in place.
    pub fn show_watch_line(data: &ResponseData) {
        use std::io::Write;

        let mut stdout = std::io::stdout();
        // Clear the line, then rewrite it without a newline
        let _ = write!(stdout, "\r\x1b[2K{}", Self::summary_line(data));
        let _ = stdout.flush();
    }

    /// Ends the `watch` view so the shell prompt starts on a fresh line.
    pub fn finish_watch() {
        println!();
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// One-line summary: phase, remaining time and run state.
    pub fn summary_line(data: &ResponseData) -> String {
        let mut line = format!(
            "{} {} [{}]",
            Self::phase_label(data),
            data.remaining,
            Self::state_label(data.state)
        );
        if data.skip_available {
            line.push_str(" (skip available)");
        }
        line
    }

    /// Multi-line status block.
    pub fn status_lines(data: &ResponseData) -> Vec<String> {
        vec![
            format!("Phase:     {}", Self::phase_label(data)),
            format!("State:     {}", Self::state_label(data.state)),
            format!("Remaining: {}", data.remaining),
            format!(
                "Skip:      {}",
                if data.skip_available {
                    "available"
                } else {
                    "unavailable"
                }
            ),
        ]
    }

    fn phase_label(data: &ResponseData) -> &'static str {
        match data.phase {
            Phase::Focus => "Focus",
            Phase::Break => "Break",
        }
    }

    fn state_label(status: TimerStatus) -> &'static str {
        match status {
            TimerStatus::FocusIdle => "idle",
            TimerStatus::FocusRunning | TimerStatus::BreakRunning => "running",
            TimerStatus::FocusPaused | TimerStatus::BreakPaused => "paused",
        }
    }

    fn outcome_marker(response: &IpcResponse) -> &'static str {
        match response.data.as_ref().map(|d| d.state) {
            Some(TimerStatus::FocusPaused | TimerStatus::BreakPaused) => "||",
            Some(TimerStatus::FocusIdle) => "[]",
            Some(_) => ">",
            None => "*",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
