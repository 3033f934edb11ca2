//! Command definitions for the Pomodoro cycle CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro cycle timer: alternating Focus and Break sessions
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro-cycle",
    version,
    about = "Focus/Break cycle timer controlled over a local socket",
    long_about = "A small Pomodoro timer that alternates Focus and Break sessions.\n\
                  Run `pomodoro-cycle daemon` once, then control it with the other subcommands.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path of the daemon's control socket
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start (or restart) a Focus session
    Start,

    /// Pause the running countdown
    Pause,

    /// Resume a paused countdown
    Resume,

    /// Stop the timer and return to idle Focus
    Reset,

    /// Skip the current Break and start a Focus session
    Skip,

    /// Pause if running, resume if paused
    Toggle,

    /// Show current timer status
    Status,

    /// Follow the timer, redrawing once per second
    Watch,

    /// Run the timer daemon in the foreground
    Daemon,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Tests
// ============================================================================
