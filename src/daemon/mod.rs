//! Daemon module for the Pomodoro cycle timer.
//!
//! This module contains the core daemon functionality:
//! - `machine`: pure transition function
//! - `clock`: countdown primitive with epoch-tagged events
//! - `controller`: single-writer state machine and its handle
//! - `observer`: read side of the state channel
//! - `ipc`: Unix socket control surface
//!
//! [`run`] is the process' composition root: it wires the notifier,
//! controller and IPC server together and owns them until shutdown.

pub mod clock;
pub mod controller;
pub mod ipc;
pub mod machine;
pub mod observer;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::notification::{spawn_dispatcher, LogNotifier};

pub use clock::{ClockEvent, ManualClock, PhaseClock, TokioClock};
pub use controller::{
    spawn_controller, CommandOutcome, ControllerError, ControllerHandle, PomodoroController,
};
pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use observer::StateObserver;

/// Runs the daemon until SIGINT/SIGTERM or an accept failure.
///
/// Alerts are written to the log; an action id typed on stdin answers the
/// latest alert.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound or accepting fails.
pub async fn run(socket_path: &Path) -> Result<()> {
    let server = IpcServer::new(socket_path)?;

    let (alert_tx, alert_rx) = mpsc::unbounded_channel();
    let (controller, controller_task) = spawn_controller(alert_tx);
    let notifier = Arc::new(LogNotifier::new(controller.clone()));
    let dispatcher = spawn_dispatcher(notifier.clone(), alert_rx);
    let responder = tokio::spawn(read_alert_responses(notifier, spawn_stdin_reader()));
    let logger = tokio::spawn(log_transitions(controller.observe()));

    tracing::info!(socket = %server.socket_path().display(), "daemon listening");

    let handler = Arc::new(RequestHandler::new(controller));
    let result = tokio::select! {
        result = server.serve(handler) => result,
        () = shutdown_signal() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
    };

    controller_task.abort();
    dispatcher.abort();
    responder.abort();
    logger.abort();
    drop(server);
    tracing::info!("daemon stopped");

    result
}

/// Reads stdin lines on a dedicated thread.
///
/// A plain thread does not hold up runtime shutdown the way a pending
/// blocking-pool read would.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("failed to start stdin reader: {}", e);
    }
    rx
}

/// Feeds input lines to the notifier as alert action ids until the input ends.
async fn read_alert_responses(
    notifier: Arc<LogNotifier>,
    mut lines: mpsc::UnboundedReceiver<String>,
) {
    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }

        match notifier.respond(&line) {
            Ok(Some(action)) => tracing::info!(action = action.id(), "alert action invoked"),
            Ok(None) => tracing::warn!(input = line.trim(), "unknown alert action"),
            Err(e) => {
                tracing::warn!("{}", e);
                break;
            }
        }
    }
}

/// Logs every status change of the timer.
async fn log_transitions(mut observer: StateObserver) {
    let mut last = observer.current();
    while let Some(state) = observer.changed().await {
        if state.status() != last.status() || state.phase != last.phase {
            tracing::info!(
                state = state.status().as_str(),
                remaining = %state.remaining_display(),
                "timer state changed"
            );
        }
        last = state;
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
