//! Pomodoro controller: the single writer of the timer state.
//!
//! This module provides:
//! - `PomodoroController`: owns `TimerState`, the clock and its epoch
//! - `ControllerHandle`: cloneable command channel into the controller task
//! - The select loop serializing commands against clock events
//!
//! Commands and clock events are funneled into one task, so no two mutations
//! of the state can interleave. Each applied transition cancels or restarts
//! the clock and bumps the epoch before the new state is installed; clock
//! events carrying an older epoch are dropped.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::notification::{Alert, AlertAction};
use crate::types::{ControlAction, TimerState};

use super::clock::{ClockEvent, PhaseClock, TokioClock};
use super::machine::{self, ClockAction, Input};
use super::observer::StateObserver;

// ============================================================================
// Errors & messages
// ============================================================================

/// Errors returned by [`ControllerHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// The controller task has ended
    #[error("timer controller is not running")]
    Stopped,
}

/// Result of a command executed through [`ControllerHandle::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// State after the command
    pub state: TimerState,
    /// False when the command did not apply and was ignored
    pub applied: bool,
}

#[derive(Debug)]
struct Command {
    action: ControlAction,
    reply: Option<oneshot::Sender<CommandOutcome>>,
}

// ============================================================================
// PomodoroController
// ============================================================================

/// The phase timer state machine.
pub struct PomodoroController<C: PhaseClock> {
    state: TimerState,
    clock: C,
    /// Identifies the current countdown; bumped on every cancel/restart
    epoch: u64,
    state_tx: watch::Sender<TimerState>,
    alerts: mpsc::UnboundedSender<Alert>,
}

impl<C: PhaseClock> PomodoroController<C> {
    /// Creates a controller in the idle Focus state.
    pub fn new(clock: C, alerts: mpsc::UnboundedSender<Alert>) -> Self {
        let state = TimerState::new();
        let (state_tx, _) = watch::channel(state);
        Self {
            state,
            clock,
            epoch: 0,
            state_tx,
            alerts,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Epoch of the current countdown.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn observe(&self) -> StateObserver {
        StateObserver::new(self.state_tx.subscribe())
    }

    /// Starts a Focus session from any state.
    pub fn start_focus_session(&mut self) -> bool {
        self.control(ControlAction::StartFocus)
    }

    /// Pauses a running countdown; no-op otherwise.
    pub fn pause_timer(&mut self) -> bool {
        self.control(ControlAction::Pause)
    }

    /// Resumes a paused countdown; no-op otherwise.
    pub fn resume_timer(&mut self) -> bool {
        self.control(ControlAction::Resume)
    }

    /// Returns to the idle Focus state without raising an alert.
    pub fn reset_timer(&mut self) -> bool {
        self.control(ControlAction::Reset)
    }

    /// Ends the current break early; no-op during Focus.
    pub fn skip_break(&mut self) -> bool {
        self.control(ControlAction::SkipBreak)
    }

    /// Pauses if running, resumes if paused.
    pub fn toggle_pause(&mut self) -> bool {
        self.control(ControlAction::TogglePause)
    }

    /// Applies a user command. Returns false if it did not apply.
    pub fn control(&mut self, action: ControlAction) -> bool {
        let applied = self.apply(Input::Control(action));
        tracing::debug!(action = action.as_str(), applied, "command");
        applied
    }

    /// Applies a clock event, dropping it if it belongs to an older countdown.
    pub fn handle_clock_event(&mut self, event: ClockEvent) -> bool {
        if event.epoch() != self.epoch {
            tracing::trace!(
                event_epoch = event.epoch(),
                epoch = self.epoch,
                "stale clock event dropped"
            );
            return false;
        }

        let input = match event {
            ClockEvent::Tick {
                remaining_seconds, ..
            } => Input::Tick { remaining_seconds },
            ClockEvent::Expired { .. } => Input::Expired,
        };
        self.apply(input)
    }

    fn apply(&mut self, input: Input) -> bool {
        let Some(transition) = machine::next(&self.state, input) else {
            tracing::trace!(?input, status = self.state.status().as_str(), "input ignored");
            return false;
        };

        match transition.clock {
            ClockAction::Keep => {}
            ClockAction::Cancel => {
                self.clock.cancel();
                self.epoch += 1;
            }
            ClockAction::Restart { duration_secs } => {
                self.clock.cancel();
                self.epoch += 1;
                self.clock.start(self.epoch, duration_secs);
            }
        }

        let previous = std::mem::replace(&mut self.state, transition.state);
        if previous.status() != self.state.status() || previous.phase != self.state.phase {
            tracing::debug!(
                from = previous.status().as_str(),
                to = self.state.status().as_str(),
                remaining = self.state.remaining_seconds,
                "transition"
            );
        } else {
            tracing::trace!(remaining = self.state.remaining_seconds, "tick");
        }
        debug_assert!(self.state.is_consistent(), "{:?}", self.state);

        self.state_tx.send_replace(self.state);

        if let Some(kind) = transition.alert {
            if self.alerts.send(Alert::new(kind, &self.state)).is_err() {
                tracing::warn!(title = kind.title(), "alert dispatcher stopped; alert dropped");
            }
        }

        true
    }
}

impl<C: PhaseClock + 'static> PomodoroController<C> {
    /// Moves the controller into its own task.
    ///
    /// `clock_events` must be the receiving end of the channel the clock
    /// was built with. The task ends once every handle has been dropped.
    pub fn spawn(
        self,
        clock_events: mpsc::UnboundedReceiver<ClockEvent>,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = ControllerHandle {
            commands: command_tx,
            state: self.state_tx.subscribe(),
        };
        let task = tokio::spawn(self.run(command_rx, clock_events));
        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut clock_events: mpsc::UnboundedReceiver<ClockEvent>,
    ) {
        tracing::debug!("controller started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command { action, reply }) => {
                        let applied = self.control(action);
                        if let Some(reply) = reply {
                            let _ = reply.send(CommandOutcome {
                                state: self.state,
                                applied,
                            });
                        }
                    }
                    None => break,
                },
                Some(event) = clock_events.recv() => {
                    self.handle_clock_event(event);
                }
            }
        }

        self.clock.cancel();
        tracing::debug!("controller stopped");
    }
}

/// Builds a wall-clock controller and spawns it.
pub fn spawn_controller(
    alerts: mpsc::UnboundedSender<Alert>,
) -> (ControllerHandle, JoinHandle<()>) {
    let (clock_tx, clock_rx) = mpsc::unbounded_channel();
    PomodoroController::new(TokioClock::new(clock_tx), alerts).spawn(clock_rx)
}

// ============================================================================
// ControllerHandle
// ============================================================================

/// Cloneable handle to a running controller.
///
/// This is what alert renderers and the IPC server hold instead of a
/// reference to the controller itself.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<TimerState>,
}

impl ControllerHandle {
    /// Executes a command and waits for the resulting state.
    pub async fn execute(&self, action: ControlAction) -> Result<CommandOutcome, ControllerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command {
                action,
                reply: Some(reply_tx),
            })
            .map_err(|_| ControllerError::Stopped)?;
        reply_rx.await.map_err(|_| ControllerError::Stopped)
    }

    /// Queues a command without waiting for it.
    pub fn post(&self, action: ControlAction) -> Result<(), ControllerError> {
        self.commands
            .send(Command {
                action,
                reply: None,
            })
            .map_err(|_| ControllerError::Stopped)
    }

    /// Entry point for action buttons on a rendered alert.
    pub fn invoke_alert_action(&self, action: AlertAction) -> Result<(), ControllerError> {
        tracing::debug!(action = action.id(), "alert action invoked");
        self.post(action.control_action())
    }

    pub async fn start_focus_session(&self) -> Result<CommandOutcome, ControllerError> {
        self.execute(ControlAction::StartFocus).await
    }

    pub async fn pause_timer(&self) -> Result<CommandOutcome, ControllerError> {
        self.execute(ControlAction::Pause).await
    }

    pub async fn resume_timer(&self) -> Result<CommandOutcome, ControllerError> {
        self.execute(ControlAction::Resume).await
    }

    pub async fn reset_timer(&self) -> Result<CommandOutcome, ControllerError> {
        self.execute(ControlAction::Reset).await
    }

    pub async fn skip_break(&self) -> Result<CommandOutcome, ControllerError> {
        self.execute(ControlAction::SkipBreak).await
    }

    pub async fn toggle_pause(&self) -> Result<CommandOutcome, ControllerError> {
        self.execute(ControlAction::TogglePause).await
    }

    /// Latest published state.
    pub fn snapshot(&self) -> TimerState {
        *self.state.borrow()
    }

    pub fn observe(&self) -> StateObserver {
        StateObserver::new(self.state.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
