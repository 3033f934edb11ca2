//! Alert notification boundary.
//!
//! The controller never talks to a notifier directly. It pushes [`Alert`]s
//! into an unbounded channel; a dispatcher task drains the channel and calls
//! the [`Notifier`]. Delivery errors and timeouts are logged and dropped, so
//! a slow or failing backend can never stall the countdown.
//!
//! The alert channel is created before the controller, and the dispatcher is
//! spawned after it, so a notifier can be built around the controller's
//! handle and route the alert actions back into it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pomodoro_cycle::daemon::spawn_controller;
//! use pomodoro_cycle::notification::{spawn_dispatcher, LogNotifier};
//!
//! let (alert_tx, alert_rx) = tokio::sync::mpsc::unbounded_channel();
//! let (controller, _task) = spawn_controller(alert_tx);
//! let _dispatcher = spawn_dispatcher(Arc::new(LogNotifier::new(controller.clone())), alert_rx);
//! ```

mod actions;
mod alert;
pub mod error;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use crate::daemon::{ControllerError, ControllerHandle};

pub use self::actions::{action_ids, AlertAction};
pub use self::alert::{Alert, AlertKind};
pub use self::error::NotificationError;

/// Upper bound for a single notify call.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Renders alerts to the user.
///
/// Implementations must offer the alert's [`AlertAction`]s and route them
/// back through a `ControllerHandle`.
pub trait Notifier: Send + Sync + 'static {
    /// Delivers one alert.
    fn notify(&self, alert: &Alert) -> impl Future<Output = Result<(), NotificationError>> + Send;

    /// Returns false when the backend is known to be unusable.
    fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Spawns the dispatcher task draining `alerts` into `notifier`.
///
/// The task ends once every sender has been dropped.
pub fn spawn_dispatcher<N: Notifier>(
    notifier: Arc<N>,
    mut alerts: mpsc::UnboundedReceiver<Alert>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(alert) = alerts.recv().await {
            deliver(notifier.as_ref(), &alert).await;
        }
        tracing::debug!("alert dispatcher stopped");
    })
}

/// Delivers one alert, swallowing every failure.
async fn deliver<N: Notifier>(notifier: &N, alert: &Alert) {
    if !notifier.is_available() {
        let e = NotificationError::Unavailable;
        tracing::debug!(title = %alert.title, "alert dropped: {}", e);
        return;
    }

    let result = match timeout(NOTIFY_TIMEOUT, notifier.notify(alert)).await {
        Ok(result) => result,
        Err(_) => Err(NotificationError::Timeout),
    };

    match result {
        Ok(()) => tracing::debug!(title = %alert.title, "alert delivered"),
        Err(e) => tracing::warn!("alert delivery failed: {} ({})", e, e.suggestion()),
    }
}

// ============================================================================
// LogNotifier
// ============================================================================

/// Notifier that writes alerts to the log.
///
/// The log line lists the action ids; typing one back into
/// [`LogNotifier::respond`] invokes that action on the controller.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    controller: ControllerHandle,
}

impl LogNotifier {
    pub fn new(controller: ControllerHandle) -> Self {
        Self { controller }
    }

    /// Invokes the alert action named by `input` (an action id, any case).
    ///
    /// Returns `Ok(None)` when `input` names no action.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Stopped`] if the controller has ended.
    pub fn respond(&self, input: &str) -> Result<Option<AlertAction>, ControllerError> {
        let Some(action) = AlertAction::from_id(&input.trim().to_ascii_uppercase()) else {
            return Ok(None);
        };
        self.controller.invoke_alert_action(action)?;
        Ok(Some(action))
    }
}

impl Notifier for LogNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError> {
        let actions: Vec<String> = alert
            .actions()
            .iter()
            .map(|(action, label)| format!("{} ({})", action.id(), label))
            .collect();
        tracing::info!(
            phase = alert.phase.as_str(),
            remaining = alert.remaining_seconds,
            paused = alert.paused,
            actions = ?actions,
            "{}: {}",
            alert.title,
            alert.message
        );
        Ok(())
    }
}

// ============================================================================
// MockNotifier
// ============================================================================

/// Recording notifier for tests.
///
/// A failing mock answers with [`NotificationError::SendFailed`].
#[derive(Debug)]
pub struct MockNotifier {
    alerts: Mutex<Vec<Alert>>,
    available: AtomicBool,
    should_fail: AtomicBool,
    delay: Mutex<Duration>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Makes every notify call sleep before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    #[must_use]
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn alert_count(&self) -> usize {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear_recorded(&self) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for MockNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError> {
        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed(
                "mock notifier set to fail".to_string(),
            ));
        }
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alert.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::{ManualClock, PomodoroController};
    use crate::types::{Phase, TimerState, TimerStatus};

    fn focus_alert() -> Alert {
        Alert::new(AlertKind::FocusStarted, &TimerState::session(Phase::Focus))
    }

    // ------------------------------------------------------------------------
    // MockNotifier Tests
    // ------------------------------------------------------------------------

    mod mock_notifier_tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_notifier_records() {
            let mock = MockNotifier::new();
            mock.notify(&focus_alert()).await.unwrap();

            assert_eq!(mock.alert_count(), 1);
            assert_eq!(mock.alerts()[0].title, "Focus started");

            mock.clear_recorded();
            assert_eq!(mock.alert_count(), 0);
        }

        #[tokio::test]
        async fn test_mock_notifier_failure() {
            let mock = MockNotifier::new();
            mock.set_should_fail(true);

            let result = mock.notify(&focus_alert()).await;
            assert!(matches!(result, Err(NotificationError::SendFailed(_))));
            assert_eq!(mock.alert_count(), 0);
        }
    }

    // ------------------------------------------------------------------------
    // LogNotifier Tests
    // ------------------------------------------------------------------------

    mod log_notifier_tests {
        use super::*;

        fn create_notifier() -> (LogNotifier, crate::daemon::ControllerHandle) {
            let (alert_tx, _alert_rx) = mpsc::unbounded_channel();
            let (_event_tx, event_rx) = mpsc::unbounded_channel();
            let (handle, _task) =
                PomodoroController::new(ManualClock::new(), alert_tx).spawn(event_rx);
            (LogNotifier::new(handle.clone()), handle)
        }

        #[tokio::test]
        async fn test_log_notifier_never_fails() {
            let (notifier, _handle) = create_notifier();
            assert!(notifier.notify(&focus_alert()).await.is_ok());
        }

        #[tokio::test]
        async fn test_respond_toggles_timer() {
            let (notifier, handle) = create_notifier();
            handle.start_focus_session().await.unwrap();

            let action = notifier.respond("toggle_pause\n").unwrap();
            assert_eq!(action, Some(AlertAction::TogglePause));

            let mut observer = handle.observe();
            while observer.status() != TimerStatus::FocusPaused {
                observer.changed().await.unwrap();
            }
        }

        #[tokio::test]
        async fn test_respond_ignores_unknown_input() {
            let (notifier, handle) = create_notifier();

            assert_eq!(notifier.respond("stop").unwrap(), None);
            assert_eq!(notifier.respond("").unwrap(), None);
            assert_eq!(handle.snapshot(), TimerState::new());
        }
    }

    // ------------------------------------------------------------------------
    // Dispatcher Tests
    // ------------------------------------------------------------------------

    mod dispatcher_tests {
        use super::*;

        #[tokio::test]
        async fn test_dispatcher_delivers_in_order() {
            let mock = Arc::new(MockNotifier::new());
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = spawn_dispatcher(mock.clone(), rx);

            tx.send(focus_alert()).unwrap();
            tx.send(Alert::new(
                AlertKind::BreakStarted,
                &TimerState::session(Phase::Break),
            ))
            .unwrap();
            drop(tx);

            handle.await.unwrap();
            let kinds: Vec<AlertKind> = mock.alerts().iter().map(|a| a.kind).collect();
            assert_eq!(kinds, vec![AlertKind::FocusStarted, AlertKind::BreakStarted]);
        }

        #[tokio::test]
        async fn test_dispatcher_swallows_failures() {
            let mock = Arc::new(MockNotifier::new());
            mock.set_should_fail(true);
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = spawn_dispatcher(mock.clone(), rx);

            tx.send(focus_alert()).unwrap();
            tx.send(focus_alert()).unwrap();
            drop(tx);

            // Task finishes normally instead of panicking or stopping early
            handle.await.unwrap();
            assert_eq!(mock.alert_count(), 0);
        }

        #[tokio::test]
        async fn test_dispatcher_skips_unavailable_backend() {
            let mock = Arc::new(MockNotifier::new());
            mock.set_available(false);
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = spawn_dispatcher(mock.clone(), rx);

            tx.send(focus_alert()).unwrap();
            drop(tx);

            handle.await.unwrap();
            assert_eq!(mock.alert_count(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_dispatcher_abandons_hung_notify_after_timeout() {
            let mock = Arc::new(MockNotifier::new());
            mock.set_delay(Duration::from_secs(600));
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = spawn_dispatcher(mock.clone(), rx);

            let started = tokio::time::Instant::now();
            tx.send(focus_alert()).unwrap();
            tx.send(focus_alert()).unwrap();
            drop(tx);
            handle.await.unwrap();

            // Each call is cut off at the timeout instead of running to completion.
            let elapsed = started.elapsed();
            assert!(elapsed >= NOTIFY_TIMEOUT * 2);
            assert!(elapsed < Duration::from_secs(600));
            assert_eq!(mock.alert_count(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_dispatcher_waits_for_notify_below_timeout() {
            let mock = Arc::new(MockNotifier::new());
            mock.set_delay(Duration::from_secs(2));
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = spawn_dispatcher(mock.clone(), rx);

            tx.send(focus_alert()).unwrap();
            drop(tx);
            handle.await.unwrap();

            assert_eq!(mock.alert_count(), 1);
        }
    }
}
