//! Countdown clock driving the phase timer.
//!
//! A clock emits one [`ClockEvent::Tick`] per period and a single
//! [`ClockEvent::Expired`] once the countdown reaches zero. Every event is
//! tagged with the epoch it was started under; the receiver compares it with
//! its current epoch to drop events that raced with a `cancel()`.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// ClockEvent
// ============================================================================

/// Events emitted by a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// One period elapsed
    Tick {
        /// Countdown that produced the event
        epoch: u64,
        /// Seconds left after this tick
        remaining_seconds: u32,
    },
    /// The countdown reached zero
    Expired {
        /// Countdown that produced the event
        epoch: u64,
    },
}

impl ClockEvent {
    /// Returns the epoch this event belongs to.
    pub fn epoch(&self) -> u64 {
        match self {
            ClockEvent::Tick { epoch, .. } | ClockEvent::Expired { epoch } => *epoch,
        }
    }
}

// ============================================================================
// PhaseClock
// ============================================================================

/// A restartable countdown with at most one active instance.
pub trait PhaseClock: Send {
    /// Cancels any active countdown, then counts down `duration_secs` under `epoch`.
    fn start(&mut self, epoch: u64, duration_secs: u32);

    /// Stops the active countdown. Idempotent.
    fn cancel(&mut self);

    /// Returns true while a countdown is in progress.
    fn is_active(&self) -> bool;
}

// ============================================================================
// TokioClock
// ============================================================================

/// Wall-clock implementation backed by a tokio task.
///
/// Must be started from within a tokio runtime.
pub struct TokioClock {
    events: mpsc::UnboundedSender<ClockEvent>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl TokioClock {
    /// Creates a clock ticking once per second.
    pub fn new(events: mpsc::UnboundedSender<ClockEvent>) -> Self {
        Self::with_period(events, TICK_PERIOD)
    }

    /// Creates a clock with a custom tick period.
    pub fn with_period(events: mpsc::UnboundedSender<ClockEvent>, period: Duration) -> Self {
        Self {
            events,
            period,
            task: None,
        }
    }
}

impl PhaseClock for TokioClock {
    fn start(&mut self, epoch: u64, duration_secs: u32) {
        self.cancel();
        let events = self.events.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(countdown(events, epoch, duration_secs, period)));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TokioClock {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Emits `duration_secs` ticks followed by one expiry.
async fn countdown(
    events: mpsc::UnboundedSender<ClockEvent>,
    epoch: u64,
    duration_secs: u32,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for remaining_seconds in (0..duration_secs).rev() {
        ticker.tick().await;
        let tick = ClockEvent::Tick {
            epoch,
            remaining_seconds,
        };
        if events.send(tick).is_err() {
            // Receiver gone; nobody left to expire for.
            return;
        }
    }

    let _ = events.send(ClockEvent::Expired { epoch });
}

// ============================================================================
// ManualClock
// ============================================================================

#[derive(Debug, Default)]
struct ManualCountdown {
    active: Option<(u64, u32)>,
    starts: Vec<u32>,
    cancels: usize,
}

/// Deterministic clock for tests.
///
/// Clones share state, so a test can keep one clone and hand the other to
/// the controller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualCountdown>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut ManualCountdown) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }

    /// Advances the countdown by one period and returns the events produced.
    ///
    /// The tick that reaches zero is followed by the expiry in the same call,
    /// and a zero-length countdown expires on its first call.
    pub fn elapse_second(&self) -> Vec<ClockEvent> {
        self.with_inner(|inner| {
            let Some((epoch, remaining)) = inner.active else {
                return Vec::new();
            };

            if remaining == 0 {
                inner.active = None;
                return vec![ClockEvent::Expired { epoch }];
            }

            let remaining_seconds = remaining - 1;
            let mut events = vec![ClockEvent::Tick {
                epoch,
                remaining_seconds,
            }];
            if remaining_seconds == 0 {
                inner.active = None;
                events.push(ClockEvent::Expired { epoch });
            } else {
                inner.active = Some((epoch, remaining_seconds));
            }
            events
        })
    }

    /// Epoch of the active countdown.
    pub fn active_epoch(&self) -> Option<u64> {
        self.with_inner(|inner| inner.active.map(|(epoch, _)| epoch))
    }

    /// Durations passed to every `start` call so far.
    pub fn starts(&self) -> Vec<u32> {
        self.with_inner(|inner| inner.starts.clone())
    }

    /// Number of `cancel` calls so far, including those made by `start`.
    pub fn cancel_count(&self) -> usize {
        self.with_inner(|inner| inner.cancels)
    }
}

impl PhaseClock for ManualClock {
    fn start(&mut self, epoch: u64, duration_secs: u32) {
        self.cancel();
        self.with_inner(|inner| {
            inner.active = Some((epoch, duration_secs));
            inner.starts.push(duration_secs);
        });
    }

    fn cancel(&mut self) {
        self.with_inner(|inner| {
            inner.active = None;
            inner.cancels += 1;
        });
    }

    fn is_active(&self) -> bool {
        self.with_inner(|inner| inner.active.is_some())
    }
}

// ============================================================================
// Tests
// ============================================================================
