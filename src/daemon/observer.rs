//! Observable view of the controller state.

use tokio::sync::watch;

use crate::types::{Phase, TimerState, TimerStatus};

/// Read side of the state channel.
///
/// Every applied transition and every tick publishes a full [`TimerState`];
/// the accessors expose its fields individually.
#[derive(Debug, Clone)]
pub struct StateObserver {
    rx: watch::Receiver<TimerState>,
}

impl StateObserver {
    pub fn new(rx: watch::Receiver<TimerState>) -> Self {
        Self { rx }
    }

    /// Latest published state.
    pub fn current(&self) -> TimerState {
        *self.rx.borrow()
    }

    pub fn phase(&self) -> Phase {
        self.rx.borrow().phase
    }

    /// Remaining time as `MM:SS`.
    pub fn remaining(&self) -> String {
        self.rx.borrow().remaining_display()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.rx.borrow().remaining_seconds
    }

    pub fn running(&self) -> bool {
        self.rx.borrow().running
    }

    pub fn paused(&self) -> bool {
        self.rx.borrow().paused
    }

    pub fn skip_available(&self) -> bool {
        self.rx.borrow().skip_available
    }

    pub fn status(&self) -> TimerStatus {
        self.rx.borrow().status()
    }

    /// Waits for the next publication.
    ///
    /// Returns `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<TimerState> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
