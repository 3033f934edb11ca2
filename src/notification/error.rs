//! Notification system error types.
//!
//! Every variant is swallowed by the alert dispatcher; none of them reaches
//! the controller.

use thiserror::Error;

/// Errors that can occur while delivering an alert.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Notification permission was denied by the user.
    #[error("notification permission denied")]
    PermissionDenied,

    /// Failed to deliver a notification.
    #[error("failed to send notification: {0}")]
    SendFailed(String),

    /// The notifier did not answer in time.
    #[error("notification delivery timed out")]
    Timeout,

    /// No notification backend is available.
    #[error("notification backend unavailable")]
    Unavailable,
}

impl NotificationError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "allow notifications for this application",
            Self::SendFailed(_) => "check the notification backend logs",
            Self::Timeout => "the notification backend is slow or hung",
            Self::Unavailable => "no notification backend is configured",
        }
    }
}
