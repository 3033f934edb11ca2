//! IPC Server for the Pomodoro cycle daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Dispatch to the controller through its handle

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};

use crate::types::{ControlAction, IpcRequest, IpcResponse, ResponseData, TimerState};

use super::controller::ControllerHandle;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Peer closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
#[derive(Debug)]
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// A stale socket file is removed before binding. A socket that still
    /// accepts connections belongs to a live daemon and is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if another daemon is listening on the path or the
    /// socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            if std::os::unix::net::UnixStream::connect(socket_path).is_ok() {
                anyhow::bail!("A daemon is already running on {:?}", socket_path);
            }
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Accepts connections forever, answering each on its own task.
    ///
    /// # Errors
    ///
    /// Returns an error only if accepting fails.
    pub async fn serve(&self, handler: Arc<RequestHandler>) -> Result<()> {
        loop {
            let mut stream = self.accept().await?;
            let handler = handler.clone();

            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(&mut stream, &handler).await {
                    tracing::warn!("IPC connection failed: {:#}", e);
                }
            });
        }
    }

    /// Runs one request/response exchange on `stream`.
    pub async fn handle_connection(stream: &mut UnixStream, handler: &RequestHandler) -> Result<()> {
        let response = match Self::receive_request(stream).await {
            Ok(request) => {
                tracing::debug!(?request, "IPC request");
                handler.handle(request).await
            }
            Err(e) => IpcResponse::error(format!("{:#}", e)),
        };
        Self::send_response(stream, &response).await
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        // One extra byte to detect oversized requests
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE + 1];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by posting commands to the controller.
pub struct RequestHandler {
    controller: ControllerHandle,
}

impl RequestHandler {
    /// Creates a new request handler bound to the given controller.
    pub fn new(controller: ControllerHandle) -> Self {
        Self { controller }
    }

    /// Handles an IPC request and returns the appropriate response.
    ///
    /// Commands that do not apply in the current state still succeed; the
    /// message says nothing changed.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        let Some(action) = request.control_action() else {
            let state = self.controller.snapshot();
            return IpcResponse::success(
                "Status retrieved",
                Some(ResponseData::from_timer_state(&state)),
            );
        };

        match self.controller.execute(action).await {
            Ok(outcome) => {
                let message = if outcome.applied {
                    applied_message(action, &outcome.state)
                } else {
                    ignored_message(action)
                };
                IpcResponse::success(message, Some(ResponseData::from_timer_state(&outcome.state)))
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }
}

fn applied_message(action: ControlAction, state: &TimerState) -> &'static str {
    match action {
        ControlAction::StartFocus => "Focus session started",
        ControlAction::Pause => "Timer paused",
        ControlAction::Resume => "Timer resumed",
        ControlAction::Reset => "Timer reset",
        ControlAction::SkipBreak => "Break skipped",
        ControlAction::TogglePause if state.paused => "Timer paused",
        ControlAction::TogglePause => "Timer resumed",
    }
}

fn ignored_message(action: ControlAction) -> &'static str {
    match action {
        ControlAction::Pause => "Timer is not running; nothing to pause",
        ControlAction::Resume => "Timer is not paused; nothing to resume",
        ControlAction::SkipBreak => "Not on a break; nothing to skip",
        ControlAction::TogglePause => "Timer is idle; nothing to pause or resume",
        // Start and reset apply in every state
        ControlAction::StartFocus | ControlAction::Reset => "Nothing changed",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::daemon::clock::ManualClock;
    use crate::daemon::controller::PomodoroController;
    use crate::types::{Phase, TimerStatus, PHASE_DURATION_SECS};

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        // Keep the directory so it's not deleted
        std::mem::forget(dir);
        path
    }

    fn create_handler() -> RequestHandler {
        let (alert_tx, _alert_rx) = mpsc::unbounded_channel();
        let (_event_tx, event_rx) = mpsc::unbounded_channel();
        let (handle, _task) =
            PomodoroController::new(ManualClock::new(), alert_tx).spawn(event_rx);
        RequestHandler::new(handle)
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());
        }

        #[tokio::test]
        async fn test_server_removes_existing_socket() {
            let socket_path = create_temp_socket_path();
            std::fs::write(&socket_path, "dummy").unwrap();

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_refuses_live_socket() {
            let socket_path = create_temp_socket_path();
            let _running = IpcServer::new(&socket_path).unwrap();

            let err = IpcServer::new(&socket_path).unwrap_err();

            assert!(err.to_string().contains("already running"));
            assert!(socket_path.exists());
            // The first server still accepts connections
            assert!(UnixStream::connect(&socket_path).await.is_ok());
        }

        #[tokio::test]
        async fn test_server_replaces_dead_socket() {
            let socket_path = create_temp_socket_path();
            // Bound and dropped without cleanup, like a crashed daemon
            let listener = std::os::unix::net::UnixListener::bind(&socket_path).unwrap();
            drop(listener);
            assert!(socket_path.exists());

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_receive_request_skip() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(br#"{"command":"skip"}"#).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();
            assert_eq!(request, IpcRequest::Skip);

            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(b"not valid json").await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_err());
        }

        #[tokio::test]
        async fn test_receive_request_too_large() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let payload = vec![b' '; MAX_REQUEST_SIZE * 2];
                stream.write_all(&payload).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            // Give the whole payload time to land in the socket buffer
            tokio::time::sleep(Duration::from_millis(100)).await;
            let err = IpcServer::receive_request(&mut stream).await.unwrap_err();

            assert!(matches!(
                err.downcast_ref::<IpcError>(),
                Some(IpcError::RequestTooLarge)
            ));
        }

        #[tokio::test]
        async fn test_handle_connection_answers_errors() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let handler = create_handler();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(br#"{"command":"stop"}"#).await.unwrap();
                stream.shutdown().await.unwrap();

                let mut buffer = Vec::new();
                stream.read_to_end(&mut buffer).await.unwrap();
                serde_json::from_slice::<IpcResponse>(&buffer).unwrap()
            });

            let mut stream = server.accept().await.unwrap();
            IpcServer::handle_connection(&mut stream, &handler)
                .await
                .unwrap();
            drop(stream);

            let response = client_handle.await.unwrap();
            assert!(response.is_error());
            assert!(response.message.contains("deserialize"));
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let socket_path = create_temp_socket_path();

            {
                let _server = IpcServer::new(&socket_path).unwrap();
                assert!(socket_path.exists());
            }

            assert!(!socket_path.exists());
        }

        #[tokio::test]
        async fn test_socket_path_getter() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            assert_eq!(server.socket_path(), socket_path);
        }
    }

    // ------------------------------------------------------------------------
    // RequestHandler Tests
    // ------------------------------------------------------------------------

    mod request_handler_tests {
        use super::*;

        #[tokio::test]
        async fn test_handle_status_initial() {
            let handler = create_handler();

            let response = handler.handle(IpcRequest::Status).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "Status retrieved");
            let data = response.data.unwrap();
            assert_eq!(data.phase, Phase::Focus);
            assert_eq!(data.state, TimerStatus::FocusIdle);
            assert_eq!(data.remaining_seconds, PHASE_DURATION_SECS);
            assert_eq!(data.remaining, "01:00");
            assert!(!data.running);
            assert!(!data.paused);
            assert!(!data.skip_available);
        }

        #[tokio::test]
        async fn test_handle_start() {
            let handler = create_handler();

            let response = handler.handle(IpcRequest::Start).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "Focus session started");
            assert_eq!(response.data.unwrap().state, TimerStatus::FocusRunning);
        }

        #[tokio::test]
        async fn test_handle_start_twice_restarts() {
            let handler = create_handler();

            handler.handle(IpcRequest::Start).await;
            let response = handler.handle(IpcRequest::Start).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.data.unwrap().remaining_seconds, PHASE_DURATION_SECS);
        }

        #[tokio::test]
        async fn test_handle_pause_and_resume() {
            let handler = create_handler();
            handler.handle(IpcRequest::Start).await;

            let response = handler.handle(IpcRequest::Pause).await;
            assert_eq!(response.message, "Timer paused");
            assert_eq!(response.data.unwrap().state, TimerStatus::FocusPaused);

            let response = handler.handle(IpcRequest::Resume).await;
            assert_eq!(response.message, "Timer resumed");
            assert_eq!(response.data.unwrap().state, TimerStatus::FocusRunning);
        }

        #[tokio::test]
        async fn test_handle_pause_not_running_is_noop() {
            let handler = create_handler();

            let response = handler.handle(IpcRequest::Pause).await;

            assert_eq!(response.status, "success");
            assert!(response.message.contains("nothing to pause"));
            assert_eq!(response.data.unwrap().state, TimerStatus::FocusIdle);
        }

        #[tokio::test]
        async fn test_handle_skip_in_focus_is_noop() {
            let handler = create_handler();
            handler.handle(IpcRequest::Start).await;

            let response = handler.handle(IpcRequest::Skip).await;

            assert_eq!(response.status, "success");
            assert!(response.message.contains("nothing to skip"));
            assert_eq!(response.data.unwrap().state, TimerStatus::FocusRunning);
        }

        #[tokio::test]
        async fn test_handle_toggle() {
            let handler = create_handler();
            handler.handle(IpcRequest::Start).await;

            let response = handler.handle(IpcRequest::Toggle).await;
            assert_eq!(response.message, "Timer paused");

            let response = handler.handle(IpcRequest::Toggle).await;
            assert_eq!(response.message, "Timer resumed");
        }

        #[tokio::test]
        async fn test_handle_reset() {
            let handler = create_handler();
            handler.handle(IpcRequest::Start).await;
            handler.handle(IpcRequest::Pause).await;

            let response = handler.handle(IpcRequest::Reset).await;

            assert_eq!(response.message, "Timer reset");
            let data = response.data.unwrap();
            assert_eq!(data.state, TimerStatus::FocusIdle);
            assert_eq!(data.remaining_seconds, PHASE_DURATION_SECS);
            assert!(!data.paused);
        }
    }
}
