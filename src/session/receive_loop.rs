//! Background task that reads, parses and dispatches server responses.
//!
//! The loop pulls framed lines from a [`ConnectionReader`] and hands each
//! one to the [`Dispatcher`] in arrival order. Read timeouts are benign and
//! only give the loop a chance to look at its stop token; end of stream or
//! a read failure ends the loop and marks the connection as closing.
//!
//! Dispatch is a bounded synchronous call. Handlers that render slowly
//! should push records onto their own queue rather than hold up reads.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connection::{ConnectionReader, ReadError};
use crate::protocol::RawLine;

use super::{ConnectionState, Dispatcher, ResponseHandler, SharedState};

/// Lifecycle of the receive task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Running,
    Stopping,
    Stopped,
}

/// Why the receive task exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Stop was requested locally.
    Stopped,
    /// The server closed the connection.
    EndOfStream,
    /// A connection-level read error occurred.
    ReadFailed(String),
}

impl DisconnectReason {
    /// Returns true if the connection dropped without a local stop request.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::EndOfStream => f.write_str("server closed the connection"),
            Self::ReadFailed(e) => write!(f, "{e}"),
        }
    }
}

/// Spawner for the receive task.
pub struct ReceiveLoop;

impl ReceiveLoop {
    /// Spawns the receive task on the current runtime.
    pub fn spawn<R, H>(
        reader: ConnectionReader<R>,
        dispatcher: Dispatcher<H>,
        state: SharedState,
    ) -> ReceiveLoopHandle
    where
        R: AsyncRead + Unpin + Send + 'static,
        H: ResponseHandler + ?Sized + 'static,
    {
        let cancel = CancellationToken::new();
        let (loop_tx, _) = watch::channel(LoopState::Running);
        let loop_state = Arc::new(loop_tx);

        let task = tokio::spawn(run(
            reader.into_lines(),
            dispatcher,
            state,
            Arc::clone(&loop_state),
            cancel.clone(),
        ));

        ReceiveLoopHandle {
            cancel,
            loop_state,
            task: Some(task),
        }
    }
}

async fn run<S, H>(
    lines: S,
    dispatcher: Dispatcher<H>,
    state: SharedState,
    loop_state: Arc<watch::Sender<LoopState>>,
    cancel: CancellationToken,
) -> DisconnectReason
where
    S: Stream<Item = Result<RawLine, ReadError>>,
    H: ResponseHandler + ?Sized,
{
    futures_util::pin_mut!(lines);
    tracing::debug!("Receive loop started");

    let reason = loop {
        let next = tokio::select! {
            biased;

            () = cancel.cancelled() => break DisconnectReason::Stopped,
            next = lines.next() => next,
        };

        match next {
            Some(Ok(line)) => {
                dispatcher.dispatch_line(&line);
            }
            Some(Err(ReadError::TimedOut(after))) => {
                tracing::trace!(?after, "Read timed out, polling again");
            }
            Some(Err(e)) => break DisconnectReason::ReadFailed(e.to_string()),
            None => break DisconnectReason::EndOfStream,
        }
    };

    if reason.is_unexpected() {
        tracing::warn!(%reason, "Connection to server lost");
        state.transition(ConnectionState::Connected, ConnectionState::Closing);
        dispatcher.handler().on_disconnected(&reason);
    }

    loop_state.send_replace(LoopState::Stopped);
    tracing::debug!(%reason, "Receive loop stopped");
    reason
}

/// Owner's handle to a running receive task. Dropping it stops the task.
#[derive(Debug)]
pub struct ReceiveLoopHandle {
    cancel: CancellationToken,
    loop_state: Arc<watch::Sender<LoopState>>,
    task: Option<JoinHandle<DisconnectReason>>,
}

impl ReceiveLoopHandle {
    /// Requests the task to stop. The task exits at its next poll.
    pub fn stop(&self) {
        self.loop_state.send_if_modified(|state| {
            if *state == LoopState::Running {
                *state = LoopState::Stopping;
                true
            } else {
                false
            }
        });
        self.cancel.cancel();
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        *self.loop_state.borrow()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits up to `limit` for the task to exit, aborting it if it does not.
    ///
    /// Returns the exit reason, or `None` if the task was already joined,
    /// aborted, or panicked.
    pub async fn join(&mut self, limit: Duration) -> Option<DisconnectReason> {
        let mut task = self.task.take()?;
        match tokio::time::timeout(limit, &mut task).await {
            Ok(Ok(reason)) => Some(reason),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Receive task failed");
                None
            }
            Err(_) => {
                tracing::warn!(?limit, "Receive task did not stop in time, aborting");
                task.abort();
                self.loop_state.send_replace(LoopState::Stopped);
                None
            }
        }
    }
}

impl Drop for ReceiveLoopHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
