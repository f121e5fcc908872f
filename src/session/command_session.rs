//! Command session façade.
//!
//! Ties a [`Connection`] to its [`ReceiveLoop`] and exposes the operations
//! the interactive front end needs: connect, send a command, disconnect.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::commands::{Command, CommandTable};
use crate::connection::{ConnectError, Connection, SendError, DEFAULT_READ_TIMEOUT};
use crate::protocol::{FrameError, RawLine, QUIT_LINE};

use super::{ConnectionState, Dispatcher, ReceiveLoop, ReceiveLoopHandle, ResponseHandler, SharedState};

/// Errors surfaced by [`CommandSession`].
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// No live connection. Nothing was written.
    #[error("Not connected to server")]
    NotConnected,

    /// Token is not in the command table. Nothing was written.
    #[error("Command not found: '{0}'")]
    InvalidCommand(String),

    /// `connect` was called on a session that is already connected.
    #[error("Already connected to {0}")]
    AlreadyConnected(SocketAddr),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Encoding(#[from] FrameError),
}

impl SessionError {
    /// Short category label for user-facing reports.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotConnected | Self::AlreadyConnected(_) => "connection",
            Self::InvalidCommand(_) => "command",
            Self::Connect(_) => "connect",
            Self::Send(_) => "send",
            Self::Encoding(_) => "encoding",
        }
    }
}

/// One connection's worth of command/response traffic.
pub struct CommandSession<H: ?Sized> {
    commands: CommandTable,
    handler: Arc<H>,
    read_timeout: Duration,
    state: SharedState,
    connection: Option<Connection>,
    receiver: Option<ReceiveLoopHandle>,
    send_failures: u32,
}

impl<H: ResponseHandler + ?Sized + 'static> CommandSession<H> {
    /// Creates a disconnected session.
    #[must_use]
    pub fn new(commands: CommandTable, handler: Arc<H>) -> Self {
        Self {
            commands,
            handler,
            read_timeout: DEFAULT_READ_TIMEOUT,
            state: SharedState::new(),
            connection: None,
            receiver: None,
            send_failures: 0,
        }
    }

    /// Sets the read timeout used for the next connection.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    #[must_use]
    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.get() == ConnectionState::Connected
    }

    /// Receiver that observes every connection state change, including a
    /// drop detected by the receive task.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn peer(&self) -> Option<SocketAddr> {
        self.connection.as_ref().map(Connection::peer)
    }

    /// Failed sends since the last successful one.
    #[must_use]
    pub fn consecutive_send_failures(&self) -> u32 {
        self.send_failures
    }

    /// Connects to `host:port` and starts the receive task.
    ///
    /// A previous connection that dropped on its own is torn down first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyConnected`] if the session is live, or
    /// [`SessionError::Connect`] if the connection cannot be established.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), SessionError> {
        if let (ConnectionState::Connected, Some(peer)) = (self.state.get(), self.peer()) {
            return Err(SessionError::AlreadyConnected(peer));
        }
        self.disconnect().await;

        self.state.set(ConnectionState::Connecting);
        tracing::info!(host, port, "Connecting to FCU server");

        let (connection, reader) = match Connection::connect(host, port, self.read_timeout).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(host, port, error = %e, "Connection failed");
                self.state.set(ConnectionState::Disconnected);
                return Err(e.into());
            }
        };

        // Publish Connected before the task starts so a drop it detects is never overwritten.
        self.state.set(ConnectionState::Connected);
        self.receiver = Some(ReceiveLoop::spawn(
            reader,
            Dispatcher::new(Arc::clone(&self.handler)),
            self.state.clone(),
        ));
        self.connection = Some(connection);
        self.send_failures = 0;
        Ok(())
    }

    /// Validates `token` against the command table and sends it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] or
    /// [`SessionError::InvalidCommand`] without touching the socket, or
    /// [`SessionError::Send`] if the write fails.
    pub async fn send(&mut self, token: &str) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let command = self
            .commands
            .resolve(token)
            .ok_or_else(|| SessionError::InvalidCommand(token.to_string()))?;
        self.send_command(&command).await
    }

    /// Sends an already resolved command.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_command(&mut self, command: &Command) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        if !self.commands.contains(command.token()) {
            return Err(SessionError::InvalidCommand(command.token().to_string()));
        }
        let line = RawLine::new(command.token())?;
        let connection = self.connection.as_mut().ok_or(SessionError::NotConnected)?;

        match connection.send(&line).await {
            Ok(()) => {
                self.send_failures = 0;
                tracing::debug!(token = command.token(), name = command.name(), "Command sent");
                Ok(())
            }
            Err(e) => {
                self.send_failures = self.send_failures.saturating_add(1);
                tracing::warn!(
                    token = command.token(),
                    failures = self.send_failures,
                    error = %e,
                    "Failed to send command"
                );
                Err(e.into())
            }
        }
    }

    /// Stops the receive task, sends a best-effort `quit`, and closes the
    /// socket. Calling it again, or on a never-connected session, is a no-op.
    pub async fn disconnect(&mut self) {
        if self.connection.is_none() && self.receiver.is_none() {
            self.state.set(ConnectionState::Disconnected);
            return;
        }

        let was_connected = self.state.get() == ConnectionState::Connected;
        self.state.set(ConnectionState::Closing);

        if let Some(receiver) = &self.receiver {
            receiver.stop();
        }

        if let Some(mut connection) = self.connection.take() {
            if was_connected {
                self.send_quit(&mut connection).await;
            }
            connection.close().await;
        }

        if let Some(mut receiver) = self.receiver.take() {
            receiver.join(self.read_timeout).await;
        }

        self.state.set(ConnectionState::Disconnected);
        tracing::info!("Disconnected from server");
    }

    async fn send_quit(&self, connection: &mut Connection) {
        let Ok(quit) = RawLine::new(QUIT_LINE) else {
            return;
        };
        match tokio::time::timeout(self.read_timeout, connection.send(&quit)).await {
            Ok(Ok(())) => tracing::debug!("Sent quit notification"),
            Ok(Err(e)) => tracing::debug!(error = %e, "Quit notification not delivered"),
            Err(_) => tracing::debug!("Quit notification timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl ResponseHandler for Silent {
        fn on_generic(&self, _message: &str) {}
    }

    fn session() -> CommandSession<Silent> {
        CommandSession::new(CommandTable::default(), Arc::new(Silent))
    }

    #[tokio::test]
    async fn test_send_when_disconnected_is_rejected() {
        let mut session = session();
        assert!(matches!(
            session.send("t").await,
            Err(SessionError::NotConnected)
        ));
        assert_eq!(session.consecutive_send_failures(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_noop() {
        let mut session = session();
        session.disconnect().await;
        session.disconnect().await;
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_failures_count_and_reset() {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut session = session().with_read_timeout(Duration::from_secs(2));

        session.connect("127.0.0.1", port).await.unwrap();
        let _first = listener.accept().await.unwrap();

        // Losing the write half makes sends fail while the read side stays up.
        session.connection.as_mut().unwrap().close().await;

        for expected in 1..=2 {
            assert!(matches!(
                session.send("t").await,
                Err(SessionError::Send(SendError::Closed))
            ));
            assert_eq!(session.consecutive_send_failures(), expected);
            assert_eq!(session.state(), ConnectionState::Connected);
        }

        let (replacement, _reader) =
            Connection::connect("127.0.0.1", port, Duration::from_secs(2))
                .await
                .unwrap();
        let (mut second, _) = listener.accept().await.unwrap();
        session.connection = Some(replacement);

        session.send("l").await.unwrap();
        assert_eq!(session.consecutive_send_failures(), 0);

        let mut buf = [0u8; 2];
        second.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"l\n");

        session.disconnect().await;
    }

    #[test]
    fn test_default_read_timeout() {
        let session = session();
        assert_eq!(session.read_timeout(), Duration::from_secs(10));
        let session = session.with_read_timeout(Duration::from_secs(5));
        assert_eq!(session.read_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(SessionError::NotConnected.category(), "connection");
        assert_eq!(
            SessionError::InvalidCommand("z".to_string()).category(),
            "command"
        );
        assert_eq!(
            SessionError::InvalidCommand("z".to_string()).to_string(),
            "Command not found: 'z'"
        );
    }
}
