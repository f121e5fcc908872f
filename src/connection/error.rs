//! Connection error types.

use std::io;
use std::time::Duration;

/// Errors establishing the TCP connection.
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    /// Host name could not be resolved.
    #[error("Failed to resolve {host}: {source}")]
    Resolve { host: String, source: io::Error },

    /// Server actively refused the connection.
    #[error("Connection refused by {addr}")]
    Refused { addr: String },

    /// No connection within the configured timeout.
    #[error("Timed out connecting to {addr} after {timeout:?}")]
    TimedOut { addr: String, timeout: Duration },

    /// Any other socket error.
    #[error("Failed to connect to {addr}: {source}")]
    Io { addr: String, source: io::Error },
}

impl ConnectError {
    /// Classifies a connect-time I/O error.
    pub(crate) fn from_io(addr: String, err: io::Error, timeout: Duration) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused { addr },
            io::ErrorKind::TimedOut => Self::TimedOut { addr, timeout },
            _ => Self::Io { addr, source: err },
        }
    }
}

/// Errors writing to the connection. Not fatal to the session.
#[derive(thiserror::Error, Debug)]
pub enum SendError {
    /// The write half has already been closed.
    #[error("Connection is closed")]
    Closed,

    #[error("Failed to send: {0}")]
    Io(#[from] io::Error),
}

/// Errors reading from the connection.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// Nothing arrived within the read timeout. Expected while idle.
    #[error("No data received within {0:?}")]
    TimedOut(Duration),

    /// Connection-level failure (reset, aborted, ...).
    #[error("Receive error: {0}")]
    Io(#[from] io::Error),
}

impl ReadError {
    /// Returns true if the connection can no longer be read from.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TimedOut(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_classifies_refused() {
        let err = ConnectError::from_io(
            "localhost:8888".to_string(),
            io::Error::from(io::ErrorKind::ConnectionRefused),
            Duration::from_secs(10),
        );
        assert!(matches!(err, ConnectError::Refused { .. }));
        assert_eq!(err.to_string(), "Connection refused by localhost:8888");
    }

    #[test]
    fn test_connect_error_other_io() {
        let err = ConnectError::from_io(
            "localhost:8888".to_string(),
            io::Error::new(io::ErrorKind::Other, "boom"),
            Duration::from_secs(10),
        );
        assert!(matches!(err, ConnectError::Io { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_timeout_is_not_fatal() {
        assert!(!ReadError::TimedOut(Duration::from_secs(10)).is_fatal());
    }

    #[test]
    fn test_io_read_error_is_fatal() {
        let err: ReadError = io::Error::from(io::ErrorKind::ConnectionReset).into();
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("Receive error"));
    }

    #[test]
    fn test_send_error_display() {
        assert_eq!(SendError::Closed.to_string(), "Connection is closed");
        let err: SendError = io::Error::from(io::ErrorKind::BrokenPipe).into();
        assert!(err.to_string().starts_with("Failed to send"));
    }
}
