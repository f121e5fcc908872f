//! TCP connection to the FCU command server.
//!
//! [`Connection::connect`] returns the write side, owned by the session, and
//! a [`ConnectionReader`] that the receive task drives. The reader applies a
//! finite read timeout so the task regularly gets a chance to observe a stop
//! request instead of blocking forever on a quiet socket.

mod error;
mod tcp;

use std::time::Duration;

pub use error::{ConnectError, ReadError, SendError};
pub use tcp::{Chunk, Connection, ConnectionReader, READ_CHUNK_SIZE};

/// Default FCU server port.
pub const DEFAULT_PORT: u16 = 8888;

/// Default read (and connect) timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
