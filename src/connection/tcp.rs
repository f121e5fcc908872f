//! TCP transport for the command channel.
//!
//! The stream is split on connect: [`Connection`] keeps the write half and
//! [`ConnectionReader`] takes the read half into the receive task. Reads and
//! writes never contend, so neither half needs a lock.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use futures_core::Stream;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::{ConnectError, ReadError, SendError};
use crate::protocol::{Framer, RawLine};

/// Size of the buffer handed to each socket read.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Outcome of a single successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Data(Vec<u8>),
    /// Peer closed its side of the stream.
    EndOfStream,
}

/// Write side of an established connection.
#[derive(Debug)]
pub struct Connection {
    writer: Option<OwnedWriteHalf>,
    peer: SocketAddr,
}

impl Connection {
    /// Connects to `host:port`.
    ///
    /// `timeout` bounds the connect attempt and becomes the read timeout of
    /// the returned reader.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectError`] if resolution fails, the server refuses,
    /// or nothing answers within `timeout`.
    pub async fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<(Self, ConnectionReader), ConnectError> {
        let addr = format!("{host}:{port}");

        let stream = match tokio::time::timeout(timeout, open_stream(host, port, &addr, timeout))
            .await
        {
            Ok(result) => result?,
            Err(_) => return Err(ConnectError::TimedOut { addr, timeout }),
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "Failed to disable Nagle");
        }
        let peer = stream
            .peer_addr()
            .map_err(|e| ConnectError::from_io(addr.clone(), e, timeout))?;
        let (reader, writer) = stream.into_split();

        tracing::info!(%peer, "Connected to FCU server");

        Ok((
            Self {
                writer: Some(writer),
                peer,
            },
            ConnectionReader::new(reader, timeout),
        ))
    }

    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Writes one framed line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Closed`] after [`close`](Self::close), or
    /// [`SendError::Io`] if the write fails.
    pub async fn send(&mut self, line: &RawLine) -> Result<(), SendError> {
        let writer = self.writer.as_mut().ok_or(SendError::Closed)?;
        writer.write_all(&line.to_wire()).await?;
        writer.flush().await?;
        tracing::trace!(line = %line, "Sent line");
        Ok(())
    }

    /// Shuts down and releases the write half. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(peer = %self.peer, error = %e, "Socket shutdown failed");
            }
            tracing::debug!(peer = %self.peer, "Write half closed");
        }
    }
}

async fn open_stream(
    host: &str,
    port: u16,
    addr: &str,
    timeout: Duration,
) -> Result<TcpStream, ConnectError> {
    let candidates: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| ConnectError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    let mut last_err = None;
    for candidate in candidates {
        match TcpStream::connect(candidate).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!(%candidate, error = %e, "Connect attempt failed");
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) => ConnectError::from_io(addr.to_string(), e, timeout),
        None => ConnectError::Resolve {
            host: host.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        },
    })
}

/// Read side of a connection with a bounded wait per read.
#[derive(Debug)]
pub struct ConnectionReader<R = OwnedReadHalf> {
    reader: R,
    read_timeout: Duration,
    buf: Vec<u8>,
}

impl<R> ConnectionReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wraps any byte source with the given read timeout.
    #[must_use]
    pub fn new(reader: R, read_timeout: Duration) -> Self {
        Self {
            reader,
            read_timeout,
            buf: vec![0; READ_CHUNK_SIZE],
        }
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Performs one read, waiting at most the read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::TimedOut`] when nothing arrived in time (not
    /// fatal), or [`ReadError::Io`] when the connection failed.
    pub async fn read_chunk(&mut self) -> Result<Chunk, ReadError> {
        match tokio::time::timeout(self.read_timeout, self.reader.read(&mut self.buf)).await {
            Err(_) => Err(ReadError::TimedOut(self.read_timeout)),
            Ok(Ok(0)) => Ok(Chunk::EndOfStream),
            Ok(Ok(n)) => Ok(Chunk::Data(self.buf[..n].to_vec())),
            Ok(Err(e)) => Err(ReadError::Io(e)),
        }
    }

    /// Turns the reader into a lazy stream of framed lines.
    ///
    /// Timeouts are yielded as `Err(ReadError::TimedOut)` and the stream
    /// keeps going; a fatal error or end of stream ends it. A partial line
    /// left at end of stream is discarded.
    pub fn into_lines(self) -> impl Stream<Item = Result<RawLine, ReadError>> {
        let state = LineState {
            reader: self,
            framer: Framer::new(),
            ready: VecDeque::new(),
            finished: false,
        };

        futures_util::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(line) = state.ready.pop_front() {
                    return Some((Ok(line), state));
                }
                if state.finished {
                    return None;
                }
                match state.reader.read_chunk().await {
                    Ok(Chunk::Data(bytes)) => state.ready.extend(state.framer.feed(&bytes)),
                    Ok(Chunk::EndOfStream) => {
                        if state.framer.has_pending() {
                            tracing::debug!(
                                bytes = state.framer.pending().len(),
                                "Discarding unterminated line at end of stream"
                            );
                        }
                        state.finished = true;
                    }
                    Err(e) => {
                        state.finished = e.is_fatal();
                        return Some((Err(e), state));
                    }
                }
            }
        })
    }
}

struct LineState<R> {
    reader: ConnectionReader<R>,
    framer: Framer,
    ready: VecDeque<RawLine>,
    finished: bool,
}
