//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fcu_controller::commands::CommandTable;
use fcu_controller::protocol::{RawLine, ResponseRecord};
use fcu_controller::session::{CommandSession, DisconnectReason, ResponseHandler};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// What the handler observed, in order.
#[derive(Debug)]
pub enum Observed {
    Record(ResponseRecord),
    Disconnected(DisconnectReason),
}

/// Handler that forwards everything it sees to a channel.
pub struct RecordingHandler {
    tx: mpsc::UnboundedSender<Observed>,
}

impl ResponseHandler for RecordingHandler {
    fn on_generic(&self, _message: &str) {}

    fn on_received(&self, _line: &RawLine, record: &ResponseRecord) {
        let _ = self.tx.send(Observed::Record(record.clone()));
    }

    fn on_disconnected(&self, reason: &DisconnectReason) {
        let _ = self.tx.send(Observed::Disconnected(reason.clone()));
    }
}

/// A session wired to a recording handler, plus the receiving end.
pub fn recording_session() -> (
    CommandSession<RecordingHandler>,
    mpsc::UnboundedReceiver<Observed>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = CommandSession::new(CommandTable::default(), Arc::new(RecordingHandler { tx }))
        .with_read_timeout(Duration::from_secs(2));
    (session, rx)
}

/// Waits for the next observation, failing the test after two seconds.
pub async fn next_observed(rx: &mut mpsc::UnboundedReceiver<Observed>) -> Observed {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("Timed out waiting for handler")
        .expect("Handler channel closed")
}

/// Binds a loopback listener on an ephemeral port.
pub async fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let port = listener.local_addr().expect("No local addr").port();
    (listener, port)
}

/// Reads one line from the server side of a connection, without the newline.
pub async fn read_line(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut line = String::new();
    let read = tokio::time::timeout(Duration::from_secs(2), reader.read_line(&mut line))
        .await
        .expect("Timed out reading from client")
        .expect("Read failed");
    if read == 0 {
        None
    } else {
        Some(line.trim_end_matches('\n').to_string())
    }
}
