//! Wire protocol between the controller and the FCU command server.
//!
//! # Protocol
//!
//! Newline-delimited UTF-8 text over TCP:
//! - Client sends a single command token + newline (`t\n`), or `quit\n`
//! - Server sends one JSON object + newline per message
//!
//! ```text
//! Controller                      FCU server
//!     |<-- {"type":"welcome",...} ---|
//!     |-- t ------------------------>|
//!     |<-- {"type":"command",...} ---|
//!     |-- quit --------------------->|
//! ```

mod framer;
mod response;

pub use framer::{FrameError, Framer, RawLine, DELIMITER};
pub use response::{Payload, ResponseRecord};

/// Courtesy line sent before closing the connection.
pub const QUIT_LINE: &str = "quit";
