//! Newline framing for the command channel.
//!
//! Outbound commands are written as a single UTF-8 line terminated by `\n`.
//! Inbound bytes are buffered until a newline arrives; anything after the
//! last newline stays in the buffer for the next read.

use std::fmt;

/// Line delimiter used in both directions.
pub const DELIMITER: u8 = b'\n';

/// Errors raised while framing outbound text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The text to send contains a line delimiter and would split on the wire.
    #[error("Line contains an embedded newline: {0:?}")]
    EmbeddedNewline(String),
}

/// A single line of protocol text without its trailing delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawLine(String);

impl RawLine {
    /// Wraps `text` as a line.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::EmbeddedNewline`] if `text` contains `\n`.
    pub fn new(text: impl Into<String>) -> Result<Self, FrameError> {
        let text = text.into();
        if text.contains('\n') {
            return Err(FrameError::EmbeddedNewline(text));
        }
        Ok(Self(text))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns true if the line holds nothing but whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Bytes as they go out on the wire, delimiter included.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len() + 1);
        bytes.extend_from_slice(self.0.as_bytes());
        bytes.push(DELIMITER);
        bytes
    }
}

impl fmt::Display for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RawLine {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Incremental line splitter for the inbound byte stream.
///
/// Buffering is done on raw bytes, so a multi-byte UTF-8 sequence split
/// across two reads is reassembled before decoding.
#[derive(Debug, Default)]
pub struct Framer {
    buffer: Vec<u8>,
}

impl Framer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes outbound text as delimiter-terminated wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::EmbeddedNewline`] if `text` contains `\n`.
    pub fn encode(text: &str) -> Result<Vec<u8>, FrameError> {
        RawLine::new(text).map(|line| line.to_wire())
    }

    /// Appends `bytes` to the buffer and returns every line it completes.
    ///
    /// A trailing `\r` is stripped from each line. The unterminated tail is
    /// kept for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<RawLine> {
        let scan_from = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        let Some(last_delim) = self.buffer[scan_from..]
            .iter()
            .rposition(|&b| b == DELIMITER)
            .map(|pos| pos + scan_from)
        else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_delim + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete[..last_delim]
            .split(|&b| b == DELIMITER)
            .map(decode_line)
            .collect()
    }

    /// Bytes received after the last delimiter.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Drops any buffered partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn decode_line(segment: &[u8]) -> RawLine {
    let segment = segment.strip_suffix(b"\r").unwrap_or(segment);
    let text = match std::str::from_utf8(segment) {
        Ok(text) => text.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Inbound line is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(segment).into_owned()
        }
    };
    // Delimiters were split out above, so the line cannot contain one.
    RawLine(text)
}
