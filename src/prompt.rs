//! Interpretation of interactive input, and what wakes the input loop.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, watch};

use crate::commands::{Command, CommandTable};
use crate::session::ConnectionState;

/// What the interactive loop should do with one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Blank input.
    Nothing,
    Quit,
    Help,
    Clear,
    /// A known command token to send to the server.
    Send(Command),
    /// Anything else.
    Unknown(String),
}

impl InputAction {
    /// Classifies a line typed at the prompt.
    ///
    /// Local words (`q`, `quit`, `exit`, `h`, `help`, `ls`, `commands`,
    /// `clear`) are handled before the command table is consulted.
    #[must_use]
    pub fn parse(input: &str, commands: &CommandTable) -> Self {
        let input = input.trim();
        match input {
            "" => Self::Nothing,
            "q" | "quit" | "exit" => Self::Quit,
            "h" | "help" | "ls" | "commands" => Self::Help,
            "clear" => Self::Clear,
            _ => commands
                .resolve(input)
                .map_or_else(|| Self::Unknown(input.to_string()), Self::Send),
        }
    }
}

/// What woke the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wake {
    Line(String),
    /// Input reached end of file.
    InputClosed,
    Interrupted,
    /// The session left the Connected state.
    ConnectionLost,
}

/// Waits for the next thing the interactive loop must react to.
///
/// `interrupt` is created once by the caller and polled here by reference,
/// so an interrupt delivered between calls is still observed on the next
/// one. It is checked first and must not be polled again after it fires.
pub async fn next_wake<F>(
    input: &mut mpsc::Receiver<String>,
    interrupt: Pin<&mut F>,
    state: &mut watch::Receiver<ConnectionState>,
) -> Wake
where
    F: Future,
{
    tokio::select! {
        biased;

        _ = interrupt => Wake::Interrupted,
        _ = state.wait_for(|s| *s != ConnectionState::Connected) => Wake::ConnectionLost,
        line = input.recv() => line.map_or(Wake::InputClosed, Wake::Line),
    }
}
