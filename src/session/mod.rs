//! Command/response engine.
//!
//! # Architecture
//!
//! ```text
//! foreground                          receive task
//!     |                                    |
//!     |-- CommandSession::send --> socket  |
//!     |                          socket -->| ConnectionReader -> Framer
//!     |                                    |   -> ResponseRecord::parse
//!     |                                    |   -> Dispatcher -> ResponseHandler
//!     |<------ ConnectionState (watch) ----|
//! ```
//!
//! The two sides share only the [`ConnectionState`] cell. The socket's read
//! half lives in the receive task and its write half in the session.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fcu_controller::commands::CommandTable;
//! use fcu_controller::session::{CommandSession, ResponseHandler};
//!
//! struct Printer;
//!
//! impl ResponseHandler for Printer {
//!     fn on_generic(&self, message: &str) {
//!         println!("{message}");
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = CommandSession::new(CommandTable::default(), Arc::new(Printer));
//! session.connect("localhost", 8888).await?;
//! session.send("t").await?;
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod command_session;
mod dispatcher;
mod receive_loop;
mod state;

pub use command_session::{CommandSession, SessionError};
pub use dispatcher::{Dispatcher, ResponseHandler};
pub use receive_loop::{DisconnectReason, LoopState, ReceiveLoop, ReceiveLoopHandle};
pub use state::{ConnectionState, SharedState};
