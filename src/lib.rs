//! FCU Controller - interactive terminal client for the FCU command server.

pub mod commands;
pub mod config;
pub mod connection;
pub mod display;
pub mod prompt;
pub mod protocol;
pub mod session;
