//! Command vocabulary understood by the FCU server.

mod table;

pub use table::*;
