//! Configuration types.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::commands::{CommandInfo, CommandTable, CommandTableError};
use crate::connection::DEFAULT_PORT;

/// Controller configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ControllerConfig {
    /// FCU server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// FCU server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Read and connect timeout in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Echo each structured response as pretty JSON before rendering it.
    #[serde(default = "default_show_raw_json")]
    pub show_raw_json: bool,
    /// Replacement command table. Empty means the built-in table.
    #[serde(default)]
    pub commands: BTreeMap<String, CommandInfo>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_read_timeout_secs() -> u64 {
    10
}

fn default_show_raw_json() -> bool {
    true
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_timeout_secs: default_read_timeout_secs(),
            show_raw_json: default_show_raw_json(),
            commands: BTreeMap::new(),
        }
    }
}

impl ControllerConfig {
    /// Read timeout, never shorter than one second.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs.max(1))
    }

    /// Builds the command table this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured token is not a single character.
    pub fn command_table(&self) -> Result<CommandTable, CommandTableError> {
        if self.commands.is_empty() {
            return Ok(CommandTable::default());
        }
        CommandTable::from_map(self.commands.clone())
    }
}
