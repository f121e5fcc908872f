//! Command token table.
//!
//! Maps single-character command tokens to their display name, description
//! and help category. Tokens are validated here before anything touches the
//! network.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Help grouping for a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Flight,
    Mission,
    Information,
    System,
    #[default]
    Other,
}

impl CommandCategory {
    /// All categories in help display order.
    pub const ALL: [Self; 5] = [
        Self::Flight,
        Self::Mission,
        Self::Information,
        Self::System,
        Self::Other,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Flight => "Flight Control",
            Self::Mission => "Mission Control",
            Self::Information => "Information",
            Self::System => "System",
            Self::Other => "Other",
        }
    }
}

/// Display metadata for a command token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Short name, e.g. "Takeoff".
    pub name: String,
    /// One-line description for help output.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: CommandCategory,
}

impl CommandInfo {
    #[must_use]
    pub fn new(name: &str, description: &str, category: CommandCategory) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            category,
        }
    }
}

/// A command token that has been checked against a [`CommandTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    token: String,
    info: CommandInfo,
}

impl Command {
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn info(&self) -> &CommandInfo {
        &self.info
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }
}

/// Errors building a command table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandTableError {
    #[error("Command token must be a single non-whitespace character: {0:?}")]
    InvalidToken(String),
}

/// Ordered, read-only lookup from token to [`CommandInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable {
    entries: Vec<(String, CommandInfo)>,
}

impl CommandTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds or replaces a token.
    ///
    /// # Errors
    ///
    /// Returns [`CommandTableError::InvalidToken`] unless `token` is exactly
    /// one non-whitespace character.
    pub fn insert(&mut self, token: &str, info: CommandInfo) -> Result<(), CommandTableError> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() => {}
            _ => return Err(CommandTableError::InvalidToken(token.to_string())),
        }

        if let Some(slot) = self.entries.iter_mut().find(|(t, _)| t == token) {
            slot.1 = info;
        } else {
            self.entries.push((token.to_string(), info));
        }
        Ok(())
    }

    /// Builds a table from a token map, in token order.
    ///
    /// # Errors
    ///
    /// Returns the first invalid token found.
    pub fn from_map(map: BTreeMap<String, CommandInfo>) -> Result<Self, CommandTableError> {
        let mut table = Self::empty();
        for (token, info) in map {
            table.insert(&token, info)?;
        }
        Ok(table)
    }

    /// Validates `token` and returns the matching command.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<Command> {
        self.get(token).map(|info| Command {
            token: token.to_string(),
            info: info.clone(),
        })
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<&CommandInfo> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, info)| info)
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandInfo)> {
        self.entries.iter().map(|(t, info)| (t.as_str(), info))
    }

    pub fn in_category(
        &self,
        category: CommandCategory,
    ) -> impl Iterator<Item = (&str, &CommandInfo)> {
        self.iter().filter(move |(_, info)| info.category == category)
    }

    /// Tokens starting with `prefix`, for tab completion.
    #[must_use]
    pub fn completions(&self, prefix: &str) -> Vec<&str> {
        self.iter()
            .map(|(t, _)| t)
            .filter(|t| t.starts_with(prefix))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        use CommandCategory::{Flight, Information, Mission, System};

        let builtin = [
            ("a", "Unlock", "Unlock the drone", Flight),
            ("d", "Lock", "Lock the drone", Flight),
            ("t", "Takeoff", "Take off the drone", Flight),
            ("l", "Land", "Land the drone", Flight),
            ("r", "Run", "Start mission", Mission),
            ("s", "Stop", "Stop mission", Mission),
            ("1", "Position 1", "Go to position 1", Mission),
            ("2", "Position 2", "Go to position 2", Mission),
            ("3", "Position 3", "Go to position 3", Mission),
            ("4", "Position 4", "Go to position 4", Mission),
            ("p", "Position Info", "Get current position and orientation", Information),
            ("i", "Topic Info", "List all ROS topics", Information),
            ("h", "Help", "Show this help", System),
            ("q", "Quit", "Exit the program", System),
        ];

        Self {
            entries: builtin
                .into_iter()
                .map(|(token, name, description, category)| {
                    (token.to_string(), CommandInfo::new(name, description, category))
                })
                .collect(),
        }
    }
}
