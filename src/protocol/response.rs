//! Typed server responses.
//!
//! The server answers with one JSON object per line. The `type` field picks
//! the variant; `message`, `data` and `commands` are carried through as-is.
//! Lines that are not JSON objects become [`ResponseRecord::Unstructured`].

use serde_json::{Map, Value};

use super::RawLine;

/// Open key/value payload attached to a response (telemetry, command lists).
pub type Payload = Map<String, Value>;

/// One parsed server message.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseRecord {
    /// Greeting sent right after the connection is accepted.
    Welcome { message: String, data: Payload },
    /// Acknowledgement of an executed command.
    CommandAck {
        message: String,
        command_id: Option<String>,
    },
    Status { message: String },
    /// Telemetry snapshot (position, orientation, IMU, GNSS, topic lists).
    Debug { message: String, data: Payload },
    Help { message: String, commands: Payload },
    Error { message: String },
    Goodbye { message: String },
    /// Structured message with a missing or unrecognised `type`.
    Generic { kind: String, message: String },
    /// Line that could not be decoded as a JSON object.
    Unstructured { raw_text: String },
}

impl ResponseRecord {
    /// Parses a protocol line. Never fails: undecodable input is returned
    /// as [`ResponseRecord::Unstructured`].
    #[must_use]
    pub fn parse(line: &RawLine) -> Self {
        let text = line.as_str().trim();
        let object = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                tracing::debug!(kind = json_kind(&other), "Response is JSON but not an object");
                return Self::unstructured(text);
            }
            Err(e) => {
                tracing::trace!(error = %e, "Response is not JSON");
                return Self::unstructured(text);
            }
        };
        Self::from_object(object)
    }

    fn unstructured(text: &str) -> Self {
        Self::Unstructured {
            raw_text: text.to_string(),
        }
    }

    fn from_object(mut object: Payload) -> Self {
        let kind = match object.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => "unknown".to_string(),
        };
        let message = object.remove("message").map(text_of).unwrap_or_default();

        match kind.as_str() {
            "welcome" => Self::Welcome {
                message,
                data: take_payload(&mut object, "data"),
            },
            "command" => {
                let data = take_payload(&mut object, "data");
                Self::CommandAck {
                    message,
                    command_id: data.get("command_id").cloned().map(text_of),
                }
            }
            "status" => Self::Status { message },
            "debug" => Self::Debug {
                message,
                data: take_payload(&mut object, "data"),
            },
            "help" => {
                // Listing lives under data.commands; older servers put it at the top level.
                let mut data = take_payload(&mut object, "data");
                let commands = match data.remove("commands") {
                    Some(Value::Object(commands)) => commands,
                    _ => take_payload(&mut object, "commands"),
                };
                Self::Help { message, commands }
            }
            "error" => Self::Error { message },
            "goodbye" => Self::Goodbye { message },
            _ => Self::Generic { kind, message },
        }
    }

    /// Wire name of the variant, for logging.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::CommandAck { .. } => "command",
            Self::Status { .. } => "status",
            Self::Debug { .. } => "debug",
            Self::Help { .. } => "help",
            Self::Error { .. } => "error",
            Self::Goodbye { .. } => "goodbye",
            Self::Generic { kind, .. } => kind,
            Self::Unstructured { .. } => "unstructured",
        }
    }

    /// Human-readable text of the record.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Welcome { message, .. }
            | Self::CommandAck { message, .. }
            | Self::Status { message }
            | Self::Debug { message, .. }
            | Self::Help { message, .. }
            | Self::Error { message }
            | Self::Goodbye { message }
            | Self::Generic { message, .. } => message,
            Self::Unstructured { raw_text } => raw_text,
        }
    }

    #[must_use]
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Unstructured { .. })
    }
}

fn take_payload(object: &mut Payload, key: &str) -> Payload {
    match object.remove(key) {
        Some(Value::Object(payload)) => payload,
        Some(other) => {
            tracing::debug!(key, kind = json_kind(&other), "Ignoring non-object payload");
            Payload::new()
        }
        None => Payload::new(),
    }
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
