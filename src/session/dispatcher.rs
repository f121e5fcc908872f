//! Routing of parsed responses to presentation callbacks.

use std::sync::Arc;

use crate::protocol::{Payload, RawLine, ResponseRecord};

use super::DisconnectReason;

/// Presentation callbacks, one per response variant.
///
/// Callbacks run synchronously on the receive task and must return quickly;
/// a handler that needs to do slow work should queue the record and return.
/// Every variant callback defaults to [`on_generic`](Self::on_generic), so
/// an implementation only overrides the variants it renders differently.
pub trait ResponseHandler: Send + Sync {
    /// Fallback for any variant without its own override.
    fn on_generic(&self, message: &str);

    /// Called with the source line before the variant callback.
    fn on_received(&self, _line: &RawLine, _record: &ResponseRecord) {}

    fn on_welcome(&self, message: &str, _data: &Payload) {
        self.on_generic(message);
    }

    fn on_command_ack(&self, message: &str, _command_id: Option<&str>) {
        self.on_generic(message);
    }

    fn on_status(&self, message: &str) {
        self.on_generic(message);
    }

    fn on_debug(&self, message: &str, _data: &Payload) {
        self.on_generic(message);
    }

    fn on_help(&self, message: &str, _commands: &Payload) {
        self.on_generic(message);
    }

    fn on_error(&self, message: &str) {
        self.on_generic(message);
    }

    fn on_goodbye(&self, message: &str) {
        self.on_generic(message);
    }

    fn on_unstructured(&self, raw_text: &str) {
        self.on_generic(raw_text);
    }

    /// The receive task ended because the connection dropped.
    fn on_disconnected(&self, _reason: &DisconnectReason) {}
}

/// Maps each [`ResponseRecord`] to its handler callback.
pub struct Dispatcher<H: ?Sized> {
    handler: Arc<H>,
}

impl<H: ?Sized> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: ResponseHandler + ?Sized> Dispatcher<H> {
    #[must_use]
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Invokes the callback for `record`'s variant.
    pub fn dispatch(&self, record: &ResponseRecord) {
        let handler = &*self.handler;
        match record {
            ResponseRecord::Welcome { message, data } => handler.on_welcome(message, data),
            ResponseRecord::CommandAck {
                message,
                command_id,
            } => handler.on_command_ack(message, command_id.as_deref()),
            ResponseRecord::Status { message } => handler.on_status(message),
            ResponseRecord::Debug { message, data } => handler.on_debug(message, data),
            ResponseRecord::Help { message, commands } => handler.on_help(message, commands),
            ResponseRecord::Error { message } => handler.on_error(message),
            ResponseRecord::Goodbye { message } => handler.on_goodbye(message),
            ResponseRecord::Generic { message, .. } => handler.on_generic(message),
            ResponseRecord::Unstructured { raw_text } => handler.on_unstructured(raw_text),
        }
    }

    /// Parses and dispatches one inbound line. Blank lines are skipped.
    pub fn dispatch_line(&self, line: &RawLine) -> Option<ResponseRecord> {
        if line.is_blank() {
            return None;
        }
        let record = ResponseRecord::parse(line);
        tracing::debug!(kind = record.kind(), "Dispatching response");
        self.handler.on_received(line, &record);
        self.dispatch(&record);
        Some(record)
    }
}
