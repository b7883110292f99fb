//! LogReporter - reports dispatch failures via tracing

use contracts::{FailureReporter, HandlerError, Message};
use tracing::{error, warn};

use crate::error::DispatchFailure;

/// Reporter that logs every failure with message identity
#[derive(Debug, Default, Clone)]
pub struct LogReporter {
    /// Include the canonical payload in log events
    include_payload: bool,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log the message content (can be large)
    pub fn with_payload(mut self) -> Self {
        self.include_payload = true;
        self
    }

    fn payload_field(&self, message: &Message) -> Option<String> {
        self.include_payload.then(|| message.payload.canonical())
    }
}

impl FailureReporter for LogReporter {
    fn on_no_handlers(&self, message: &Message) {
        let failure = DispatchFailure::NoHandlers {
            message_id: message.id,
            message_type: message.message_type(),
        };
        warn!(
            message_id = message.id.get(),
            message_type = %message.message_type(),
            payload = self.payload_field(message),
            "{failure}"
        );
    }

    fn on_handler_error(&self, message: &Message, handler: &str, err: &HandlerError) {
        error!(
            message_id = message.id.get(),
            message_type = %message.message_type(),
            handler,
            error_kind = err.kind(),
            error = %err,
            payload = self.payload_field(message),
            "Handler failed, message dropped"
        );
    }
}
