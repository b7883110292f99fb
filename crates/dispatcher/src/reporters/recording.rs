//! RecordingReporter - keeps failure events in memory

use contracts::{FailureReporter, HandlerError, Message};
use parking_lot::Mutex;

use crate::error::DispatchFailure;

/// A captured failure event
#[derive(Debug, Clone)]
pub struct RecordedFailure {
    pub message: Message,
    /// Handler identity (`None` for the no-handlers condition)
    pub handler: Option<String>,
    pub failure: DispatchFailure,
}

/// Reporter that records every failure for later inspection
///
/// Used by tests and by the CLI summary.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<RecordedFailure>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded events, in report order
    pub fn events(&self) -> Vec<RecordedFailure> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn no_handlers_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.failure.is_no_handlers())
            .count()
    }

    pub fn handler_error_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| !e.failure.is_no_handlers())
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl FailureReporter for RecordingReporter {
    fn on_no_handlers(&self, message: &Message) {
        let event = RecordedFailure {
            message: message.clone(),
            handler: None,
            failure: DispatchFailure::NoHandlers {
                message_id: message.id,
                message_type: message.message_type(),
            },
        };
        self.events.lock().push(event);
    }

    fn on_handler_error(&self, message: &Message, handler: &str, error: &HandlerError) {
        let event = RecordedFailure {
            message: message.clone(),
            handler: Some(handler.to_string()),
            failure: DispatchFailure::HandlerInvocation {
                message_id: message.id,
                handler: handler.to_string(),
                source: error.clone(),
            },
        };
        self.events.lock().push(event);
    }
}
