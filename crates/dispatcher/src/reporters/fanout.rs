//! FanoutReporter - forwards failures to several reporters

use std::sync::Arc;

use contracts::{FailureReporter, HandlerError, Message};

/// Reporter that forwards each event to every inner reporter, in order
#[derive(Default, Clone)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn FailureReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl FailureReporter for FanoutReporter {
    fn on_no_handlers(&self, message: &Message) {
        for reporter in &self.reporters {
            reporter.on_no_handlers(message);
        }
    }

    fn on_handler_error(&self, message: &Message, handler: &str, error: &HandlerError) {
        for reporter in &self.reporters {
            reporter.on_handler_error(message, handler, error);
        }
    }
}
