//! FailureReporter trait - Dispatcher failure sink
//!
//! Every dispatch failure is surfaced through this interface; nothing is
//! propagated back to the submitter.

use crate::{HandlerError, Message};

/// Receiver of dispatch failure events
///
/// Called from worker tasks concurrently, so implementations must be
/// thread-safe and should not block.
pub trait FailureReporter: Send + Sync {
    /// The message type resolved to zero handlers; the message is dropped.
    fn on_no_handlers(&self, message: &Message);

    /// A handler returned an error (or panicked) for the message.
    fn on_handler_error(&self, message: &Message, handler: &str, error: &HandlerError);
}
