//! Dispatcher error types

use contracts::{HandlerError, MessageId, MessageType};
use thiserror::Error;

/// Dispatcher lifecycle errors
///
/// Never produced by `submit`; dispatch failures go to the `FailureReporter`.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Invalid pool configuration
    #[error("invalid dispatcher config '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// `start` called while the worker pool is running
    #[error("dispatcher is already running with {workers} workers")]
    AlreadyRunning { workers: usize },
}

impl DispatcherError {
    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A reported dispatch failure for a single message
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchFailure {
    /// The message type resolved to zero handlers
    #[error("message {message_id} of type '{message_type}' could not be dispatched to any handlers")]
    NoHandlers {
        message_id: MessageId,
        message_type: MessageType,
    },

    /// A handler failed while processing the message
    #[error("handler '{handler}' failed on message {message_id}: {source}")]
    HandlerInvocation {
        message_id: MessageId,
        handler: String,
        #[source]
        source: HandlerError,
    },
}

impl DispatchFailure {
    pub fn message_id(&self) -> MessageId {
        match self {
            Self::NoHandlers { message_id, .. } | Self::HandlerInvocation { message_id, .. } => {
                *message_id
            }
        }
    }

    pub fn is_no_handlers(&self) -> bool {
        matches!(self, Self::NoHandlers { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_carries_identity() {
        let failure = DispatchFailure::NoHandlers {
            message_id: MessageId::new(7),
            message_type: MessageType::Json,
        };
        assert_eq!(
            failure.to_string(),
            "message #7 of type 'json' could not be dispatched to any handlers"
        );
        assert!(failure.is_no_handlers());

        let failure = DispatchFailure::HandlerInvocation {
            message_id: MessageId::new(8),
            handler: "flaky".to_string(),
            source: HandlerError::failed("boom"),
        };
        assert!(failure.to_string().contains("'flaky'"));
        assert!(failure.to_string().contains("boom"));
        assert_eq!(failure.message_id(), MessageId::new(8));
    }
}
