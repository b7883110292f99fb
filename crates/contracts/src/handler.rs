//! MessageHandler trait - Dispatcher routing target
//!
//! Defines the abstract interface for message handlers.

use async_trait::async_trait;
use thiserror::Error;

use crate::Message;

/// Error raised by a handler while processing a message
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler reported a processing failure
    #[error("handler failed: {message}")]
    Failed { message: String },

    /// Failure deliberately injected by a `FailureInjector`
    #[error("injected failure: {message}")]
    Injected { message: String },

    /// Handler panicked during invocation
    #[error("handler panicked: {message}")]
    Panicked { message: String },
}

impl HandlerError {
    /// Create a processing failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Create an injected failure
    pub fn injected(message: impl Into<String>) -> Self {
        Self::Injected {
            message: message.into(),
        }
    }

    /// Create a panic failure
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed { .. } => "failed",
            Self::Injected { .. } => "injected",
            Self::Panicked { .. } => "panicked",
        }
    }
}

/// Message handler
///
/// Handlers are registered per `MessageType` at startup and shared by all
/// workers, so implementations must be `Send + Sync` and use interior
/// synchronization for any state.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handler name (used for failure reports and metrics)
    fn name(&self) -> &str;

    /// Process one message
    ///
    /// # Errors
    /// Returns the cause of the failure; the dispatcher reports it and
    /// moves on to the next handler.
    async fn handle(&self, message: &Message) -> Result<(), HandlerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_display() {
        let err = HandlerError::injected("OMG THE RANDOM VALUE IS 3!");
        assert_eq!(err.to_string(), "injected failure: OMG THE RANDOM VALUE IS 3!");
        assert_eq!(err.kind(), "injected");
        assert_eq!(HandlerError::failed("x").kind(), "failed");
    }
}
