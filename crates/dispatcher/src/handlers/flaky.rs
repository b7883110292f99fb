//! FlakyHandler - accepts messages, failing whenever its injector says so

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{async_trait, FailureInjector, HandlerError, Message, MessageHandler};
use tracing::trace;

/// Handler whose only work is to succeed or fail on demand
///
/// Statistics are registered by the dispatcher on success, so this handler
/// only tracks its own invocation counts.
pub struct FlakyHandler {
    name: String,
    injector: Arc<dyn FailureInjector>,
    handled: AtomicU64,
    failed: AtomicU64,
}

impl FlakyHandler {
    pub fn new(name: impl Into<String>, injector: Arc<dyn FailureInjector>) -> Self {
        Self {
            name: name.into(),
            injector,
            handled: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Invocations that completed successfully
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    /// Invocations failed by the injector
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessageHandler for FlakyHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        if let Some(reason) = self.injector.should_fail(message) {
            self.failed.fetch_add(1, Ordering::Relaxed);
            return Err(HandlerError::injected(reason));
        }

        self.handled.fetch_add(1, Ordering::Relaxed);
        trace!(handler = %self.name, message_id = %message.id, "Message handled");
        Ok(())
    }
}
