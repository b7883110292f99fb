//! HandlerRegistry - message type to ordered handler set
//!
//! Populated once through `HandlerRegistryBuilder`, then frozen and shared
//! read-only by every worker, so the resolve path takes no locks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use contracts::{MessageHandler, MessageType};
use tracing::debug;

/// Shared handler reference
pub type HandlerRef = Arc<dyn MessageHandler>;

/// Mutable registration phase
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    bindings: HashMap<MessageType, Vec<HandlerRef>>,
}

impl HandlerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to a message type
    ///
    /// Handlers for the same type are invoked in registration order.
    pub fn register<H>(&mut self, message_type: MessageType, handler: H) -> &mut Self
    where
        H: MessageHandler + 'static,
    {
        self.register_shared(message_type, Arc::new(handler))
    }

    /// Bind an already shared handler (the caller may keep a reference)
    pub fn register_shared(&mut self, message_type: MessageType, handler: HandlerRef) -> &mut Self {
        debug!(
            message_type = %message_type,
            handler = handler.name(),
            "Handler registered"
        );
        self.bindings.entry(message_type).or_default().push(handler);
        self
    }

    /// Freeze the bindings
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            bindings: self.bindings,
        }
    }
}

/// Read-only handler lookup
pub struct HandlerRegistry {
    bindings: HashMap<MessageType, Vec<HandlerRef>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    /// Registry with no bindings: every message hits the no-handlers path
    pub fn empty() -> Self {
        HandlerRegistryBuilder::new().build()
    }

    /// Handlers bound to `message_type`, in registration order
    ///
    /// An empty slice is the no-handlers condition.
    pub fn resolve(&self, message_type: MessageType) -> &[HandlerRef] {
        self.bindings
            .get(&message_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of bindings
    pub fn handler_count(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    /// Message types with at least one handler, sorted
    pub fn message_types(&self) -> Vec<MessageType> {
        let mut types: Vec<_> = self
            .bindings
            .iter()
            .filter(|(_, handlers)| !handlers.is_empty())
            .map(|(t, _)| *t)
            .collect();
        types.sort();
        types
    }

    /// Handler names bound to `message_type`
    pub fn handler_names(&self, message_type: MessageType) -> Vec<&str> {
        self.resolve(message_type).iter().map(|h| h.name()).collect()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for message_type in self.message_types() {
            map.entry(&message_type, &self.handler_names(message_type));
        }
        map.finish()
    }
}
