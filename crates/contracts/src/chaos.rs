//! FailureInjector trait - pluggable deliberate failures
//!
//! Handlers consult an injector to exercise the failure paths; tests swap
//! in deterministic implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Message;

/// Decides whether a handler invocation should fail on purpose
pub trait FailureInjector: Send + Sync {
    /// Return `Some(reason)` to make the current invocation fail
    fn should_fail(&self, message: &Message) -> Option<String>;
}

/// Injector that never fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverFail;

impl FailureInjector for NeverFail {
    fn should_fail(&self, _message: &Message) -> Option<String> {
        None
    }
}

/// Injector that always fails with a fixed reason
#[derive(Debug, Clone)]
pub struct AlwaysFail {
    reason: String,
}

impl AlwaysFail {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl FailureInjector for AlwaysFail {
    fn should_fail(&self, _message: &Message) -> Option<String> {
        Some(self.reason.clone())
    }
}

/// Injector failing every `n`th invocation (1-based)
#[derive(Debug)]
pub struct FailEveryNth {
    n: u64,
    calls: AtomicU64,
}

impl FailEveryNth {
    /// `n == 0` never fails
    pub fn new(n: u64) -> Self {
        Self {
            n,
            calls: AtomicU64::new(0),
        }
    }
}

impl FailureInjector for FailEveryNth {
    fn should_fail(&self, _message: &Message) -> Option<String> {
        if self.n == 0 {
            return None;
        }
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        (call % self.n == 0).then(|| format!("call {call} is a multiple of {}", self.n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageId;

    #[test]
    fn test_fail_every_nth() {
        let injector = FailEveryNth::new(3);
        let msg = Message::new(MessageId::new(1), "x");
        let failures: Vec<bool> = (0..6).map(|_| injector.should_fail(&msg).is_some()).collect();
        assert_eq!(failures, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_zero_never_fails() {
        let injector = FailEveryNth::new(0);
        let msg = Message::new(MessageId::new(1), "x");
        assert!((0..10).all(|_| injector.should_fail(&msg).is_none()));
        assert!(NeverFail.should_fail(&msg).is_none());
        assert_eq!(AlwaysFail::new("boom").should_fail(&msg).as_deref(), Some("boom"));
    }
}
