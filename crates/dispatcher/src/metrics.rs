//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// In-process counters shared by all workers
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Messages taken off the queue
    dequeued: AtomicU64,
    /// Successful handler completions
    succeeded: AtomicU64,
    /// Handler invocations that returned an error or panicked
    handler_errors: AtomicU64,
    /// Messages whose type had no handlers
    no_handlers: AtomicU64,
    /// Messages currently being handled
    in_flight: AtomicUsize,
    /// Highest observed `in_flight`
    peak_in_flight: AtomicUsize,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    pub fn inc_dequeued(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn inc_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handler_errors(&self) -> u64 {
        self.handler_errors.load(Ordering::Relaxed)
    }

    pub fn inc_handler_errors(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn no_handlers(&self) -> u64 {
        self.no_handlers.load(Ordering::Relaxed)
    }

    pub fn inc_no_handlers(&self) {
        self.no_handlers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Acquire)
    }

    /// Mark a message as entering the handling state; returns the new count
    pub fn enter_flight(&self) -> usize {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
        now
    }

    /// Mark a message as done; returns the new count
    pub fn exit_flight(&self) -> usize {
        self.in_flight.fetch_sub(1, Ordering::AcqRel) - 1
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        DispatchMetricsSnapshot {
            dequeued: self.dequeued(),
            succeeded: self.succeeded(),
            handler_errors: self.handler_errors(),
            no_handlers: self.no_handlers(),
            in_flight: self.in_flight(),
            peak_in_flight: self.peak_in_flight(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchMetricsSnapshot {
    pub dequeued: u64,
    pub succeeded: u64,
    pub handler_errors: u64,
    pub no_handlers: u64,
    pub in_flight: usize,
    pub peak_in_flight: usize,
}

impl DispatchMetricsSnapshot {
    /// Total reported failures
    pub fn failures(&self) -> u64 {
        self.handler_errors + self.no_handlers
    }
}
