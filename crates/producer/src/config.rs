//! Producer configuration and metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use contracts::ProducerSettings;

use crate::error::{ProducerError, Result};

/// Producer configuration
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Time between two batches
    pub interval: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

impl ProducerConfig {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ProducerError::InvalidConfig {
                field: "interval".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl From<&ProducerSettings> for ProducerConfig {
    fn from(settings: &ProducerSettings) -> Self {
        Self::new(settings.interval())
    }
}

/// Producer metrics
#[derive(Debug, Default)]
pub struct ProducerMetrics {
    /// Timer ticks handled
    ticks: AtomicU64,

    /// Total messages submitted
    messages_submitted: AtomicU64,

    /// Size of the most recent batch
    last_batch: AtomicUsize,
}

impl ProducerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one submitted batch
    pub fn record_batch(&self, size: usize) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.messages_submitted
            .fetch_add(size as u64, Ordering::Relaxed);
        self.last_batch.store(size, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProducerMetricsSnapshot {
        ProducerMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            messages_submitted: self.messages_submitted.load(Ordering::Relaxed),
            last_batch: self.last_batch.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerMetricsSnapshot {
    pub ticks: u64,
    pub messages_submitted: u64,
    pub last_batch: usize,
}
