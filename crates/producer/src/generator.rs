//! Message generators
//!
//! A generator yields one batch per producer tick. Returning `None` ends
//! production.

use contracts::{Payload, ProducerSettings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of message batches
pub trait MessageGenerator: Send {
    /// Next batch to submit, or `None` when exhausted
    fn next_batch(&mut self) -> Option<Vec<Payload>>;
}

fn render(template: &str, n: u64) -> Payload {
    Payload::Text(template.replace("{n}", &n.to_string()))
}

/// Random batch of `template` messages
///
/// Each batch has a size drawn uniformly from `0..max_batch`; message `i` of
/// a batch renders `{n}` as `i % distinct`.
pub struct TemplateGenerator {
    template: String,
    distinct: u64,
    max_batch: usize,
    rng: StdRng,
}

impl TemplateGenerator {
    pub fn new(template: impl Into<String>, distinct: u64, max_batch: usize) -> Self {
        Self {
            template: template.into(),
            distinct: distinct.max(1),
            max_batch: max_batch.max(1),
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn from_settings(settings: &ProducerSettings) -> Self {
        Self::new(
            settings.template.clone(),
            settings.distinct_messages,
            settings.max_batch,
        )
    }

    /// Fix the random seed (reproducible batch sizes)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl MessageGenerator for TemplateGenerator {
    fn next_batch(&mut self) -> Option<Vec<Payload>> {
        let size = self.rng.random_range(0..self.max_batch);
        let batch = (0..size as u64)
            .map(|n| render(&self.template, n % self.distinct))
            .collect();
        Some(batch)
    }
}

/// Deterministic generator
///
/// Emits fixed-size batches with a running counter and stops after `limit`
/// messages when one is set.
pub struct SequenceGenerator {
    template: String,
    distinct: u64,
    batch_size: usize,
    next: u64,
    limit: Option<u64>,
}

impl SequenceGenerator {
    pub fn new(template: impl Into<String>, distinct: u64, batch_size: usize) -> Self {
        Self {
            template: template.into(),
            distinct: distinct.max(1),
            batch_size,
            next: 0,
            limit: None,
        }
    }

    /// Stop after `limit` messages in total
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl MessageGenerator for SequenceGenerator {
    fn next_batch(&mut self) -> Option<Vec<Payload>> {
        let remaining = match self.limit {
            Some(limit) if self.next >= limit => return None,
            Some(limit) => limit - self.next,
            None => u64::MAX,
        };
        let size = (self.batch_size as u64).min(remaining);

        let start = self.next;
        self.next += size;
        Some(
            (start..self.next)
                .map(|n| render(&self.template, n % self.distinct))
                .collect(),
        )
    }
}
