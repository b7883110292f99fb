//! Periodic producer task

use std::sync::Arc;

use contracts::MessageSubmitter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace};

use crate::config::{ProducerConfig, ProducerMetrics, ProducerMetricsSnapshot};
use crate::error::{ProducerError, Result};
use crate::generator::MessageGenerator;

/// Periodic producer
///
/// Every `interval` asks the generator for a batch and submits it. The first
/// batch is sent one interval after start.
pub struct Producer {
    config: ProducerConfig,
    generator: Box<dyn MessageGenerator>,
    submitter: Arc<dyn MessageSubmitter>,
    metrics: Arc<ProducerMetrics>,
}

impl Producer {
    pub fn new(
        config: ProducerConfig,
        generator: impl MessageGenerator + 'static,
        submitter: Arc<dyn MessageSubmitter>,
    ) -> Self {
        Self {
            config,
            generator: Box::new(generator),
            submitter,
            metrics: Arc::new(ProducerMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<ProducerMetrics> {
        self.metrics.clone()
    }

    /// Spawn the producer task
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(
        name = "producer_start",
        skip(self),
        fields(interval_ms = self.config.interval.as_millis() as u64)
    )]
    pub fn start(self) -> Result<ProducerHandle> {
        self.config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = self.metrics.clone();
        let task = tokio::spawn(self.run(shutdown_rx));

        info!("Producer started");
        Ok(ProducerHandle {
            shutdown_tx,
            task,
            metrics,
        })
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            let Some(batch) = self.generator.next_batch() else {
                debug!("Generator exhausted");
                break;
            };

            let size = batch.len();
            for payload in batch {
                self.submitter.submit(payload);
            }
            self.metrics.record_batch(size);
            observability::record_producer_batch(size);
            trace!(batch = size, "Batch submitted");
        }

        let metrics = self.metrics.snapshot();
        info!(
            ticks = metrics.ticks,
            messages_submitted = metrics.messages_submitted,
            "Producer stopped"
        );
    }
}

/// Handle of a running producer
pub struct ProducerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    metrics: Arc<ProducerMetrics>,
}

impl ProducerHandle {
    /// True once the task ended (stopped or generator exhausted)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn metrics(&self) -> ProducerMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop producing and wait for the task; a batch in progress completes
    pub async fn stop(self) -> Result<ProducerMetricsSnapshot> {
        let _ = self.shutdown_tx.send(true);
        self.task.await.map_err(|e| ProducerError::TaskFailed {
            message: e.to_string(),
        })?;
        Ok(self.metrics.snapshot())
    }
}
