//! Dispatcher - worker pool lifecycle and producer/reporter facing API

use std::sync::Arc;
use std::time::Duration;

use contracts::{DispatcherSettings, FailureReporter, MessageId, Payload};
use parking_lot::Mutex;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, DispatchMetricsSnapshot};
use crate::queue::MessageQueue;
use crate::registry::HandlerRegistry;
use crate::reporters::LogReporter;
use crate::stats::{StatsCollector, StatsSnapshot};
use crate::worker::{worker_loop, WorkerShared};

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker loops
    pub workers: usize,
    /// Maximum messages handled at once across all workers
    pub max_parallelism: usize,
    /// First idle wait after an empty dequeue
    pub idle_backoff_min: Duration,
    /// Upper bound for the idle wait
    pub idle_backoff_max: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_parallelism: 30,
            idle_backoff_min: Duration::from_millis(1),
            idle_backoff_max: Duration::from_millis(100),
        }
    }
}

impl DispatcherConfig {
    pub fn new(workers: usize, max_parallelism: usize) -> Self {
        Self {
            workers,
            max_parallelism,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), DispatcherError> {
        if self.workers == 0 {
            return Err(DispatcherError::invalid_config("workers", "must be >= 1"));
        }
        if self.max_parallelism == 0 {
            return Err(DispatcherError::invalid_config(
                "max_parallelism",
                "must be >= 1",
            ));
        }
        if self.idle_backoff_min.is_zero() || self.idle_backoff_min > self.idle_backoff_max {
            return Err(DispatcherError::invalid_config(
                "idle_backoff",
                format!(
                    "need 0 < min ({:?}) <= max ({:?})",
                    self.idle_backoff_min, self.idle_backoff_max
                ),
            ));
        }
        Ok(())
    }
}

impl From<&DispatcherSettings> for DispatcherConfig {
    fn from(settings: &DispatcherSettings) -> Self {
        Self {
            workers: settings.workers,
            max_parallelism: settings.max_parallelism,
            idle_backoff_min: settings.idle_backoff_min(),
            idle_backoff_max: settings.idle_backoff_max(),
        }
    }
}

/// Builder for creating a Dispatcher
///
/// Queue, stats and reporter default to fresh instances; pass your own to
/// share them with producers, reporters or tests.
pub struct DispatcherBuilder {
    registry: Arc<HandlerRegistry>,
    queue: Option<Arc<MessageQueue>>,
    stats: Option<Arc<StatsCollector>>,
    reporter: Option<Arc<dyn FailureReporter>>,
}

impl DispatcherBuilder {
    pub fn new(registry: impl Into<Arc<HandlerRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            queue: None,
            stats: None,
            reporter: None,
        }
    }

    pub fn queue(mut self, queue: Arc<MessageQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn stats(mut self, stats: Arc<StatsCollector>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            queue: self.queue.unwrap_or_default(),
            registry: self.registry,
            stats: self.stats.unwrap_or_default(),
            reporter: self
                .reporter
                .unwrap_or_else(|| Arc::new(LogReporter::new())),
            metrics: Arc::new(DispatchMetrics::new()),
            pool: Mutex::new(None),
        }
    }
}

/// Handles of a running pool
struct WorkerPool {
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

/// Message dispatcher
///
/// Owns the worker pool. The queue and the stats collector are the only
/// shared mutable state and both synchronize internally.
pub struct Dispatcher {
    queue: Arc<MessageQueue>,
    registry: Arc<HandlerRegistry>,
    stats: Arc<StatsCollector>,
    reporter: Arc<dyn FailureReporter>,
    metrics: Arc<DispatchMetrics>,
    pool: Mutex<Option<WorkerPool>>,
}

impl Dispatcher {
    pub fn builder(registry: impl Into<Arc<HandlerRegistry>>) -> DispatcherBuilder {
        DispatcherBuilder::new(registry)
    }

    /// Create a dispatcher with explicit collaborators
    pub fn new(
        queue: Arc<MessageQueue>,
        registry: Arc<HandlerRegistry>,
        stats: Arc<StatsCollector>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        DispatcherBuilder::new(registry)
            .queue(queue)
            .stats(stats)
            .reporter(reporter)
            .build()
    }

    /// Enqueue a payload; never fails
    pub fn submit(&self, payload: impl Into<Payload>) -> MessageId {
        self.queue.submit(payload)
    }

    /// Point-in-time statistics
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }

    pub fn stats(&self) -> &Arc<StatsCollector> {
        &self.stats
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> DispatchMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.pool.lock().is_some()
    }

    /// Launch `workers` loops sharing `max_parallelism` in-flight permits
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, workers: usize, max_parallelism: usize) -> Result<(), DispatcherError> {
        self.start_with(DispatcherConfig::new(workers, max_parallelism))
    }

    /// Launch the pool with full configuration
    #[instrument(
        name = "dispatcher_start",
        skip(self, config),
        fields(workers = config.workers, max_parallelism = config.max_parallelism)
    )]
    pub fn start_with(&self, config: DispatcherConfig) -> Result<(), DispatcherError> {
        config.validate()?;

        let mut pool = self.pool.lock();
        if let Some(running) = pool.as_ref() {
            return Err(DispatcherError::AlreadyRunning {
                workers: running.workers.len(),
            });
        }

        let shared = Arc::new(WorkerShared {
            queue: Arc::clone(&self.queue),
            registry: Arc::clone(&self.registry),
            stats: Arc::clone(&self.stats),
            reporter: Arc::clone(&self.reporter),
            metrics: Arc::clone(&self.metrics),
            permits: Arc::new(Semaphore::new(config.max_parallelism)),
            idle_backoff_min: config.idle_backoff_min,
            idle_backoff_max: config.idle_backoff_max,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let workers = (0..config.workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&shared),
                    shutdown_rx.clone(),
                ))
            })
            .collect();

        *pool = Some(WorkerPool {
            shutdown_tx,
            workers,
        });

        info!(
            workers = config.workers,
            max_parallelism = config.max_parallelism,
            handlers = self.registry.handler_count(),
            "Dispatcher started"
        );
        Ok(())
    }

    /// Signal all workers and wait for in-flight messages to finish
    ///
    /// Pending queue entries are left in place. Calling `stop` on a stopped
    /// dispatcher does nothing.
    #[instrument(name = "dispatcher_stop", skip(self))]
    pub async fn stop(&self) {
        let pool = self.pool.lock().take();
        let Some(pool) = pool else {
            return;
        };

        let _ = pool.shutdown_tx.send(true);
        for handle in pool.workers {
            if let Err(e) = handle.await {
                error!(error = ?e, "Worker task panicked");
            }
        }

        let metrics = self.metrics.snapshot();
        info!(
            dequeued = metrics.dequeued,
            succeeded = metrics.succeeded,
            handler_errors = metrics.handler_errors,
            no_handlers = metrics.no_handlers,
            left_in_queue = self.queue.len(),
            "Dispatcher stopped"
        );
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.get_mut().take() {
            let _ = pool.shutdown_tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::FlakyHandler;
    use crate::reporters::RecordingReporter;
    use contracts::{
        async_trait, FailEveryNth, HandlerError, Message, MessageHandler, MessageType, NeverFail,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    async fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn text_registry(handler: FlakyHandler) -> HandlerRegistry {
        let mut builder = HandlerRegistry::builder();
        builder.register(MessageType::Text, handler);
        builder.build()
    }

    #[tokio::test]
    async fn test_dispatches_and_counts() {
        let dispatcher = Dispatcher::builder(text_registry(FlakyHandler::new(
            "flaky",
            Arc::new(NeverFail),
        )))
        .build();
        dispatcher.start(2, 4).unwrap();

        for i in 0..30 {
            dispatcher.submit(format!("MSG {}", i % 3));
        }

        wait_until(|| dispatcher.snapshot().total == 30).await;
        dispatcher.stop().await;

        let snapshot = dispatcher.snapshot();
        assert_eq!(snapshot.count("MSG 0"), 10);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(dispatcher.metrics().dequeued, 30);
    }

    #[tokio::test]
    async fn test_handler_errors_reported_not_counted() {
        let reporter = Arc::new(RecordingReporter::new());
        let dispatcher = Dispatcher::builder(text_registry(FlakyHandler::new(
            "flaky",
            Arc::new(FailEveryNth::new(2)),
        )))
        .reporter(reporter.clone())
        .build();
        dispatcher.start(1, 1).unwrap();

        for _ in 0..10 {
            dispatcher.submit("same");
        }

        wait_until(|| {
            let metrics = dispatcher.metrics();
            metrics.succeeded + metrics.handler_errors == 10
        })
        .await;
        dispatcher.stop().await;

        assert_eq!(dispatcher.stats().count("same"), 5);
        assert_eq!(reporter.handler_error_count(), 5);
    }

    #[tokio::test]
    async fn test_invalid_start_rejected() {
        let dispatcher = Dispatcher::builder(HandlerRegistry::empty()).build();
        assert!(matches!(
            dispatcher.start(0, 1),
            Err(DispatcherError::InvalidConfig { .. })
        ));
        assert!(matches!(
            dispatcher.start(1, 0),
            Err(DispatcherError::InvalidConfig { .. })
        ));
        assert!(!dispatcher.is_running());
    }

    #[tokio::test]
    async fn test_double_start_and_idempotent_stop() {
        let dispatcher = Dispatcher::builder(HandlerRegistry::empty()).build();
        dispatcher.start(3, 3).unwrap();
        assert!(dispatcher.is_running());
        assert!(matches!(
            dispatcher.start(1, 1),
            Err(DispatcherError::AlreadyRunning { workers: 3 })
        ));

        dispatcher.stop().await;
        assert!(!dispatcher.is_running());
        dispatcher.stop().await;

        // Restart after a full stop is allowed.
        dispatcher.start(1, 1).unwrap();
        dispatcher.stop().await;
    }

    struct Slow {
        started: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MessageHandler for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn handle(&self, _message: &Message) -> Result<(), HandlerError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stop_finishes_in_flight_and_keeps_queue() {
        let started = Arc::new(AtomicUsize::new(0));
        let mut builder = HandlerRegistry::builder();
        builder.register(
            MessageType::Text,
            Slow {
                started: Arc::clone(&started),
            },
        );
        let dispatcher = Dispatcher::builder(builder.build()).build();

        for i in 0..10 {
            dispatcher.submit(format!("job {i}"));
        }
        dispatcher.start(1, 3).unwrap();

        wait_until(|| started.load(Ordering::SeqCst) == 3).await;
        assert_eq!(dispatcher.metrics().in_flight, 3);
        dispatcher.stop().await;

        let started = started.load(Ordering::SeqCst);
        assert_eq!(started, 3);
        assert_eq!(dispatcher.snapshot().total, started as u64);
        assert_eq!(dispatcher.metrics().in_flight, 0);
        assert_eq!(dispatcher.queue().len(), 10 - started);

        // Submissions after stop stay queued too.
        dispatcher.submit("left behind");
        assert_eq!(dispatcher.queue().len(), 11 - started);
    }

    #[test]
    fn test_config_from_settings() {
        let settings = DispatcherSettings::default();
        let config = DispatcherConfig::from(&settings);
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_parallelism, 30);
        assert!(config.validate().is_ok());

        let bad = DispatcherConfig {
            idle_backoff_min: Duration::from_millis(50),
            idle_backoff_max: Duration::from_millis(10),
            ..DispatcherConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
