//! Worker loop - dequeue, resolve, invoke, report

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{FailureReporter, HandlerError, Message, MessageHandler};
use futures::FutureExt;
use observability::DispatchOutcome;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, instrument, trace};

use crate::metrics::DispatchMetrics;
use crate::queue::MessageQueue;
use crate::registry::HandlerRegistry;
use crate::stats::StatsCollector;

/// State shared by every worker of one pool
pub(crate) struct WorkerShared {
    pub queue: Arc<MessageQueue>,
    pub registry: Arc<HandlerRegistry>,
    pub stats: Arc<StatsCollector>,
    pub reporter: Arc<dyn FailureReporter>,
    pub metrics: Arc<DispatchMetrics>,
    /// In-flight gate sized to `max_parallelism`
    pub permits: Arc<Semaphore>,
    pub idle_backoff_min: Duration,
    pub idle_backoff_max: Duration,
}

/// Bounded exponential idle wait
struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl Backoff {
    fn new(min: Duration, max: Duration) -> Self {
        Self {
            current: min,
            min,
            max,
        }
    }

    fn next(&mut self) -> Duration {
        let wait = self.current;
        self.current = (self.current * 2).min(self.max);
        wait
    }

    fn reset(&mut self) {
        self.current = self.min;
    }
}

/// Worker task
///
/// Runs until the shutdown signal flips, then waits for its in-flight
/// messages to finish. Never returns early because of a dispatch failure.
#[instrument(name = "dispatch_worker_loop", skip(shared, shutdown))]
pub(crate) async fn worker_loop(
    worker_id: usize,
    shared: Arc<WorkerShared>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(worker_id, "Worker started");

    let mut in_flight: JoinSet<()> = JoinSet::new();
    let mut backoff = Backoff::new(shared.idle_backoff_min, shared.idle_backoff_max);

    loop {
        if *shutdown.borrow() {
            break;
        }

        while let Some(result) = in_flight.try_join_next() {
            log_join_result(worker_id, result);
        }

        // Acquire before dequeuing so a message is never held without capacity.
        let permit = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            permit = Arc::clone(&shared.permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        match shared.queue.try_dequeue() {
            Some(message) => {
                backoff.reset();
                shared.metrics.inc_dequeued();
                observability::record_queue_depth(shared.queue.len());

                let shared = Arc::clone(&shared);
                in_flight.spawn(async move {
                    dispatch_message(&shared, message).await;
                    drop(permit);
                });
            }
            None => {
                drop(permit);
                let wait = backoff.next();
                trace!(worker_id, wait_ms = wait.as_millis() as u64, "Queue empty, idling");
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(wait) => {}
                }
            }
        }
    }

    let pending = in_flight.len();
    if pending > 0 {
        debug!(worker_id, pending, "Waiting for in-flight messages");
    }
    while let Some(result) = in_flight.join_next().await {
        log_join_result(worker_id, result);
    }

    debug!(worker_id, "Worker stopped");
}

fn log_join_result(worker_id: usize, result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(worker_id, error = %e, "Dispatch task terminated abnormally");
    }
}

/// Marks one message as in flight until dropped
///
/// Records the dispatch outcome on drop, so an unwinding reporter still
/// releases the slot. An unfinished guard counts as `Failed`.
struct FlightGuard<'a> {
    metrics: &'a DispatchMetrics,
    outcome: DispatchOutcome,
}

impl<'a> FlightGuard<'a> {
    fn enter(metrics: &'a DispatchMetrics) -> Self {
        observability::record_in_flight(metrics.enter_flight());
        Self {
            metrics,
            outcome: DispatchOutcome::Failed,
        }
    }

    fn finish(mut self, outcome: DispatchOutcome) {
        self.outcome = outcome;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        observability::record_message_dispatched(self.outcome);
        observability::record_in_flight(self.metrics.exit_flight());
    }
}

/// Route one message to its handlers and account for the outcome
pub(crate) async fn dispatch_message(shared: &WorkerShared, message: Message) {
    let flight = FlightGuard::enter(&shared.metrics);

    let message_type = message.message_type();
    let handlers = shared.registry.resolve(message_type);

    let outcome = if handlers.is_empty() {
        shared.metrics.inc_no_handlers();
        observability::record_no_handlers(message_type);
        shared.reporter.on_no_handlers(&message);
        DispatchOutcome::NoHandlers
    } else {
        let key = message.payload.canonical();
        let (mut succeeded, mut failed) = (0usize, 0usize);

        for handler in handlers {
            let started = Instant::now();
            let result = invoke(handler.as_ref(), &message).await;
            observability::record_handler_latency_ms(
                handler.name(),
                started.elapsed().as_secs_f64() * 1000.0,
            );

            match result {
                Ok(()) => {
                    shared.stats.register(&key);
                    shared.metrics.inc_succeeded();
                    succeeded += 1;
                }
                Err(e) => {
                    shared.metrics.inc_handler_errors();
                    observability::record_handler_error(handler.name(), &e);
                    shared.reporter.on_handler_error(&message, handler.name(), &e);
                    failed += 1;
                }
            }
        }

        DispatchOutcome::from_counts(succeeded, failed)
    };

    trace!(message_id = %message.id, outcome = outcome.as_str(), "Message dispatched");
    flight.finish(outcome);
}

/// Invoke a handler, converting a panic into a `HandlerError`
async fn invoke(handler: &dyn MessageHandler, message: &Message) -> Result<(), HandlerError> {
    match AssertUnwindSafe(handler.handle(message)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(HandlerError::panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
