//! Pipeline orchestrator - wires every component together.
//!
//! Construction order: stats collector, handlers, registry, dispatcher,
//! producer, reporter. Shutdown runs in the reverse direction of the data
//! flow: producer first, then dispatcher, then reporter.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use contracts::{AppConfig, HandlerSettings, MessageType};
use dispatcher::{
    Dispatcher, DispatcherConfig, FlakyHandler, HandlerRegistry, LogHandler, LogReporter,
    MessageQueue, StatsCollector,
};
use producer::{Producer, ProducerConfig, RandomFailureInjector, TemplateGenerator};
use tracing::info;

use super::{PipelineStats, StatsReporter};
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded and validated application configuration
    pub app: AppConfig,

    /// Stop automatically after this long (None = until shutdown signal)
    pub duration: Option<Duration>,
}

/// Build the handler registry from configuration
///
/// Text messages go to the `stats` handler, which fails one invocation in
/// `failure_one_in`. JSON and binary messages have no handlers.
pub fn build_registry(settings: &HandlerSettings) -> HandlerRegistry {
    let injector = Arc::new(RandomFailureInjector::new(settings.failure_one_in));

    let mut builder = HandlerRegistry::builder();
    builder.register(MessageType::Text, FlakyHandler::new("stats", injector));
    if settings.extra_log_handler {
        builder.register(MessageType::Text, LogHandler::new("log"));
    }
    builder.build()
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or the configured duration elapses
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let app = &self.config.app;

        let queue = Arc::new(MessageQueue::new());
        let stats = Arc::new(StatsCollector::new());
        let registry = build_registry(&app.handlers);
        info!(registry = ?registry, "Handlers registered");

        let dispatcher = Dispatcher::builder(registry)
            .queue(queue.clone())
            .stats(stats.clone())
            .reporter(Arc::new(LogReporter::new()))
            .build();
        dispatcher
            .start_with(DispatcherConfig::from(&app.dispatcher))
            .map_err(|e| CliError::startup("dispatcher", e))?;

        let producer = Producer::new(
            ProducerConfig::from(&app.producer),
            TemplateGenerator::from_settings(&app.producer),
            queue.clone(),
        )
        .start()
        .map_err(|e| CliError::startup("producer", e))?;

        let reporter = StatsReporter::new(stats.clone(), app.reporter.clone()).start();

        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = shutdown => {}
            _ = deadline => info!("Run duration elapsed"),
        }

        info!("Stopping producer...");
        let produced = producer.stop().await.map_err(CliError::shutdown)?;

        info!(pending = queue.len(), "Stopping dispatcher...");
        dispatcher.stop().await;

        let throughput = reporter.stop().await?;

        Ok(PipelineStats {
            duration: start_time.elapsed(),
            produced,
            dispatch: dispatcher.metrics(),
            left_in_queue: queue.len(),
            snapshot: dispatcher.snapshot(),
            throughput,
            top: app.reporter.top,
        })
    }
}
