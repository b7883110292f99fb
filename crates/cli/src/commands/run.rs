//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::commands::load_config_or_default;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_dispatch(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut app = load_config_or_default(&args.config)?;

    // Apply CLI overrides
    if let Some(workers) = args.workers {
        info!(workers, "Overriding workers from CLI");
        app.dispatcher.workers = workers;
    }
    if let Some(max_parallelism) = args.max_parallelism {
        info!(max_parallelism, "Overriding max_parallelism from CLI");
        app.dispatcher.max_parallelism = max_parallelism;
    }
    if let Some(failure_one_in) = args.failure_one_in {
        info!(failure_one_in, "Overriding failure rate from CLI");
        app.handlers.failure_one_in = failure_one_in;
    }
    config_loader::ConfigLoader::validate(&app)
        .map_err(|e| CliError::config_load(&args.config, e))
        .context("Invalid configuration after CLI overrides")?;

    info!(
        workers = app.dispatcher.workers,
        max_parallelism = app.dispatcher.max_parallelism,
        producer_interval_ms = app.producer.interval_ms,
        reporter_interval_ms = app.reporter.interval_ms,
        failure_one_in = app.handlers.failure_one_in,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let pipeline = Pipeline::new(PipelineConfig {
        app,
        duration: (args.duration != 0).then(|| Duration::from_secs(args.duration)),
    });

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Dispatch pipeline failed")?;

    info!(
        produced = stats.produced.messages_submitted,
        succeeded = stats.dispatch.succeeded,
        handler_errors = stats.dispatch.handler_errors,
        duration_secs = stats.duration.as_secs_f64(),
        "Dispatch pipeline finished"
    );
    stats.print_summary();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal");
}
