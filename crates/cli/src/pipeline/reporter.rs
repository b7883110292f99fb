//! Periodic stats reporter.

use std::sync::Arc;
use std::time::Duration;

use contracts::ReporterSettings;
use dispatcher::{StatsCollector, StatsSnapshot};
use observability::{StatsSummary, ThroughputStats};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::CliError;

/// Logs a stats snapshot every `interval`, plus a final one on stop
pub struct StatsReporter {
    stats: Arc<StatsCollector>,
    settings: ReporterSettings,
}

impl StatsReporter {
    pub fn new(stats: Arc<StatsCollector>, settings: ReporterSettings) -> Self {
        Self { stats, settings }
    }

    /// Spawn the reporter task
    pub fn start(self) -> ReporterHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        ReporterHandle { shutdown_tx, task }
    }

    /// Returns the per-interval throughput (messages/s) observed
    async fn run(self, mut shutdown: watch::Receiver<bool>) -> ThroughputStats {
        let period = self.settings.interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut throughput = ThroughputStats::default();
        let mut last_total = 0u64;
        let mut last_tick = Instant::now();

        debug!(interval_ms = self.settings.interval_ms, "Stats reporter started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            let snapshot = self.stats.snapshot();
            let elapsed = last_tick.elapsed();
            last_tick = Instant::now();

            throughput.record(rate(snapshot.total - last_total, elapsed));
            last_total = snapshot.total;

            report(&snapshot, self.settings.top);
        }

        report(&self.stats.snapshot(), self.settings.top);
        throughput
    }
}

/// Handle of a running reporter
pub struct ReporterHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<ThroughputStats>,
}

impl ReporterHandle {
    /// Stop the reporter; it logs one final snapshot before exiting
    pub async fn stop(self) -> Result<StatsSummary, CliError> {
        let _ = self.shutdown_tx.send(true);
        let throughput = self.task.await.map_err(CliError::shutdown)?;
        Ok(StatsSummary::from(&throughput))
    }
}

fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

/// Log one snapshot, entries ordered by count descending
fn report(snapshot: &StatsSnapshot, top: usize) {
    observability::record_stats_snapshot(snapshot.total, snapshot.len());

    match serde_json::to_string(snapshot.top(top)) {
        Ok(entries) => info!(
            total = snapshot.total,
            distinct = snapshot.len(),
            "Here's the collected stats (total = {}): {}",
            snapshot.total,
            entries
        ),
        Err(e) => warn!(error = %e, "Failed to render stats snapshot"),
    }
}
