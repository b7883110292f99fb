//! Run statistics.

use std::time::Duration;

use dispatcher::{DispatchMetricsSnapshot, StatsSnapshot};
use observability::StatsSummary;
use producer::ProducerMetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Producer counters
    pub produced: ProducerMetricsSnapshot,

    /// Dispatcher counters
    pub dispatch: DispatchMetricsSnapshot,

    /// Messages still queued when the dispatcher stopped
    pub left_in_queue: usize,

    /// Final stats snapshot
    pub snapshot: StatsSnapshot,

    /// Successful handler completions per second, sampled per report interval
    pub throughput: StatsSummary,

    /// Entries to print (0 = all)
    pub top: usize,
}

impl PipelineStats {
    /// Messages dequeued per second over the whole run
    pub fn dispatch_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.dequeued as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Failed handler invocations as a percentage of all invocations
    pub fn failure_rate(&self) -> f64 {
        let total = self.dispatch.succeeded + self.dispatch.handler_errors;
        if total > 0 {
            (self.dispatch.handler_errors as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Dispatch Statistics                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Producer ticks: {}", self.produced.ticks);
        println!("   ├─ Messages produced: {}", self.produced.messages_submitted);
        println!("   ├─ Messages dispatched: {}", self.dispatch.dequeued);
        println!("   ├─ Left in queue: {}", self.left_in_queue);
        println!("   └─ Dispatch rate: {:.2} msg/s", self.dispatch_rate());

        println!("\n🔀 Handlers");
        println!("   ├─ Successful invocations: {}", self.dispatch.succeeded);
        println!(
            "   ├─ Failed invocations: {} ({:.3}%)",
            self.dispatch.handler_errors,
            self.failure_rate()
        );
        println!("   ├─ Messages without handlers: {}", self.dispatch.no_handlers);
        println!("   ├─ Peak in flight: {}", self.dispatch.peak_in_flight);
        println!("   └─ Throughput (msg/s): {}", self.throughput);

        println!("\n📈 Collected stats (total = {})", self.snapshot.total);
        let entries = self.snapshot.top(self.top);
        for (i, entry) in entries.iter().enumerate() {
            let prefix = if i == entries.len() - 1 { "└─" } else { "├─" };
            println!("   {} {}: {}", prefix, entry.key, entry.count);
        }

        println!();
    }
}
