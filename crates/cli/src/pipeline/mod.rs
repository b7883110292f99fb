//! Pipeline orchestration module.

mod orchestrator;
mod reporter;
mod stats;

pub use orchestrator::{build_registry, Pipeline, PipelineConfig};
pub use reporter::StatsReporter;
pub use stats::PipelineStats;
