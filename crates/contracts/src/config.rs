//! AppConfig - Config Loader output
//!
//! Dispatcher sizing, producer cadence, handler wiring and reporter cadence.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    #[validate(nested)]
    pub dispatcher: DispatcherSettings,

    #[serde(default)]
    #[validate(nested)]
    pub producer: ProducerSettings,

    #[serde(default)]
    pub handlers: HandlerSettings,

    #[serde(default)]
    #[validate(nested)]
    pub reporter: ReporterSettings,
}

/// Worker pool sizing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatcherSettings {
    /// Number of worker loops
    #[serde(default = "default_workers")]
    #[validate(range(min = 1, max = 1024))]
    pub workers: usize,

    /// Maximum handler invocations in flight across all workers
    #[serde(default = "default_max_parallelism")]
    #[validate(range(min = 1, max = 65536))]
    pub max_parallelism: usize,

    /// First idle wait after an empty dequeue
    #[serde(default = "default_idle_backoff_min_ms")]
    #[validate(range(min = 1))]
    pub idle_backoff_min_ms: u64,

    /// Upper bound for the idle wait
    #[serde(default = "default_idle_backoff_max_ms")]
    #[validate(range(min = 1, max = 60000))]
    pub idle_backoff_max_ms: u64,
}

fn default_workers() -> usize {
    4
}

fn default_max_parallelism() -> usize {
    30
}

fn default_idle_backoff_min_ms() -> u64 {
    1
}

fn default_idle_backoff_max_ms() -> u64 {
    100
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_parallelism: default_max_parallelism(),
            idle_backoff_min_ms: default_idle_backoff_min_ms(),
            idle_backoff_max_ms: default_idle_backoff_max_ms(),
        }
    }
}

impl DispatcherSettings {
    pub fn idle_backoff_min(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_min_ms)
    }

    pub fn idle_backoff_max(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_max_ms)
    }
}

/// Periodic message production
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProducerSettings {
    /// Tick interval
    #[serde(default = "default_producer_interval_ms")]
    #[validate(range(min = 1))]
    pub interval_ms: u64,

    /// Batch size is drawn uniformly from `0..max_batch`
    #[serde(default = "default_max_batch")]
    #[validate(range(min = 1, max = 1000000))]
    pub max_batch: usize,

    /// Number of distinct message contents (`n % distinct_messages`)
    #[serde(default = "default_distinct_messages")]
    #[validate(range(min = 1))]
    pub distinct_messages: u64,

    /// Message template; `{n}` is replaced by the content index
    #[serde(default = "default_template")]
    #[validate(contains(pattern = "{n}"))]
    pub template: String,
}

fn default_producer_interval_ms() -> u64 {
    100
}

fn default_max_batch() -> usize {
    1000
}

fn default_distinct_messages() -> u64 {
    13
}

fn default_template() -> String {
    "THIS IS MESSAGE {n}".to_string()
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_producer_interval_ms(),
            max_batch: default_max_batch(),
            distinct_messages: default_distinct_messages(),
            template: default_template(),
        }
    }
}

impl ProducerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Handler wiring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerSettings {
    /// One in N text invocations fails on purpose (0 = never)
    #[serde(default = "default_failure_one_in")]
    pub failure_one_in: u32,

    /// Also register a logging handler for text messages
    #[serde(default)]
    pub extra_log_handler: bool,
}

fn default_failure_one_in() -> u32 {
    1000
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            failure_one_in: default_failure_one_in(),
            extra_log_handler: false,
        }
    }
}

/// Periodic stats reporting
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReporterSettings {
    #[serde(default = "default_reporter_interval_ms")]
    #[validate(range(min = 1))]
    pub interval_ms: u64,

    /// Number of entries to print (0 = all)
    #[serde(default)]
    pub top: usize,
}

fn default_reporter_interval_ms() -> u64 {
    10_000
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_reporter_interval_ms(),
            top: 0,
        }
    }
}

impl ReporterSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
