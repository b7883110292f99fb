//! # Producer
//!
//! Periodic message producer.
//!
//! Responsibilities:
//! - Generate message batches (random or deterministic)
//! - Submit them on a fixed interval through `MessageSubmitter`
//! - Provide random failure injection for handlers
//!
//! ## Usage Example
//!
//! ```ignore
//! use producer::{Producer, ProducerConfig, TemplateGenerator};
//!
//! let generator = TemplateGenerator::from_settings(&settings);
//! let handle = Producer::new(ProducerConfig::from(&settings), generator, queue).start();
//! // ...
//! handle.stop().await?;
//! ```

mod chaos;
mod config;
mod error;
mod generator;
mod producer;

// Re-exports
pub use chaos::RandomFailureInjector;
pub use config::{ProducerConfig, ProducerMetrics, ProducerMetricsSnapshot};
pub use error::{ProducerError, Result};
pub use generator::{MessageGenerator, SequenceGenerator, TemplateGenerator};
pub use producer::{Producer, ProducerHandle};
