//! FailureReporter implementations
//!
//! Contains LogReporter, RecordingReporter, and FanoutReporter.

mod fanout;
mod log;
mod recording;

pub use self::fanout::FanoutReporter;
pub use self::log::LogReporter;
pub use self::recording::{RecordedFailure, RecordingReporter};
