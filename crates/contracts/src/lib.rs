//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Message Model
//! - A `Message` is an immutable `Payload` plus a queue-assigned `MessageId`
//! - `Payload::message_type()` drives handler routing
//! - `Payload::canonical()` is the statistics key

mod chaos;
mod config;
mod error;
mod handler;
mod message;
mod report;
mod submit;

pub use chaos::{AlwaysFail, FailEveryNth, FailureInjector, NeverFail};
pub use config::*;
pub use error::*;
pub use handler::{HandlerError, MessageHandler};
pub use message::{Message, MessageId, MessageType, Payload};
pub use report::FailureReporter;
pub use submit::MessageSubmitter;

pub use async_trait::async_trait;
