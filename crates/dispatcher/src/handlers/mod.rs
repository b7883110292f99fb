//! Built-in message handlers

mod flaky;
mod log;

pub use self::flaky::FlakyHandler;
pub use self::log::LogHandler;
