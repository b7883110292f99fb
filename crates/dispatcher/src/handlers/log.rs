//! LogHandler - logs each message it receives

use contracts::{async_trait, HandlerError, Message, MessageHandler};
use tracing::{debug, info, Level};

/// Handler that writes every message to the log and always succeeds
#[derive(Debug, Clone)]
pub struct LogHandler {
    name: String,
    level: Level,
}

impl LogHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::DEBUG,
        }
    }

    /// Log at info instead of debug
    pub fn verbose(mut self) -> Self {
        self.level = Level::INFO;
        self
    }
}

impl Default for LogHandler {
    fn default() -> Self {
        Self::new("log")
    }
}

#[async_trait]
impl MessageHandler for LogHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        if self.level == Level::INFO {
            info!(
                handler = %self.name,
                message_id = %message.id,
                message_type = %message.message_type(),
                "Got message: {}",
                message.payload.canonical()
            );
        } else {
            debug!(
                handler = %self.name,
                message_id = %message.id,
                message_type = %message.message_type(),
                "Got message: {}",
                message.payload.canonical()
            );
        }
        Ok(())
    }
}
