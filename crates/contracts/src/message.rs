//! Message - Producer output / Dispatcher input
//!
//! Immutable unit of work flowing through the queue.

use std::fmt;
use std::fmt::Write as _;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Queue-assigned message identity
///
/// Monotonically increasing per queue, used to correlate failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime type of a message, used for handler routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Json,
    Binary,
}

impl MessageType {
    pub const ALL: [MessageType; 3] = [MessageType::Text, MessageType::Json, MessageType::Binary];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Json => "json",
            MessageType::Binary => "binary",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Payload {
    /// Plain text (the common case)
    Text(String),

    /// Structured JSON document
    Json(serde_json::Value),

    /// Opaque bytes
    Binary(Bytes),
}

impl Payload {
    /// Routing type of this payload
    pub fn message_type(&self) -> MessageType {
        match self {
            Payload::Text(_) => MessageType::Text,
            Payload::Json(_) => MessageType::Json,
            Payload::Binary(_) => MessageType::Binary,
        }
    }

    /// Canonical content used as the statistics key
    ///
    /// Text is returned as-is, JSON in compact form, binary as lowercase hex.
    pub fn canonical(&self) -> String {
        match self {
            Payload::Text(s) => s.clone(),
            Payload::Json(v) => v.to_string(),
            Payload::Binary(b) => {
                let mut out = String::with_capacity(b.len() * 2);
                for byte in b.iter() {
                    let _ = write!(out, "{byte:02x}");
                }
                out
            }
        }
    }

    /// Payload size in bytes (approximate for JSON)
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(s) => s.len(),
            Payload::Json(v) => v.to_string().len(),
            Payload::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Json(v)
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Binary(b)
    }
}

/// A submitted message
///
/// Owned by the queue until dequeued, then by exactly one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub payload: Payload,
}

impl Message {
    pub fn new(id: MessageId, payload: impl Into<Payload>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    #[inline]
    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }
}
