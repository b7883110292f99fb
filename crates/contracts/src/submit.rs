//! MessageSubmitter trait - producer-facing enqueue

use crate::{MessageId, Payload};

/// Anything that accepts new messages for dispatch
///
/// Submission never fails: the queue behind it is unbounded.
pub trait MessageSubmitter: Send + Sync {
    /// Append a payload to the tail of the queue
    fn submit(&self, payload: Payload) -> MessageId;
}
