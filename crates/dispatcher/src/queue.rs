//! MessageQueue - unbounded in-memory FIFO shared by producers and workers

use std::sync::atomic::{AtomicU64, Ordering};

use async_channel::{unbounded, Receiver, Sender, TryRecvError};
use contracts::{Message, MessageId, MessageSubmitter, Payload};
use tracing::{error, trace};

/// Thread-safe FIFO of pending messages
///
/// No capacity limit is enforced, so `submit` never fails or waits.
/// Order is preserved per producer; concurrent producers interleave.
#[derive(Debug)]
pub struct MessageQueue {
    tx: Sender<Message>,
    /// Kept alive so the channel can never close under the producers
    rx: Receiver<Message>,
    next_id: AtomicU64,
}

impl MessageQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a payload to the tail and return its assigned id
    pub fn submit(&self, payload: impl Into<Payload>) -> MessageId {
        let id = MessageId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let message = Message::new(id, payload);
        let message_type = message.message_type();

        if let Err(e) = self.tx.try_send(message) {
            // Unreachable while `self.rx` is alive.
            error!(message_id = %id, error = %e, "Queue rejected message");
            return id;
        }

        observability::record_message_submitted(message_type);
        trace!(message_id = %id, "Message enqueued");
        id
    }

    /// Remove and return the head message, or `None` when empty
    pub fn try_dequeue(&self) -> Option<Message> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Total messages ever submitted
    pub fn submitted_count(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSubmitter for MessageQueue {
    fn submit(&self, payload: Payload) -> MessageId {
        MessageQueue::submit(self, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_queue() {
        let queue = MessageQueue::new();
        assert!(queue.is_empty());
        assert!(queue.try_dequeue().is_none());
        assert_eq!(queue.submitted_count(), 0);
    }

    #[test]
    fn test_fifo_single_producer() {
        let queue = MessageQueue::new();
        let ids: Vec<MessageId> = ["m1", "m2", "m3"].iter().map(|m| queue.submit(*m)).collect();
        assert_eq!(queue.len(), 3);

        let dequeued: Vec<Message> = std::iter::from_fn(|| queue.try_dequeue()).collect();
        assert_eq!(
            dequeued.iter().map(|m| m.id).collect::<Vec<_>>(),
            ids,
            "ids must come back in submission order"
        );
        assert_eq!(dequeued[0].payload, Payload::from("m1"));
        assert_eq!(dequeued[2].payload, Payload::from("m3"));
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let queue = Arc::new(MessageQueue::new());
        let producers: Vec<_> = (0..8)
            .map(|p| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        queue.submit(format!("p{p}-{i}"));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(queue.len(), 4000);
        assert_eq!(queue.submitted_count(), 4000);

        // Each producer's own messages keep their relative order.
        let mut last_seen = [None::<usize>; 8];
        while let Some(message) = queue.try_dequeue() {
            let Payload::Text(text) = message.payload else {
                panic!("expected text payload");
            };
            let (p, i) = text[1..].split_once('-').unwrap();
            let (p, i): (usize, usize) = (p.parse().unwrap(), i.parse().unwrap());
            if let Some(prev) = last_seen[p] {
                assert!(i > prev, "producer {p} reordered: {i} after {prev}");
            }
            last_seen[p] = Some(i);
        }
    }

    #[test]
    fn test_submit_through_trait_object() {
        let queue = Arc::new(MessageQueue::new());
        let submitter: Arc<dyn MessageSubmitter> = queue.clone();
        let id = submitter.submit(Payload::from("via trait"));
        assert_eq!(queue.try_dequeue().map(|m| m.id), Some(id));
    }
}
