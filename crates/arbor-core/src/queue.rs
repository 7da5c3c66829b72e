//! The inbound mailbox between command callers and the tick thread.
//!
//! Producers append under a short lock and return. The single consumer
//! takes the whole pending batch at once, so anything enqueued while a
//! batch is being applied waits for the next drain.

use parking_lot::Mutex;

/// Thread-safe FIFO mailbox drained in whole batches.
#[derive(Debug)]
pub struct EventQueue<T> {
    pending: Mutex<Vec<T>>,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Append an event. Never waits for the consumer.
    pub fn enqueue(&self, event: T) {
        self.pending.lock().push(event);
    }

    /// Take every pending event, in enqueue order, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<T> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
