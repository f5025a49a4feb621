//! In-memory deadline queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// An entry waiting for its fire time.
#[derive(Debug)]
pub struct PendingEvent<T> {
    /// Monotonic time at or after which the event may fire.
    pub fire_at: Instant,
    /// Insertion sequence, breaks ties between equal fire times.
    pub seq: u64,
    /// Opaque payload (a callback for the schedulers).
    pub payload: T,
}

impl<T> PartialEq for PendingEvent<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<T> Eq for PendingEvent<T> {}

impl<T> PartialOrd for PendingEvent<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for PendingEvent<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for the max-heap: earliest deadline first, then lowest seq.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-ordered queue of [`PendingEvent`]s keyed by fire time.
/// O(log n) push and pop.
pub struct DeadlineQueue<T> {
    events: BinaryHeap<PendingEvent<T>>,
    next_seq: u64,
}

impl<T> DeadlineQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Insert an event and return its sequence number.
    pub fn push(&mut self, fire_at: Instant, payload: T) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(PendingEvent {
            fire_at,
            seq,
            payload,
        });
        seq
    }

    /// Fire time of the earliest event.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.events.peek().map(|e| e.fire_at)
    }

    /// Pop the head if its fire time is at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<PendingEvent<T>> {
        if self.events.peek().is_some_and(|e| e.fire_at <= now) {
            self.events.pop()
        } else {
            None
        }
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<T> Default for DeadlineQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
