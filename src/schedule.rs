//! Deferred Work
//!
//! A timer queue keyed by due time. Entries cannot be cancelled; the driver
//! pops whatever is due each time it looks at the clock.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use jiff::Timestamp;

#[derive(Debug)]
struct Scheduled<E> {
    due: Timestamp,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Fire-and-forget timers ordered by due time, then by scheduling order.
#[derive(Debug)]
pub struct TimerQueue<E> {
    entries: BinaryHeap<Reverse<Scheduled<E>>>,
    next_seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            entries: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<E> TimerQueue<E> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` to fire at `due`.
    pub fn schedule(&mut self, due: Timestamp, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.entries.push(Reverse(Scheduled { due, seq, event }));
    }

    /// Removes and returns every event due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: Timestamp) -> Vec<E> {
        let mut due = Vec::new();

        while self
            .entries
            .peek()
            .is_some_and(|Reverse(entry)| entry.due <= now)
        {
            if let Some(Reverse(entry)) = self.entries.pop() {
                due.push(entry.event);
            }
        }

        due
    }

    /// When the next event becomes due.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.entries.peek().map(|Reverse(entry)| entry.due)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
