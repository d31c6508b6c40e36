//! Delayed tasks for the render loop.
//!
//! Instead of relying on an external timer service, deferred work (the
//! celebration trigger, staggered sparkle spawns) is kept in a time-ordered
//! queue that the render loop drains with its own clock sample each tick.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use cgmath::Point3;
use web_time::Instant;

/// Work the render loop performs when a deadline passes.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Show the celebration and queue its sparkle volley.
    Celebration,
    /// Spawn one sparkle burst at a world position.
    SparkleBurst { position: Point3<f32> },
}

struct Entry {
    due: Instant,
    /// Tie-breaker preserving FIFO order for identical deadlines.
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

/// A min-heap of delayed tasks keyed by due time.
pub struct TaskQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedules `task` to run `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.heap.push(Reverse(Entry {
            due: now + delay,
            seq,
            task,
        }));
    }

    /// Removes and returns every task whose deadline has passed, in order.
    pub fn drain_due(&mut self, now: Instant) -> Vec<Task> {
        let mut due = Vec::new();

        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.due > now {
                break;
            }
            let Reverse(entry) = self.heap.pop().unwrap();
            due.push(entry.task);
        }

        due
    }

    /// Number of tasks still waiting.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
