//! Frontier queue for the breadth-first crawl
//!
//! The frontier is a plain FIFO of paper ids. It performs no deduplication:
//! ids only reach it after winning the record store's single-fetch gate.

use std::collections::VecDeque;

/// FIFO queue of paper ids awaiting expansion
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the queue with `ids`, in the given order
    ///
    /// Anything already queued is discarded.
    pub fn seed<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queue = ids.into_iter().map(Into::into).collect();
    }

    /// Removes and returns the oldest id
    pub fn dequeue(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Appends `id` at the back of the queue
    pub fn enqueue(&mut self, id: impl Into<String>) {
        self.queue.push_back(id.into());
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
