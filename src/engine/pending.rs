use std::collections::VecDeque;

use crate::model::Transaction;

/// Submitted transactions awaiting execution, strictly first-in first-out.
#[derive(Debug, Default)]
pub struct PendingQueue {
    queue: VecDeque<Transaction>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, tx: Transaction) {
        self.queue.push_back(tx);
    }

    /// Remove the oldest pending transaction, `None` when nothing is pending.
    pub fn dequeue(&mut self) -> Option<Transaction> {
        self.queue.pop_front()
    }

    #[cfg(test)]
    pub fn peek(&self) -> Option<&Transaction> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
