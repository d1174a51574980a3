//! A bounded FIFO queue.
//!
//! [BoundedQueue](struct.BoundedQueue.html) backs both the per-actor mailbox and the system-wide run queue.
//! Its capacity is fixed when it is created; the backing ring buffer grows on demand up to that bound,
//! so a queue with a very large bound costs nothing until it is actually filled.

use std::collections::VecDeque;

/// Initial ring buffer size, before any on-demand growth.
const INITIAL_SLOTS: usize = 16;

/// Bounded circular FIFO.
#[derive(Debug)]
pub(crate) struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue holding at most `capacity` items.
    pub(crate) fn new(capacity: usize) -> Self {
        BoundedQueue {
            items: VecDeque::with_capacity(capacity.min(INITIAL_SLOTS)),
            capacity,
        }
    }

    /// Append `item` at the back.
    ///
    /// Hands the item back if the queue is at capacity.
    pub(crate) fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    /// Remove the oldest item.
    pub(crate) fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every queued item.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_push_order() {
        let mut queue = BoundedQueue::new(4);
        for i in 0..4 {
            assert!(queue.push(i).is_ok());
        }
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        queue.push(4).unwrap();
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(4));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn refuses_push_at_capacity() {
        let mut queue = BoundedQueue::new(2);
        queue.push('a').unwrap();
        queue.push('b').unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.push('c'), Err('c'));
        assert_eq!(queue.len(), 2);

        queue.pop();
        assert!(!queue.is_full());
        assert!(queue.push('c').is_ok());
    }

    #[test]
    fn large_bound_does_not_preallocate() {
        let queue: BoundedQueue<u64> = BoundedQueue::new(1 << 20);
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 1 << 20);
        assert!(queue.items.capacity() < 1 << 20);
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = BoundedQueue::new(8);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}
