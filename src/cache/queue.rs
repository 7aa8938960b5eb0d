//! Ring Queue Module
//!
//! Growable circular FIFO used to schedule lazy expiry checks.

use std::fmt;

// == Schedule Token ==
/// Records that a field should eventually be checked for expiry.
///
/// The token carries no expiry time; the sweep worker re-reads the entry from
/// the store when it processes the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleToken {
    pub field: String,
}

impl ScheduleToken {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl fmt::Display for ScheduleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field)
    }
}

// == Ring Queue ==
/// FIFO queue over a circular buffer that grows when full.
///
/// Growth adds `increment` slots (the initial capacity) and compacts the live
/// elements to the front of the new buffer, preserving order. There is no
/// upper bound on growth.
#[derive(Debug)]
pub struct RingQueue<T> {
    slots: Vec<Option<T>>,
    increment: usize,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> RingQueue<T> {
    // == Constructor ==
    /// Creates a queue with `capacity` slots. A zero capacity is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let increment = capacity.max(1);
        let mut slots = Vec::with_capacity(increment);
        slots.resize_with(increment, || None);
        Self {
            slots,
            increment,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    // == Push ==
    /// Appends `item` at the tail, growing the buffer first if it is full.
    pub fn push(&mut self, item: T) {
        if self.head == self.tail && self.count > 0 {
            self.grow();
        }
        self.slots[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
    }

    // == Pop ==
    /// Removes and returns the oldest item, or `None` when the queue is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        item
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Only called when full, so `head..` followed by `..head` is the whole queue in order.
    fn grow(&mut self) {
        let old_len = self.slots.len();
        self.slots.rotate_left(self.head);
        self.slots.resize_with(old_len + self.increment, || None);
        self.head = 0;
        self.tail = old_len;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_new_is_empty() {
        let mut queue: RingQueue<ScheduleToken> = RingQueue::new(4);
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 4);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_queue_fifo_order() {
        let mut queue = RingQueue::new(4);
        queue.push("a");
        queue.push("b");
        queue.push("c");

        assert_eq!(queue.pop(), Some("a"));
        assert_eq!(queue.pop(), Some("b"));
        assert_eq!(queue.pop(), Some("c"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_queue_grows_by_increment() {
        let mut queue = RingQueue::new(3);
        for token in ["a", "b", "c"] {
            queue.push(token);
        }
        assert_eq!(queue.capacity(), 3);

        queue.push("d");
        assert_eq!(queue.capacity(), 6);
        assert_eq!(queue.len(), 4);

        queue.push("e");
        queue.push("f");
        queue.push("g");
        assert_eq!(queue.capacity(), 9);
    }

    #[test]
    fn test_queue_grow_after_wraparound_preserves_order() {
        let mut queue = RingQueue::new(3);
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));

        // tail wraps to the front, then the buffer fills with head in the middle
        queue.push(4);
        queue.push(5);
        assert_eq!(queue.capacity(), 3);

        queue.push(6);
        assert_eq!(queue.capacity(), 6);

        let drained: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![3, 4, 5, 6]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_alphabet_round_trip() {
        let mut queue = RingQueue::new(5);
        let tokens: Vec<ScheduleToken> = ('a'..='z')
            .map(|c| ScheduleToken::new(c.to_string()))
            .collect();

        for token in &tokens {
            queue.push(token.clone());
        }
        assert!(queue.capacity() >= 26);

        let popped: Vec<ScheduleToken> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(popped, tokens);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_queue_zero_capacity_is_usable() {
        let mut queue = RingQueue::new(0);
        assert_eq!(queue.capacity(), 1);

        queue.push("a");
        queue.push("b");
        assert_eq!(queue.capacity(), 2);
        assert_eq!(queue.pop(), Some("a"));
        assert_eq!(queue.pop(), Some("b"));
    }

    #[test]
    fn test_schedule_token_display() {
        assert_eq!(ScheduleToken::new("order1").to_string(), "order1");
    }
}
