//! Fixed-capacity ring buffer.
//!
//! Slots are allocated once up front; `push` writes at the cursor and the
//! cursor wraps modulo capacity. The stored count saturates at capacity, after
//! which every push overwrites the oldest entry.

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    write_idx: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            write_idx: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        let capacity = self.capacity();
        self.slots[self.write_idx] = Some(value);
        self.write_idx = (self.write_idx + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// The newest `min(limit, len)` entries, oldest first.
    /// A `limit` of zero means every stored entry.
    pub fn latest(&self, limit: usize) -> impl Iterator<Item = &T> + '_ {
        let take = if limit == 0 || limit > self.len {
            self.len
        } else {
            limit
        };
        let capacity = self.capacity();
        // write_idx is one past the newest entry, whether or not we have wrapped.
        let start = (self.write_idx + capacity - take) % capacity;
        (0..take).filter_map(move |offset| self.slots[(start + offset) % capacity].as_ref())
    }

    /// Every stored entry, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.latest(0)
    }
}
