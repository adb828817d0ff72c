//! Fixed-capacity ring of scrape batches.

/// A circular buffer holding the most recent `capacity` entries.
///
/// Entries are written at a cursor that wraps modulo the capacity, and a
/// saturating count tracks how many slots hold data, so reading the last
/// `n` entries touches exactly `n` slots regardless of capacity.
///
/// # Example
///
/// ```rust
/// use statswatch_collector::HistoryRing;
///
/// let mut ring = HistoryRing::new(3);
/// for batch in 1..=4 {
///     ring.put(batch);
/// }
///
/// let window: Vec<i32> = ring.get(10).into_iter().copied().collect();
/// assert_eq!(window, vec![2, 3, 4]);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryRing<T> {
    slots: Vec<Option<T>>,
    /// Index the next `put` writes to.
    cursor: usize,
    len: usize,
}

impl<T> HistoryRing<T> {
    /// Create a ring with room for `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            cursor: 0,
            len: 0,
        }
    }

    /// Insert the newest entry, evicting the oldest once full.
    pub fn put(&mut self, entry: T) {
        self.slots[self.cursor] = Some(entry);
        self.cursor = (self.cursor + 1) % self.slots.len();
        if self.len < self.slots.len() {
            self.len += 1;
        }
    }

    /// Up to `n` most recent entries, oldest first.
    pub fn get(&self, n: usize) -> Vec<&T> {
        let take = n.min(self.len);
        let capacity = self.slots.len();
        // cursor - take, wrapped; adding capacity first keeps it unsigned
        let start = (self.cursor + capacity - take) % capacity;

        let mut out = Vec::with_capacity(take);
        for i in 0..take {
            if let Some(entry) = &self.slots[(start + i) % capacity] {
                out.push(entry);
            }
        }
        out
    }

    /// The most recently inserted entry.
    pub fn latest(&self) -> Option<&T> {
        self.get(1).pop()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
