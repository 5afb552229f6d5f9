//! Fixed-capacity circular queue.
//!
//! Backs the completion event queue. Storage is a const-generic array so the
//! queue can live in a `static` without an allocator.

/// Circular FIFO with wraparound head index.
pub struct Ring<T, const N: usize> {
    /// Slot storage
    slots: [Option<T>; N],
    /// Index of the oldest element
    head: usize,
    /// Number of occupied slots
    len: usize,
}

impl<T, const N: usize> Ring<T, N> {
    /// Create an empty ring. Const-compatible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; N],
            head: 0,
            len: 0,
        }
    }

    /// Ring capacity
    #[inline(always)]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued elements
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if nothing is queued
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if no more elements fit
    #[inline(always)]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append at the tail. Hands the value back if the ring is full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        let tail = (self.head + self.len) % N;
        self.slots[tail] = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Remove the oldest element
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % N;
        self.len -= 1;
        value
    }
}

impl<T, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
