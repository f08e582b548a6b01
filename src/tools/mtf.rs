//! Move-To-Front decoding.

/// A 256-entry recency list. Index 0 is the most recently promoted value.
#[derive(Debug, Clone)]
pub struct MoveToFront {
    order: [u8; 256],
}

impl MoveToFront {
    /// Start from the identity permutation [0, 1, ..., 255].
    pub fn new() -> Self {
        let mut order = [0_u8; 256];
        for (i, slot) in order.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self { order }
    }

    /// Move the value at `index` to the front and return it.
    ///
    /// Everything in front of `index` slides back one slot, so the relative order
    /// of the other values never changes.
    #[inline]
    pub fn promote(&mut self, index: usize) -> u8 {
        let value = self.order[index];
        // Shift each entry in front of the index back one, then put the value at the front.
        self.order.copy_within(0..index, 1);
        self.order[0] = value;
        value
    }

    /// The value at the front of the list.
    #[inline]
    pub fn front(&self) -> u8 {
        self.order[0]
    }
}

impl Default for MoveToFront {
    fn default() -> Self {
        Self::new()
    }
}
