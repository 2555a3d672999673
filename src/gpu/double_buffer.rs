//! Paired front/back slots that are always created and released together.

/// Two slots addressed by index.
///
/// `front` is the slot most recently written, `back` the one it was read
/// from. Swapping only flips the index, so neither slot can be released
/// without the other.
#[derive(Debug)]
pub struct DoubleBuffer<T> {
    slots: [T; 2],
    front: usize,
}

impl<T> DoubleBuffer<T> {
    /// Pair `front` and `back`.
    pub fn new(front: T, back: T) -> Self {
        Self {
            slots: [front, back],
            front: 0,
        }
    }

    /// Slot holding the latest result.
    pub fn front(&self) -> &T {
        &self.slots[self.front]
    }

    /// The other slot.
    pub fn back(&self) -> &T {
        &self.slots[self.front ^ 1]
    }

    /// Exchange the roles of the two slots.
    pub fn swap(&mut self) {
        self.front ^= 1;
    }

    /// Both slots as `(front, back)`.
    pub fn pair(&self) -> (&T, &T) {
        (self.front(), self.back())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_front_and_back() {
        let mut buffers = DoubleBuffer::new("a", "b");
        assert_eq!(buffers.pair(), (&"a", &"b"));
        buffers.swap();
        assert_eq!(buffers.pair(), (&"b", &"a"));
        buffers.swap();
        assert_eq!(*buffers.front(), "a");
    }

    #[test]
    fn odd_swap_count_leaves_back_in_front() {
        let mut buffers = DoubleBuffer::new(0, 1);
        for _ in 0..5 {
            buffers.swap();
        }
        assert_eq!(*buffers.front(), 1);
        assert_eq!(*buffers.back(), 0);
    }
}
