//! Circular slot storage shared by every queue flavour in this crate.
//!
//! [`Ring`] owns `capacity + 1` slots and two indices. One slot is always left
//! unused so that "empty" (`push_index == pop_index`) and "full"
//! (`next(push_index) == pop_index`) are distinguishable without a separate
//! element counter.
//!
//! The ring does no locking of its own. Callers must hold whatever exclusive
//! access the enclosing queue provides (`&mut Ring` is the proof).

use std::mem::MaybeUninit;

/// Fixed-size FIFO ring buffer with one sentinel slot.
///
/// Slots in the half-open range `[pop_index, push_index)` (modulo the slot count)
/// are initialized; every other slot is logically uninitialized.
pub(crate) struct Ring<T> {
    slots: Box<[MaybeUninit<T>]>,
    push_index: usize,
    pop_index: usize,
}

impl<T> Ring<T> {
    /// Allocates storage for `capacity` elements (`capacity + 1` slots).
    ///
    /// `capacity` must be at least one; queue constructors validate this before
    /// reaching here.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring capacity must be non-zero");
        Self {
            slots: Box::new_uninit_slice(capacity + 1),
            push_index: 0,
            pop_index: 0,
        }
    }

    /// Advances an index to the next slot, wrapping to 0 past the sentinel.
    ///
    /// Equivalent to `(idx + 1) % slots` without the division.
    #[inline]
    fn next(&self, idx: usize) -> usize {
        let next = idx + 1;
        if next == self.slots.len() { 0 } else { next }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.push_index == self.pop_index
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.next(self.push_index) == self.pop_index
    }

    /// Number of live elements.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        if self.push_index >= self.pop_index {
            self.push_index - self.pop_index
        } else {
            self.slots.len() - self.pop_index + self.push_index
        }
    }

    /// Appends `value` at the back.
    ///
    /// # Errors
    ///
    /// Returns `Err(value)` if every usable slot is occupied.
    #[inline]
    pub(crate) fn push_back(&mut self, value: T) -> Result<(), T> {
        let hdx = self.push_index;
        let nxt = self.next(hdx);
        if nxt == self.pop_index {
            return Err(value);
        }

        // The slot is outside the live range, so nothing is overwritten.
        self.slots[hdx].write(value);

        // Publish only once the value is in place.
        self.push_index = nxt;
        Ok(())
    }

    /// Removes the front element, or returns `None` if the ring is empty.
    #[inline]
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        let pdx = self.pop_index;
        if pdx == self.push_index {
            return None;
        }

        // Release the slot before the value leaves it.
        self.pop_index = self.next(pdx);

        // SAFETY: `pdx` was inside the live range `[pop_index, push_index)`, so the
        // slot holds a value written by `push_back`. Advancing `pop_index` above
        // moved the slot out of the live range, so this read is the only one and
        // the slot will be overwritten, never dropped, from here on.
        Some(unsafe { self.slots[pdx].assume_init_read() })
    }

    /// Removes every element in FIFO order.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        while let Some(value) = self.pop_front() {
            out.push(value);
        }
        out
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        while self.pop_front().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_one_sentinel_slot() {
        let ring = Ring::<u32>::with_capacity(4);
        assert_eq!(ring.slots.len(), 5);
        assert!(ring.is_empty());
        assert!(!ring.is_full());
    }

    #[test]
    fn test_fill_then_full() {
        let mut ring = Ring::with_capacity(3);
        for i in 0..3 {
            assert!(ring.push_back(i).is_ok());
        }
        assert!(ring.is_full());
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.push_back(99), Err(99));
    }

    #[test]
    fn test_capacity_one() {
        let mut ring = Ring::with_capacity(1);
        assert!(ring.push_back('a').is_ok());
        assert!(ring.is_full());
        assert_eq!(ring.push_back('b'), Err('b'));
        assert_eq!(ring.pop_front(), Some('a'));
        assert!(ring.is_empty());
        assert_eq!(ring.pop_front(), None);
    }

    #[test]
    fn test_wrapping_len() {
        let mut ring = Ring::with_capacity(4);
        for round in 0..7u64 {
            for i in 0..3 {
                ring.push_back(round * 10 + i).unwrap();
            }
            assert_eq!(ring.len(), 3);
            for i in 0..3 {
                assert_eq!(ring.pop_front(), Some(round * 10 + i));
            }
            assert_eq!(ring.len(), 0);
        }
    }

    #[test]
    fn test_len_across_wrap_point() {
        let mut ring = Ring::with_capacity(4);
        for i in 0..4 {
            ring.push_back(i).unwrap();
        }
        for _ in 0..4 {
            ring.pop_front().unwrap();
        }
        ring.push_back(10).unwrap();
        ring.push_back(11).unwrap();
        assert!(ring.push_index < ring.pop_index);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.pop_front(), Some(10));
        assert_eq!(ring.pop_front(), Some(11));
    }

    #[test]
    fn test_drain_in_order() {
        let mut ring = Ring::with_capacity(4);
        ring.push_back(1).unwrap();
        ring.push_back(2).unwrap();
        assert_eq!(ring.pop_front(), Some(1));
        ring.push_back(3).unwrap();
        ring.push_back(4).unwrap();
        ring.push_back(5).unwrap();
        assert_eq!(ring.drain(), vec![2, 3, 4, 5]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_drop_releases_live_values() {
        let tracker = Rc::new(());
        {
            let mut ring = Ring::with_capacity(3);
            ring.push_back(Rc::clone(&tracker)).unwrap();
            ring.push_back(Rc::clone(&tracker)).unwrap();
            drop(ring.pop_front());
            ring.push_back(Rc::clone(&tracker)).unwrap();
            assert_eq!(Rc::strong_count(&tracker), 3);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}
