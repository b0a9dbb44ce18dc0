// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

/// A slot in the slot map.
///
/// An alive slot stores the position of its value in the dense array and the generation of the
/// key that points to it. A free slot stores the next slot of the free list and the generation
/// the next value placed in it will get.
///
/// Free slots have the upper bit of the index set, which tells them apart from alive ones.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SlotEntry {
    /// alive: value_index, free: next_free
    value_index_or_next_free: usize,
    generation: usize,
}

const DEAD_BIT: usize = 1 << (usize::BITS - 1);

// Terminates the free list. Also the max possible value next_free can have due to the dead bit
// being always unset, so no real slot can ever have this index.
pub(crate) const NO_SLOT: usize = DEAD_BIT - 1;

impl SlotEntry {
    pub(crate) fn new_alive(value_index: usize, generation: usize) -> Self {
        Self {
            value_index_or_next_free: value_index,
            generation,
        }
    }

    pub(crate) fn new_free(next_free: usize, generation: usize) -> Self {
        Self {
            value_index_or_next_free: next_free | DEAD_BIT,
            generation,
        }
    }

    /// Frees the slot and moves it to the next generation.
    pub(crate) fn mark_free(&mut self, next_free: usize) {
        debug_assert!(self.is_alive());
        self.value_index_or_next_free = next_free | DEAD_BIT;
        self.generation += 1;
    }

    /// Frees the slot without changing its generation. Such a slot must never be reused.
    pub(crate) fn retire(&mut self) {
        debug_assert!(self.is_alive());
        self.value_index_or_next_free = NO_SLOT | DEAD_BIT;
    }

    pub(crate) fn revive(&mut self, value_index: usize) {
        debug_assert!(!self.is_alive());
        self.value_index_or_next_free = value_index;
    }

    pub(crate) fn is_alive(&self) -> bool {
        // use the dead bit to differentiate between alive and free slots
        self.value_index_or_next_free & DEAD_BIT == 0
    }

    pub(crate) fn value_index(&self) -> usize {
        debug_assert!(self.is_alive());
        self.value_index_or_next_free
    }

    pub(crate) fn set_value_index(&mut self, value_index: usize) {
        debug_assert!(self.is_alive());
        self.value_index_or_next_free = value_index;
    }

    pub(crate) fn generation(&self) -> usize {
        self.generation
    }

    pub(crate) fn next_free(&self) -> usize {
        debug_assert!(!self.is_alive());
        self.value_index_or_next_free & !DEAD_BIT
    }

    pub(crate) fn set_next_free(&mut self, next_free: usize) {
        debug_assert!(!self.is_alive());
        self.value_index_or_next_free = next_free | DEAD_BIT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // alive slot => mark free => dead with the next generation
    #[test]
    fn alive_slot_mark_free_dead_with_the_next_generation() {
        let mut slot = SlotEntry::new_alive(5, 2);

        slot.mark_free(NO_SLOT);

        assert!(!slot.is_alive());
        assert_eq!(slot.generation(), 3);
        assert_eq!(slot.next_free(), NO_SLOT);
    }

    // free slot => revive => alive with the same generation
    #[test]
    fn free_slot_revive_alive_with_the_same_generation() {
        let mut slot = SlotEntry::new_free(7, 4);

        slot.revive(0);

        assert!(slot.is_alive());
        assert_eq!(slot.value_index(), 0);
        assert_eq!(slot.generation(), 4);
    }

    // alive slot => retire => dead with the same generation
    #[test]
    fn alive_slot_retire_dead_with_the_same_generation() {
        let mut slot = SlotEntry::new_alive(1, 9);

        slot.retire();

        assert!(!slot.is_alive());
        assert_eq!(slot.generation(), 9);
    }

    #[test]
    fn index_zero_is_alive() {
        assert!(SlotEntry::new_alive(0, 0).is_alive());
        assert!(!SlotEntry::new_free(0, 0).is_alive());
    }
}
