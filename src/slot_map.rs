// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Bound, Index, IndexMut, RangeBounds};

use crate::error::{Error, Result};
use crate::slot_entry::{SlotEntry, NO_SLOT};
use crate::slot_key::{Key, KeyPart, SlotKey};
use crate::storage::{Storage, StorageCapacity};
use crate::tracing_helpers::{debug_log, trace_log, warn_log};

/// A container that stores values densely and hands out stable keys to access them.
///
/// Usage-wise it works similarly to an array, with exceptions that keys stay stable even after
/// removals, and removals change the order of the remaining values (the last value is moved
/// into the hole). Iterating over the values is iterating over a plain slice.
///
/// A key is an index into an array of slots plus a generation. The slot knows where its value
/// currently is; erasing the value frees the slot and bumps its generation, so the old key never
/// matches again. Freed slots are reused in the order they were freed.
///
/// Insertions are O(1) amortized.
/// Removals are O(1).
/// Accessing elements is O(1).
///
/// `K` is the key type (see [`SlotKey`]) and `C` the storage for the values (see [`Storage`]).
/// Extra memory consumption is one slot (2 * sizeof(usize)) plus one usize per value.
pub struct SlotMap<T, K = Key, C = Vec<T>> {
    // slot index => position of the value, or the next free slot
    slots: Vec<SlotEntry>,
    values: C,
    // position of the value => slot index
    reverse_map: Vec<usize>,
    // the free list, oldest freed slot first
    free_head: usize,
    free_tail: usize,
    _marker: PhantomData<(K, T)>,
}

impl<T, K, C> SlotMap<T, K, C>
where
    K: SlotKey,
    C: Storage<T>,
{
    /// Does not heap-allocate when created.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            values: C::new(),
            reverse_map: Vec::new(),
            free_head: NO_SLOT,
            free_tail: NO_SLOT,
            _marker: PhantomData,
        }
    }

    /// Creates a new SlotMap with allocated memory for the given number of values.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut values = C::new();
        values.reserve(capacity);
        Self {
            slots: Vec::with_capacity(capacity),
            values,
            reverse_map: Vec::with_capacity(capacity),
            free_head: NO_SLOT,
            free_tail: NO_SLOT,
            _marker: PhantomData,
        }
    }

    /// Inserts a new value and returns a key that can be used to access it.
    ///
    /// Reuses the slot that has been free for the longest time, if any.
    ///
    /// Panics if the key type can't index any more slots.
    ///
    /// O(1) amortized time complexity.
    pub fn insert(&mut self, value: T) -> K {
        self.insert_with(|_| value)
    }

    /// Inserts the value produced by `make_value`, which gets the key of the value being
    /// inserted (so the value can store its own key).
    ///
    /// If `make_value` panics, the map is left unchanged.
    pub fn insert_with<F: FnOnce(K) -> T>(&mut self, make_value: F) -> K {
        let reused = self.free_head != NO_SLOT;
        let slot_index = if reused {
            self.free_head
        } else {
            let slot_index = self.slots.len();
            assert!(
                slot_index < Self::max_slots(),
                "the key type can't index more than {} slots",
                Self::max_slots()
            );
            slot_index
        };
        let generation = if reused {
            self.slots[slot_index].generation()
        } else {
            0
        };
        let key = Self::make_key(slot_index, generation);

        let value = make_value(key);
        let value_index = self.values.len();
        // the only step that can fail (a full fixed-capacity storage), so it goes first
        self.values.push(value);
        self.reverse_map.push(slot_index);

        if reused {
            self.free_head = self.slots[slot_index].next_free();
            if self.free_head == NO_SLOT {
                self.free_tail = NO_SLOT;
            }
            self.slots[slot_index].revive(value_index);
        } else {
            self.slots.push(SlotEntry::new_alive(value_index, 0));
            trace_log!(slots = self.slots.len(), "slot map grew the slot array");
        }

        key
    }

    /// Removes the value by key, moving the last value into its place.
    /// Returns the number of removed values: 1, or 0 if the key doesn't point to a live value.
    ///
    /// O(1) time complexity, however changes the order of values.
    pub fn erase(&mut self, key: K) -> usize {
        usize::from(self.remove(key).is_some())
    }

    /// Removes the value by key and returns it, if the key points to a live value.
    pub fn remove(&mut self, key: K) -> Option<T> {
        let position = self.find(key)?;
        self.take_at(position)
    }

    /// Removes the value at the given position in [`as_slice`](Self::as_slice), moving the last
    /// value into its place. Returns the position to continue iterating from, which is the same
    /// position.
    ///
    /// Panics if the position is out of bounds.
    pub fn erase_at(&mut self, position: usize) -> usize {
        assert!(
            position < self.len(),
            "position {position} is out of bounds for a slot map of {} values",
            self.len()
        );
        self.take_at(position);
        position
    }

    /// Removes the values at the given range of positions in [`as_slice`](Self::as_slice).
    /// Returns the position following the removed ones, which is the start of the range.
    ///
    /// Panics if the range is out of bounds.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&start) => Some(start),
            Bound::Excluded(&start) => start.checked_add(1),
            Bound::Unbounded => Some(0),
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end.checked_add(1),
            Bound::Excluded(&end) => Some(end),
            Bound::Unbounded => Some(len),
        };
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) if start <= end && end <= len => (start, end),
            _ => panic!(
                "range {:?}..{:?} is out of bounds for a slot map of {len} values",
                range.start_bound(),
                range.end_bound()
            ),
        };

        // from the back, so the values moved into the holes always come from past the range
        for position in (start..end).rev() {
            self.take_at(position);
        }
        start
    }

    /// Keeps only the values for which `keep` returns true.
    ///
    /// The order of the kept values can change.
    pub fn retain<F: FnMut(K, &mut T) -> bool>(&mut self, mut keep: F) {
        let mut position = 0;
        while position < self.len() {
            let key = self.key_of_slot(self.reverse_map[position]);
            if keep(key, &mut self.values.as_mut_slice()[position]) {
                position += 1;
            } else {
                // the last value moves in here and gets checked next
                self.take_at(position);
            }
        }
    }

    /// Returns the position of the value in [`as_slice`](Self::as_slice), if the key points to
    /// a live value.
    ///
    /// O(1) time complexity.
    pub fn find(&self, key: K) -> Option<usize> {
        let slot = self.slots.get(key.index().to_usize())?;
        if slot.is_alive() && slot.generation() == key.generation().to_usize() {
            Some(slot.value_index())
        } else {
            None
        }
    }

    /// Same as [`find`](Self::find), for a key that is known to point to a live value.
    ///
    /// Passing an invalid key is a logic error: the result is unspecified and may panic.
    pub fn find_unchecked(&self, key: K) -> usize {
        debug_assert!(self.find(key).is_some(), "the key doesn't point to a live value");
        self.slots[key.index().to_usize()].value_index()
    }

    /// Returns a reference to the value stored at the given key.
    /// If the key is not valid, returns None.
    ///
    /// O(1) time complexity.
    pub fn get(&self, key: K) -> Option<&T> {
        let position = self.find(key)?;
        self.values.as_slice().get(position)
    }

    /// Returns a mutable reference to the value stored at the given key.
    /// If the key is not valid, returns None.
    ///
    /// O(1) time complexity.
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        let position = self.find(key)?;
        self.values.as_mut_slice().get_mut(position)
    }

    /// Returns true if the key points to a live value.
    pub fn contains(&self, key: K) -> bool {
        self.find(key).is_some()
    }

    /// Same as [`get`](Self::get), reporting an invalid key as [`Error::OutOfRange`].
    pub fn at(&self, key: K) -> Result<&T> {
        self.get(key).ok_or_else(|| Self::out_of_range(key))
    }

    pub fn at_mut(&mut self, key: K) -> Result<&mut T> {
        self.get_mut(key).ok_or_else(|| Self::out_of_range(key))
    }

    /// Returns the key of the value at the given position in [`as_slice`](Self::as_slice).
    pub fn key_at(&self, position: usize) -> Option<K> {
        let slot_index = *self.reverse_map.get(position)?;
        Some(self.key_of_slot(slot_index))
    }

    /// Grows the slot array to at least `slot_count` slots. The new slots go to the free list.
    ///
    /// Panics if the key type can't index that many slots.
    pub fn reserve_slots(&mut self, slot_count: usize) {
        let old_count = self.slots.len();
        if slot_count <= old_count {
            return;
        }
        assert!(
            slot_count <= Self::max_slots(),
            "the key type can't index more than {} slots",
            Self::max_slots()
        );

        self.slots.reserve_exact(slot_count - old_count);
        for slot_index in old_count..slot_count {
            self.slots.push(SlotEntry::new_free(NO_SLOT, 0));
            self.push_free(slot_index);
        }
        debug_log!(old_count, slot_count, "slot map reserved slots");
    }

    /// The number of slots, both used and free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Makes room for at least `additional` more values, both in the value storage (if it can
    /// grow) and in the slot array.
    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
        self.reverse_map.reserve(additional);
        let wanted_slots = self.len().saturating_add(additional);
        self.reserve_slots(wanted_slots.min(Self::max_slots()));
    }

    /// Moves the values for which `predicate` returns true in front of the others, and returns
    /// the number of such values. Keys stay valid.
    pub fn partition<F: FnMut(&T) -> bool>(&mut self, mut predicate: F) -> usize {
        let mut first = 0;
        let mut last = self.len();
        loop {
            while first < last && predicate(&self.values.as_slice()[first]) {
                first += 1;
            }
            while first < last && !predicate(&self.values.as_slice()[last - 1]) {
                last -= 1;
            }
            if first == last {
                return first;
            }
            last -= 1;
            self.swap_positions(first, last);
            first += 1;
        }
    }

    /// Removes all values. Every key handed out so far becomes invalid for good.
    pub fn clear(&mut self) {
        let len = self.len();
        for position in 0..len {
            self.free_slot(self.reverse_map[position]);
        }
        self.values.clear();
        self.reverse_map.clear();
        debug_log!(len, "slot map cleared");
    }

    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Returns the number of values.
    ///
    /// O(1) time complexity.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values in their storage order.
    pub fn as_slice(&self) -> &[T] {
        self.values.as_slice()
    }

    /// Takes the value storage out of the map, dropping the keys.
    pub fn into_storage(self) -> C {
        self.values
    }

    /// Returns an iterator over the values in their storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.as_slice().iter()
    }

    /// Returns an iterator over the mutable values in their storage order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.values.as_mut_slice().iter_mut()
    }

    /// Returns an iterator over the keys, in the storage order of their values.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = K> + ExactSizeIterator + '_ {
        self.reverse_map
            .iter()
            .map(move |&slot_index| self.key_of_slot(slot_index))
    }

    /// Returns an iterator over the key-value pairs.
    ///
    /// Note that if you intend to iterate over key-values in time-critical code, it may be better
    /// to instead store the keys in the values themselves (see [`insert_with`](Self::insert_with))
    /// to reduce CPU cache misses.
    pub fn iter_with_keys(&self) -> impl DoubleEndedIterator<Item = (K, &T)> + '_ {
        self.keys().zip(self.values.as_slice().iter())
    }

    fn max_slots() -> usize {
        K::Index::MAX.saturating_add(1).min(NO_SLOT)
    }

    fn make_key(slot_index: usize, generation: usize) -> K {
        K::from_parts(
            K::Index::from_usize(slot_index),
            K::Generation::from_usize(generation),
        )
    }

    fn key_of_slot(&self, slot_index: usize) -> K {
        Self::make_key(slot_index, self.slots[slot_index].generation())
    }

    fn out_of_range(key: K) -> Error {
        Error::OutOfRange {
            index: key.index().to_usize(),
            generation: key.generation().to_usize(),
        }
    }

    fn take_at(&mut self, position: usize) -> Option<T> {
        let last = self.len().checked_sub(1)?;
        let slot_index = self.reverse_map[position];

        if position != last {
            self.swap_positions(position, last);
        }
        self.reverse_map.pop();
        let value = self.values.pop();

        self.free_slot(slot_index);
        value
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        self.values.as_mut_slice().swap(a, b);
        self.reverse_map.swap(a, b);
        self.slots[self.reverse_map[a]].set_value_index(a);
        self.slots[self.reverse_map[b]].set_value_index(b);
    }

    fn free_slot(&mut self, slot_index: usize) {
        let slot = &mut self.slots[slot_index];
        // as long as we have available generations, we can reuse the slot
        if slot.generation() >= K::Generation::MAX {
            slot.retire();
            warn_log!(slot_index, "slot generation exhausted, the slot is retired");
            return;
        }

        slot.mark_free(NO_SLOT);
        self.push_free(slot_index);
    }

    fn push_free(&mut self, slot_index: usize) {
        if self.free_tail == NO_SLOT {
            self.free_head = slot_index;
        } else {
            self.slots[self.free_tail].set_next_free(slot_index);
        }
        self.free_tail = slot_index;
    }
}

impl<T, K, C> SlotMap<T, K, C>
where
    K: SlotKey,
    C: StorageCapacity<T>,
{
    /// How many values the storage can hold without growing.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }
}

impl<T, K, C> Default for SlotMap<T, K, C>
where
    K: SlotKey,
    C: Storage<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K, C: Clone> Clone for SlotMap<T, K, C> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            values: self.values.clone(),
            reverse_map: self.reverse_map.clone(),
            free_head: self.free_head,
            free_tail: self.free_tail,
            _marker: PhantomData,
        }
    }
}

impl<T: fmt::Debug, K: SlotKey + fmt::Debug, C: Storage<T>> fmt::Debug for SlotMap<T, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter_with_keys()).finish()
    }
}

impl<T, K, C> Index<K> for SlotMap<T, K, C>
where
    K: SlotKey,
    C: Storage<T>,
{
    type Output = T;

    fn index(&self, key: K) -> &T {
        &self.values.as_slice()[self.find_unchecked(key)]
    }
}

impl<T, K, C> IndexMut<K> for SlotMap<T, K, C>
where
    K: SlotKey,
    C: Storage<T>,
{
    fn index_mut(&mut self, key: K) -> &mut T {
        let position = self.find_unchecked(key);
        &mut self.values.as_mut_slice()[position]
    }
}

impl<'a, T, K, C> IntoIterator for &'a SlotMap<T, K, C>
where
    K: SlotKey,
    C: Storage<T>,
{
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, K, C> IntoIterator for &'a mut SlotMap<T, K, C>
where
    K: SlotKey,
    C: Storage<T>,
{
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
