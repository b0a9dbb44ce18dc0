// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

//! Backing sequence containers.
//!
//! Both [`FlatSet`](crate::FlatSet) and [`SlotMap`](crate::SlotMap) keep their elements in a
//! single contiguous sequence. The type of that sequence is a type parameter, so a growable
//! `Vec`, an inline `SmallVec` or a fixed-capacity `ArrayVec` can be used interchangeably.

/// A contiguous sequence that can back the containers of this crate.
///
/// Only appending and popping at the end is required; every reordering the containers do
/// goes through [`as_mut_slice`](Storage::as_mut_slice).
pub trait Storage<T> {
    /// Creates an empty storage. Should not allocate.
    fn new() -> Self;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a value to the end.
    ///
    /// Fixed-capacity storages panic when they are full.
    fn push(&mut self, value: T);

    fn pop(&mut self) -> Option<T>;

    fn clear(&mut self);

    fn truncate(&mut self, len: usize) {
        while self.len() > len {
            self.pop();
        }
    }

    fn as_slice(&self) -> &[T];

    fn as_mut_slice(&mut self) -> &mut [T];

    /// Makes room for at least `additional` more values.
    ///
    /// Storages that can't grow ignore this.
    fn reserve(&mut self, additional: usize) {
        let _ = additional;
    }
}

/// A storage that can report how many values it can hold without reallocating.
pub trait StorageCapacity<T>: Storage<T> {
    fn capacity(&self) -> usize;
}

impl<T> Storage<T> for Vec<T> {
    fn new() -> Self {
        Vec::new()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn push(&mut self, value: T) {
        Vec::push(self, value);
    }

    fn pop(&mut self) -> Option<T> {
        Vec::pop(self)
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len);
    }

    fn as_slice(&self) -> &[T] {
        Vec::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        Vec::as_mut_slice(self)
    }

    fn reserve(&mut self, additional: usize) {
        Vec::reserve(self, additional);
    }
}

impl<T> StorageCapacity<T> for Vec<T> {
    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}

#[cfg(feature = "arrayvec")]
impl<T, const N: usize> Storage<T> for arrayvec::ArrayVec<T, N> {
    fn new() -> Self {
        arrayvec::ArrayVec::new()
    }

    fn len(&self) -> usize {
        arrayvec::ArrayVec::len(self)
    }

    fn push(&mut self, value: T) {
        // panics with "ArrayVec: capacity exceeded in push" when full
        arrayvec::ArrayVec::push(self, value);
    }

    fn pop(&mut self) -> Option<T> {
        arrayvec::ArrayVec::pop(self)
    }

    fn clear(&mut self) {
        arrayvec::ArrayVec::clear(self);
    }

    fn truncate(&mut self, len: usize) {
        arrayvec::ArrayVec::truncate(self, len);
    }

    fn as_slice(&self) -> &[T] {
        arrayvec::ArrayVec::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        arrayvec::ArrayVec::as_mut_slice(self)
    }
}

#[cfg(feature = "arrayvec")]
impl<T, const N: usize> StorageCapacity<T> for arrayvec::ArrayVec<T, N> {
    fn capacity(&self) -> usize {
        N
    }
}

#[cfg(feature = "smallvec")]
impl<T, const N: usize> Storage<T> for smallvec::SmallVec<[T; N]> {
    fn new() -> Self {
        smallvec::SmallVec::new()
    }

    fn len(&self) -> usize {
        smallvec::SmallVec::len(self)
    }

    fn push(&mut self, value: T) {
        smallvec::SmallVec::push(self, value);
    }

    fn pop(&mut self) -> Option<T> {
        smallvec::SmallVec::pop(self)
    }

    fn clear(&mut self) {
        smallvec::SmallVec::clear(self);
    }

    fn truncate(&mut self, len: usize) {
        smallvec::SmallVec::truncate(self, len);
    }

    fn as_slice(&self) -> &[T] {
        smallvec::SmallVec::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        smallvec::SmallVec::as_mut_slice(self)
    }

    fn reserve(&mut self, additional: usize) {
        smallvec::SmallVec::reserve(self, additional);
    }
}

#[cfg(feature = "smallvec")]
impl<T, const N: usize> StorageCapacity<T> for smallvec::SmallVec<[T; N]> {
    fn capacity(&self) -> usize {
        smallvec::SmallVec::capacity(self)
    }
}
