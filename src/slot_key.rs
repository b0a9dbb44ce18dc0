// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

use std::fmt::Debug;
use std::hash::Hash;

/// An unsigned integer that can hold one half of a [`SlotKey`].
///
/// The width of the integer caps the number of slots (for the index) or the number of times a
/// slot can be reused (for the generation).
pub trait KeyPart: Copy + Eq + Ord + Hash + Debug {
    /// The largest value the type can hold, as `usize`.
    const MAX: usize;

    fn to_usize(self) -> usize;

    /// The value must not be greater than [`MAX`](KeyPart::MAX).
    fn from_usize(value: usize) -> Self;
}

macro_rules! impl_key_part {
    ($($t:ty),*) => {
        $(
            impl KeyPart for $t {
                const MAX: usize = if (<$t>::MAX as u128) < (usize::MAX as u128) {
                    <$t>::MAX as usize
                } else {
                    usize::MAX
                };

                fn to_usize(self) -> usize {
                    self as usize
                }

                fn from_usize(value: usize) -> Self {
                    debug_assert!(value <= <Self as KeyPart>::MAX);
                    value as $t
                }
            }
        )*
    };
}

impl_key_part!(u8, u16, u32, u64, usize);

/// A handle that names a value in a [`SlotMap`](crate::SlotMap).
///
/// A key is an index into the slot array plus the generation of the slot at the time the value
/// was inserted. Once the value is erased the generation of the slot moves on, and the key
/// never matches again.
pub trait SlotKey: Copy {
    type Index: KeyPart;
    type Generation: KeyPart;

    fn from_parts(index: Self::Index, generation: Self::Generation) -> Self;

    fn index(&self) -> Self::Index;

    fn generation(&self) -> Self::Generation;
}

/// The default key type: an index and a generation, both `u32` unless specified otherwise.
///
/// Smaller parts make smaller keys: `Key<u16, u8>` fits in 4 bytes but limits the map to 65536
/// slots that can each be reused 255 times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key<I = u32, G = u32> {
    index: I,
    generation: G,
}

impl<I: KeyPart, G: KeyPart> Key<I, G> {
    pub fn new(index: I, generation: G) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> I {
        self.index
    }

    pub fn generation(&self) -> G {
        self.generation
    }
}

impl<I: KeyPart, G: KeyPart> SlotKey for Key<I, G> {
    type Index = I;
    type Generation = G;

    fn from_parts(index: I, generation: G) -> Self {
        Self::new(index, generation)
    }

    fn index(&self) -> I {
        self.index
    }

    fn generation(&self) -> G {
        self.generation
    }
}

impl<I: KeyPart, G: KeyPart> SlotKey for (I, G) {
    type Index = I;
    type Generation = G;

    fn from_parts(index: I, generation: G) -> Self {
        (index, generation)
    }

    fn index(&self) -> I {
        self.0
    }

    fn generation(&self) -> G {
        self.1
    }
}
