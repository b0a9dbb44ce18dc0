// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

//! Cache-friendly containers that keep all their elements in one contiguous array.
//!
//! - [`FlatSet`] is an ordered set of unique keys stored in level order (Eytzinger layout), so
//!   a lookup is a binary search that touches the array from the front.
//! - [`SlotMap`] stores values densely and hands out generational keys that stay valid while the
//!   values move around inside the array.
//!
//! Both containers take the array type as a type parameter (see [`Storage`]), so they can live
//! inline in a fixed-capacity `ArrayVec` or a `SmallVec` instead of a `Vec`.
//!
//! ```
//! use compact_containers::{FlatSet, SlotMap};
//!
//! let mut set: FlatSet<i32> = [5, 1, 3, 1].into_iter().collect();
//! set.insert(4);
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 3, 4, 5]);
//! assert!(set.contains(&3));
//!
//! let mut map: SlotMap<&str> = SlotMap::new();
//! let key = map.insert("value");
//! assert_eq!(map[key], "value");
//! map.erase(key);
//! assert_eq!(map.get(key), None);
//! ```

mod compare;
mod error;
pub mod eytzinger;
mod flat_set;
mod slot_entry;
mod slot_key;
mod slot_map;
mod storage;
mod tracing_helpers;

#[cfg(test)]
mod proptests;

pub use compare::{ByFn, Compare, OrdGreater, OrdLess};
pub use error::{Error, Result};
pub use flat_set::{FlatSet, IntoIter, Iter, Position};
pub use slot_key::{Key, KeyPart, SlotKey};
pub use slot_map::SlotMap;
pub use storage::{Storage, StorageCapacity};
