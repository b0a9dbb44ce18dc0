// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

use std::cmp::Ordering;

/// A strict weak ordering used by [`FlatSet`](crate::FlatSet) to arrange its keys.
///
/// Two keys are considered equivalent when neither is less than the other.
pub trait Compare<T: ?Sized> {
    /// Returns true if `a` goes strictly before `b`.
    fn less(&self, a: &T, b: &T) -> bool;

    fn ordering(&self, a: &T, b: &T) -> Ordering {
        if self.less(a, b) {
            Ordering::Less
        } else if self.less(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

/// Ascending order through [`Ord`]. The default ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OrdLess;

impl<T: Ord + ?Sized> Compare<T> for OrdLess {
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }

    fn ordering(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Descending order through [`Ord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OrdGreater;

impl<T: Ord + ?Sized> Compare<T> for OrdGreater {
    fn less(&self, a: &T, b: &T) -> bool {
        a > b
    }

    fn ordering(&self, a: &T, b: &T) -> Ordering {
        b.cmp(a)
    }
}

/// Adapts a "less than" closure into a [`Compare`].
#[derive(Clone, Copy, Debug)]
pub struct ByFn<F>(pub F);

impl<T: ?Sized, F: Fn(&T, &T) -> bool> Compare<T> for ByFn<F> {
    fn less(&self, a: &T, b: &T) -> bool {
        (self.0)(a, b)
    }
}
