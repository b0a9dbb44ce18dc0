// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Index, Sub, SubAssign};

use crate::compare::{Compare, OrdLess};
use crate::eytzinger;
use crate::storage::Storage;
use crate::tracing_helpers::{debug_log, trace_log};

/// A position inside a [`FlatSet`]: an index into the level-order array together with the
/// number of elements the set had when the position was produced.
///
/// Positions are ordered by the sorted rank of the element they point to, and support the
/// usual random-access arithmetic. Moving past either end saturates at the first element or at
/// the end position.
///
/// A position is invalidated by any insertion or removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    index: usize,
    len: usize,
}

impl Position {
    fn new(index: usize, len: usize) -> Self {
        debug_assert!(index <= len);
        Self { index, len }
    }

    /// Position of the smallest element (or the end position for an empty set).
    pub fn begin(len: usize) -> Self {
        if len == 0 {
            Self::end(len)
        } else {
            Self::new(eytzinger::leftmost(0, len), len)
        }
    }

    pub fn end(len: usize) -> Self {
        Self::new(len, len)
    }

    /// The position of the element with the given sorted rank, or the end position if the rank
    /// is out of range.
    pub fn from_rank(rank: usize, len: usize) -> Self {
        Self::new(eytzinger::eytzinger_from_rank(rank, len), len)
    }

    /// Index into the level-order array.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Length of the set this position was taken from.
    pub fn set_len(&self) -> usize {
        self.len
    }

    pub fn is_end(&self) -> bool {
        self.index == self.len
    }

    /// Sorted position of the element; equals `set_len()` for the end position.
    pub fn rank(&self) -> usize {
        eytzinger::rank_from_eytzinger(self.index, self.len)
    }

    /// The next position in ascending order. The end position stays at the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(self) -> Self {
        if self.is_end() {
            self
        } else {
            Self::new(eytzinger::next(self.index, self.len), self.len)
        }
    }

    /// The previous position in ascending order. The first position stays in place.
    pub fn prev(self) -> Self {
        let index = eytzinger::prev(self.index, self.len);
        if index == self.len {
            self
        } else {
            Self::new(index, self.len)
        }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then(self.len.cmp(&other.len))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<usize> for Position {
    type Output = Position;

    fn add(self, offset: usize) -> Position {
        Position::from_rank(self.rank().saturating_add(offset), self.len)
    }
}

impl AddAssign<usize> for Position {
    fn add_assign(&mut self, offset: usize) {
        *self = *self + offset;
    }
}

impl Sub<usize> for Position {
    type Output = Position;

    fn sub(self, offset: usize) -> Position {
        Position::from_rank(self.rank().saturating_sub(offset), self.len)
    }
}

impl SubAssign<usize> for Position {
    fn sub_assign(&mut self, offset: usize) {
        *self = *self - offset;
    }
}

/// Distance in ranks between two positions of the same set.
impl Sub<Position> for Position {
    type Output = isize;

    fn sub(self, other: Position) -> isize {
        debug_assert_eq!(self.len, other.len, "positions of different sets");
        self.rank() as isize - other.rank() as isize
    }
}

/// An ordered set of unique keys stored in a single contiguous array in level order
/// (Eytzinger layout).
///
/// Lookups descend an implicit binary search tree whose root is the first element of the array,
/// which keeps the first few levels of every search in the same few cache lines. Iteration walks
/// the same tree in order, so it always yields the keys in ascending order regardless of where
/// they physically are.
///
/// Lookups are O(log n). Insertions and removals are O(log n) to find the spot plus O(n) to
/// shift the array into a new valid layout.
///
/// The ordering is given by `C` (ascending [`Ord`] by default) and the array type by `S`
/// (`Vec` by default, see [`Storage`]).
pub struct FlatSet<K, C = OrdLess, S = Vec<K>> {
    // level-order array of unique keys
    keys: S,
    compare: C,
    _marker: PhantomData<K>,
}

impl<K, C, S> FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    /// Creates an empty set. Does not allocate.
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::with_compare(C::default())
    }

    /// Creates an empty set ordered by `compare`.
    pub fn with_compare(compare: C) -> Self {
        Self {
            keys: S::new(),
            compare,
            _marker: PhantomData,
        }
    }

    /// Builds a set from arbitrary keys: sorts them, drops duplicates (keeping the first key
    /// of every run of equivalent keys) and lays them out in level order.
    pub fn from_storage(keys: S) -> Self
    where
        C: Default,
    {
        Self::from_storage_with_compare(keys, C::default())
    }

    pub fn from_storage_with_compare(mut keys: S, compare: C) -> Self {
        sort_unique_levelorder(&mut keys, &compare);
        Self {
            keys,
            compare,
            _marker: PhantomData,
        }
    }

    /// Builds a set from keys that are already sorted and unique under `C`, skipping the sort
    /// and the deduplication.
    ///
    /// The keys must be sorted and unique. This is not checked; violating it leaves the set in
    /// a state where lookups and iteration give unspecified results.
    pub fn from_sorted_unique(keys: S) -> Self
    where
        C: Default,
    {
        Self::from_sorted_unique_with_compare(keys, C::default())
    }

    /// See [`from_sorted_unique`](Self::from_sorted_unique).
    pub fn from_sorted_unique_with_compare(mut keys: S, compare: C) -> Self {
        eytzinger::make_levelorder_from_sorted(keys.as_mut_slice());
        Self {
            keys,
            compare,
            _marker: PhantomData,
        }
    }

    /// Same as [`from_sorted_unique`](Self::from_sorted_unique), collecting the keys first.
    pub fn from_sorted_unique_iter<I: IntoIterator<Item = K>>(iter: I) -> Self
    where
        C: Default,
    {
        Self::from_sorted_unique(collect_storage(iter))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key_comp(&self) -> &C {
        &self.compare
    }

    /// The keys in their physical level-order arrangement.
    pub fn as_slice(&self) -> &[K] {
        self.keys.as_slice()
    }

    /// Takes the backing array out of the set, keys still in level order.
    pub fn into_storage(self) -> S {
        self.keys
    }

    /// Position of the smallest key, or [`end`](Self::end) when the set is empty.
    pub fn begin(&self) -> Position {
        Position::begin(self.len())
    }

    pub fn end(&self) -> Position {
        Position::end(self.len())
    }

    pub fn first(&self) -> Option<&K> {
        self.get_at(self.begin())
    }

    pub fn last(&self) -> Option<&K> {
        self.get_at(self.end().prev())
    }

    /// The key at `position`, or `None` for the end position.
    pub fn get_at(&self, position: Position) -> Option<&K> {
        debug_assert_eq!(position.set_len(), self.len(), "stale position");
        self.keys.as_slice().get(position.index())
    }

    /// First position whose key is not less than `key`.
    pub fn lower_bound<Q: ?Sized>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        let keys = self.keys.as_slice();
        let n = keys.len();
        if n == 0 {
            return self.end();
        }

        let mut index = 0;
        loop {
            if <C as Compare<Q>>::less(&self.compare, keys[index].borrow(), key) {
                let right = eytzinger::right(index);
                if right < n {
                    index = right;
                } else {
                    return Position::new(eytzinger::next(index, n), n);
                }
            } else {
                let left = eytzinger::left(index);
                if left < n {
                    index = left;
                } else {
                    return Position::new(index, n);
                }
            }
        }
    }

    /// First position whose key is greater than `key`.
    pub fn upper_bound<Q: ?Sized>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        let keys = self.keys.as_slice();
        let n = keys.len();
        if n == 0 {
            return self.end();
        }

        let mut index = 0;
        loop {
            if <C as Compare<Q>>::less(&self.compare, key, keys[index].borrow()) {
                let left = eytzinger::left(index);
                if left < n {
                    index = left;
                } else {
                    return Position::new(index, n);
                }
            } else {
                let right = eytzinger::right(index);
                if right < n {
                    index = right;
                } else {
                    return Position::new(eytzinger::next(index, n), n);
                }
            }
        }
    }

    pub fn equal_range<Q: ?Sized>(&self, key: &Q) -> (Position, Position)
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        (self.lower_bound(key), self.upper_bound(key))
    }

    /// Position of the key equivalent to `key`, or [`end`](Self::end) if there is none.
    pub fn find<Q: ?Sized>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        let position = self.lower_bound(key);
        match self.keys.as_slice().get(position.index()) {
            Some(found) if !<C as Compare<Q>>::less(&self.compare, key, found.borrow()) => position,
            _ => self.end(),
        }
    }

    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        self.keys.as_slice().get(self.find(key).index())
    }

    pub fn contains<Q: ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        !self.find(key).is_end()
    }

    /// 1 if the set holds a key equivalent to `key`, 0 otherwise.
    pub fn count<Q: ?Sized>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        usize::from(self.contains(key))
    }

    /// Inserts a key unless an equivalent one is already present.
    ///
    /// Returns the position of the inserted key (or of the key that prevented the insertion)
    /// and whether the insertion happened.
    ///
    /// The key is appended to the array and then shifted through the in-order sequence to its
    /// rank, which is O(n) swaps in the worst case.
    pub fn insert(&mut self, key: K) -> (Position, bool) {
        let position = self.lower_bound(&key);
        if let Some(existing) = self.keys.as_slice().get(position.index()) {
            if !self.compare.less(&key, existing) {
                return (position, false);
            }
        }

        let rank = position.rank();
        self.keys.push(key);

        let keys = self.keys.as_mut_slice();
        let n = keys.len();
        let index = eytzinger::shift_to_rank(keys, n - 1, rank);
        trace_log!(rank, index, len = n, "flat set insert");
        (Position::new(index, n), true)
    }

    /// Removes the key at `position` and returns the position of the key that followed it.
    ///
    /// Erasing the end position does nothing.
    pub fn erase_at(&mut self, position: Position) -> Position {
        let rank = position.rank();
        self.remove_at(position);
        Position::from_rank(rank, self.len())
    }

    /// Removes the key equivalent to `key`. Returns the number of removed keys (0 or 1).
    pub fn erase<Q: ?Sized>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        usize::from(self.take(key).is_some())
    }

    /// Removes and returns the key equivalent to `key`.
    pub fn take<Q: ?Sized>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        let position = self.find(key);
        self.remove_at(position)
    }

    /// Removes every key in `[first, last)` and returns the position that follows the removed
    /// range.
    pub fn erase_range(&mut self, first: Position, last: Position) -> Position {
        let rank = first.rank();
        let count = last.rank().saturating_sub(rank);
        for _ in 0..count {
            let position = Position::from_rank(rank, self.len());
            self.remove_at(position);
        }
        Position::from_rank(rank, self.len())
    }

    /// Keeps only the keys for which `keep` returns true.
    ///
    /// Rebuilds the layout once instead of shifting the array per removed key.
    ///
    /// If `keep` panics, the set keeps all of its keys.
    pub fn retain<F: FnMut(&K) -> bool>(&mut self, mut keep: F) {
        let mut guard = RelayoutOnUnwind {
            keys: &mut self.keys,
            compare: &self.compare,
            finished: false,
            _marker: PhantomData,
        };
        let compare = guard.compare;
        let keys = guard.keys.as_mut_slice();
        keys.sort_unstable_by(|a, b| compare.ordering(a, b));

        let mut kept = 0;
        for read in 0..keys.len() {
            if keep(&keys[read]) {
                keys.swap(kept, read);
                kept += 1;
            }
        }

        guard.keys.truncate(kept);
        eytzinger::make_levelorder_from_sorted(guard.keys.as_mut_slice());
        guard.finished = true;
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Iterates over the keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(self.keys.as_slice(), self.begin(), self.end())
    }

    /// Iterates over the keys in `[first, last)` in ascending order.
    pub fn range(&self, first: Position, last: Position) -> Iter<'_, K> {
        debug_assert_eq!(first.set_len(), self.len(), "stale position");
        debug_assert_eq!(last.set_len(), self.len(), "stale position");
        Iter::new(self.keys.as_slice(), first, last)
    }

    // moves the key to the rank of the last array slot, where popping it keeps the layout valid
    fn remove_at(&mut self, position: Position) -> Option<K> {
        let n = self.len();
        if position.index() >= n {
            return None;
        }
        debug_assert_eq!(position.set_len(), n, "stale position");

        let last_rank = eytzinger::rank_from_eytzinger(n - 1, n);
        eytzinger::shift_to_rank(self.keys.as_mut_slice(), position.index(), last_rank);
        self.keys.pop()
    }
}

// restores a valid layout if a user callback unwinds while the keys are out of level order
struct RelayoutOnUnwind<'a, K, C: Compare<K>, S: Storage<K>> {
    keys: &'a mut S,
    compare: &'a C,
    finished: bool,
    _marker: PhantomData<K>,
}

impl<K, C: Compare<K>, S: Storage<K>> Drop for RelayoutOnUnwind<'_, K, C, S> {
    fn drop(&mut self) {
        if !self.finished {
            let compare = self.compare;
            let keys = self.keys.as_mut_slice();
            keys.sort_unstable_by(|a, b| compare.ordering(a, b));
            eytzinger::make_levelorder_from_sorted(keys);
        }
    }
}

fn collect_storage<K, S: Storage<K>, I: IntoIterator<Item = K>>(iter: I) -> S {
    let iter = iter.into_iter();
    let mut storage = S::new();
    storage.reserve(iter.size_hint().0);
    for key in iter {
        storage.push(key);
    }
    storage
}

fn sort_unique_levelorder<K, C: Compare<K>, S: Storage<K>>(keys: &mut S, compare: &C) {
    // stable, so the first of equivalent keys stays in front of its run
    let slice = keys.as_mut_slice();
    slice.sort_by(|a, b| compare.ordering(a, b));
    let unique_len = dedup_keep_first(slice, compare);
    keys.truncate(unique_len);

    eytzinger::make_levelorder_from_sorted(keys.as_mut_slice());
    debug_log!(unique_len, "built flat set");
}

// moves the first key of every run of equivalent keys to the front, returns how many there are
fn dedup_keep_first<K, C: Compare<K>>(sorted: &mut [K], compare: &C) -> usize {
    if sorted.is_empty() {
        return 0;
    }

    let mut unique = 1;
    for read in 1..sorted.len() {
        if compare.less(&sorted[unique - 1], &sorted[read]) {
            sorted.swap(unique, read);
            unique += 1;
        }
    }
    unique
}

impl<K, C, S> Default for FlatSet<K, C, S>
where
    C: Compare<K> + Default,
    S: Storage<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C: Clone, S: Clone> Clone for FlatSet<K, C, S> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            compare: self.compare.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, C, S> FromIterator<K> for FlatSet<K, C, S>
where
    C: Compare<K> + Default,
    S: Storage<K>,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self::from_storage(collect_storage(iter))
    }
}

impl<K, C, S, const N: usize> From<[K; N]> for FlatSet<K, C, S>
where
    C: Compare<K> + Default,
    S: Storage<K>,
{
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<K, C, S> Extend<K> for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K: Copy + 'a, C, S> Extend<&'a K> for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<K, C, S> Index<Position> for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    type Output = K;

    /// Panics on the end position.
    fn index(&self, position: Position) -> &K {
        &self.keys.as_slice()[position.index()]
    }
}

impl<K: PartialEq, C, S> PartialEq for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, C, S> Eq for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
}

impl<K: PartialOrd, C, S> PartialOrd for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, C, S> Ord for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: Hash, C, S> Hash for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for key in self {
            key.hash(state);
        }
    }
}

impl<K: fmt::Debug, C, S> fmt::Debug for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Ascending iterator over the keys of a [`FlatSet`].
pub struct Iter<'a, K> {
    keys: &'a [K],
    // index of the next key from the front
    front: usize,
    // index one past the next key from the back, in order
    back: usize,
    remaining: usize,
}

impl<'a, K> Iter<'a, K> {
    fn new(keys: &'a [K], first: Position, last: Position) -> Self {
        Self {
            keys,
            front: first.index(),
            back: last.index(),
            remaining: usize::try_from(last - first).unwrap_or(0),
        }
    }
}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        if self.remaining == 0 {
            return None;
        }
        let key = &self.keys[self.front];
        self.front = eytzinger::next(self.front, self.keys.len());
        self.remaining -= 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.back = eytzinger::prev(self.back, self.keys.len());
        self.remaining -= 1;
        Some(&self.keys[self.back])
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

impl<'a, K, C, S> IntoIterator for &'a FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

/// Owning ascending iterator over the keys of a [`FlatSet`].
pub struct IntoIter<K, S> {
    // sorted in descending order, so popping yields ascending keys
    keys: S,
    _marker: PhantomData<K>,
}

impl<K, S: Storage<K>> Iterator for IntoIter<K, S> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.keys.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.keys.len(), Some(self.keys.len()))
    }
}

impl<K, S: Storage<K>> ExactSizeIterator for IntoIter<K, S> {}

impl<K, S: Storage<K>> FusedIterator for IntoIter<K, S> {}

impl<K, C, S> IntoIterator for FlatSet<K, C, S>
where
    C: Compare<K>,
    S: Storage<K>,
{
    type Item = K;
    type IntoIter = IntoIter<K, S>;

    fn into_iter(mut self) -> IntoIter<K, S> {
        let compare = &self.compare;
        self.keys
            .as_mut_slice()
            .sort_unstable_by(|a, b| compare.ordering(b, a));
        IntoIter {
            keys: self.keys,
            _marker: PhantomData,
        }
    }
}
