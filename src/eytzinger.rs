// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

//! Level-order (Eytzinger) layout of an implicit complete binary search tree.
//!
//! The root lives at index 0 and the children of the node at index `i` live at `2i + 1` and
//! `2i + 2`. A tree of `n` nodes is always complete: every level is full except possibly the
//! deepest one, which is filled from the left.
//!
//! All navigation functions use `n` as the "no such node" value, which doubles as the end
//! position of an in-order traversal.

pub const fn parent(index: usize) -> usize {
    (index - 1) / 2
}

pub const fn left(index: usize) -> usize {
    2 * index + 1
}

pub const fn right(index: usize) -> usize {
    2 * index + 2
}

pub const fn is_left_child(index: usize) -> bool {
    index & 1 == 1
}

/// The root counts as a right child, which terminates upward walks.
pub const fn is_right_child(index: usize) -> bool {
    index & 1 == 0
}

/// The smallest node of the subtree rooted at `index`.
pub fn leftmost(mut index: usize, n: usize) -> usize {
    while left(index) < n {
        index = left(index);
    }
    index
}

/// The largest node of the subtree rooted at `index`.
pub fn rightmost(mut index: usize, n: usize) -> usize {
    while right(index) < n {
        index = right(index);
    }
    index
}

/// In-order successor of `index`, or `n` if `index` is the largest node.
pub fn next(index: usize, n: usize) -> usize {
    if right(index) < n {
        return leftmost(right(index), n);
    }

    let mut index = index;
    while is_right_child(index) {
        if index == 0 {
            return n;
        }
        index = parent(index);
    }
    parent(index)
}

/// In-order predecessor of `index`, or `n` if `index` is the smallest node.
///
/// The predecessor of the end position `n` is the largest node.
pub fn prev(index: usize, n: usize) -> usize {
    if index >= n {
        return if n == 0 { n } else { rightmost(0, n) };
    }
    if left(index) < n {
        return rightmost(left(index), n);
    }

    let mut index = index;
    while is_left_child(index) {
        index = parent(index);
    }
    if index == 0 {
        n
    } else {
        parent(index)
    }
}

/// Returns the sorted position of the node at `index` in a tree of `n` nodes.
///
/// The bits of `index + 1` below its leading one spell the left/right trail from the root to
/// the node, so the rank in a perfect tree of the same height is read off directly. Leaves
/// missing from the deepest level are then discounted. `rank_from_eytzinger(n, n) == n`.
pub fn rank_from_eytzinger(index: usize, n: usize) -> usize {
    if index >= n {
        return n;
    }

    let height = n.ilog2();
    // leaves present at the deepest level
    let deepest_count = n - (1 << height) + 1;

    let node = index + 1;
    let depth = node.ilog2();
    let trail = node - (1 << depth);
    let perfect_rank = (((trail << 1) + 1) << (height - depth)) - 1;

    // deepest-level leaves occupy the even perfect ranks
    let missing = ((perfect_rank + 1) >> 1).saturating_sub(deepest_count);
    perfect_rank - missing
}

/// Inverse of [`rank_from_eytzinger`]: the index of the node with the given sorted position.
pub fn eytzinger_from_rank(rank: usize, n: usize) -> usize {
    if rank >= n {
        return n;
    }

    let height = n.ilog2();
    let deepest_count = n - (1 << height) + 1;

    // past the last deepest leaf only inner nodes remain, at every other perfect rank
    let perfect_rank = if rank < 2 * deepest_count {
        rank
    } else {
        2 * (rank - deepest_count) + 1
    };

    let position = perfect_rank + 1;
    let levels_above_bottom = position.trailing_zeros();
    let depth = height - levels_above_bottom;
    let trail = position >> (levels_above_bottom + 1);
    (1 << depth) + trail - 1
}

/// Transforms `[a0 b0 a1 b1 ... an-1 bn-1 an]` into `[a0 a1 ... an b0 b1 ... bn-1]`.
///
/// The length must be odd (or zero).
pub fn invert_faro_shuffle<T>(seq: &mut [T]) {
    let n = seq.len();
    debug_assert!(n == 0 || n % 2 == 1, "faro shuffle needs an odd length, got {n}");

    if n >= 3 {
        let half = (n + 1) >> 1;
        let quarter = half >> 1;
        invert_faro_shuffle(&mut seq[..quarter + quarter - 1]);
        invert_faro_shuffle(&mut seq[quarter + quarter..]);
        seq[quarter..half + quarter].rotate_left(quarter);
    }
}

/// Rearranges a sorted sequence into level order, in place.
///
/// Works bottom-up: at every level the elements that become that level's nodes sit at the even
/// positions of a prefix, get separated from the rest by an inverse shuffle and are rotated to
/// the back of the still unplaced range.
///
/// The sequence must already be sorted. This is not checked, and an unsorted input produces a
/// layout that is not a valid search tree.
pub fn make_levelorder_from_sorted<T>(seq: &mut [T]) {
    let n = seq.len();
    let height = (usize::BITS - n.leading_zeros()).max(1);

    for level in (1..height).rev() {
        let level_width = 1usize << level;
        let effective_size = (level_width + (level_width - 1)).min(n);
        let leaf_count = level_width.min(n + 1 - level_width);
        invert_faro_shuffle(&mut seq[..2 * leaf_count - 1]);
        seq[..effective_size].rotate_left(leaf_count);
    }
}

/// Moves the node at `index` so that it ends up at sorted position `target_rank`, shifting the
/// nodes in between by one rank. Returns the index where the node ended up.
///
/// Every node other than the moved one keeps its relative order, so a valid layout with one
/// misplaced node becomes a valid layout.
pub fn shift_to_rank<T>(seq: &mut [T], index: usize, target_rank: usize) -> usize {
    let n = seq.len();
    let rank = rank_from_eytzinger(index, n);

    let mut index = index;
    if rank < target_rank {
        for _ in rank..target_rank {
            let successor = next(index, n);
            seq.swap(index, successor);
            index = successor;
        }
    } else {
        for _ in target_rank..rank {
            let predecessor = prev(index, n);
            seq.swap(index, predecessor);
            index = predecessor;
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_order<T: Copy>(seq: &[T]) -> Vec<T> {
        fn walk<T: Copy>(seq: &[T], index: usize, out: &mut Vec<T>) {
            if index < seq.len() {
                walk(seq, left(index), out);
                out.push(seq[index]);
                walk(seq, right(index), out);
            }
        }

        let mut out = Vec::with_capacity(seq.len());
        walk(seq, 0, &mut out);
        out
    }

    // sorted sequences of every length up to 200 => make level order => in-order walk restores them
    #[test]
    fn sorted_sequences_make_levelorder_in_order_walk_restores_them() {
        for n in 0..=200 {
            let sorted: Vec<usize> = (0..n).collect();
            let mut seq = sorted.clone();

            make_levelorder_from_sorted(&mut seq);

            assert_eq!(in_order(&seq), sorted, "n = {n}");
        }
    }

    // level order sequence => every node => stores its own rank
    #[test]
    fn levelorder_sequence_every_node_stores_its_own_rank() {
        for n in 1..=300 {
            let mut seq: Vec<usize> = (0..n).collect();
            make_levelorder_from_sorted(&mut seq);

            for (index, &value) in seq.iter().enumerate() {
                assert_eq!(rank_from_eytzinger(index, n), value, "index {index} of {n}");
            }
        }
    }

    #[test]
    fn rank_transform_is_a_bijection() {
        for n in 1..=300 {
            for index in 0..n {
                assert_eq!(eytzinger_from_rank(rank_from_eytzinger(index, n), n), index);
            }
        }
    }

    #[test]
    fn end_position_maps_to_itself() {
        for n in 0..=20 {
            assert_eq!(rank_from_eytzinger(n, n), n);
            assert_eq!(eytzinger_from_rank(n, n), n);
        }
    }

    // tree of four nodes => known layout => ranks match
    #[test]
    fn tree_of_four_nodes_known_layout_ranks_match() {
        let mut seq = ['a', 'b', 'c', 'd'];

        make_levelorder_from_sorted(&mut seq);

        assert_eq!(seq, ['c', 'b', 'd', 'a']);
    }

    #[test]
    fn next_and_prev_walk_in_sorted_order() {
        for n in 1..=64 {
            let mut index = leftmost(0, n);
            for rank in 0..n {
                assert_eq!(rank_from_eytzinger(index, n), rank);
                index = next(index, n);
            }
            assert_eq!(index, n);

            for rank in (0..n).rev() {
                index = prev(index, n);
                assert_eq!(rank_from_eytzinger(index, n), rank);
            }
            assert_eq!(prev(index, n), n);
        }
    }

    #[test]
    fn invert_faro_shuffle_separates_even_and_odd_positions() {
        let mut seq = [0, 10, 1, 11, 2, 12, 3];

        invert_faro_shuffle(&mut seq);

        assert_eq!(seq, [0, 1, 2, 3, 10, 11, 12]);
    }

    // valid layout with one appended node => shift it to its rank => layout stays valid
    #[test]
    fn valid_layout_with_one_appended_node_shift_to_rank_layout_stays_valid() {
        for n in 0..40usize {
            for inserted in 0..=n {
                let mut seq: Vec<usize> = (0..n).map(|i| if i < inserted { i } else { i + 1 }).collect();
                make_levelorder_from_sorted(&mut seq);
                seq.push(inserted);

                let last = seq.len() - 1;
                let index = shift_to_rank(&mut seq, last, inserted);

                assert_eq!(seq[index], inserted);
                assert_eq!(in_order(&seq), (0..=n).collect::<Vec<_>>());
            }
        }
    }
}
