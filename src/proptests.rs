// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

use super::*;

use proptest::prelude::*;
use std::collections::BTreeSet;

fn validate_layout(set: &FlatSet<i16>) {
    let keys = set.as_slice();
    for (index, key) in keys.iter().enumerate() {
        let left = eytzinger::left(index);
        let right = eytzinger::right(index);
        if left < keys.len() {
            assert!(keys[left] < *key, "left child out of order at {index}");
        }
        if right < keys.len() {
            assert!(*key < keys[right], "right child out of order at {index}");
        }
    }
}

#[derive(Clone, Debug)]
enum SetOp {
    Insert(i16),
    Erase(i16),
    EraseNth(usize),
    EraseRange(usize, usize),
    Bounds(i16),
    RetainMultiplesOf(i16),
}

fn set_ops_strategy() -> impl Strategy<Value = Vec<SetOp>> {
    let key = -200i16..200;
    let op = prop_oneof![
        50 => key.clone().prop_map(SetOp::Insert),
        20 => key.clone().prop_map(SetOp::Erase),
        10 => any::<usize>().prop_map(SetOp::EraseNth),
        3 => (any::<usize>(), 0usize..8).prop_map(|(first, len)| SetOp::EraseRange(first, len)),
        15 => key.prop_map(SetOp::Bounds),
        2 => (2i16..5).prop_map(SetOp::RetainMultiplesOf),
    ];
    prop::collection::vec(op, 0..=500)
}

#[derive(Clone, Debug)]
enum MapOp {
    Insert(u32),
    Erase(usize),
    Partition(u32),
    Clear,
}

fn map_ops_strategy() -> impl Strategy<Value = Vec<MapOp>> {
    let op = prop_oneof![
        50 => any::<u32>().prop_map(MapOp::Insert),
        35 => any::<usize>().prop_map(MapOp::Erase),
        10 => any::<u32>().prop_map(MapOp::Partition),
        1 => Just(MapOp::Clear),
    ];
    prop::collection::vec(op, 0..=1000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_flat_set_equivalence(ops in set_ops_strategy()) {
        let mut set: FlatSet<i16> = FlatSet::new();
        let mut model: BTreeSet<i16> = BTreeSet::new();

        for op in ops {
            match op {
                SetOp::Insert(key) => {
                    let (position, inserted) = set.insert(key);
                    prop_assert_eq!(inserted, model.insert(key));
                    prop_assert_eq!(set[position], key);
                }
                SetOp::Erase(key) => {
                    prop_assert_eq!(set.erase(&key), usize::from(model.remove(&key)));
                }
                SetOp::EraseNth(n) => {
                    if !model.is_empty() {
                        let rank = n % model.len();
                        let key = *model.iter().nth(rank).unwrap();
                        let next = set.erase_at(set.begin() + rank);
                        model.remove(&key);
                        prop_assert_eq!(set.get_at(next), model.range(key..).next());
                    }
                }
                SetOp::EraseRange(first, len) => {
                    let first = first % (model.len() + 1);
                    let last = (first + len).min(model.len());
                    let removed: Vec<i16> = model.iter().skip(first).take(last - first).copied().collect();
                    set.erase_range(set.begin() + first, set.begin() + last);
                    for key in removed {
                        model.remove(&key);
                    }
                }
                SetOp::Bounds(key) => {
                    prop_assert_eq!(set.get_at(set.lower_bound(&key)), model.range(key..).next());
                    prop_assert_eq!(
                        set.get_at(set.upper_bound(&key)),
                        model.range((std::ops::Bound::Excluded(key), std::ops::Bound::Unbounded)).next()
                    );
                    prop_assert_eq!(set.contains(&key), model.contains(&key));
                }
                SetOp::RetainMultiplesOf(divisor) => {
                    set.retain(|key| key % divisor == 0);
                    model.retain(|key| key % divisor == 0);
                }
            }

            prop_assert_eq!(set.len(), model.len());
        }

        validate_layout(&set);
        prop_assert!(set.iter().eq(model.iter()));
        prop_assert!(set.iter().rev().eq(model.iter().rev()));
        prop_assert!(set.into_iter().eq(model.into_iter()));
    }

    #[test]
    fn prop_flat_set_from_unsorted_input(keys in prop::collection::vec(any::<i16>(), 0..=300)) {
        let set: FlatSet<i16> = keys.iter().copied().collect();
        let model: BTreeSet<i16> = keys.into_iter().collect();

        validate_layout(&set);
        prop_assert!(set.iter().eq(model.iter()));
        for (rank, key) in model.iter().enumerate() {
            let position = set.find(key);
            prop_assert_eq!(position.rank(), rank);
            prop_assert_eq!(position, set.begin() + rank);
        }
    }

    #[test]
    fn prop_slot_map_equivalence(ops in map_ops_strategy()) {
        let mut slot_map: SlotMap<u32> = SlotMap::new();
        // every key ever handed out, with the value it should still point to
        let mut issued: Vec<(Key, Option<u32>)> = Vec::new();

        for op in ops {
            match op {
                MapOp::Insert(value) => {
                    let key = slot_map.insert(value);
                    prop_assert!(issued.iter().all(|(issued_key, _)| *issued_key != key));
                    issued.push((key, Some(value)));
                }
                MapOp::Erase(n) => {
                    if !issued.is_empty() {
                        let chosen = n % issued.len();
                        let (key, expected) = &mut issued[chosen];
                        prop_assert_eq!(slot_map.remove(*key), expected.take());
                    }
                }
                MapOp::Partition(pivot) => {
                    let split = slot_map.partition(|&value| value < pivot);
                    prop_assert!(slot_map.as_slice()[..split].iter().all(|&value| value < pivot));
                    prop_assert!(slot_map.as_slice()[split..].iter().all(|&value| value >= pivot));
                }
                MapOp::Clear => {
                    slot_map.clear();
                    for (_, expected) in issued.iter_mut() {
                        *expected = None;
                    }
                }
            }

            let alive = issued.iter().filter(|(_, expected)| expected.is_some()).count();
            prop_assert_eq!(slot_map.len(), alive);
        }

        for (key, expected) in &issued {
            prop_assert_eq!(slot_map.get(*key), expected.as_ref());
        }
        for (position, key) in slot_map.keys().enumerate() {
            prop_assert_eq!(slot_map.find(key), Some(position));
        }
    }
}
