// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Not every test binary uses every helper.
#![allow(dead_code)]

use rustc_hash::FxHashMap;
use stab_forest::{Interval, StabForest};

pub type Event = Interval<u32>;
pub type Pair = (Event, Event);

/// Builds a forest from `(start, end)` pairs given in valid order.
#[allow(clippy::unwrap_used)]
pub fn build_forest(events: &[(u32, u32)]) -> StabForest<u32> {
    let mut forest = StabForest::new();
    for &(start, end) in events {
        forest.append(start, end).unwrap();
    }
    forest
}

/// Normalizes arbitrary pairs into a valid event stream: flipped bounds are
/// swapped, then everything is sorted into `(start, end)` order.
pub fn normalize(raw: impl IntoIterator<Item = (u32, u32)>) -> Vec<(u32, u32)> {
    let mut events: Vec<(u32, u32)> = raw
        .into_iter()
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect();
    events.sort_unstable();
    events
}

/// The quadratic oracle: every overlapping pair of `lhs` × `rhs`.
pub fn naive_join(lhs: &StabForest<u32>, rhs: &StabForest<u32>) -> Vec<Pair> {
    let mut pairs = Vec::new();
    for l in lhs.iter() {
        for r in rhs.iter() {
            if l.overlaps(&r) {
                pairs.push((l, r));
            }
        }
    }
    pairs
}

fn multiset(pairs: &[Pair]) -> FxHashMap<Pair, usize> {
    let mut counts = FxHashMap::default();
    for pair in pairs {
        *counts.entry(*pair).or_insert(0) += 1;
    }
    counts
}

/// Asserts two pair sequences are equal as multisets (the global order of a
/// parallel join is scheduling-dependent).
#[track_caller]
pub fn assert_same_pairs(expected: &[Pair], actual: &[Pair], context: &str) {
    assert_eq!(
        multiset(expected),
        multiset(actual),
        "pair multisets differ: {context}"
    );
}
