// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod common;

use common::{build_forest, normalize};
use rand::prelude::*;
use stab_forest::{Interval, JumpPolicy, StabForest};
use test_log::test;

const POLICIES: [JumpPolicy; 4] = [
    JumpPolicy::List,
    JumpPolicy::Index,
    JumpPolicy::Check(1),
    JumpPolicy::Check(4),
];

fn random_events(rng: &mut impl Rng, len: usize, domain: u32, span: u32) -> Vec<(u32, u32)> {
    normalize((0..len).map(|_| {
        let start = rng.random_range(0..domain);
        (start, start + rng.random_range(0..span))
    }))
}

fn stab_oracle(forest: &StabForest<u32>, value: u32) -> (Vec<Interval<u32>>, usize) {
    let active: Vec<_> = forest.iter().filter(|e| e.contains(value)).collect();
    let next = forest
        .iter()
        .position(|e| e.start > value)
        .unwrap_or(forest.len());
    (active, next)
}

fn sorted(mut events: Vec<Interval<u32>>) -> Vec<Interval<u32>> {
    events.sort_unstable();
    events
}

#[test]
fn invariants_hold_after_every_append() {
    let mut rng = StdRng::seed_from_u64(0xF0_5E57);

    for _ in 0..20 {
        let events = random_events(&mut rng, 80, 60, 20);

        let mut forest = StabForest::new();
        for (start, end) in events {
            forest.append(start, end).expect("events are normalized");
            forest.check_invariants();
        }
    }
}

#[test]
fn stab_matches_oracle_on_random_forests() {
    let mut rng = StdRng::seed_from_u64(0xB01D_FACE);

    for round in 0..25 {
        let events = random_events(&mut rng, 120, 90, 25);
        let forest = build_forest(&events);

        for value in 0..130u32 {
            let mut active = Vec::new();
            let next = forest.stab(value, &mut active);

            let (expected, expected_next) = stab_oracle(&forest, value);
            assert_eq!(sorted(expected), sorted(active), "round {round}, stab({value})");
            assert_eq!(expected_next, next, "round {round}, cursor after stab({value})");
        }
    }
}

#[test]
fn stab_forward_sequences_match_oracle() {
    let mut rng = StdRng::seed_from_u64(0xCAFE);

    for round in 0..25 {
        let events = random_events(&mut rng, 100, 70, 18);
        let forest = build_forest(&events);

        // A random non-decreasing stab sequence.
        let mut values: Vec<u32> = (0..12).map(|_| rng.random_range(0..100)).collect();
        values.sort_unstable();

        for policy in POLICIES {
            let mut cursor = forest.stab_forward_cursor(policy);

            for &value in &values {
                let from = cursor.position();
                let mut hits = Vec::new();
                cursor.stab_forward(value, &mut hits);

                let (full, expected_next) = stab_oracle(&forest, value);
                let bound = forest.iter().nth(from).map(|e| e.start);
                let expected: Vec<_> = full
                    .into_iter()
                    .filter(|e| bound.is_some_and(|b| e.start >= b))
                    .collect();

                assert_eq!(
                    sorted(expected),
                    sorted(hits),
                    "round {round}, {policy:?}, stab_forward({value}) from {from}"
                );
                assert_eq!(expected_next.max(from), cursor.position());
            }
        }
    }
}

#[test]
fn policies_emit_identical_sets() {
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..15 {
        let events = random_events(&mut rng, 90, 60, 15);
        let forest = build_forest(&events);

        let mut values: Vec<u32> = (0..10).map(|_| rng.random_range(0..80)).collect();
        values.sort_unstable();

        let mut baseline: Option<Vec<Interval<u32>>> = None;

        for policy in POLICIES {
            let mut cursor = forest.stab_forward_cursor(policy);
            let mut hits = Vec::new();
            for &value in &values {
                cursor.stab_forward(value, &mut hits);
            }

            let hits = sorted(hits);
            match &baseline {
                None => baseline = Some(hits),
                Some(expected) => assert_eq!(expected, &hits, "{policy:?}"),
            }
        }
    }
}
