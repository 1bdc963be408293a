// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{join_left_window, join_right_window};
use crate::{PairSink, StabForest, Timestamp};

/// Joins two event streams with a plain merge-like sweep (the baseline the
/// skip-joins are measured against).
///
/// The side with the smaller start is joined against the other side's
/// active window, then advanced. Runs in O(|lhs| + |rhs| + output).
pub fn forward_scan<T: Timestamp, S: PairSink<T>>(
    lhs: &StabForest<T>,
    rhs: &StabForest<T>,
    out: &mut S,
) {
    let left = lhs.events_slice();
    let right = rhs.events_slice();

    let mut lit = 0;
    let mut rit = 0;

    while let (Some(l), Some(r)) = (left.get(lit), right.get(rit)) {
        if l.start <= r.start {
            join_left_window(*l, right.get(rit..).unwrap_or_default(), out);
            lit += 1;
        } else {
            join_right_window(*r, left.get(lit..).unwrap_or_default(), out);
            rit += 1;
        }
    }
}
