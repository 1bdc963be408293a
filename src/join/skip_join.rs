// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::WindowJoin;
use crate::event_list::EventPos;
use crate::{EventSink, JumpPolicy, PairSink, StabForest, Timestamp};

/// Joins two event streams, skipping past runs that cannot produce output.
///
/// Shaped like [`forward_scan`](super::forward_scan::forward_scan), but both
/// sides are stab-forward cursors: when the current events do not overlap,
/// the lagging cursor stab-forwards to the other side's start, emitting any
/// still-active events it jumps across straight into the pair window.
///
/// All jump policies produce the same pairs; they only trade how the jump is
/// performed.
pub fn forward_skip_join<T: Timestamp, S: PairSink<T>>(
    lhs: &StabForest<T>,
    rhs: &StabForest<T>,
    out: &mut S,
    policy_l: JumpPolicy,
    policy_r: JumpPolicy,
) {
    partial_skip_join(
        lhs,
        rhs,
        (0, lhs.len()),
        (0, rhs.len()),
        policy_l,
        policy_r,
        out,
    );
}

/// Skip-join over the ranges `lhs[la..lb)` × `rhs[ra..rb)`.
///
/// Pairs reaching outside the ranges are not emitted; the parallel driver
/// covers those with spill-over tasks. Range begins must sit on run
/// boundaries (position 0 and stab cursor positions satisfy this).
pub(crate) fn partial_skip_join<T: Timestamp, S: PairSink<T>>(
    lhs: &StabForest<T>,
    rhs: &StabForest<T>,
    (la, lb): (EventPos, EventPos),
    (ra, rb): (EventPos, EventPos),
    policy_l: JumpPolicy,
    policy_r: JumpPolicy,
    out: &mut S,
) {
    let left = lhs.events_slice();
    let right = rhs.events_slice();

    let mut lit = lhs.cursor_at(la, policy_l);
    let mut rit = rhs.cursor_at(ra, policy_r);

    while lit.position() < lb && rit.position() < rb {
        let (Some(l), Some(r)) = (lit.peek(), rit.peek()) else {
            break;
        };

        if l.start <= r.start {
            let mut window = WindowJoin {
                window: right.get(rit.position()..rb).unwrap_or_default(),
                swap: false,
                out: &mut *out,
            };

            if r.start <= l.end {
                window.emit(l);
                lit.advance();
            } else {
                lit.stab_forward(r.start, &mut window);
            }
        } else {
            let mut window = WindowJoin {
                window: left.get(lit.position()..lb).unwrap_or_default(),
                swap: true,
                out: &mut *out,
            };

            if l.start <= r.end {
                window.emit(r);
                rit.advance();
            } else {
                rit.stab_forward(l.start, &mut window);
            }
        }
    }
}
