// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{EventSink, Interval, JumpPolicy, StabForest, Timestamp};

/// Emits, for each query window, every event overlapping it.
///
/// Windows must be given in non-decreasing start order; one stab-forward
/// cursor answers the whole batch. For each window `[s, e]` the cursor
/// stab-forwards to `s` (emitting the events already active there) and then
/// scans forward while events start at-or-before `e`.
///
/// The cursor only moves forward: for every window after the first, an
/// event is emitted iff it overlaps the window and starts after the
/// previous window's end.
pub fn multi_window<T: Timestamp, S: EventSink<T>>(
    forest: &StabForest<T>,
    windows: &[Interval<T>],
    policy: JumpPolicy,
    out: &mut S,
) {
    let mut cursor = forest.stab_forward_cursor(policy);

    for window in windows {
        cursor.stab_forward(window.start, out);

        while let Some(event) = cursor.peek() {
            if event.start > window.end {
                break;
            }
            out.emit(event);
            cursor.advance();
        }
    }
}
