// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

pub(crate) mod forward_scan;
pub(crate) mod median;
pub(crate) mod parallel;
pub(crate) mod skip_join;
pub(crate) mod window;

use crate::{EventSink, Interval, PairSink, Timestamp};

/// Joins a left event against a window of right events: pairs are emitted
/// while the right event starts at-or-before the left event ends.
///
/// The intervals already overlap on the other axis when this is called
/// (the window begins at-or-after the left event's start), so the start
/// check is the whole overlap test.
pub(crate) fn join_left_window<T: Timestamp, S: PairSink<T>>(
    event: Interval<T>,
    window: &[Interval<T>],
    out: &mut S,
) {
    for other in window {
        if other.start > event.end {
            break;
        }
        out.emit(event, *other);
    }
}

/// Mirror of [`join_left_window`] for a right event against a left window.
pub(crate) fn join_right_window<T: Timestamp, S: PairSink<T>>(
    event: Interval<T>,
    window: &[Interval<T>],
    out: &mut S,
) {
    for other in window {
        if other.start > event.end {
            break;
        }
        out.emit(*other, event);
    }
}

/// An event sink that joins every received event against a fixed window of
/// the opposite stream.
///
/// This is what the skip-join hands to `stab_forward`: events a cursor
/// jumps across are spliced straight into result pairs. `swap` flips the
/// pair so the sink works for either side.
pub(crate) struct WindowJoin<'a, T: Timestamp, S: PairSink<T>> {
    pub window: &'a [Interval<T>],
    pub swap: bool,
    pub out: &'a mut S,
}

impl<T: Timestamp, S: PairSink<T>> EventSink<T> for WindowJoin<'_, T, S> {
    fn emit(&mut self, event: Interval<T>) {
        if self.swap {
            join_right_window(event, self.window, self.out);
        } else {
            join_left_window(event, self.window, self.out);
        }
    }
}
