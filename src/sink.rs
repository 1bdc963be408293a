// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{Interval, Timestamp};

/// Receives events emitted by stab queries and stab-forward scans.
///
/// `Vec` collects; the join drivers plug in window-join sinks that splice
/// emissions straight into result pairs.
pub trait EventSink<T: Timestamp> {
    /// Consumes one emitted event.
    fn emit(&mut self, event: Interval<T>);
}

impl<T: Timestamp> EventSink<T> for Vec<Interval<T>> {
    fn emit(&mut self, event: Interval<T>) {
        self.push(event);
    }
}

/// Receives `(l, r)` result pairs produced by the join drivers.
pub trait PairSink<T: Timestamp> {
    /// Consumes one result pair.
    fn emit(&mut self, lhs: Interval<T>, rhs: Interval<T>);
}

impl<T: Timestamp> PairSink<T> for Vec<(Interval<T>, Interval<T>)> {
    fn emit(&mut self, lhs: Interval<T>, rhs: Interval<T>) {
        self.push((lhs, rhs));
    }
}
