// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::StabForest;
use crate::event_list::EventPos;
use crate::node::NodeRef;
use crate::{EventSink, Interval, Timestamp};

/// Callbacks invoked while navigating the forest for a stab value.
///
/// `navigate` searches for the node whose `[nkey, dkey]` window contains the
/// value and reports every step:
///
/// - `before_trees` when the value is at or before the smallest indexed
///   start-time,
/// - `after_trees` when the value exceeds the largest indexed start-time
///   (the event-list tail may still hold later starts),
/// - `left_child` / `right_child` for every branch taken,
/// - `select_node` for the terminal node.
///
/// `mstart` carries the "start at-or-after" bound of a resumed stab-forward
/// operation; it filters left-lists down to not-yet-visited events. The
/// one-shot stab always navigates with `None`.
pub(crate) trait NavigateOps<T: Timestamp> {
    fn before_trees(&mut self, forest: &StabForest<T>, value: T, mstart: Option<T>);
    fn after_trees(&mut self, forest: &StabForest<T>, value: T, mstart: Option<T>);
    fn left_child(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, mstart: Option<T>);
    fn right_child(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, mstart: Option<T>);
    fn select_node(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, mstart: Option<T>);
}

impl<T: Timestamp> StabForest<T> {
    /// Navigates the forest for `value`, dispatching on the three regimes.
    pub(crate) fn navigate<O: NavigateOps<T>>(&self, value: T, mstart: Option<T>, ops: &mut O) {
        if value <= self.min_key {
            ops.before_trees(self, value, mstart);
        } else if self.index.last().is_some_and(|fp| value <= fp.node.dkey) {
            self.navigate_from(NodeRef::Point(0), value, mstart, ops);
        } else {
            ops.after_trees(self, value, mstart);
        }
    }

    /// Descends from `start` to the node whose window contains `value`.
    ///
    /// The caller guarantees such a node exists below `start` (i.e. the
    /// value is covered by the index and at-or-after the subtree).
    pub(crate) fn navigate_from<O: NavigateOps<T>>(
        &self,
        start: NodeRef,
        value: T,
        mstart: Option<T>,
        ops: &mut O,
    ) {
        let mut at = start;

        loop {
            let node = self.node(at);

            if node.nkey <= value && value <= node.dkey {
                ops.select_node(self, at, value, mstart);
                return;
            }

            if value < node.nkey {
                ops.left_child(self, at, value, mstart);
                at = self.left_of(at).expect("left descent should have a child");
            } else {
                ops.right_child(self, at, value, mstart);
                at = self
                    .right_of(at)
                    .expect("right descent should have a child");
            }
        }
    }
}

/// Copies events from an ascending `(start, end)` list, starting at `idx`,
/// while their start is at most `value`; events starting before `mstart` are
/// skipped. Returns the index of the first event not copied.
pub(crate) fn copy_start_asc<T: Timestamp, S: EventSink<T>>(
    items: &[Interval<T>],
    mut idx: usize,
    value: T,
    mstart: Option<T>,
    out: &mut S,
) -> usize {
    if let Some(m) = mstart {
        while let Some(item) = items.get(idx) {
            if item.start >= m {
                break;
            }
            idx += 1;
        }
    }

    while let Some(item) = items.get(idx) {
        if item.start > value {
            break;
        }
        out.emit(*item);
        idx += 1;
    }

    idx
}

/// Copies events from a descending-end list while their end is at least
/// `value`; events starting before `mstart` are passed over without being
/// emitted.
pub(crate) fn copy_end_desc<T: Timestamp, S: EventSink<T>>(
    items: &[Interval<T>],
    value: T,
    mstart: Option<T>,
    out: &mut S,
) {
    for item in items {
        if item.end < value {
            break;
        }
        if mstart.is_none_or(|m| m <= item.start) {
            out.emit(*item);
        }
    }
}

/// [`copy_end_desc`] over an ascending-end list walked back to front (the
/// event-list tail is one start-time run, so its ends ascend).
pub(crate) fn copy_end_desc_rev<T: Timestamp, S: EventSink<T>>(
    items: &[Interval<T>],
    value: T,
    mstart: Option<T>,
    out: &mut S,
) {
    for item in items.iter().rev() {
        if item.end < value {
            break;
        }
        if mstart.is_none_or(|m| m <= item.start) {
            out.emit(*item);
        }
    }
}

/// Navigation callbacks for the one-shot stab query.
pub(crate) struct StabOps<'a, S> {
    pub out: &'a mut S,
    pub next: EventPos,
}

impl<T: Timestamp, S: EventSink<T>> NavigateOps<T> for StabOps<'_, S> {
    fn before_trees(&mut self, forest: &StabForest<T>, value: T, _mstart: Option<T>) {
        self.next = copy_start_asc(forest.events_slice(), 0, value, None, self.out);
    }

    fn after_trees(&mut self, forest: &StabForest<T>, value: T, _mstart: Option<T>) {
        // All max-lists can still hold events alive at the value.
        for idx in 0..forest.index.len() {
            self.right_child(forest, NodeRef::Point(idx), value, None);
        }

        if forest.events.back().is_some_and(|back| value < back.start) {
            self.next = forest.tail;
        } else {
            let tail = forest.events.slice(forest.tail, forest.len());
            copy_end_desc_rev(tail, value, None, self.out);
            self.next = forest.len();
        }
    }

    fn left_child(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, _mstart: Option<T>) {
        let node = forest.node(at);
        copy_start_asc(node.left_list.nav_asc(), 0, value, None, self.out);
    }

    fn right_child(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, _mstart: Option<T>) {
        let node = forest.node(at);
        copy_end_desc(node.left_list.data_desc(), value, None, self.out);
        copy_end_desc(node.left_list.nav_desc(), value, None, self.out);
    }

    fn select_node(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, _mstart: Option<T>) {
        let node = forest.node(at);

        if value == node.dkey {
            copy_end_desc(node.left_list.data_desc(), value, None, self.out);
        }
        copy_end_desc(node.left_list.nav_desc(), value, None, self.out);

        self.next = if value < node.dkey {
            node.data_begin
        } else {
            node.data_end
        };
    }
}
