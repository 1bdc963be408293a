// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::navigate::{copy_end_desc, copy_end_desc_rev, copy_start_asc, NavigateOps};
use super::StabForest;
use crate::event_list::EventPos;
use crate::node::NodeRef;
use crate::{EventSink, Interval, JumpPolicy, Timestamp};

/// A monotone forward cursor over a stab-forest.
///
/// Besides plain forward iteration, the cursor supports
/// [`StabForwardCursor::stab_forward`]: emit every event that is active at
/// the given timestamp and starts at-or-after the cursor, then jump to the
/// first event starting strictly after the timestamp. Successive calls must
/// use non-decreasing timestamps.
///
/// The cursor remembers how far into each visited node's left-list it got,
/// keyed by node height: along any descent path heights strictly decrease,
/// so no two live scratch entries collide. Left-lists that were partially
/// consumed on an earlier left branch are resumed, not restarted, when the
/// same node is revisited.
///
/// The cursor borrows the forest; the forest must not be appended to while
/// cursors are live (the borrow checker enforces this).
pub struct StabForwardCursor<'f, T: Timestamp> {
    forest: &'f StabForest<T>,

    /// Current position in the event list.
    pos: EventPos,

    policy: JumpPolicy,

    /// Resolved probe distance for [`JumpPolicy::Check`].
    threshold: usize,

    /// Whether the running stab-forward operation took a left branch yet.
    went_left: bool,

    /// First node at which the previous stab-forward went left; navigation
    /// resumes from here.
    first_left_parent: Option<NodeRef>,

    /// Nodes visited during the previous stab-forward, by height.
    visited: Box<[Option<NodeRef>]>,

    /// Per-height resume offsets into the ascending navigation-key
    /// left-lists.
    nav_offsets: Box<[usize]>,
}

impl<'f, T: Timestamp> StabForwardCursor<'f, T> {
    pub(crate) fn new(forest: &'f StabForest<T>, pos: EventPos, policy: JumpPolicy) -> Self {
        let scratch = if forest.index.is_empty() {
            0
        } else {
            forest.index_height() + 1
        };

        Self {
            forest,
            pos,
            policy,
            threshold: policy.resolve_threshold(forest.index_height()),
            went_left: false,
            first_left_parent: None,
            visited: vec![None; scratch].into_boxed_slice(),
            nav_offsets: vec![0; scratch].into_boxed_slice(),
        }
    }

    /// The event under the cursor, or `None` at the end.
    #[must_use]
    pub fn peek(&self) -> Option<Interval<T>> {
        self.forest.events.get(self.pos)
    }

    /// Moves to the next event.
    pub fn advance(&mut self) {
        if self.pos < self.forest.len() {
            self.pos += 1;
        }
    }

    /// Returns `true` if the cursor is past the last event.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos >= self.forest.len()
    }

    /// Current event-list position.
    #[must_use]
    pub fn position(&self) -> EventPos {
        self.pos
    }

    /// Emits every event active at `value` that starts at-or-after the
    /// cursor, then repositions the cursor at the first event with
    /// `start > value`.
    ///
    /// `value` must be at-or-after the previous stab-forward timestamp.
    pub fn stab_forward<S: EventSink<T>>(&mut self, value: T, out: &mut S) {
        match self.policy {
            JumpPolicy::List => self.list_stab_forward(value, out),
            JumpPolicy::Index => self.index_stab_forward(value, out),
            JumpPolicy::Check(_) => {
                let remaining = self.forest.len().saturating_sub(self.pos);

                // Scan when the end (or the target) is within the probe
                // distance; otherwise let the index jump.
                let probe_hit = self
                    .pos
                    .checked_add(self.threshold)
                    .and_then(|idx| self.forest.events_slice().get(idx))
                    .is_some_and(|probe| value <= probe.start);

                if remaining <= self.threshold || probe_hit {
                    self.list_stab_forward(value, out);
                } else {
                    self.index_stab_forward(value, out);
                }
            }
        }
    }

    /// Stab-forward by advancing through the event-list in place.
    fn list_stab_forward<S: EventSink<T>>(&mut self, value: T, out: &mut S) {
        while let Some(event) = self.forest.events.get(self.pos) {
            if event.start > value {
                break;
            }
            if value <= event.end {
                out.emit(event);
            }
            self.pos += 1;
        }
    }

    /// Stab-forward through the index, resuming from the first left parent
    /// of the previous operation when there is one.
    fn index_stab_forward<S: EventSink<T>>(&mut self, value: T, out: &mut S) {
        let Some(current) = self.peek() else {
            // Nothing at-or-after the cursor.
            return;
        };

        self.went_left = false;
        let forest = self.forest;

        match self.first_left_parent {
            None => {
                let mstart = (self.pos != 0).then_some(current.start);
                forest.navigate(value, mstart, &mut ForwardOps { cursor: self, out });
            }
            Some(parent) => {
                let mstart = Some(current.start);

                if forest.index.last().is_some_and(|fp| value <= fp.node.dkey) {
                    forest.navigate_from(parent, value, mstart, &mut ForwardOps { cursor: self, out });
                } else {
                    // The value left the indexed range for good; jump out.
                    ForwardOps { cursor: self, out }.after_trees(forest, value, mstart);
                }
            }
        }
    }
}

/// Adapter wiring a cursor and a sink into the navigation callbacks.
struct ForwardOps<'a, 'f, T: Timestamp, S> {
    cursor: &'a mut StabForwardCursor<'f, T>,
    out: &'a mut S,
}

impl<T: Timestamp, S: EventSink<T>> NavigateOps<T> for ForwardOps<'_, '_, T, S> {
    fn before_trees(&mut self, forest: &StabForest<T>, value: T, mstart: Option<T>) {
        self.cursor.pos = copy_start_asc(
            forest.events_slice(),
            self.cursor.pos,
            value,
            mstart,
            self.out,
        );
    }

    fn after_trees(&mut self, forest: &StabForest<T>, value: T, mstart: Option<T>) {
        if !forest.index.is_empty() {
            // Walk the remaining forest-points from the resume point (or
            // all of them on a first stab) and collect from their
            // max-lists.
            let mut walk = Some(self.cursor.first_left_parent.unwrap_or(NodeRef::Point(0)));

            while let Some(at) = walk {
                self.right_child(forest, at, value, mstart);
                walk = forest.right_of(at);
            }

            // Pin the resume point to the last forest-point so later stabs
            // do not traverse the whole index again.
            self.cursor.first_left_parent = Some(NodeRef::Point(forest.index.len() - 1));
        }

        if forest.events.back().is_some_and(|back| value < back.start) {
            self.cursor.pos = forest.tail;
        } else {
            let tail = forest.events.slice(forest.tail, forest.len());
            copy_end_desc_rev(tail, value, mstart, self.out);
            self.cursor.pos = forest.len();
        }
    }

    fn left_child(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, mstart: Option<T>) {
        if !self.cursor.went_left {
            self.cursor.went_left = true;
            self.cursor.first_left_parent = Some(at);
        }

        let node = forest.node(at);
        let height = node.height;

        let slot = self
            .cursor
            .visited
            .get_mut(height)
            .expect("scratch slot should exist");

        if *slot != Some(at) {
            *slot = Some(at);
            *self
                .cursor
                .nav_offsets
                .get_mut(height)
                .expect("scratch slot should exist") = 0;
        }

        let offset = self
            .cursor
            .nav_offsets
            .get_mut(height)
            .expect("scratch slot should exist");

        *offset = copy_start_asc(node.left_list.nav_asc(), *offset, value, mstart, self.out);
    }

    fn right_child(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, mstart: Option<T>) {
        let node = forest.node(at);

        *self
            .cursor
            .visited
            .get_mut(node.height)
            .expect("scratch slot should exist") = Some(at);

        match mstart {
            None => {
                copy_end_desc(node.left_list.data_desc(), value, None, self.out);
                copy_end_desc(node.left_list.nav_desc(), value, None, self.out);
            }
            Some(m) => {
                // A previous stab may have left either list partially
                // unread; the mstart filter keeps already-passed events
                // out. Lists that cannot start at-or-after the cursor are
                // skipped outright.
                if m <= node.dkey {
                    copy_end_desc(node.left_list.data_desc(), value, mstart, self.out);
                }
                if m < node.nkey {
                    copy_end_desc(node.left_list.nav_desc(), value, mstart, self.out);
                }
            }
        }
    }

    fn select_node(&mut self, forest: &StabForest<T>, at: NodeRef, value: T, mstart: Option<T>) {
        let node = forest.node(at);

        *self
            .cursor
            .visited
            .get_mut(node.height)
            .expect("scratch slot should exist") = Some(at);

        match mstart {
            None => {
                if value == node.dkey {
                    copy_end_desc(node.left_list.data_desc(), value, None, self.out);
                }
                copy_end_desc(node.left_list.nav_desc(), value, None, self.out);
            }
            Some(m) => {
                if value == node.dkey {
                    copy_end_desc(node.left_list.data_desc(), value, mstart, self.out);
                }
                if m < node.nkey {
                    copy_end_desc(node.left_list.nav_desc(), value, mstart, self.out);
                }
            }
        }

        self.cursor.pos = if value < node.dkey {
            node.data_begin
        } else {
            node.data_end
        };
    }
}
