// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

pub(crate) mod cursor;
pub(crate) mod navigate;

use crate::event_list::{EventList, EventPos};
use crate::interval::cmp_end_desc;
use crate::left_list::LeftList;
use crate::merge::merge_three_way;
use crate::node::{ForestPoint, Node, NodeId, NodeRef};
use crate::{Error, EventSink, Interval, JumpPolicy, Timestamp};
use cursor::StabForwardCursor;
use navigate::StabOps;

/// An append-optimised index over an event stream, answering stab queries
/// in O(log n + k)
///
/// Events must be appended in non-decreasing `(start, end)` order. Every
/// append that introduces a new start-time folds the open event-list tail
/// into a fresh leaf forest-point; forest-points of equal height are then
/// merged until their heights strictly descend, like the levels of a
/// size-tiered index.
///
/// The forest owns all of its storage (event list, node arena, index);
/// nothing is freed before the forest itself is dropped, and no event is
/// mutated after insertion. Cursors borrow the forest and cannot outlive
/// it.
pub struct StabForest<T: Timestamp> {
    pub(crate) events: EventList<T>,

    /// Node arena; nodes are allocated in start-time order.
    pub(crate) nodes: Vec<Node<T>>,

    /// The forest-point list. Heights strictly descend after maintenance.
    pub(crate) index: Vec<ForestPoint<T>>,

    /// First event not yet covered by the index.
    pub(crate) tail: EventPos,

    /// Start-time of the first event, `T::MAX` while empty.
    pub(crate) min_key: T,
}

impl<T: Timestamp> Default for StabForest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Timestamp> StabForest<T> {
    /// Creates an empty stab-forest.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: EventList::new(),
            nodes: Vec::new(),
            index: Vec::new(),
            tail: 0,
            min_key: T::MAX,
        }
    }

    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnorderedAppend`] if the event precedes the last
    /// appended event in `(start, end)` order.
    ///
    /// # Panics
    ///
    /// Panics if `end < start`.
    pub fn append(&mut self, start: T, end: T) -> crate::Result<()> {
        self.append_interval(Interval::new(start, end))
    }

    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnorderedAppend`] if the event precedes the last
    /// appended event in `(start, end)` order.
    pub fn append_interval(&mut self, event: Interval<T>) -> crate::Result<()> {
        if let Some(last) = self.events.back() {
            if event < last {
                return Err(Error::UnorderedAppend);
            }

            if event.start != last.start {
                self.close_tail();
            }
            self.events.push(event);
        } else {
            self.min_key = event.start;
            self.events.push(event);
        }

        Ok(())
    }

    /// Number of events in the forest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the forest holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over all events in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Interval<T>> + '_ {
        self.events.iter()
    }

    /// Height of the index (0 while nothing is indexed).
    #[must_use]
    pub fn index_height(&self) -> usize {
        self.index.first().map_or(0, |fp| fp.node.height)
    }

    /// Performs a stab query: every event active at `value` (in walk order)
    /// is written to `out`, and the position of the first event with
    /// `start > value` is returned.
    pub fn stab<S: EventSink<T>>(&self, value: T, out: &mut S) -> EventPos {
        let mut ops = StabOps { out, next: 0 };
        self.navigate(value, None, &mut ops);
        ops.next
    }

    /// Creates a stab-forward cursor at the begin of the event list.
    ///
    /// The cursor supports repeated stab-forward operations on
    /// non-decreasing timestamps; see [`StabForwardCursor`].
    #[must_use]
    pub fn stab_forward_cursor(&self, policy: JumpPolicy) -> StabForwardCursor<'_, T> {
        self.cursor_at(0, policy)
    }

    /// Creates a stab-forward cursor at the given event position; used by
    /// the parallel join to stab within a range partition.
    pub(crate) fn cursor_at(&self, pos: EventPos, policy: JumpPolicy) -> StabForwardCursor<'_, T> {
        StabForwardCursor::new(self, pos, policy)
    }

    pub(crate) fn events_slice(&self) -> &[Interval<T>] {
        self.events.as_slice()
    }

    pub(crate) fn node(&self, at: NodeRef) -> &Node<T> {
        match at {
            NodeRef::Point(idx) => &self.index.get(idx).expect("forest-point should exist").node,
            NodeRef::Tree(id) => self.node_at(id),
        }
    }

    /// Left child of a node or forest-point.
    pub(crate) fn left_of(&self, at: NodeRef) -> Option<NodeRef> {
        self.node(at).left.map(NodeRef::Tree)
    }

    /// Right child of a node; for a forest-point, the next forest-point.
    pub(crate) fn right_of(&self, at: NodeRef) -> Option<NodeRef> {
        match at {
            NodeRef::Point(idx) => {
                if idx + 1 < self.index.len() {
                    Some(NodeRef::Point(idx + 1))
                } else {
                    None
                }
            }
            NodeRef::Tree(id) => self.node_at(id).right.map(NodeRef::Tree),
        }
    }

    fn node_at(&self, id: NodeId) -> &Node<T> {
        self.nodes.get(id).expect("node should exist")
    }

    fn node_at_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes.get_mut(id).expect("node should exist")
    }

    /// Folds the open event-list tail into a new leaf forest-point, then
    /// restores the strictly-descending height invariant.
    fn close_tail(&mut self) {
        let first = self.tail;
        let last = self.events.len();

        let key = self
            .events
            .get(first)
            .expect("tail should not be empty")
            .start;

        let nkey = self
            .index
            .last()
            .map_or(key, |fp| fp.node.dkey.successor());

        log::trace!("closing tail [{first}..{last}) into a leaf forest-point, dkey={key}");

        let leaf_id = self.nodes.len();
        self.nodes.push(Node {
            nkey,
            dkey: key,
            left: None,
            right: None,
            height: 0,
            data_begin: first,
            data_end: last,
            left_list: LeftList::empty(),
        });

        // The max-list of a leaf forest-point is its own data run; the run
        // is (start, end)-ordered, so reversing yields descending ends.
        let run_desc: Vec<_> = self.events.slice(first, last).iter().rev().copied().collect();

        self.index.push(ForestPoint {
            node: Node {
                nkey,
                dkey: key,
                left: None,
                right: None,
                height: 1,
                data_begin: first,
                data_end: last,
                left_list: LeftList::from_parts(Vec::new(), run_desc, Vec::new()),
            },
            replacement: leaf_id,
        });

        self.tail = last;
        self.maintain();
    }

    /// Merges the last two forest-points while their heights are equal.
    fn maintain(&mut self) {
        while self.index.len() >= 2 {
            let right_height = self
                .index
                .last()
                .map(|fp| fp.node.height)
                .expect("should exist");
            let left_height = self
                .index
                .get(self.index.len() - 2)
                .map(|fp| fp.node.height)
                .expect("should exist");

            if left_height != right_height {
                return;
            }

            log::trace!("merging forest-points of height {left_height}");
            self.merge_last_two();
        }
    }

    /// Merges the last two (equal-height) forest-points.
    ///
    /// The left tree's replacement node becomes the internal root of the
    /// merged tree; the right tree's replacement provides the merged
    /// forest-point's keys and data run, and stays reserved as the
    /// replacement for the next merge.
    fn merge_last_two(&mut self) {
        let right = self.index.pop().expect("merge needs two forest-points");
        let left = self.index.pop().expect("merge needs two forest-points");

        let root_id = left.replacement;
        let merged_height = left.node.height;

        {
            let left_child = left.node.left;
            let right_child = right.node.left;
            let root = self.node_at_mut(root_id);
            root.left = left_child;
            root.right = right_child;
            root.height = merged_height;
        }

        let fp_node_id = right.replacement;
        let fp_nkey = self.node_at(fp_node_id).nkey;

        // Split the left max-list at the merged forest-point's navigation
        // key: events still alive at fp_nkey move up into the merged
        // max-list, the rest becomes the root's left-list.
        let left_ml = &left.node.left_list;
        let data_keep = left_ml.data_alive_at(fp_nkey);
        let nav_keep = left_ml.nav_alive_at(fp_nkey);

        #[allow(clippy::indexing_slicing)]
        let (root_list, max_list) = {
            let root_nav_asc: Vec<_> = left_ml
                .nav_asc()
                .iter()
                .copied()
                .filter(|e| e.end < fp_nkey)
                .collect();
            let root_data = left_ml.data_desc()[data_keep..].to_vec();
            let root_nav_desc = left_ml.nav_desc()[nav_keep..].to_vec();

            let right_ml = &right.node.left_list;

            // Ascending view: surviving left navigation events, then the
            // left data run (reversed back to ascending ends), then the
            // right tree's events; starts are already in order across the
            // three groups.
            let mut ml_nav_asc: Vec<_> = left_ml
                .nav_asc()
                .iter()
                .copied()
                .filter(|e| e.end >= fp_nkey)
                .collect();
            ml_nav_asc.extend(left_ml.data_desc()[..data_keep].iter().rev().copied());
            ml_nav_asc.extend_from_slice(right_ml.nav_asc());

            let ml_data = right_ml.data_desc().to_vec();

            let ml_nav_desc = merge_three_way(
                &left_ml.nav_desc()[..nav_keep],
                &left_ml.data_desc()[..data_keep],
                right_ml.nav_desc(),
                cmp_end_desc,
            );

            (
                LeftList::from_parts(root_nav_asc, root_data, root_nav_desc),
                LeftList::from_parts(ml_nav_asc, ml_data, ml_nav_desc),
            )
        };

        log::trace!(
            "merged max-list holds {} events, root left-list {}",
            max_list.event_count(),
            root_list.event_count(),
        );

        self.node_at_mut(root_id).left_list = root_list;

        let fp_node = self.node_at(fp_node_id);
        self.index.push(ForestPoint {
            node: Node {
                nkey: fp_node.nkey,
                dkey: fp_node.dkey,
                left: Some(root_id),
                right: None,
                height: merged_height + 1,
                data_begin: fp_node.data_begin,
                data_end: fp_node.data_end,
                left_list: max_list,
            },
            replacement: fp_node_id,
        });
    }

    /// Validates the maintained invariants; panics on violation.
    ///
    /// Checks that forest-point heights strictly descend, that every
    /// max-list holds exactly its subtree's events still alive at the
    /// forest-point's navigation key, that all left-list views agree, and
    /// that the tail is consistent.
    #[doc(hidden)]
    #[allow(clippy::indexing_slicing)]
    pub fn check_invariants(&self) {
        let events = self.events.as_slice();

        assert!(
            events.windows(2).all(|w| w[0] <= w[1]),
            "event list must be (start, end)-ordered"
        );

        if let Some(first) = events.first() {
            assert_eq!(self.min_key, first.start, "min key must match first event");
        }

        assert_eq!(
            self.tail,
            self.index.last().map_or(0, |fp| fp.node.data_end),
            "tail must start after the last indexed event"
        );

        let tail = events.get(self.tail..).unwrap_or_default();
        assert!(
            tail.windows(2).all(|w| w[0].start == w[1].start),
            "tail must be a single start-time run"
        );

        let heights: Vec<_> = self.index.iter().map(|fp| fp.node.height).collect();
        assert!(
            heights.windows(2).all(|w| w[0] > w[1]),
            "forest-point heights must strictly descend: {heights:?}"
        );

        let mut subtree_begin = 0;
        for fp in &self.index {
            let node = &fp.node;
            self.check_left_list_views(node);

            let mut expected: Vec<_> = events
                .get(subtree_begin..node.data_end)
                .unwrap_or_default()
                .iter()
                .copied()
                .filter(|e| e.end >= node.nkey)
                .collect();

            let mut actual: Vec<_> = node
                .left_list
                .nav_asc()
                .iter()
                .chain(node.left_list.data_desc())
                .copied()
                .collect();

            expected.sort_unstable();
            actual.sort_unstable();
            assert_eq!(
                expected, actual,
                "max-list must hold the subtree events alive at nkey={}",
                node.nkey
            );

            if let Some(left) = node.left {
                self.check_subtree(left);
            }

            subtree_begin = node.data_end;
        }
    }

    #[allow(clippy::indexing_slicing)]
    fn check_subtree(&self, id: NodeId) {
        let node = self.node_at(id);

        assert!(node.nkey <= node.dkey, "node window must not be empty");
        assert!(node.data_begin <= node.data_end);
        self.check_left_list_views(node);

        for event in node.left_list.nav_asc() {
            assert!(
                event.start < node.nkey && event.end >= node.nkey,
                "navigation-key left-list holds left-subtree events alive at nkey"
            );
        }
        for event in node.left_list.data_desc() {
            assert!(
                event.start == node.dkey && event.end >= node.nkey,
                "data-key left-list holds the node's own run"
            );
        }

        if let Some(left) = node.left {
            assert!(self.node_at(left).dkey < node.nkey);
            self.check_subtree(left);
        }
        if let Some(right) = node.right {
            assert!(self.node_at(right).dkey > node.dkey);
            self.check_subtree(right);
        }
    }

    #[allow(clippy::indexing_slicing)]
    fn check_left_list_views(&self, node: &Node<T>) {
        let nav_asc = node.left_list.nav_asc();
        let nav_desc = node.left_list.nav_desc();

        assert!(nav_asc.windows(2).all(|w| w[0] <= w[1]));
        assert!(nav_desc.windows(2).all(|w| w[0].end >= w[1].end));
        assert!(node
            .left_list
            .data_desc()
            .windows(2)
            .all(|w| w[0].end >= w[1].end));

        let mut asc: Vec<_> = nav_asc.to_vec();
        let mut desc: Vec<_> = nav_desc.to_vec();
        asc.sort_unstable();
        desc.sort_unstable();
        assert_eq!(asc, desc, "navigation-key views must hold the same events");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    fn forest_of(events: &[(u32, u32)]) -> StabForest<u32> {
        let mut forest = StabForest::new();
        for &(start, end) in events {
            forest.append(start, end).unwrap();
        }
        forest
    }

    #[test]
    fn forest_append_rejects_unordered() {
        let mut forest = StabForest::new();
        forest.append(5u32, 10).unwrap();
        forest.append(5, 12).unwrap();

        assert_eq!(Err(Error::UnorderedAppend), forest.append(5, 11));
        assert_eq!(Err(Error::UnorderedAppend), forest.append(4, 20));

        // Duplicates are fine, appends are non-decreasing.
        forest.append(5, 12).unwrap();
        forest.append(6, 6).unwrap();
    }

    #[test]
    fn forest_heights_follow_binary_counter() {
        let mut forest = StabForest::new();

        for i in 0..64u32 {
            forest.append(i, i + 3).unwrap();
            forest.check_invariants();
        }

        // 63 closed runs: 32 + 16 + 8 + 4 + 2 + 1
        let heights: Vec<_> = forest.index.iter().map(|fp| fp.node.height).collect();
        assert_eq!(vec![6, 5, 4, 3, 2, 1], heights);
        assert_eq!(6, forest.index_height());
    }

    #[test]
    fn forest_tail_stays_open_for_repeated_starts() {
        let mut forest = StabForest::new();
        for end in 10..20u32 {
            forest.append(3, end).unwrap();
        }

        assert!(forest.index.is_empty());
        assert_eq!(0, forest.index_height());
        assert_eq!(10, forest.len());
        forest.check_invariants();
    }

    #[test]
    fn forest_stab_scenario() {
        // Scenario: stab into a mixed forest.
        let forest = forest_of(&[
            (0, 10),
            (1, 8),
            (1, 12),
            (2, 50),
            (3, 11),
            (12, 13),
            (13, 30),
        ]);
        forest.check_invariants();

        let mut hits = Vec::new();
        let next = forest.stab(12, &mut hits);

        hits.sort_unstable();
        assert_eq!(
            vec![
                Interval::new(1, 12),
                Interval::new(2, 50),
                Interval::new(12, 13),
            ],
            hits
        );
        assert_eq!(Some(Interval::new(13, 30)), forest.events.get(next));
    }

    #[test]
    fn forest_stab_before_all_events() {
        let forest = forest_of(&[(5, 10), (6, 8)]);

        let mut hits = Vec::new();
        let next = forest.stab(2, &mut hits);

        assert!(hits.is_empty());
        assert_eq!(0, next);
    }

    #[test]
    fn forest_stab_past_all_events() {
        let forest = forest_of(&[(0, 3), (1, 100), (2, 4)]);

        let mut hits = Vec::new();
        let next = forest.stab(99, &mut hits);

        assert_eq!(vec![Interval::new(1, 100)], hits);
        assert_eq!(forest.len(), next);
    }

    #[test]
    fn forest_stab_empty() {
        let forest = StabForest::<u32>::new();

        let mut hits = Vec::new();
        let next = forest.stab(7, &mut hits);

        assert!(hits.is_empty());
        assert_eq!(0, next);
    }

    #[test]
    fn forest_stab_oracle_exhaustive() {
        let events: Vec<(u32, u32)> = (0..48)
            .map(|i| (i, i + (i * 7) % 13))
            .collect();
        let forest = forest_of(&events);
        forest.check_invariants();

        for v in 0..70u32 {
            let mut hits = Vec::new();
            let next = forest.stab(v, &mut hits);

            let mut expected: Vec<_> = forest.iter().filter(|e| e.contains(v)).collect();
            hits.sort_unstable();
            expected.sort_unstable();
            assert_eq!(expected, hits, "stab({v})");

            let expected_next = forest
                .events_slice()
                .iter()
                .position(|e| e.start > v)
                .unwrap_or(forest.len());
            assert_eq!(expected_next, next, "cursor after stab({v})");
        }
    }
}
