// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::event_list::EventPos;
use crate::left_list::LeftList;
use crate::Timestamp;

/// Index of a stab-tree node in the forest's node arena.
///
/// Nodes are allocated in start-time order, so consecutive ids are adjacent
/// in memory and in-order traversals of deep subtrees stay local.
pub(crate) type NodeId = usize;

/// A stab-tree node.
///
/// Invariant: for every node `M` in this node's subtree,
/// `nkey <= M.dkey <= dkey`, and the node answering a stab at `v` is the
/// unique descent terminator with `nkey <= v <= dkey`.
#[derive(Debug)]
pub(crate) struct Node<T: Timestamp> {
    /// Navigation key: one past the largest start-time in the left subtree.
    pub nkey: T,

    /// Data key: the start-time of this node's own data run.
    pub dkey: T,

    pub left: Option<NodeId>,
    pub right: Option<NodeId>,

    /// 0 for data leaves; overwritten when a leaf is promoted to an
    /// internal node during a forest-point merge.
    pub height: usize,

    /// First event with start-time `dkey`.
    pub data_begin: EventPos,

    /// One past the last event with start-time `dkey`.
    pub data_end: EventPos,

    /// Left-list; the max-list when this node data belongs to a
    /// forest-point.
    pub left_list: LeftList<T>,
}

/// A forest-point: the root cell of one stab-tree in the index.
///
/// The node's left-list is the max-list of the entire tree, and its
/// `left` child is the tree itself. `replacement` is the arena node that
/// takes this forest-point's place once it is merged into a taller tree;
/// reserving it up front keeps node allocation in start-time order.
#[derive(Debug)]
pub(crate) struct ForestPoint<T: Timestamp> {
    pub node: Node<T>,
    pub replacement: NodeId,
}

/// Either a stab-tree node or a forest-point; lets navigation treat the
/// forest-point chain and tree descent uniformly.
///
/// A forest-point's right sibling is the next forest-point in the index,
/// so no right pointer is stored for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeRef {
    /// Forest-point at the given position in the index.
    Point(usize),

    /// Node in the arena.
    Tree(NodeId),
}
