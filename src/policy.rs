// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Strategy a stab-forward cursor uses to jump past irrelevant events.
///
/// Policies only trade traversal cost; for the same inputs every policy
/// emits the same set of events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JumpPolicy {
    /// Advance through the event-list in place; never consults the index.
    ///
    /// O(k) in the scanned length.
    List,

    /// Delegate every jump to the index navigation.
    ///
    /// O(log n + k).
    Index,

    /// Scan the event-list when the jump target is near, otherwise use the
    /// index.
    ///
    /// The factor is multiplied by `max(1, index_height)` when a cursor is
    /// constructed to obtain the actual probe distance.
    Check(usize),
}

impl JumpPolicy {
    /// Resolves the policy's probe threshold against a forest's index
    /// height. `None` means the policy never probes (pure list or index).
    pub(crate) fn resolve_threshold(self, index_height: usize) -> usize {
        match self {
            Self::Check(factor) => factor * index_height.max(1),
            Self::List | Self::Index => 0,
        }
    }
}
