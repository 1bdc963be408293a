// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A K.I.S.S. implementation of stab-forests for fast temporal interval
//! joins.
//!
//! ##### About
//!
//! This crate exports a [`StabForest`]: an append-optimised index over an
//! event stream, where every event is a closed interval `[start, end]` over
//! an unsigned time domain and events arrive in `(start, end)` order.
//!
//! The forest answers two primitives:
//!
//! - **stab**: find every event active at a timestamp, in O(log n + k),
//! - **stab-forward**: a monotone cursor that jumps past events which
//!   cannot participate in a join.
//!
//! On top of the cursor sit three join drivers producing every overlapping
//! pair of two event streams: [`forward_scan`] (baseline sweep),
//! [`forward_skip_join`] (single-threaded, skipping) and [`parallel_join`]
//! (divide-and-conquer over a task runtime). Skipping pays off when join
//! selectivity is low: long irrelevant runs are jumped over instead of
//! scanned.
//!
//! Appending is amortised O(log n): each new start-time folds the open
//! event-list tail into a leaf forest-point, and forest-points of equal
//! height merge until heights strictly descend, much like the levels of a
//! size-tiered index.
//!
//! # Example usage
//!
//! ```
//! use stab_forest::{forward_skip_join, JumpPolicy, StabForest};
//!
//! let mut lhs = StabForest::new();
//! lhs.append(0u32, 9)?;
//! lhs.append(4, 5)?;
//! lhs.append(20, 24)?;
//!
//! let mut rhs = StabForest::new();
//! rhs.append(5u32, 6)?;
//! rhs.append(30, 40)?;
//!
//! let mut pairs = Vec::new();
//! forward_skip_join(&lhs, &rhs, &mut pairs, JumpPolicy::Index, JumpPolicy::Index);
//!
//! // (0, 9) and (4, 5) both overlap (5, 6)
//! assert_eq!(2, pairs.len());
//!
//! // Stab queries return the active events plus a cursor position
//! let mut active = Vec::new();
//! let next = lhs.stab(4, &mut active);
//! assert_eq!(2, active.len());
//! assert_eq!(2, next); // first event starting after 4
//! #
//! # Ok::<(), stab_forest::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]

mod error;
mod event_list;
mod forest;
mod interval;
mod join;
mod left_list;
mod merge;
mod node;
mod policy;
mod runtime;
mod sink;

/// Result pair emitted by the join drivers
pub type EventPair<T> = (Interval<T>, Interval<T>);

pub use {
    error::{Error, Result},
    event_list::EventPos,
    forest::{cursor::StabForwardCursor, StabForest},
    interval::{Interval, Timestamp},
    join::{
        forward_scan::forward_scan,
        parallel::{parallel_join, parallel_join_with},
        skip_join::forward_skip_join,
        window::multi_window,
    },
    policy::JumpPolicy,
    runtime::TaskRuntime,
    sink::{EventSink, PairSink},
};
