// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::median::pseudo_median;
use super::skip_join::partial_skip_join;
use super::{join_left_window, join_right_window};
use crate::event_list::EventPos;
use crate::runtime::{Task, TaskRuntime};
use crate::{Interval, JumpPolicy, PairSink, StabForest, Timestamp};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Pair<T> = (Interval<T>, Interval<T>);

/// Joins two event streams with a divide-and-conquer parallel skip-join on
/// a bounded pool of `n_threads` workers.
///
/// The streams are recursively partitioned `f` times by a pseudo-median
/// timestamp into roughly `2^f` independent skip-join tasks, plus
/// spill-over tasks for events crossing each split. The emitted pairs are
/// the concatenation of the per-task outputs in submission order; across
/// tasks the pair order is scheduling-dependent, so compare results as
/// multisets.
///
/// # Errors
///
/// Returns [`Error::TaskFailed`](crate::Error::TaskFailed) if a task
/// panicked.
pub fn parallel_join<T: Timestamp, S: PairSink<T>>(
    n_threads: usize,
    f: usize,
    lhs: &StabForest<T>,
    rhs: &StabForest<T>,
    out: &mut S,
    policy_l: JumpPolicy,
    policy_r: JumpPolicy,
) -> crate::Result<()> {
    parallel_join_with(
        &TaskRuntime::Pool(n_threads),
        f,
        lhs,
        rhs,
        out,
        policy_l,
        policy_r,
    )
}

/// [`parallel_join`] with an injected task runtime.
///
/// # Errors
///
/// Returns [`Error::TaskFailed`](crate::Error::TaskFailed) if a task
/// panicked.
pub fn parallel_join_with<T: Timestamp, S: PairSink<T>>(
    runtime: &TaskRuntime,
    f: usize,
    lhs: &StabForest<T>,
    rhs: &StabForest<T>,
    out: &mut S,
    policy_l: JumpPolicy,
    policy_r: JumpPolicy,
) -> crate::Result<()> {
    let results = TaskResults::new();

    runtime.execute(|submit| {
        recursive_join(
            f.max(1),
            lhs,
            rhs,
            (0, lhs.len()),
            (0, rhs.len()),
            policy_l,
            policy_r,
            &results,
            submit,
        );
    })?;

    for (lhs_event, rhs_event) in results.into_pairs() {
        out.emit(lhs_event, rhs_event);
    }

    Ok(())
}

/// Splits the ranges at a pseudo-median and recurses; at depth 1 the range
/// pair becomes a terminal skip-join task.
#[allow(clippy::too_many_arguments)]
fn recursive_join<'env, T: Timestamp>(
    f: usize,
    lhs: &'env StabForest<T>,
    rhs: &'env StabForest<T>,
    (la, lb): (EventPos, EventPos),
    (ra, rb): (EventPos, EventPos),
    policy_l: JumpPolicy,
    policy_r: JumpPolicy,
    results: &'env TaskResults<T>,
    submit: &dyn Fn(Task<'env>),
) {
    if la >= lb || ra >= rb {
        return;
    }

    if f <= 1 {
        let id = results.next_id();
        submit(Box::new(move || {
            let mut pairs = Vec::new();
            partial_skip_join(lhs, rhs, (la, lb), (ra, rb), policy_l, policy_r, &mut pairs);
            results.commit(id, pairs);
        }));
        return;
    }

    let left = lhs.events_slice();
    let right = rhs.events_slice();

    let median = pseudo_median(
        left.get(la..lb).unwrap_or_default(),
        right.get(ra..rb).unwrap_or_default(),
    );

    // Stab both ranges at the median: events starting at-or-before it but
    // still alive spill over the split; the cursors land right after it.
    // The range-restricted stab keeps events of outer partitions out.
    let mut spill_l = Vec::new();
    let mut lcursor = lhs.cursor_at(la, JumpPolicy::Index);
    lcursor.stab_forward(median, &mut spill_l);
    let lmid = lcursor.position();

    let mut spill_r = Vec::new();
    let mut rcursor = rhs.cursor_at(ra, JumpPolicy::Index);
    rcursor.stab_forward(median, &mut spill_r);
    let rmid = rcursor.position();

    log::trace!(
        "split depth {f} at {median}: lhs {la}..{lmid}..{lb} ({} spill), rhs {ra}..{rmid}..{rb} ({} spill)",
        spill_l.len(),
        spill_r.len(),
    );

    // Spill-over pairs: a spilled left event reaches every right event of
    // the high half that starts before it ends (and vice versa).
    if !spill_l.is_empty() && rmid < rb {
        let id = results.next_id();
        let high = right.get(rmid..rb).unwrap_or_default();
        submit(Box::new(move || {
            let mut pairs = Vec::new();
            for event in &spill_l {
                join_left_window(*event, high, &mut pairs);
            }
            results.commit(id, pairs);
        }));
    }

    if !spill_r.is_empty() && lmid < lb {
        let id = results.next_id();
        let high = left.get(lmid..lb).unwrap_or_default();
        submit(Box::new(move || {
            let mut pairs = Vec::new();
            for event in &spill_r {
                join_right_window(*event, high, &mut pairs);
            }
            results.commit(id, pairs);
        }));
    }

    recursive_join(
        f - 1,
        lhs,
        rhs,
        (la, lmid),
        (ra, rmid),
        policy_l,
        policy_r,
        results,
        submit,
    );
    recursive_join(
        f - 1,
        lhs,
        rhs,
        (lmid, lb),
        (rmid, rb),
        policy_l,
        policy_r,
        results,
        submit,
    );
}

/// Per-task output sinks, concatenated in submission order once the
/// runtime has joined.
struct TaskResults<T: Timestamp> {
    seq: AtomicUsize,
    slots: Mutex<Vec<(usize, Vec<Pair<T>>)>>,
}

impl<T: Timestamp> TaskResults<T> {
    fn new() -> Self {
        Self {
            seq: AtomicUsize::new(0),
            slots: Mutex::new(Vec::new()),
        }
    }

    fn next_id(&self) -> usize {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn commit(&self, id: usize, pairs: Vec<Pair<T>>) {
        self.slots
            .lock()
            .expect("result sink should not be poisoned")
            .push((id, pairs));
    }

    fn into_pairs(self) -> Vec<Pair<T>> {
        let mut slots = self
            .slots
            .into_inner()
            .expect("result sink should not be poisoned");

        slots.sort_unstable_by_key(|(id, _)| *id);
        slots.into_iter().flat_map(|(_, pairs)| pairs).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::forward_skip_join;
    use test_log::test;

    fn forest_of(events: &[(u32, u32)]) -> StabForest<u32> {
        let mut forest = StabForest::new();
        for &(start, end) in events {
            forest.append(start, end).unwrap();
        }
        forest
    }

    fn sorted(mut pairs: Vec<Pair<u32>>) -> Vec<Pair<u32>> {
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn parallel_equals_serial() {
        let events: Vec<(u32, u32)> = (0..100).map(|i| (i, i + 2)).collect();
        let lhs = forest_of(&events);
        let rhs = forest_of(&events);

        let mut serial = Vec::new();
        forward_skip_join(&lhs, &rhs, &mut serial, JumpPolicy::Index, JumpPolicy::Index);

        let mut parallel = Vec::new();
        parallel_join(
            4,
            3,
            &lhs,
            &rhs,
            &mut parallel,
            JumpPolicy::Index,
            JumpPolicy::Index,
        )
        .unwrap();

        assert_eq!(sorted(serial), sorted(parallel));
    }

    #[test]
    fn parallel_join_empty_sides() {
        let empty = StabForest::<u32>::new();
        let other = forest_of(&[(0, 5), (1, 2)]);

        let mut out = Vec::new();
        parallel_join(
            2,
            2,
            &empty,
            &other,
            &mut out,
            JumpPolicy::Index,
            JumpPolicy::Index,
        )
        .unwrap();
        parallel_join(
            2,
            2,
            &other,
            &empty,
            &mut out,
            JumpPolicy::Index,
            JumpPolicy::Index,
        )
        .unwrap();

        assert!(out.is_empty());
    }

    #[test]
    fn parallel_depth_one_is_a_single_task() {
        let lhs = forest_of(&[(0, 3), (2, 4)]);
        let rhs = forest_of(&[(1, 1), (5, 9)]);

        let mut expected = Vec::new();
        forward_skip_join(&lhs, &rhs, &mut expected, JumpPolicy::List, JumpPolicy::List);

        for f in [0, 1] {
            let mut out = Vec::new();
            parallel_join_with(
                &TaskRuntime::Inline,
                f,
                &lhs,
                &rhs,
                &mut out,
                JumpPolicy::List,
                JumpPolicy::List,
            )
            .unwrap();

            assert_eq!(sorted(expected.clone()), sorted(out));
        }
    }

    #[test]
    fn parallel_inline_is_deterministic() {
        let events: Vec<(u32, u32)> = (0..64).map(|i| (i / 2, i / 2 + (i % 7))).collect();
        let lhs = forest_of(&events);
        let rhs = forest_of(&events);

        let mut first = Vec::new();
        parallel_join_with(
            &TaskRuntime::Inline,
            3,
            &lhs,
            &rhs,
            &mut first,
            JumpPolicy::Check(2),
            JumpPolicy::Index,
        )
        .unwrap();

        let mut second = Vec::new();
        parallel_join_with(
            &TaskRuntime::Inline,
            3,
            &lhs,
            &rhs,
            &mut second,
            JumpPolicy::Check(2),
            JumpPolicy::Index,
        )
        .unwrap();

        // Identical order, not just identical multiset.
        assert_eq!(first, second);
    }
}
