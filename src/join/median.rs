// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{Interval, Timestamp};

/// A start timestamp read at a partition offset; offsets before the range
/// read as minus infinity, offsets past it as plus infinity.
///
/// The derived ordering compares the variants in declaration order, so the
/// sentinels sort around every real timestamp without dedicated MIN/MAX
/// constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Endpoint<T: Timestamp> {
    NegInf,
    At(T),
    PosInf,
}

fn start_at<T: Timestamp>(events: &[Interval<T>], offset: isize) -> Endpoint<T> {
    if offset < 0 {
        return Endpoint::NegInf;
    }

    usize::try_from(offset)
        .ok()
        .and_then(|idx| events.get(idx))
        .map_or(Endpoint::PosInf, |event| Endpoint::At(event.start))
}

/// Returns a timestamp approximating the median of the combined start times
/// of two `(start, end)`-ordered event ranges.
///
/// Classical two-array median bisection in O(log(n + m)): the first phase
/// looks for the median inside `lhs`; if it does not converge there, the
/// phase is re-run with the sides swapped. If both phases fail the input
/// sizes are such that any start works, and the midpoint of the longer side
/// is returned.
///
/// Callers only use the result to split work; a tie between the sides may
/// resolve to either.
///
/// # Panics
///
/// Panics if both ranges are empty.
pub(crate) fn pseudo_median<T: Timestamp>(lhs: &[Interval<T>], rhs: &[Interval<T>]) -> T {
    if let Some(median) = median_phase(lhs, rhs) {
        return median;
    }
    if let Some(median) = median_phase(rhs, lhs) {
        return median;
    }

    let longer = if lhs.len() >= rhs.len() { lhs } else { rhs };
    longer
        .get(longer.len() / 2)
        .map(|event| event.start)
        .expect("median needs at least one event")
}

/// Searches for a partition of `a` ∪ `b` into halves such that the largest
/// start of the lower half comes from `a`; returns that start.
#[allow(clippy::cast_possible_wrap)]
fn median_phase<T: Timestamp>(a: &[Interval<T>], b: &[Interval<T>]) -> Option<T> {
    let half = (a.len() + b.len()) / 2;

    let mut lo = 0isize;
    let mut hi = a.len() as isize;

    while lo <= hi {
        // Take `i` elements from a and `j` from b into the lower half.
        let i = (lo + hi) / 2;
        let j = half as isize - i;

        if j < 0 {
            hi = i - 1;
            continue;
        }
        if j > b.len() as isize {
            lo = i + 1;
            continue;
        }

        let a_low = start_at(a, i - 1);
        let a_high = start_at(a, i);
        let b_low = start_at(b, j - 1);
        let b_high = start_at(b, j);

        if a_low > b_high {
            hi = i - 1;
        } else if b_low > a_high {
            lo = i + 1;
        } else if i > 0 && a_low >= b_low {
            let Endpoint::At(median) = a_low else {
                return None;
            };
            return Some(median);
        } else {
            // Valid partition, but the median sits in the other range.
            return None;
        }
    }

    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::pseudo_median;
    use crate::Interval;
    use test_log::test;

    fn points(starts: &[u32]) -> Vec<Interval<u32>> {
        starts.iter().map(|&s| Interval::new(s, s + 1)).collect()
    }

    /// Signed imbalance of the split: |{start <= m}| - |{start > m}|.
    fn imbalance(lhs: &[Interval<u32>], rhs: &[Interval<u32>], median: u32) -> i64 {
        let below = lhs
            .iter()
            .chain(rhs)
            .filter(|e| e.start <= median)
            .count() as i64;
        let total = (lhs.len() + rhs.len()) as i64;
        below - (total - below)
    }

    #[test]
    fn median_interleaved() {
        let lhs = points(&[0, 4, 10]);
        let rhs = points(&[2, 6, 12]);

        let median = pseudo_median(&lhs, &rhs);
        assert!(imbalance(&lhs, &rhs, median).abs() <= 1, "median {median}");
    }

    #[test]
    fn median_single_sided() {
        let lhs = points(&[1, 2, 3, 4, 5]);
        let rhs = points(&[]);

        let median = pseudo_median(&lhs, &rhs);
        assert!(imbalance(&lhs, &rhs, median).abs() <= 1, "median {median}");
    }

    #[test]
    fn median_singletons() {
        let lhs = points(&[7]);
        let rhs = points(&[3]);

        let median = pseudo_median(&lhs, &rhs);
        assert!((3..=7).contains(&median));
    }

    #[test]
    fn median_skewed_sides() {
        let lhs = points(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let rhs = points(&[100]);

        let median = pseudo_median(&lhs, &rhs);
        assert!(imbalance(&lhs, &rhs, median).abs() <= 1, "median {median}");
    }

    #[test]
    fn median_balanced_exhaustive() {
        // Distinct starts split evenly regardless of how they interleave.
        for mask in 0u32..256 {
            let mut lhs = Vec::new();
            let mut rhs = Vec::new();

            for bit in 0..8 {
                if mask & (1 << bit) == 0 {
                    lhs.push(bit);
                } else {
                    rhs.push(bit);
                }
            }

            if lhs.is_empty() && rhs.is_empty() {
                continue;
            }

            let lhs = points(&lhs);
            let rhs = points(&rhs);
            let median = pseudo_median(&lhs, &rhs);

            assert!(
                imbalance(&lhs, &rhs, median).abs() <= 1,
                "mask {mask:#b}, median {median}"
            );
        }
    }

    #[test]
    fn median_duplicate_starts_splits_work() {
        // With duplicates the balance bound does not hold; the median must
        // still be one of the input starts.
        let lhs = points(&[5, 5, 5, 5]);
        let rhs = points(&[5, 5]);

        assert_eq!(5, pseudo_median(&lhs, &rhs));
    }
}
