// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::cmp::Ordering;
use std::slice::Iter;

/// Merges three sorted lists into a single sorted list.
///
/// On equal elements (with respect to `cmp`), `first` precedes `second`
/// precedes `third`. Merging forest-points relies on this tie order: the
/// left tree's events come before the right tree's events, which keeps
/// max-lists stable.
pub fn merge_three_way<T, F>(first: &[T], second: &[T], third: &[T], cmp: F) -> Vec<T>
where
    T: Copy,
    F: Fn(&T, &T) -> Ordering,
{
    let mut out = Vec::with_capacity(first.len() + second.len() + third.len());

    let (mut a, mut b, mut c) = (first.iter(), second.iter(), third.iter());
    let (mut x, mut y, mut z) = (a.next(), b.next(), c.next());

    loop {
        let (Some(&xv), Some(&yv), Some(&zv)) = (x, y, z) else {
            break;
        };

        if cmp(&yv, &xv) == Ordering::Less {
            if cmp(&zv, &yv) == Ordering::Less {
                out.push(zv);
                z = c.next();
            } else {
                out.push(yv);
                y = b.next();
            }
        } else if cmp(&zv, &xv) == Ordering::Less {
            out.push(zv);
            z = c.next();
        } else {
            out.push(xv);
            x = a.next();
        }
    }

    // One list drained; finish with a stable two-way merge of the rest.
    if x.is_none() {
        merge_rest(y, b, z, c, &cmp, &mut out);
    } else if y.is_none() {
        merge_rest(x, a, z, c, &cmp, &mut out);
    } else {
        merge_rest(x, a, y, b, &cmp, &mut out);
    }

    out
}

fn merge_rest<'a, T, F>(
    mut p: Option<&'a T>,
    mut pi: Iter<'a, T>,
    mut q: Option<&'a T>,
    mut qi: Iter<'a, T>,
    cmp: &F,
    out: &mut Vec<T>,
) where
    T: Copy,
    F: Fn(&T, &T) -> Ordering,
{
    loop {
        match (p, q) {
            (Some(pv), Some(qv)) => {
                if cmp(qv, pv) == Ordering::Less {
                    out.push(*qv);
                    q = qi.next();
                } else {
                    out.push(*pv);
                    p = pi.next();
                }
            }
            (Some(pv), None) => {
                out.push(*pv);
                out.extend(pi.copied());
                return;
            }
            (None, Some(qv)) => {
                out.push(*qv);
                out.extend(qi.copied());
                return;
            }
            (None, None) => return,
        }
    }
}
