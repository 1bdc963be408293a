// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{Interval, Timestamp};

/// Per-node left-list storage (the max-list, for a forest-point).
///
/// Three logical views share one contiguous buffer to keep allocations per
/// node down and traversals cache-linear:
///
/// - the first `nav_len` entries are the navigation-key events, ascending
///   `(start, end)`,
/// - the next `len - nav_len` entries are the data-key events (the node's own
///   data run), descending end,
/// - the final `nav_len` entries repeat the navigation-key events, descending
///   end.
#[derive(Debug, Default)]
pub(crate) struct LeftList<T: Timestamp> {
    nav_len: usize,
    len: usize,
    items: Box<[Interval<T>]>,
}

impl<T: Timestamp> LeftList<T> {
    pub fn empty() -> Self {
        Self {
            nav_len: 0,
            len: 0,
            items: Box::default(),
        }
    }

    /// Assembles the buffer from its three views.
    ///
    /// `nav_asc` and `nav_desc` must hold the same events; `data_desc` and
    /// `nav_desc` must be in descending end order.
    pub fn from_parts(
        nav_asc: Vec<Interval<T>>,
        data_desc: Vec<Interval<T>>,
        nav_desc: Vec<Interval<T>>,
    ) -> Self {
        debug_assert_eq!(nav_asc.len(), nav_desc.len());

        let nav_len = nav_asc.len();
        let len = nav_len + data_desc.len();

        let mut items = Vec::with_capacity(len + nav_len);
        items.extend(nav_asc);
        items.extend(data_desc);
        items.extend(nav_desc);

        Self {
            nav_len,
            len,
            items: items.into_boxed_slice(),
        }
    }

    /// Number of distinct events held (navigation-key + data-key).
    pub fn event_count(&self) -> usize {
        self.len
    }

    /// Navigation-key view, ascending `(start, end)`.
    pub fn nav_asc(&self) -> &[Interval<T>] {
        self.items.get(..self.nav_len).unwrap_or_default()
    }

    /// Data-key view, descending end.
    pub fn data_desc(&self) -> &[Interval<T>] {
        self.items.get(self.nav_len..self.len).unwrap_or_default()
    }

    /// Navigation-key view, descending end.
    pub fn nav_desc(&self) -> &[Interval<T>] {
        self.items.get(self.len..).unwrap_or_default()
    }

    /// How many leading events of the data-key view are still alive at
    /// `key`.
    ///
    /// Merging forest-points splits both descending-end views here: the
    /// alive prefix climbs into the merged max-list, the dead remainder
    /// stays behind in the promoted root's left-list.
    pub fn data_alive_at(&self, key: T) -> usize {
        alive_prefix(self.data_desc(), key)
    }

    /// How many leading events of the descending-end navigation-key view
    /// are still alive at `key`.
    pub fn nav_alive_at(&self, key: T) -> usize {
        alive_prefix(self.nav_desc(), key)
    }
}

/// Length of the leading run of a descending-end view whose events end
/// at-or-after `key`.
fn alive_prefix<T: Timestamp>(view: &[Interval<T>], key: T) -> usize {
    let mut alive = 0;
    let mut rest = view.len();

    // Bisect on the end times; they only shrink along the view.
    while alive < rest {
        let probe = alive + (rest - alive) / 2;

        match view.get(probe) {
            Some(event) if event.end >= key => alive = probe + 1,
            _ => rest = probe,
        }
    }

    alive
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn iv(start: u32, end: u32) -> Interval<u32> {
        Interval::new(start, end)
    }

    #[test]
    fn left_list_views() {
        let list = LeftList::from_parts(
            vec![iv(0, 4), iv(1, 9)],
            vec![iv(5, 8), iv(5, 6)],
            vec![iv(1, 9), iv(0, 4)],
        );

        assert_eq!(4, list.event_count());
        assert_eq!(&[iv(0, 4), iv(1, 9)], list.nav_asc());
        assert_eq!(&[iv(5, 8), iv(5, 6)], list.data_desc());
        assert_eq!(&[iv(1, 9), iv(0, 4)], list.nav_desc());
    }

    #[test]
    fn left_list_empty() {
        let list = LeftList::<u32>::empty();

        assert_eq!(0, list.event_count());
        assert!(list.nav_asc().is_empty());
        assert!(list.data_desc().is_empty());
        assert!(list.nav_desc().is_empty());
        assert_eq!(0, list.data_alive_at(3));
        assert_eq!(0, list.nav_alive_at(3));
    }

    #[test]
    fn left_list_alive_split() {
        let list = LeftList::from_parts(
            vec![iv(0, 9), iv(1, 7), iv(2, 4), iv(3, 3)],
            vec![iv(5, 8), iv(5, 6), iv(5, 5)],
            vec![iv(0, 9), iv(1, 7), iv(2, 4), iv(3, 3)],
        );

        assert_eq!(2, list.data_alive_at(6));
        assert_eq!(2, list.nav_alive_at(5));

        // Everything alive, nothing alive, and the exact boundary.
        assert_eq!(3, list.data_alive_at(0));
        assert_eq!(0, list.data_alive_at(9));
        assert_eq!(3, list.data_alive_at(5));
        assert_eq!(4, list.nav_alive_at(3));
        assert_eq!(3, list.nav_alive_at(4));
    }

    #[test]
    fn left_list_alive_split_matches_scan() {
        // Long duplicate-heavy view against the linear definition.
        let ends = [40, 40, 40, 33, 25, 25, 19, 12, 12, 12, 12, 5, 1];
        let view: Vec<_> = ends.iter().map(|&end| iv(0, end)).collect();

        let list = LeftList::from_parts(Vec::new(), view.clone(), Vec::new());

        for key in 0..45u32 {
            let expected = view.iter().take_while(|e| e.end >= key).count();
            assert_eq!(expected, list.data_alive_at(key), "key {key}");
        }
    }
}
