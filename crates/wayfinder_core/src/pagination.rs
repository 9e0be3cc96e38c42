//! Cursor pagination over collections with a unique, totally ordered string key.
//!
//! A cursor is the key of the last item handed out. Resuming never returns an item whose key
//! is less than or equal to the cursor, so pages stay disjoint even if the cursor's own item was
//! deleted in between. Keys greater than everything seen so far are picked up by later pages.

use crate::model::DiscoveryDocument;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::ops::Bound;

/// Requested page size and resume point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    /// [`None`] returns everything from the resume point.
    pub limit: Option<NonZeroUsize>,
    pub cursor: Option<String>,
}

impl PaginationInfo {
    pub const NO_LIMIT: Self = Self {
        limit: None,
        cursor: None,
    };

    pub fn new(limit: Option<NonZeroUsize>, cursor: Option<String>) -> Self {
        Self { limit, cursor }
    }

    /// A first page of at most `limit` items. A zero limit means no limit.
    pub fn limited(limit: usize) -> Self {
        Self {
            limit: NonZeroUsize::new(limit),
            cursor: None,
        }
    }

    pub fn after(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

/// One slice of an ordered result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    /// [`None`] once the end of the stream is reached.
    pub cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            cursor: self.cursor,
        }
    }
}

/// Something addressable by a pagination key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }
}

impl Keyed for DiscoveryDocument {
    fn key(&self) -> &str {
        &self.shell_id
    }
}

impl<T> Keyed for (String, T) {
    fn key(&self) -> &str {
        &self.0
    }
}

/// Range bounds selecting every key strictly after `cursor`.
pub fn resume_bounds(cursor: Option<&str>) -> (Bound<&str>, Bound<&str>) {
    match cursor {
        Some(cursor) => (Bound::Excluded(cursor), Bound::Unbounded),
        None => (Bound::Unbounded, Bound::Unbounded),
    }
}

pub struct CursorPaginator;

impl CursorPaginator {
    /// Cuts a page from items that already start after the cursor, in ascending key order.
    ///
    /// This is the building block for backends that can seek, the iterator is consumed lazily
    /// and at most `limit + 1` items are pulled from it.
    pub fn page<T, I>(resumed: I, limit: Option<NonZeroUsize>) -> CursorPage<T>
    where
        T: Keyed,
        I: IntoIterator<Item = T>,
    {
        let mut resumed = resumed.into_iter();

        let Some(limit) = limit else {
            return CursorPage {
                items: resumed.collect(),
                cursor: None,
            };
        };

        let items: Vec<T> = resumed.by_ref().take(limit.get()).collect();
        let cursor = match (items.last(), resumed.next()) {
            (Some(last), Some(_)) => Some(last.key().to_owned()),
            _ => None,
        };

        CursorPage { items, cursor }
    }

    /// Pages through items in ascending key order, skipping everything up to the cursor.
    pub fn paginate<T, I>(sorted: I, info: &PaginationInfo) -> CursorPage<T>
    where
        T: Keyed,
        I: IntoIterator<Item = T>,
    {
        let cursor = info.cursor();
        let resumed = sorted
            .into_iter()
            .skip_while(|item| cursor.is_some_and(|cursor| item.key() <= cursor));

        Self::page(resumed, info.limit)
    }

    /// Seeks structurally into an ordered map.
    pub fn paginate_map<V: Clone>(
        map: &BTreeMap<String, V>,
        info: &PaginationInfo,
    ) -> CursorPage<V> {
        let resumed = map
            .range::<str, _>(resume_bounds(info.cursor()))
            .map(|(key, value)| (key.clone(), value.clone()));

        Self::page(resumed, info.limit).map(|(_, value)| value)
    }

    pub fn paginate_keys(keys: &BTreeSet<String>, info: &PaginationInfo) -> CursorPage<String> {
        let resumed = keys.range::<str, _>(resume_bounds(info.cursor())).cloned();

        Self::page(resumed, info.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> BTreeSet<String> {
        (0..n).map(|i| format!("aas-{i:03}")).collect()
    }

    fn drain(keys: &BTreeSet<String>, limit: usize) -> (Vec<String>, usize) {
        let mut info = PaginationInfo::limited(limit);
        let mut seen = Vec::new();
        let mut pages = 0;

        loop {
            let page = CursorPaginator::paginate_keys(keys, &info);
            pages += 1;
            assert!(page.items.len() <= limit);
            seen.extend(page.items);
            match page.cursor {
                Some(cursor) => info = info.after(Some(cursor)),
                None => break,
            }
        }

        (seen, pages)
    }

    #[test]
    fn every_page_size_yields_the_full_set_once() {
        let all = keys(23);
        let expected: Vec<String> = all.iter().cloned().collect();

        for limit in 1..=all.len() {
            let (seen, pages) = drain(&all, limit);

            assert_eq!(seen, expected, "page size {limit}");
            assert_eq!(pages, all.len().div_ceil(limit), "page size {limit}");
        }
    }

    #[test]
    fn last_full_page_has_no_cursor() {
        let page = CursorPaginator::paginate_keys(&keys(4), &PaginationInfo::limited(4));

        assert_eq!(page.items.len(), 4);
        assert!(page.is_last());
    }

    #[test]
    fn no_limit_returns_everything_from_resume_point() {
        let info = PaginationInfo::NO_LIMIT.after(Some("aas-001".into()));
        let page = CursorPaginator::paginate_keys(&keys(4), &info);

        assert_eq!(page.items, vec!["aas-002", "aas-003"]);
        assert!(page.is_last());
    }

    #[test]
    fn resumes_after_a_deleted_cursor_key() {
        let mut all = keys(6);
        let first = CursorPaginator::paginate_keys(&all, &PaginationInfo::limited(2));
        assert_eq!(first.cursor.as_deref(), Some("aas-001"));

        all.remove("aas-001");
        let second =
            CursorPaginator::paginate_keys(&all, &PaginationInfo::limited(2).after(first.cursor));

        assert_eq!(second.items, vec!["aas-002", "aas-003"]);
    }

    #[test]
    fn cursor_between_keys_resumes_at_next_greater() {
        let info = PaginationInfo::limited(1).after(Some("aas-0015".into()));
        let page = CursorPaginator::paginate_keys(&keys(4), &info);

        assert_eq!(page.items, vec!["aas-002"]);
        assert_eq!(page.cursor.as_deref(), Some("aas-002"));
    }

    #[test]
    fn cursor_past_the_end_yields_empty_last_page() {
        let info = PaginationInfo::limited(3).after(Some("zzz".into()));
        let page = CursorPaginator::paginate_keys(&keys(4), &info);

        assert!(page.items.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn later_insertions_past_the_cursor_are_picked_up() {
        let mut all = keys(3);
        let first = CursorPaginator::paginate_keys(&all, &PaginationInfo::limited(2));

        all.insert("aas-999".into());
        let rest = CursorPaginator::paginate_keys(&all, &PaginationInfo::NO_LIMIT.after(first.cursor));

        assert_eq!(rest.items, vec!["aas-002", "aas-999"]);
    }

    #[test]
    fn map_and_linear_paths_agree() {
        let map: BTreeMap<String, usize> = keys(9)
            .into_iter()
            .enumerate()
            .map(|(i, key)| (key, i))
            .collect();
        let info = PaginationInfo::limited(4).after(Some("aas-002".into()));

        let seek = CursorPaginator::paginate_map(&map, &info);
        let scan = CursorPaginator::paginate(map.clone(), &info).map(|(_, value)| value);

        assert_eq!(seek, scan);
        assert_eq!(seek.items, vec![3, 4, 5, 6]);
        assert_eq!(seek.cursor.as_deref(), Some("aas-006"));
    }

    #[test]
    fn zero_limit_means_unbounded() {
        assert_eq!(PaginationInfo::limited(0), PaginationInfo::NO_LIMIT);
    }
}
