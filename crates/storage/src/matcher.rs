//! Record/query matching and the page window
//!
//! [`matches`] is the reference predicate. The in-memory store uses it
//! directly; the durable store translates the same clauses into its own
//! filter (see [`crate::durable::filter`]).
//!
//! A record matches when every clause holds:
//!
//! 1. `level` equals the filter
//! 2. `resource_id`, `trace_id`, `span_id`, `commit` equal their filters
//! 3. `metadata["parentResourceId"]` (missing = "") equals the filter
//! 4. timestamp is not before `start_time` and not after `end_time`
//! 5. `message` contains the filter as a literal, case-sensitive substring
//!
//! An empty filter value matches everything. `regex_pattern` and
//! `full_text_search` are not evaluated here.

use logbook_core::{LogQuery, LogRecord, Pagination};

/// True if `record` satisfies every non-empty clause of `query`
pub fn matches(record: &LogRecord, query: &LogQuery) -> bool {
    matches_identity(record, query)
        && matches_time(record, query)
        && contains(&record.message, &query.message)
}

/// Equality clauses: level, ids, commit and parent resource id
pub(crate) fn matches_identity(record: &LogRecord, query: &LogQuery) -> bool {
    field_eq(&record.level, &query.level)
        && field_eq(&record.resource_id, &query.resource_id)
        && field_eq(&record.trace_id, &query.trace_id)
        && field_eq(&record.span_id, &query.span_id)
        && field_eq(&record.commit, &query.commit)
        && field_eq(record.parent_resource_id(), &query.parent_resource_id)
}

/// Inclusive time range clause
pub(crate) fn matches_time(record: &LogRecord, query: &LogQuery) -> bool {
    if let Some(start) = query.start_time {
        if record.timestamp < start {
            return false;
        }
    }
    if let Some(end) = query.end_time {
        if record.timestamp > end {
            return false;
        }
    }
    true
}

#[inline]
fn field_eq(value: &str, filter: &str) -> bool {
    filter.is_empty() || value == filter
}

/// Case-sensitive substring test; an empty needle is always contained
pub fn contains(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.contains(needle)
}

/// Slice `items` down to one page
///
/// `start = (page - 1) * limit`, `end = start + limit` clamped to the input.
/// A start at or past the end yields an empty slice.
pub fn page_window<T>(items: &[T], window: Pagination) -> &[T] {
    let start = window.offset();
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(window.size()).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 9, 15, hour, minute, 0).unwrap()
    }

    fn sample() -> LogRecord {
        LogRecord::new("error", "Failed to connect to DB", ts(8, 0))
            .with_resource_id("server-1234")
            .with_trace_id("abc-xyz-123")
            .with_span_id("span-456")
            .with_commit("5e5342f")
            .with_parent_resource_id("server-0987")
    }

    /// A query with every filter set to the sample's values
    fn full_query() -> LogQuery {
        LogQuery::default()
            .with_level("error")
            .with_message("connect")
            .with_resource_id("server-1234")
            .with_trace_id("abc-xyz-123")
            .with_span_id("span-456")
            .with_commit("5e5342f")
            .with_parent_resource_id("server-0987")
            .with_time_range(Some(ts(8, 0)), Some(ts(8, 0)))
    }

    // ========================================
    // matches()
    // ========================================

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(matches(&sample(), &LogQuery::default()));
        assert!(matches(
            &LogRecord::new("", "", ts(0, 0)),
            &LogQuery::default()
        ));
    }

    #[test]
    fn test_full_query_matches() {
        assert!(matches(&sample(), &full_query()));
    }

    #[test]
    fn test_each_filter_is_independent() {
        let record = sample();
        let mismatches: Vec<(&str, LogQuery)> = vec![
            ("level", full_query().with_level("info")),
            ("message", full_query().with_message("timeout")),
            ("resource", full_query().with_resource_id("server-5678")),
            ("trace", full_query().with_trace_id("def-uvw-789")),
            ("span", full_query().with_span_id("span-789")),
            ("commit", full_query().with_commit("a1b2c3d")),
            ("parent", full_query().with_parent_resource_id("server-6543")),
            (
                "start",
                full_query().with_time_range(Some(ts(8, 1)), None),
            ),
            ("end", full_query().with_time_range(None, Some(ts(7, 59)))),
        ];

        for (name, query) in mismatches {
            assert!(!matches(&record, &query), "{} filter should reject", name);
        }
    }

    #[test]
    fn test_time_bounds_are_inclusive() {
        let record = sample();
        let exact = LogQuery::default().with_time_range(Some(ts(8, 0)), Some(ts(8, 0)));
        assert!(matches(&record, &exact));

        let open_end = LogQuery::default().with_time_range(Some(ts(7, 0)), None);
        assert!(matches(&record, &open_end));

        let open_start = LogQuery::default().with_time_range(None, Some(ts(9, 0)));
        assert!(matches(&record, &open_start));
    }

    #[test]
    fn test_missing_parent_resource_id_compares_as_empty() {
        let record = LogRecord::new("info", "no metadata", ts(8, 0));
        assert!(matches(&record, &LogQuery::default()));
        assert!(!matches(
            &record,
            &LogQuery::default().with_parent_resource_id("server-0987")
        ));
    }

    #[test]
    fn test_message_match_is_case_sensitive() {
        let record = sample();
        assert!(matches(&record, &LogQuery::default().with_message("Failed")));
        assert!(!matches(&record, &LogQuery::default().with_message("failed")));
    }

    #[test]
    fn test_regex_and_search_are_ignored() {
        let record = sample();
        let query = LogQuery::default()
            .with_regex("^nothing$")
            .with_search("absent words");
        assert!(matches(&record, &query));
    }

    // ========================================
    // contains()
    // ========================================

    #[test]
    fn test_contains() {
        let cases = [
            ("Failed to connect to DB", "Failed", true),
            ("User authentication successful", "Failed", false),
            ("Failed", "Failed", true),
            ("", "Failed", false),
            ("Failed to connect to DB", "", true),
            ("", "", true),
        ];

        for (s, substr, expected) in cases {
            assert_eq!(
                contains(s, substr),
                expected,
                "contains({:?}, {:?})",
                s,
                substr
            );
        }
    }

    // ========================================
    // page_window()
    // ========================================

    fn window(page: u64, limit: u64) -> Pagination {
        Pagination { page, limit }
    }

    #[test]
    fn test_page_window_basic() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(page_window(&items, window(1, 2)), &[1, 2]);
        assert_eq!(page_window(&items, window(2, 2)), &[3, 4]);
        assert_eq!(page_window(&items, window(3, 2)), &[5]);
        assert!(page_window(&items, window(4, 2)).is_empty());
    }

    #[test]
    fn test_page_window_empty_input() {
        let items: [u8; 0] = [];
        assert!(page_window(&items, window(1, 10)).is_empty());
    }

    #[test]
    fn test_page_window_huge_page() {
        let items = [1, 2, 3];
        assert!(page_window(&items, window(u64::MAX, u64::MAX)).is_empty());
    }

    proptest! {
        #[test]
        fn prop_last_page_holds_remainder(n in 1usize..200, limit in 1u64..50) {
            let items: Vec<usize> = (0..n).collect();
            let l = limit as usize;
            let last_page = ((n + l - 1) / l) as u64;
            let expected = if n % l == 0 { l } else { n % l };

            prop_assert_eq!(page_window(&items, window(last_page, limit)).len(), expected);
            prop_assert!(page_window(&items, window(last_page + 1, limit)).is_empty());
        }

        #[test]
        fn prop_pages_partition_input(n in 0usize..120, limit in 1u64..20) {
            let items: Vec<usize> = (0..n).collect();
            let mut seen = Vec::new();
            let mut page = 1;
            loop {
                let chunk = page_window(&items, window(page, limit));
                if chunk.is_empty() {
                    break;
                }
                seen.extend_from_slice(chunk);
                page += 1;
            }
            prop_assert_eq!(seen, items);
        }
    }
}
