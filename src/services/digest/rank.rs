use std::cmp::Ordering;

use crate::models::Entry;

/// Orders entries newest first and keeps at most `max_items`
///
/// Entries with the same timestamp are ordered by their feed's position in
/// the feed list, whatever order the fetches finished in; the sort is
/// stable within one feed. Undated entries sort after every dated one.
pub fn rank(mut entries: Vec<Entry>, max_items: usize) -> Vec<Entry> {
    entries.sort_by(|a, b| {
        let by_date = match (a.published, b.published) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then(a.source_index.cmp(&b.source_index))
    });
    entries.truncate(max_items);
    entries
}
