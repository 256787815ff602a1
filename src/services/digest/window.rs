use chrono::{DateTime, Duration, Utc};

use crate::config::MissingDatePolicy;
use crate::models::Entry;

/// Keeps entries published within `lookback` before `now`
///
/// The boundary is inclusive: an entry exactly `lookback` old is kept.
/// Entries dated after `now` are kept as well. Undated entries follow
/// `policy`, the same way for every feed.
pub fn filter_window(
    entries: Vec<Entry>,
    lookback: Duration,
    now: DateTime<Utc>,
    policy: MissingDatePolicy,
) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|entry| match entry.published {
            Some(published) => now - published <= lookback,
            None => policy == MissingDatePolicy::Include,
        })
        .collect()
}
