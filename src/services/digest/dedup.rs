use std::collections::HashSet;
use url::Url;

use crate::models::Entry;
use crate::utils::collapse_whitespace;

/// Removes entries that refer to the same item, keeping the first one
///
/// Two entries are the same item when their normalized links match, or
/// when their normalized titles match. Input is expected in feed-list
/// order, so the copy from the earliest feed wins.
pub fn dedupe(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen_links = HashSet::new();
    let mut seen_titles = HashSet::new();
    let mut unique = Vec::with_capacity(entries.len());

    for entry in entries {
        let link = normalize_link(&entry.link);
        let title = normalize_title(&entry.title);

        let duplicate = seen_links.contains(&link) || (!title.is_empty() && seen_titles.contains(&title));
        if duplicate {
            log::debug!("Dropping duplicate {} from {}", entry.link, entry.source);
            continue;
        }

        seen_links.insert(link);
        if !title.is_empty() {
            seen_titles.insert(title);
        }
        unique.push(entry);
    }

    unique
}

/// Canonical form of a link for comparison
///
/// Drops the fragment, `utm_*` query parameters and a trailing slash on
/// non-root paths. Scheme and host are already lowercase after parsing.
pub fn normalize_link(link: &Url) -> String {
    let mut url = link.clone();
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.to_ascii_lowercase().starts_with("utm_"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

/// Lowercases a title and collapses its whitespace
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(&title.to_lowercase())
}
