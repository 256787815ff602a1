use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::utils::{first_sentences, strip_html};

/// Number of summary sentences kept in the digest
const SUMMARY_SENTENCES: usize = 2;

/// One item parsed from a feed
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Title of the item, as published (may contain markup)
    pub title: String,
    /// Link to the item; always an http(s) URL
    pub link: Url,
    /// Publication date, if the feed gave one
    pub published: Option<DateTime<Utc>>,
    /// Name of the feed source this item came from
    pub source: String,
    /// Position of the source in the feed list
    pub source_index: usize,
    /// Summary or excerpt of the item
    pub summary: Option<String>,
}

impl Entry {
    pub fn new(title: impl Into<String>, link: Url, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link,
            published: None,
            source: source.into(),
            source_index: 0,
            summary: None,
        }
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_source_index(mut self, index: usize) -> Self {
        self.source_index = index;
        self
    }
}

/// An entry promoted into the rendered digest
///
/// Title and summary are plain text here; escaping is left to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestItem {
    pub title: String,
    pub link: String,
    pub source: String,
    pub summary: String,
    /// Formatted publication date, empty when unknown
    pub published: String,
}

impl From<&Entry> for DigestItem {
    fn from(entry: &Entry) -> Self {
        let title = strip_html(&entry.title);
        let summary = entry
            .summary
            .as_deref()
            .map(|s| first_sentences(&strip_html(s), SUMMARY_SENTENCES))
            .unwrap_or_default();

        Self {
            title: if title.is_empty() { "(untitled)".to_string() } else { title },
            link: entry.link.to_string(),
            source: entry.source.clone(),
            summary,
            published: entry
                .published
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}
