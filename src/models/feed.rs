use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A configured RSS/Atom feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    /// Display name of the feed, shown as the item source in the digest
    pub name: String,
    /// URL to the feed XML
    pub url: Url,
}

impl FeedSource {
    /// Creates a new feed source with the given name and URL
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }

    /// Creates a feed source named after the URL host
    ///
    /// Used for feed lists that only give bare URLs. Falls back to the
    /// full URL when the URL has no host.
    pub fn from_url(url: Url) -> Self {
        let name = url
            .host_str()
            .map(|host| host.trim_start_matches("www.").to_string())
            .unwrap_or_else(|| url.to_string());
        Self { name, url }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.url)
    }
}

/// Feed document format, as detected by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss0,
    Rss1,
    Rss2,
    Atom,
    Json,
}

impl FeedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rss0 => "rss0",
            Self::Rss1 => "rss1",
            Self::Rss2 => "rss2",
            Self::Atom => "atom",
            Self::Json => "json",
        }
    }
}

impl From<&feed_rs::model::FeedType> for FeedFormat {
    fn from(feed_type: &feed_rs::model::FeedType) -> Self {
        use feed_rs::model::FeedType;
        match feed_type {
            FeedType::RSS0 => Self::Rss0,
            FeedType::RSS1 => Self::Rss1,
            FeedType::RSS2 => Self::Rss2,
            FeedType::Atom => Self::Atom,
            FeedType::JSON => Self::Json,
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
