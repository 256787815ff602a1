use chrono::Utc;
use feed_rs::parser;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::time::Duration;
use url::Url;

use crate::error::FetchError;
use crate::models::{Entry, FeedFormat, FeedSource};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Result of reading one feed source
#[derive(Debug)]
pub struct FetchOutcome {
    pub source: FeedSource,
    pub result: Result<Vec<Entry>, FetchError>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Entries of this source, or none if it failed
    pub fn into_entries(self) -> Vec<Entry> {
        self.result.unwrap_or_default()
    }
}

/// Fetches feeds and parses them into entries
///
/// One HTTP client is shared by every fetch of a run; each request is
/// bounded by the client timeout.
pub struct RssService {
    client: reqwest::Client,
    concurrency: usize,
}

impl RssService {
    pub fn new(timeout: Duration, concurrency: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(client, concurrency))
    }

    pub fn with_client(client: reqwest::Client, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetches all sources, keeping the feed-list order in the result
    ///
    /// A source that fails is logged and reported in its outcome; it never
    /// affects the other sources. Each source is attempted once.
    pub async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<FetchOutcome> {
        let outcomes: Vec<FetchOutcome> = stream::iter(sources.iter().enumerate())
            .map(|(index, source)| async move {
                let result = self.fetch_source(source, index).await;
                if let Err(e) = &result {
                    warn!("Failed to fetch feed {}: {}", source, e);
                }
                FetchOutcome {
                    source: source.clone(),
                    result,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let success_count = outcomes.iter().filter(|o| o.is_ok()).count();
        info!(
            "Feed fetch complete: {} successful, {} failed",
            success_count,
            outcomes.len() - success_count
        );
        outcomes
    }

    /// Fetches and parses one source; `index` is its feed-list position
    pub async fn fetch_source(&self, source: &FeedSource, index: usize) -> Result<Vec<Entry>, FetchError> {
        debug!("Fetching feed {}", source);
        let response = self.client.get(source.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content = response.bytes().await?;
        let entries = parse_entries(&content[..], source, index)?;
        debug!("Parsed {} entries from {}", entries.len(), source.name);
        Ok(entries)
    }
}

/// Parses a feed document of any supported format into entries
///
/// Entries without a usable http(s) link are dropped.
pub fn parse_entries(content: &[u8], source: &FeedSource, index: usize) -> Result<Vec<Entry>, FetchError> {
    let parsed = parser::parse(content)?;
    let format = FeedFormat::from(&parsed.feed_type);
    debug!("{} is a {} feed", source.name, format);

    let mut entries = Vec::with_capacity(parsed.entries.len());
    for entry in parsed.entries {
        let Some(link) = entry_link(&entry) else {
            debug!("Skipping entry {:?} from {}: no usable link", entry.id, source.name);
            continue;
        };

        entries.push(Entry {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            link,
            published: entry.published.or(entry.updated).map(|dt| dt.with_timezone(&Utc)),
            source: source.name.clone(),
            source_index: index,
            summary: entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body)),
        });
    }

    Ok(entries)
}

fn entry_link(entry: &feed_rs::model::Entry) -> Option<Url> {
    let preferred = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .or_else(|| Some(entry.id.trim().to_string()))?;

    let url = Url::parse(&preferred).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
