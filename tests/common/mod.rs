#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brief::config::RunConfig;
use brief::error::NotifyError;
use brief::models::{Digest, FeedSource};
use brief::services::notify::Notifier;

/// One `<item>` of a generated RSS document
pub struct Item<'a> {
    pub title: &'a str,
    pub link: String,
    pub published: DateTime<Utc>,
}

pub fn item(title: &str, link: impl Into<String>, published: DateTime<Utc>) -> Item<'_> {
    Item {
        title,
        link: link.into(),
        published,
    }
}

pub fn hours_ago(now: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    now - Duration::seconds((hours * 3600.0) as i64)
}

/// Escapes text for an XML element body
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn rss_document(items: &[Item<'_>]) -> String {
    let body: String = items
        .iter()
        .map(|it| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate><description>About {}.</description></item>",
                xml_escape(it.title),
                xml_escape(&it.link),
                it.published.to_rfc2822(),
                xml_escape(it.title)
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Test</title><link>https://example.com</link><description>t</description>{}</channel></rss>"#,
        body
    )
}

pub async fn mount_feed(server: &MockServer, route: &str, document: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(document),
        )
        .mount(server)
        .await;
}

pub async fn mount_failure(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(server)
        .await;
}

pub fn source(server: &MockServer, name: &str, route: &str) -> FeedSource {
    FeedSource::new(name, Url::parse(&format!("{}{}", server.uri(), route)).unwrap())
}

pub fn run_config(feeds: Vec<FeedSource>, lookback_hours: u32, max_items: usize) -> RunConfig {
    let mut config = RunConfig::new(feeds, None);
    config.lookback_hours = lookback_hours;
    config.max_items = max_items;
    config.fetch_timeout = std::time::Duration::from_secs(5);
    config
}

/// Notifier that keeps every digest it is given
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Digest>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Digest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, digest: &Digest) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(digest.clone());
        Ok(())
    }
}

/// Notifier whose delivery always fails
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    fn channel(&self) -> &'static str {
        "failing"
    }

    async fn send(&self, _digest: &Digest) -> Result<(), NotifyError> {
        Err(NotifyError::Api {
            status: 429,
            description: "Too Many Requests: retry after 5".to_string(),
        })
    }
}

/// Titles of the items in a plain-text digest, in order
pub fn digest_titles(digest: &Digest) -> Vec<String> {
    digest
        .text
        .lines()
        .filter_map(|line| line.strip_prefix("• "))
        .map(str::to_string)
        .collect()
}
