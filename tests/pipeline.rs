mod common;

use chrono::Utc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brief::services::digest::DigestService;
use brief::services::render::DigestRenderer;
use brief::services::rss::RssService;

use common::*;

fn service(config: brief::config::RunConfig, notifier: Option<Box<dyn brief::services::notify::Notifier>>) -> DigestService {
    let rss = RssService::new(config.fetch_timeout, config.fetch_concurrency).unwrap();
    DigestService::new(config, rss, DigestRenderer::new().unwrap(), notifier)
}

#[tokio::test]
async fn test_failed_feed_does_not_block_others() {
    let server = MockServer::start().await;
    let now = Utc::now();

    let feed1: Vec<_> = (1..=5)
        .map(|h| item(["a1", "a2", "a3", "a4", "a5"][h - 1], format!("https://one.example/{}", h), hours_ago(now, h as f64)))
        .collect();
    mount_feed(&server, "/one", rss_document(&feed1)).await;
    mount_failure(&server, "/two").await;
    mount_feed(
        &server,
        "/three",
        rss_document(&[
            item("c1", "https://three.example/1", hours_ago(now, 0.5)),
            item("c2", "https://three.example/2", hours_ago(now, 1.5)),
            item("c3", "https://three.example/3", hours_ago(now, 30.0)),
        ]),
    )
    .await;

    let feeds = vec![
        source(&server, "One", "/one"),
        source(&server, "Two", "/two"),
        source(&server, "Three", "/three"),
    ];
    let notifier = RecordingNotifier::default();
    let report = service(run_config(feeds, 24, 5), Some(Box::new(notifier.clone())))
        .run(now)
        .await
        .unwrap();

    assert_eq!(report.sources, 3);
    assert_eq!(report.failed_sources, 1);
    assert_eq!(report.fetched, 8);
    assert_eq!(report.in_window, 7);
    assert_eq!(report.items, 5);
    assert!(report.delivered);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].item_count, 5);
    assert_eq!(digest_titles(&sent[0]), vec!["c1", "a1", "c2", "a2", "a3"]);
    assert!(!sent[0].html.contains("c3"));
}

#[tokio::test]
async fn test_no_items_in_window_still_delivers() {
    let server = MockServer::start().await;
    let now = Utc::now();

    mount_feed(
        &server,
        "/old",
        rss_document(&[item("stale", "https://old.example/1", hours_ago(now, 48.0))]),
    )
    .await;
    mount_feed(&server, "/empty", rss_document(&[])).await;

    let feeds = vec![source(&server, "Old", "/old"), source(&server, "Empty", "/empty")];
    let notifier = RecordingNotifier::default();
    let report = service(run_config(feeds, 24, 5), Some(Box::new(notifier.clone())))
        .run(now)
        .await
        .unwrap();

    assert_eq!(report.items, 0);
    assert!(report.delivered);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_empty());
    assert!(sent[0].html.contains("No items today"));
}

#[tokio::test]
async fn test_all_feeds_failing_is_fatal() {
    let server = MockServer::start().await;
    mount_failure(&server, "/a").await;
    mount_failure(&server, "/b").await;

    let feeds = vec![source(&server, "A", "/a"), source(&server, "B", "/b")];
    let notifier = RecordingNotifier::default();
    let result = service(run_config(feeds, 24, 5), Some(Box::new(notifier.clone())))
        .run(Utc::now())
        .await;

    assert!(result.is_err());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_fails_the_run() {
    let server = MockServer::start().await;
    let now = Utc::now();
    mount_feed(
        &server,
        "/feed",
        rss_document(&[item("fresh", "https://x.example/1", hours_ago(now, 1.0))]),
    )
    .await;

    let feeds = vec![source(&server, "Feed", "/feed")];
    let err = service(run_config(feeds, 24, 5), Some(Box::new(FailingNotifier)))
        .run(now)
        .await
        .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("Failed to deliver digest via failing"));
    assert!(message.contains("Too Many Requests"));
}

#[tokio::test]
async fn test_duplicates_across_feeds_keep_first_feed() {
    let server = MockServer::start().await;
    let now = Utc::now();
    mount_feed(
        &server,
        "/first",
        rss_document(&[item("Shared story", "https://news.example/story?utm_source=first", hours_ago(now, 3.0))]),
    )
    .await;
    mount_feed(
        &server,
        "/second",
        rss_document(&[
            item("Shared story (mirror)", "https://news.example/story", hours_ago(now, 1.0)),
            item("shared   STORY", "https://mirror.example/copy", hours_ago(now, 2.0)),
            item("Own story", "https://second.example/own", hours_ago(now, 2.5)),
        ]),
    )
    .await;

    let feeds = vec![source(&server, "First", "/first"), source(&server, "Second", "/second")];
    let notifier = RecordingNotifier::default();
    let report = service(run_config(feeds, 24, 10), Some(Box::new(notifier.clone())))
        .run(now)
        .await
        .unwrap();

    assert_eq!(report.in_window, 4);
    assert_eq!(report.unique, 2);
    assert_eq!(digest_titles(&notifier.sent()[0]), vec!["Own story", "Shared story"]);
}

#[tokio::test]
async fn test_feed_markup_is_escaped_and_archived() {
    let server = MockServer::start().await;
    let now = Utc::now();
    mount_feed(
        &server,
        "/evil",
        rss_document(&[
            item("<script>alert(1)</script>", "https://evil.example/1", hours_ago(now, 1.0)),
            item("Tom & Jerry <3", "https://evil.example/2", hours_ago(now, 2.0)),
            item("Sneaky link", "javascript:alert(2)", hours_ago(now, 2.0)),
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("out/newsletter.html");

    let feeds = vec![source(&server, "Evil", "/evil")];
    let report = service(run_config(feeds, 24, 10), None)
        .with_archive(&archive)
        .run(now)
        .await
        .unwrap();

    assert!(!report.delivered);
    assert_eq!(report.items, 2);

    let html = std::fs::read_to_string(&archive).unwrap();
    assert!(!html.contains("<script>alert(1)"));
    assert!(!html.contains("javascript:"));
    assert!(html.contains("Tom &amp; Jerry &lt;3"));
}

#[tokio::test]
async fn test_slow_feed_times_out_in_isolation() {
    let server = MockServer::start().await;
    let now = Utc::now();
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(rss_document(&[item("late", "https://slow.example/1", now)]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_feed(
        &server,
        "/fast",
        rss_document(&[item("quick", "https://fast.example/1", hours_ago(now, 1.0))]),
    )
    .await;

    let feeds = vec![source(&server, "Slow", "/slow"), source(&server, "Fast", "/fast")];
    let mut config = run_config(feeds, 24, 10);
    config.fetch_timeout = Duration::from_secs(1);

    let notifier = RecordingNotifier::default();
    let report = service(config, Some(Box::new(notifier.clone()))).run(now).await.unwrap();

    assert_eq!(report.failed_sources, 1);
    assert_eq!(digest_titles(&notifier.sent()[0]), vec!["quick"]);
}
