use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use std::fs;
use std::path::PathBuf;

use super::{dedupe, filter_window, rank};
use crate::config::RunConfig;
use crate::models::{Digest, DigestItem};
use crate::services::notify::Notifier;
use crate::services::render::{DigestHeader, DigestRenderer};
use crate::services::rss::RssService;
use crate::utils::ensure_directory_exists;

/// Counts from one run, for the closing log line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sources: usize,
    pub failed_sources: usize,
    pub fetched: usize,
    pub in_window: usize,
    pub unique: usize,
    pub items: usize,
    pub delivered: bool,
}

/// Runs the whole pipeline once
///
/// Everything a run needs is owned here and dropped with it.
pub struct DigestService {
    config: RunConfig,
    rss_service: RssService,
    renderer: DigestRenderer,
    notifier: Option<Box<dyn Notifier>>,
    archive_path: Option<PathBuf>,
}

impl DigestService {
    /// Without a notifier the run renders (and archives) but delivers nothing
    pub fn new(
        config: RunConfig,
        rss_service: RssService,
        renderer: DigestRenderer,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            config,
            rss_service,
            renderer,
            notifier,
            archive_path: None,
        }
    }

    /// Also writes the rendered HTML to `path` before delivery
    pub fn with_archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_path = Some(path.into());
        self
    }

    /// Fetches, filters and renders the digest as of `now`
    pub async fn build_digest(&self, now: DateTime<Utc>) -> Result<(Digest, RunReport)> {
        let mut report = RunReport {
            sources: self.config.feeds.len(),
            ..RunReport::default()
        };

        let outcomes = self.rss_service.fetch_all(&self.config.feeds).await;
        report.failed_sources = outcomes.iter().filter(|o| !o.is_ok()).count();
        if !outcomes.is_empty() && report.failed_sources == outcomes.len() {
            bail!("All {} feeds failed to fetch; no digest produced", outcomes.len());
        }

        let pooled: Vec<_> = outcomes.into_iter().flat_map(|o| o.into_entries()).collect();
        report.fetched = pooled.len();

        let in_window = filter_window(
            pooled,
            self.config.lookback(),
            now,
            self.config.missing_date_policy,
        );
        report.in_window = in_window.len();

        let unique = dedupe(in_window);
        report.unique = unique.len();

        let ranked = rank(unique, self.config.max_items);
        let items: Vec<DigestItem> = ranked.iter().map(DigestItem::from).collect();
        report.items = items.len();

        info!(
            "{} entries fetched, {} in the last {} hours, {} unique, {} selected",
            report.fetched, report.in_window, self.config.lookback_hours, report.unique, report.items
        );

        let header = DigestHeader {
            title: self.config.title.clone(),
            lookback_hours: self.config.lookback_hours,
        };
        let digest = self
            .renderer
            .render(&header, &items, now)
            .context("Failed to render digest")?;

        Ok((digest, report))
    }

    /// Runs the pipeline and delivers the digest
    ///
    /// The run succeeds only when delivery succeeds (or when there is no
    /// notifier, for dry runs).
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let (digest, mut report) = self.build_digest(now).await?;

        if let Some(path) = &self.archive_path {
            ensure_directory_exists(path)?;
            fs::write(path, &digest.html)
                .with_context(|| format!("Failed to write digest archive: {}", path.display()))?;
            info!("Digest written to {}", path.display());
        }

        match &self.notifier {
            Some(notifier) => {
                notifier
                    .send(&digest)
                    .await
                    .with_context(|| format!("Failed to deliver digest via {}", notifier.channel()))?;
                report.delivered = true;
                info!("Digest delivered via {}", notifier.channel());
            }
            None => info!("Dry run: digest not delivered"),
        }

        Ok(report)
    }
}
