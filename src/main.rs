use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use brief::config::RunConfig;
use brief::services::notify::notifier_for;
use brief::services::render::DigestRenderer;
use brief::services::rss::RssService;
use brief::services::digest::DigestService;

/// Builds a digest of recent feed items and delivers it once.
#[derive(Parser)]
#[command(name = "brief")]
#[command(version)]
struct Cli {
    /// Feed list: YAML, or OPML when the file ends in .opml
    #[arg(long, default_value = "feeds.yaml")]
    feeds: PathBuf,

    /// Handlebars template for the HTML digest (built-in if omitted)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Where to write the rendered HTML
    #[arg(long, default_value = "newsletter.html")]
    output: PathBuf,

    /// Render and write the digest, but do not deliver it
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = RunConfig::load(&cli.feeds, !cli.dry_run)
        .with_context(|| format!("Invalid configuration ({})", cli.feeds.display()))?;
    info!(
        "Building \"{}\" from {} feeds (last {} hours, max {} items)",
        config.title,
        config.feeds.len(),
        config.lookback_hours,
        config.max_items
    );

    let renderer = match &cli.template {
        Some(path) => DigestRenderer::from_file(path)?,
        None => DigestRenderer::new().context("Built-in template is unusable")?,
    };

    let rss_service = RssService::new(config.fetch_timeout, config.fetch_concurrency)
        .context("Failed to create HTTP client")?;

    let notifier = match &config.channel {
        Some(channel) => {
            let client = reqwest::Client::builder()
                .timeout(config.fetch_timeout)
                .build()
                .context("Failed to create HTTP client")?;
            Some(notifier_for(channel, client))
        }
        None => None,
    };

    let service = DigestService::new(config, rss_service, renderer, notifier).with_archive(cli.output);
    let report = service.run(Utc::now()).await?;

    info!(
        "Run complete: {} items from {}/{} feeds{}",
        report.items,
        report.sources - report.failed_sources,
        report.sources,
        if report.delivered { ", delivered" } else { "" }
    );
    Ok(())
}
