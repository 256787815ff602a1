//! Run configuration.
//!
//! Settings come from three layers, highest first: environment variables,
//! the feed list file, built-in defaults. Everything is resolved once,
//! before the pipeline starts, into an immutable [`RunConfig`].

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::models::FeedSource;
use crate::services::opml::parse_opml;

pub const DEFAULT_TITLE: &str = "Daily Tech & AI Brief";
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;
pub const DEFAULT_MAX_ITEMS: usize = 12;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// What the time window does with entries that carry no date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingDatePolicy {
    #[default]
    Include,
    Exclude,
}

impl FromStr for MissingDatePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            _ => Err(()),
        }
    }
}

/// A credential or private address that must never show up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short masked form, enough to tell two tokens apart
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 12 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        } else {
            "****".to_string()
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: Secret,
    pub chat_id: Secret,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: Secret,
    pub from: String,
    pub to: Secret,
}

/// The single delivery channel of a run
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelConfig {
    Telegram(TelegramConfig),
    Email(EmailConfig),
}

/// Immutable settings for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub title: String,
    pub lookback_hours: u32,
    pub max_items: usize,
    pub missing_date_policy: MissingDatePolicy,
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    pub feeds: Vec<FeedSource>,
    /// `None` only for dry runs, which never deliver
    pub channel: Option<ChannelConfig>,
}

impl RunConfig {
    pub fn new(feeds: Vec<FeedSource>, channel: Option<ChannelConfig>) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            max_items: DEFAULT_MAX_ITEMS,
            missing_date_policy: MissingDatePolicy::default(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            feeds,
            channel,
        }
    }

    /// Loads the feed list at `feeds_path` and layers the process
    /// environment over it
    pub fn load(feeds_path: &Path, require_channel: bool) -> Result<Self, ConfigError> {
        let file = FeedFile::read(feeds_path)?;
        Self::resolve(file, require_channel, |name| std::env::var(name).ok())
    }

    /// Resolves the final configuration from a parsed feed file and an
    /// environment lookup
    pub fn resolve<F>(file: FeedFile, require_channel: bool, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let mut config = Self::new(file.feeds, None);

        if let Some(title) = env("NEWSLETTER_TITLE").or(file.title) {
            config.title = title;
        }
        if let Some(hours) = parse_var(&env, "LOOKBACK_HOURS")?.or(file.lookback_hours) {
            config.lookback_hours = positive("LOOKBACK_HOURS", hours)?;
        }
        if let Some(max) = parse_var(&env, "MAX_ITEMS")?.or(file.max_items) {
            config.max_items = positive("MAX_ITEMS", max)?;
        }
        if let Some(policy) = env("MISSING_DATE_POLICY") {
            config.missing_date_policy = policy.parse().map_err(|_| ConfigError::Invalid {
                name: "MISSING_DATE_POLICY",
                value: policy,
            })?;
        }
        if let Some(secs) = parse_var::<u64, _>(&env, "FETCH_TIMEOUT_SECS")? {
            config.fetch_timeout = Duration::from_secs(positive("FETCH_TIMEOUT_SECS", secs)?);
        }
        if let Some(workers) = parse_var(&env, "FETCH_CONCURRENCY")? {
            config.fetch_concurrency = positive("FETCH_CONCURRENCY", workers)?;
        }

        if require_channel {
            config.channel = Some(channel_from_env(&env)?);
        }

        Ok(config)
    }

    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.lookback_hours))
    }
}

fn channel_from_env<F>(env: &F) -> Result<ChannelConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let channel = env("DIGEST_CHANNEL").unwrap_or_else(|| "telegram".to_string());
    match channel.trim().to_ascii_lowercase().as_str() {
        "telegram" => Ok(ChannelConfig::Telegram(TelegramConfig {
            bot_token: Secret::new(
                env("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?,
            ),
            chat_id: Secret::new(
                env("TELEGRAM_CHAT_ID").ok_or(ConfigError::Missing("TELEGRAM_CHAT_ID"))?,
            ),
        })),
        "email" => {
            let username = env("SMTP_USER").ok_or(ConfigError::Missing("SMTP_USER"))?;
            Ok(ChannelConfig::Email(EmailConfig {
                smtp_host: env("SMTP_HOST").ok_or(ConfigError::Missing("SMTP_HOST"))?,
                smtp_port: parse_var(env, "SMTP_PORT")?.unwrap_or(DEFAULT_SMTP_PORT),
                password: Secret::new(env("SMTP_PASS").ok_or(ConfigError::Missing("SMTP_PASS"))?),
                from: env("EMAIL_FROM").unwrap_or_else(|| username.clone()),
                to: Secret::new(env("EMAIL_TO").unwrap_or_else(|| username.clone())),
                username,
            }))
        }
        _ => Err(ConfigError::Invalid {
            name: "DIGEST_CHANNEL",
            value: channel,
        }),
    }
}

fn parse_var<T, F>(env: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    env(name)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}

fn positive<T>(name: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + ToString,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    }
}

/// Contents of the feed list file
#[derive(Debug, Clone, Default)]
pub struct FeedFile {
    pub feeds: Vec<FeedSource>,
    pub title: Option<String>,
    pub lookback_hours: Option<u32>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedSpec {
    Url(Url),
    Named { name: String, url: Url },
}

#[derive(Debug, Deserialize)]
struct RawFeedFile {
    #[serde(default)]
    feeds: Vec<FeedSpec>,
    title: Option<String>,
    lookback_hours: Option<u32>,
    max_items: Option<usize>,
}

impl FeedFile {
    /// Reads a YAML feed list, or an OPML export when the file ends in
    /// `.opml`
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_opml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("opml"));

        let file = if is_opml {
            let feeds = parse_opml(&content).map_err(|e| ConfigError::FeedList {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            Self {
                feeds,
                ..Self::default()
            }
        } else {
            Self::from_yaml(&content).map_err(|message| ConfigError::FeedList {
                path: path.to_path_buf(),
                message,
            })?
        };

        if file.feeds.is_empty() {
            return Err(ConfigError::NoFeeds(path.to_path_buf()));
        }
        for feed in &file.feeds {
            if !matches!(feed.url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedScheme(feed.url.to_string()));
            }
        }
        Ok(file)
    }

    pub fn from_yaml(content: &str) -> Result<Self, String> {
        let raw: RawFeedFile = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        let feeds = raw
            .feeds
            .into_iter()
            .map(|spec| match spec {
                FeedSpec::Url(url) => FeedSource::from_url(url),
                FeedSpec::Named { name, url } => FeedSource::new(name, url),
            })
            .collect();

        Ok(Self {
            feeds,
            title: raw.title,
            lookback_hours: raw.lookback_hours,
            max_items: raw.max_items,
        })
    }
}
