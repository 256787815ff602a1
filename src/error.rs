use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors; all of them abort the run before any fetch
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read feed list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed feed list {path}: {message}")]
    FeedList { path: PathBuf, message: String },

    #[error("feed list {0} contains no feeds")]
    NoFeeds(PathBuf),

    #[error("unsupported feed URL scheme in {0} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Errors fetching or parsing a single feed; isolated to that feed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to parse feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// Errors turning digest items into a document
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("template uses unescaped output, which is not allowed for feed content")]
    RawOutput,

    #[error("template has no `{0}` slot")]
    MissingSlot(&'static str),

    #[error("failed to render digest: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Delivery errors; any of them fails the run
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error (HTTP {status}): {description}")]
    Api { status: u16, description: String },

    #[error("invalid e-mail address in {setting}: {source}")]
    Address {
        setting: &'static str,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build e-mail: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
