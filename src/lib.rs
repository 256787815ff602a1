pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{ChannelConfig, MissingDatePolicy, RunConfig};
pub use error::{ConfigError, FetchError, NotifyError, RenderError};

// Re-export models
pub use models::{Digest, DigestItem, Entry, FeedFormat, FeedSource};

// Re-export services selectively
pub use services::{
    digest::{DigestService, RunReport},
    notify::{notifier_for, EmailNotifier, Notifier, TelegramNotifier},
    render::DigestRenderer,
    rss::RssService,
};
