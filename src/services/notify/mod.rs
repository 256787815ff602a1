//! Outbound delivery of a rendered digest.
//!
//! A run has exactly one channel. Delivery is attempted once; any failure
//! is returned to the caller and ends the run.

mod email;
mod telegram;

use async_trait::async_trait;

use crate::config::ChannelConfig;
use crate::error::NotifyError;
use crate::models::Digest;

pub use email::EmailNotifier;
pub use telegram::{split_message, TelegramNotifier, MESSAGE_LIMIT, TELEGRAM_API_BASE};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name for logs
    fn channel(&self) -> &'static str;

    async fn send(&self, digest: &Digest) -> Result<(), NotifyError>;
}

/// Builds the notifier for the configured channel
pub fn notifier_for(channel: &ChannelConfig, client: reqwest::Client) -> Box<dyn Notifier> {
    match channel {
        ChannelConfig::Telegram(config) => Box::new(TelegramNotifier::new(client, config.clone())),
        ChannelConfig::Email(config) => Box::new(EmailNotifier::new(config.clone())),
    }
}
