use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;

use super::Notifier;
use crate::config::TelegramConfig;
use crate::error::NotifyError;
use crate::models::Digest;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Maximum length of one Telegram message, in characters
pub const MESSAGE_LIMIT: usize = 4096;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends the plain-text digest through the Telegram Bot API
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        Self::with_api_base(client, config, TELEGRAM_API_BASE)
    }

    pub fn with_api_base(client: reqwest::Client, config: TelegramConfig, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            config,
        }
    }

    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base,
            self.config.bot_token.expose()
        );

        // reqwest errors carry the request URL, which contains the token
        let resp = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.config.chat_id.expose(),
                "text": text,
                "disable_web_page_preview": true
            }))
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(parsed) if parsed.ok && status.is_success() => Ok(()),
            Ok(parsed) => Err(NotifyError::Api {
                status: status.as_u16(),
                description: parsed.description.unwrap_or_else(|| "no description".to_string()),
            }),
            Err(_) => Err(NotifyError::Api {
                status: status.as_u16(),
                description: body.chars().take(200).collect(),
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn channel(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, digest: &Digest) -> Result<(), NotifyError> {
        let chunks = split_message(&digest.text, MESSAGE_LIMIT);
        debug!(
            "Sending Telegram digest (token {}) in {} message(s)",
            self.config.bot_token.masked(),
            chunks.len()
        );

        for chunk in &chunks {
            self.send_message(chunk).await?;
        }

        info!("Telegram digest sent ({} items)", digest.item_count);
        Ok(())
    }
}

/// Splits text into messages of at most `limit` characters
///
/// Splits happen between blank-line separated blocks where possible; a
/// single block longer than `limit` is cut at character boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for block in text.split("\n\n") {
        let block_len = block.chars().count();
        let needed = if current.is_empty() { block_len } else { block_len + 2 };

        if current_len + needed <= limit {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(block);
            current_len += needed;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if block_len <= limit {
            current.push_str(block);
            current_len = block_len;
        } else {
            let chars: Vec<char> = block.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_message() {
        assert_eq!(split_message("a\n\nb", 100), vec!["a\n\nb".to_string()]);
    }

    #[test]
    fn test_split_on_block_boundaries() {
        let chunks = split_message("aaaa\n\nbbbb\n\ncccc", 10);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_oversized_block_is_cut() {
        let chunks = split_message(&"x".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), "x".repeat(25));
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text: Vec<String> = (0..500).map(|i| format!("• Item number {}\nhttps://example.com/{}", i, i)).collect();
        let chunks = split_message(&text.join("\n\n"), MESSAGE_LIMIT);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MESSAGE_LIMIT));
    }
}
