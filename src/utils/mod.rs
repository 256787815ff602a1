use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use scraper::Html;
use std::fs;
use std::path::Path;

/// Fallback summary length, in characters, when no sentence end is found
const FALLBACK_SUMMARY_CHARS: usize = 240;

pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Ensures that the directory for the given file path exists
///
/// This function extracts the directory part of a given file path
/// and creates it if it doesn't exist.
pub fn ensure_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduces an HTML fragment to its visible text
///
/// Entities are decoded, tags dropped, and whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Keeps the first `max_sentences` sentences of `text`
///
/// A sentence ends at `.`, `!` or `?`. Text without any sentence end is
/// cut to its first 240 characters instead.
pub fn first_sentences(text: &str, max_sentences: usize) -> String {
    if text.is_empty() || max_sentences == 0 {
        return String::new();
    }

    let mut parts = Vec::new();
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let end = i + ch.len_utf8();
            let part = text[start..end].trim();
            if !part.is_empty() {
                parts.push(part);
            }
            start = end;
            if parts.len() >= max_sentences {
                break;
            }
        }
    }

    if parts.is_empty() {
        return text
            .chars()
            .take(FALLBACK_SUMMARY_CHARS)
            .collect::<String>()
            .trim()
            .to_string();
    }
    parts.join(" ")
}
