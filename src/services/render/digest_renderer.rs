use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::RenderError;
use crate::models::{Digest, DigestItem};
use crate::utils::format_datetime;

const TEMPLATE_NAME: &str = "digest";

/// Built-in digest template
pub const DEFAULT_TEMPLATE: &str = include_str!("../../../templates/digest.html.hbs");

/// Values every digest template has to place
pub const REQUIRED_SLOTS: [&str; 4] = ["title", "date", "items", "empty_message"];

/// Static parts of a digest that do not come from feeds
#[derive(Debug, Clone)]
pub struct DigestHeader {
    pub title: String,
    pub lookback_hours: u32,
}

#[derive(Serialize)]
struct TemplateData<'a> {
    title: &'a str,
    date: String,
    lookback_hours: u32,
    count: usize,
    items: &'a [DigestItem],
    empty_message: String,
}

/// Renders digest items into HTML and plain text
///
/// Rendering is pure: the same items, header and timestamp always give
/// the same output. Every value is HTML-escaped by the template engine.
pub struct DigestRenderer {
    registry: Handlebars<'static>,
}

impl DigestRenderer {
    pub fn new() -> Result<Self, RenderError> {
        Self::from_template(DEFAULT_TEMPLATE)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?;
        Self::from_template(&source)
            .with_context(|| format!("Unusable template: {}", path.display()))
    }

    pub fn from_template(source: &str) -> Result<Self, RenderError> {
        if has_raw_output(source) {
            return Err(RenderError::RawOutput);
        }
        let placed = top_level_slots(source);
        for slot in REQUIRED_SLOTS {
            if !placed.contains(&slot) {
                return Err(RenderError::MissingSlot(slot));
            }
        }

        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_template_string(TEMPLATE_NAME, source)?;
        Ok(Self { registry })
    }

    pub fn render(
        &self,
        header: &DigestHeader,
        items: &[DigestItem],
        generated_at: DateTime<Utc>,
    ) -> Result<Digest, RenderError> {
        let data = TemplateData {
            title: &header.title,
            date: format!("{} UTC", format_datetime(generated_at)),
            lookback_hours: header.lookback_hours,
            count: items.len(),
            items,
            empty_message: empty_message(header.lookback_hours),
        };

        let html = self.registry.render(TEMPLATE_NAME, &data)?;

        Ok(Digest {
            subject: format!("{} - {}", header.title, generated_at.format("%Y-%m-%d")),
            html,
            text: render_text(header, items),
            item_count: items.len(),
        })
    }
}

fn empty_message(lookback_hours: u32) -> String {
    format!("No items today: nothing new in the last {} hours.", lookback_hours)
}

/// Triple-stash `{{{x}}}`, `{{&x}}` and raw blocks `{{{{raw}}}}`, with or
/// without a `~` whitespace omitter
fn has_raw_output(source: &str) -> bool {
    Regex::new(r"\{\{~?\s*[{&]").map_or(true, |re| re.is_match(source))
}

/// Required slots a template reads in the top-level data context
///
/// Expressions inside an `each`/`with` body resolve against the item, so a
/// `{{title}}` there does not place the digest title. The `else` branch of
/// those blocks runs in the outer context again.
fn top_level_slots(source: &str) -> Vec<&'static str> {
    let (Ok(comments), Ok(tags)) = (
        Regex::new(r"(?s)\{\{~?!--.*?--~?\}\}|\{\{~?![^}]*\}\}"),
        Regex::new(r"\{\{~?\s*([#/]?)\s*([^\s}~()]+)(?:\s+([^\s}~()]+))?"),
    ) else {
        return Vec::new();
    };
    let source = comments.replace_all(source, "");

    let mut names: Vec<&str> = Vec::new();
    // One flag per open block: true while its body rebinds the context
    let mut blocks: Vec<bool> = Vec::new();
    for caps in tags.captures_iter(&source) {
        let sigil = caps.get(1).map_or("", |m| m.as_str());
        let head = caps.get(2).map_or("", |m| m.as_str());
        let top_level = !blocks.iter().any(|rebinds| *rebinds);

        match (sigil, head) {
            ("#", helper) => {
                if let (true, Some(arg)) = (top_level, caps.get(3)) {
                    names.push(arg.as_str());
                }
                blocks.push(matches!(helper, "each" | "with"));
            }
            ("/", _) => {
                blocks.pop();
            }
            (_, "else" | "^") => {
                if let Some(rebinds) = blocks.last_mut() {
                    *rebinds = false;
                }
            }
            (_, name) if top_level || name.starts_with("@root.") => names.push(name),
            _ => (),
        }
    }

    REQUIRED_SLOTS
        .into_iter()
        .filter(|slot| {
            names
                .iter()
                .any(|name| name == slot || name.strip_prefix("@root.") == Some(*slot))
        })
        .collect()
}

/// Plain-text rendition: a header line, then one block per item
pub fn render_text(header: &DigestHeader, items: &[DigestItem]) -> String {
    let mut text = format!("{}: {} items", header.title, items.len());
    if items.is_empty() {
        text.push_str("\n\n");
        text.push_str(&empty_message(header.lookback_hours));
        return text;
    }
    for item in items {
        text.push_str(&format!("\n\n• {}\n{}", item.title, item.link));
    }
    text
}
