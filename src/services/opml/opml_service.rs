use anyhow::{anyhow, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use url::Url;

use crate::models::FeedSource;

#[derive(Debug)]
struct OpmlOutline {
    text: Option<String>,
    xml_url: Option<String>,
}

/// Reads the feed list out of an OPML subscription export
///
/// Every `outline` element carrying an `xmlUrl` becomes a source, named by
/// its `text` (or `title`) attribute. Category outlines without `xmlUrl`
/// are skipped, their children are still read.
pub fn parse_opml(content: &str) -> Result<Vec<FeedSource>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut sources = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"outline" {
                    let outline = parse_outline(&e, &reader)?;
                    if let Some(xml_url) = outline.xml_url {
                        let url = Url::parse(&xml_url)
                            .map_err(|err| anyhow!("invalid xmlUrl {:?}: {}", xml_url, err))?;
                        let source = match outline.text {
                            Some(text) if !text.trim().is_empty() => FeedSource::new(text.trim(), url),
                            _ => FeedSource::from_url(url),
                        };
                        sources.push(source);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "Error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => (),
        }
        buf.clear();
    }

    Ok(sources)
}

fn parse_outline(e: &BytesStart, reader: &Reader<&[u8]>) -> Result<OpmlOutline> {
    let mut text = None;
    let mut title = None;
    let mut xml_url = None;

    for attr in e.attributes().flatten() {
        let value = attr.decode_and_unescape_value(reader)?.into_owned();
        match attr.key.as_ref() {
            b"text" => text = Some(value),
            b"title" => title = Some(value),
            b"xmlUrl" => xml_url = Some(value),
            _ => (),
        }
    }

    Ok(OpmlOutline {
        text: text.or(title),
        xml_url,
    })
}
