use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::OpmlError;

/// A feed subscription extracted from an OPML document.
///
/// One `<outline>` element with an `xmlUrl` attribute; the title falls back
/// to the `text` attribute, then to the URL itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub title: String,
    pub url: String,
}

/// Parse an OPML file from disk and extract its feed subscriptions
pub fn parse_opml(path: &Path) -> Result<Vec<Subscription>, OpmlError> {
    let content = std::fs::read_to_string(path).map_err(|e| OpmlError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_opml_content(&content)
}

/// Parse OPML content and extract feed subscriptions.
///
/// Outlines with an `xmlUrl` attribute become subscriptions regardless of
/// nesting depth; category/folder outlines are traversed but not returned.
pub fn parse_opml_content(content: &str) -> Result<Vec<Subscription>, OpmlError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut subscriptions = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) if e.name().as_ref() == b"outline" => {
                if let Some(subscription) = subscription_from_outline(&e, &reader)? {
                    subscriptions.push(subscription);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(OpmlError::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(subscriptions)
}

fn subscription_from_outline(
    e: &quick_xml::events::BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<Option<Subscription>, OpmlError> {
    let decoder = reader.decoder();

    let mut xml_url = None;
    let mut title = None;
    let mut text = None;

    for attr in e.attributes().flatten() {
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|e| OpmlError::XmlParse(e.to_string()))?
            .to_string();

        match attr.key.as_ref() {
            b"xmlUrl" => xml_url = Some(value),
            b"title" => title = Some(value),
            b"text" => text = Some(value),
            _ => {}
        }
    }

    Ok(xml_url.map(|url| Subscription {
        title: title.or(text).unwrap_or_else(|| url.clone()),
        url,
    }))
}
