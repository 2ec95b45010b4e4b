// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::model::{Entry, Link};

/// Map RSS feed XML into the entry snapshot stored per feed.
///
/// Unparseable content yields an empty snapshot, indistinguishable from a
/// feed that currently has no items; downstream truncation and iteration
/// over zero entries are safe.
pub fn parse_entries(xml_bytes: &[u8]) -> Vec<Entry> {
    let Ok(channel) = rss::Channel::read_from(xml_bytes) else {
        return Vec::new();
    };

    channel.items().iter().map(entry_from_item).collect()
}

fn entry_from_item(item: &rss::Item) -> Entry {
    let title = item
        .title()
        .map(String::from)
        .unwrap_or_else(|| "Untitled Episode".to_string());

    let mut links = Vec::new();

    if let Some(page) = item.link() {
        links.push(Link {
            href: page.to_string(),
            mime_type: "text/html".to_string(),
        });
    }

    if let Some(enclosure) = item.enclosure() {
        links.push(Link {
            href: enclosure.url().to_string(),
            mime_type: enclosure.mime_type().to_string(),
        });
    }

    Entry { title, links }
}
