// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whole days a feed's last refresh may lag behind before it counts as stale
pub const STALE_AFTER_DAYS: i64 = 1;

/// MIME type of links treated as downloadable audio
pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";

/// One subscribed show.
///
/// The title doubles as the store key and the download subdirectory name;
/// no two stored feeds share one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub url: String,
    /// Snapshot of recent episodes, newest first, replaced wholesale on
    /// every refresh
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// Instant of the last successful refresh; `None` means never refreshed
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Feed {
    /// A freshly imported subscription: no entries, never refreshed
    pub fn subscription(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            entries: Vec::new(),
            last_updated: None,
        }
    }

    /// Whether this feed is due for a refresh at `now`
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.last_updated {
            None => true,
            Some(last_updated) => (now - last_updated).num_days() > STALE_AFTER_DAYS,
        }
    }
}

/// One episode within a feed's current snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Entry {
    /// The first audio link attached to this entry, if any
    pub fn audio_link(&self) -> Option<&Link> {
        self.links.iter().find(|l| l.mime_type == AUDIO_MIME_TYPE)
    }
}

/// A resource reference attached to an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}
