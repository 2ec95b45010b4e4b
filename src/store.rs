// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::feed::{Entry, Feed};

/// Persistent collection of [`Feed`] records, keyed by title.
///
/// Backed by a single JSON document holding a `feeds` collection. The file
/// is pretty-printed and kept sorted by title so consecutive runs diff
/// cleanly. Single-writer access is assumed; every mutation rewrites the
/// document atomically via a temp file and rename.
pub struct FeedStore {
    path: PathBuf,
    feeds: Vec<Feed>,
}

#[derive(Deserialize, Default)]
struct Document {
    #[serde(default)]
    feeds: Vec<Feed>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    feeds: &'a [Feed],
}

impl FeedStore {
    /// Open the store at `path`. A missing file yields an empty store;
    /// nothing is written until the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let feeds = if path.exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|e| StoreError::ReadFailed {
                    path: path.clone(),
                    source: e,
                })?;

            let document: Document =
                serde_json::from_str(&content).map_err(|e| StoreError::ParseFailed {
                    path: path.clone(),
                    source: e,
                })?;

            document.feeds
        } else {
            Vec::new()
        };

        Ok(Self { path, feeds })
    }

    /// Snapshot of every stored feed
    pub fn all(&self) -> &[Feed] {
        &self.feeds
    }

    /// The stored feed with this title, if any
    pub fn get(&self, title: &str) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.title == title)
    }

    /// Feeds due for a refresh at `now`: never refreshed, or last refreshed
    /// more than the staleness threshold ago
    pub fn stale(&self, now: DateTime<Utc>) -> Vec<Feed> {
        self.feeds
            .iter()
            .filter(|f| f.is_stale(now))
            .cloned()
            .collect()
    }

    /// Insert `feed`, or replace the stored record sharing its title
    /// wholesale
    pub fn upsert(&mut self, feed: Feed) -> Result<(), StoreError> {
        match self.feeds.iter_mut().find(|f| f.title == feed.title) {
            Some(existing) => *existing = feed,
            None => self.feeds.push(feed),
        }

        self.save()
    }

    /// Replace the entry snapshot and refresh timestamp of the feed with
    /// this title. Returns `false`, without writing, when no record matches.
    pub fn update_entries(
        &mut self,
        title: &str,
        entries: Vec<Entry>,
        last_updated: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(feed) = self.feeds.iter_mut().find(|f| f.title == title) else {
            return Ok(false);
        };

        feed.entries = entries;
        feed.last_updated = Some(last_updated);

        self.save()?;
        Ok(true)
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.feeds.sort_by(|a, b| a.title.cmp(&b.title));

        let json = serde_json::to_string_pretty(&DocumentRef { feeds: &self.feeds })
            .map_err(StoreError::SerializeFailed)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let temp_path = temp_path_for(&self.path);

        std::fs::write(&temp_path, json).map_err(|e| StoreError::WriteFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| StoreError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Link;
    use chrono::Duration;
    use tempfile::tempdir;

    fn make_entry(title: &str) -> Entry {
        Entry {
            title: title.to_string(),
            links: vec![Link {
                href: format!("https://example.com/{title}.mp3"),
                mime_type: "audio/mpeg".to_string(),
            }],
        }
    }

    #[test]
    fn open_missing_file_yields_empty_store() {
        let dir = tempdir().unwrap();
        let store = FeedStore::open(dir.path().join("feeds.json")).unwrap();

        assert!(store.all().is_empty());
        assert!(!dir.path().join("feeds.json").exists());
    }

    #[test]
    fn upsert_inserts_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feeds.json");

        let mut store = FeedStore::open(&path).unwrap();
        store
            .upsert(Feed::subscription("Show A", "https://example.com/a.xml"))
            .unwrap();

        let reopened = FeedStore::open(&path).unwrap();
        assert_eq!(reopened.all().len(), 1);
        assert_eq!(reopened.get("Show A").unwrap().url, "https://example.com/a.xml");
    }

    #[test]
    fn upsert_replaces_matching_title_wholesale() {
        let dir = tempdir().unwrap();
        let mut store = FeedStore::open(dir.path().join("feeds.json")).unwrap();

        let mut refreshed = Feed::subscription("Show A", "https://example.com/a.xml");
        refreshed.entries = vec![make_entry("ep1")];
        refreshed.last_updated = Some(Utc::now());
        store.upsert(refreshed).unwrap();

        // Re-importing the same title resets entries and refresh history
        store
            .upsert(Feed::subscription("Show A", "https://example.com/new.xml"))
            .unwrap();

        assert_eq!(store.all().len(), 1);
        let feed = store.get("Show A").unwrap();
        assert_eq!(feed.url, "https://example.com/new.xml");
        assert!(feed.entries.is_empty());
        assert!(feed.last_updated.is_none());
    }

    #[test]
    fn update_entries_touches_only_snapshot_and_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feeds.json");

        let mut store = FeedStore::open(&path).unwrap();
        store
            .upsert(Feed::subscription("Show A", "https://example.com/a.xml"))
            .unwrap();

        let now = Utc::now();
        let updated = store
            .update_entries("Show A", vec![make_entry("ep1"), make_entry("ep2")], now)
            .unwrap();
        assert!(updated);

        let reopened = FeedStore::open(&path).unwrap();
        let feed = reopened.get("Show A").unwrap();
        assert_eq!(feed.url, "https://example.com/a.xml");
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.last_updated.unwrap().timestamp(), now.timestamp());
    }

    #[test]
    fn update_entries_without_match_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feeds.json");

        let mut store = FeedStore::open(&path).unwrap();
        let updated = store
            .update_entries("Unknown", vec![make_entry("ep1")], Utc::now())
            .unwrap();

        assert!(!updated);
        assert!(!path.exists());
    }

    #[test]
    fn stale_filters_by_refresh_age() {
        let dir = tempdir().unwrap();
        let mut store = FeedStore::open(dir.path().join("feeds.json")).unwrap();

        let now = Utc::now();

        store
            .upsert(Feed::subscription("Never", "https://example.com/n.xml"))
            .unwrap();

        let mut fresh = Feed::subscription("Fresh", "https://example.com/f.xml");
        fresh.last_updated = Some(now - Duration::hours(3));
        store.upsert(fresh).unwrap();

        let mut old = Feed::subscription("Old", "https://example.com/o.xml");
        old.last_updated = Some(now - Duration::days(3));
        store.upsert(old).unwrap();

        let stale: Vec<_> = store.stale(now).into_iter().map(|f| f.title).collect();
        assert_eq!(stale, vec!["Never".to_string(), "Old".to_string()]);
    }

    #[test]
    fn document_keeps_feeds_collection_sorted_by_title() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feeds.json");

        let mut store = FeedStore::open(&path).unwrap();
        store
            .upsert(Feed::subscription("Zeta", "https://example.com/z.xml"))
            .unwrap();
        store
            .upsert(Feed::subscription("Alpha", "https://example.com/a.xml"))
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        let titles: Vec<_> = value["feeds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["title"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(titles, vec!["Alpha".to_string(), "Zeta".to_string()]);
    }

    #[test]
    fn timestamps_serialize_as_iso_8601() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feeds.json");

        let mut store = FeedStore::open(&path).unwrap();
        let mut feed = Feed::subscription("Show", "https://example.com/feed.xml");
        feed.last_updated = Some("2024-01-15T12:00:00Z".parse().unwrap());
        store.upsert(feed).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("2024-01-15T12:00:00Z"));
    }

    #[test]
    fn corrupt_store_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feeds.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = FeedStore::open(&path);
        assert!(matches!(result, Err(StoreError::ParseFailed { .. })));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feeds.json");

        let mut store = FeedStore::open(&path).unwrap();
        store
            .upsert(Feed::subscription("Show", "https://example.com/feed.xml"))
            .unwrap();

        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());
    }
}
