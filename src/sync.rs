// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::episode::download_feed;
use crate::error::SyncError;
use crate::feed::Feed;
use crate::http::HttpClient;
use crate::opml::parse_opml;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::refresh::{DEFAULT_MAX_ENTRIES_PER_FEED, refresh_feeds};
use crate::store::FeedStore;

/// Options for one library sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// OPML subscription list to merge into the store before refreshing
    pub import_opml: Option<PathBuf>,
    /// Refresh every feed, stale or not
    pub force_updates: bool,
    /// Episodes to download per feed
    pub max_episodes: usize,
    /// Entries kept per feed at refresh time
    pub max_entries_per_feed: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            import_opml: None,
            force_updates: false,
            max_episodes: 3,
            max_entries_per_feed: DEFAULT_MAX_ENTRIES_PER_FEED,
        }
    }
}

/// Result of a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    /// Feeds whose entry snapshot was refreshed
    pub refreshed: usize,
    /// Feeds abandoned during refresh (title, error message)
    pub refresh_failures: Vec<(String, String)>,
    /// Episodes newly downloaded
    pub downloaded: usize,
    /// Episodes skipped (already present, or no audio link)
    pub skipped: usize,
    /// Episodes that failed to download
    pub failed: usize,
    /// Details of failed episodes (title, error message)
    pub failed_episodes: Vec<(String, String)>,
}

/// Run the full pipeline over the store: import, refresh, download.
///
/// The three stages run strictly sequentially, one feed at a time:
/// 1. If an OPML path is given, merge its subscriptions into the store.
/// 2. Refresh the entry snapshot of every stale feed (or all of them when
///    forced), under the bounded retry policy.
/// 3. Download the most recent stored entries of every feed, skipping
///    episodes already on disk.
///
/// An unreadable OPML file or a store that cannot be loaded aborts the
/// run; refresh and download failures never do — they are reported and
/// collected in the summary.
pub async fn sync_library<C: HttpClient>(
    client: &C,
    store: &mut FeedStore,
    output_root: &Path,
    options: &SyncOptions,
    reporter: &SharedProgressReporter,
) -> Result<SyncSummary, SyncError> {
    let mut summary = SyncSummary::default();

    if let Some(opml_path) = &options.import_opml {
        import_subscriptions(store, opml_path)?;
    }

    let refresh = refresh_feeds(
        client,
        store,
        options.max_entries_per_feed,
        options.force_updates,
        reporter,
    )
    .await;

    summary.refreshed = refresh.refreshed;
    summary.refresh_failures = refresh.failures;

    for feed in store.all().to_vec() {
        let outcome =
            download_feed(client, &feed, output_root, options.max_episodes, reporter).await;

        summary.downloaded += outcome.downloaded;
        summary.skipped += outcome.skipped;
        summary.failed += outcome.failed;
        summary.failed_episodes.extend(outcome.failures);
    }

    reporter.report(ProgressEvent::SyncCompleted {
        refreshed: summary.refreshed,
        downloaded: summary.downloaded,
        skipped: summary.skipped,
        failed: summary.failed,
    });

    Ok(summary)
}

/// Merge an OPML subscription list into the store, matched by title.
///
/// Every subscription is upserted as a fresh record: empty entries, never
/// refreshed. Re-importing a known title therefore resets its refresh
/// history, and its episodes reappear only after the next refresh.
pub fn import_subscriptions(store: &mut FeedStore, opml_path: &Path) -> Result<usize, SyncError> {
    let subscriptions = parse_opml(opml_path)?;
    let count = subscriptions.len();

    for subscription in subscriptions {
        store.upsert(Feed::subscription(subscription.title, subscription.url))?;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{BufferedResponse, ByteStream, HttpResponse};
    use crate::progress::NoopReporter;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const FEED_XML: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Show A</title>
    <description>Test</description>
    <item>
      <title>Episode 2</title>
      <enclosure url="https://example.com/ep2.mp3" type="audio/mpeg"/>
    </item>
    <item>
      <title>Episode 1</title>
      <enclosure url="https://example.com/ep1.mp3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    const OPML: &str = r#"<?xml version="1.0"?>
<opml version="2.0">
  <body>
    <outline type="rss" title="Show A" xmlUrl="https://example.com/feed.xml"/>
  </body>
</opml>"#;

    struct MockHttpClient {
        feed_requests: AtomicUsize,
        stream_requests: AtomicUsize,
    }

    impl MockHttpClient {
        fn new() -> Self {
            Self {
                feed_requests: AtomicUsize::new(0),
                stream_requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, _url: &str) -> Result<BufferedResponse, reqwest::Error> {
            self.feed_requests.fetch_add(1, Ordering::SeqCst);
            Ok(BufferedResponse {
                status: 200,
                body: Bytes::from_static(FEED_XML.as_bytes()),
            })
        }

        async fn get_stream(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.stream_requests.fetch_add(1, Ordering::SeqCst);
            let stream: ByteStream =
                Box::pin(futures::stream::once(
                    async { Ok(Bytes::from_static(b"fake audio")) },
                ));
            Ok(HttpResponse {
                status: 200,
                content_length: Some(10),
                body: stream,
            })
        }
    }

    #[tokio::test]
    async fn full_pipeline_imports_refreshes_and_downloads() {
        let dir = tempdir().unwrap();
        let opml_path = dir.path().join("subscriptions.opml");
        std::fs::write(&opml_path, OPML).unwrap();

        let mut store = FeedStore::open(dir.path().join("feeds.json")).unwrap();
        let client = MockHttpClient::new();
        let reporter = NoopReporter::shared();

        let options = SyncOptions {
            import_opml: Some(opml_path),
            ..Default::default()
        };

        let summary = sync_library(&client, &mut store, dir.path(), &options, &reporter)
            .await
            .unwrap();

        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.failed, 0);

        let feed_dir = dir.path().join("Show A");
        assert!(feed_dir.join("Episode 2.mp3").exists());
        assert!(feed_dir.join("Episode 1.mp3").exists());

        let feed = store.get("Show A").unwrap();
        assert_eq!(feed.entries.len(), 2);
        assert!(feed.last_updated.is_some());
    }

    #[tokio::test]
    async fn second_run_is_idempotent_and_makes_no_requests() {
        let dir = tempdir().unwrap();
        let opml_path = dir.path().join("subscriptions.opml");
        std::fs::write(&opml_path, OPML).unwrap();

        let mut store = FeedStore::open(dir.path().join("feeds.json")).unwrap();
        let reporter = NoopReporter::shared();

        let first = MockHttpClient::new();
        let options = SyncOptions {
            import_opml: Some(opml_path),
            ..Default::default()
        };
        sync_library(&first, &mut store, dir.path(), &options, &reporter)
            .await
            .unwrap();

        // No import this time: the feed is fresh and every file exists
        let second = MockHttpClient::new();
        let summary = sync_library(
            &second,
            &mut store,
            dir.path(),
            &SyncOptions::default(),
            &reporter,
        )
        .await
        .unwrap();

        assert_eq!(summary.downloaded, 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(second.feed_requests.load(Ordering::SeqCst), 0);
        assert_eq!(second.stream_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reimport_resets_refresh_history() {
        let dir = tempdir().unwrap();
        let opml_path = dir.path().join("subscriptions.opml");
        std::fs::write(&opml_path, OPML).unwrap();

        let mut store = FeedStore::open(dir.path().join("feeds.json")).unwrap();

        let mut known = Feed::subscription("Show A", "https://example.com/old.xml");
        known.last_updated = Some(chrono::Utc::now());
        store.upsert(known).unwrap();

        import_subscriptions(&mut store, &opml_path).unwrap();

        let feed = store.get("Show A").unwrap();
        assert_eq!(feed.url, "https://example.com/feed.xml");
        assert!(feed.entries.is_empty());
        assert!(feed.last_updated.is_none());
    }

    #[tokio::test]
    async fn missing_opml_aborts_the_run() {
        let dir = tempdir().unwrap();
        let mut store = FeedStore::open(dir.path().join("feeds.json")).unwrap();
        let client = MockHttpClient::new();
        let reporter = NoopReporter::shared();

        let options = SyncOptions {
            import_opml: Some(dir.path().join("missing.opml")),
            ..Default::default()
        };

        let result = sync_library(&client, &mut store, dir.path(), &options, &reporter).await;

        assert!(matches!(result, Err(SyncError::Import(_))));
        assert_eq!(client.feed_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn download_limit_applies_per_feed() {
        let dir = tempdir().unwrap();
        let mut store = FeedStore::open(dir.path().join("feeds.json")).unwrap();
        store
            .upsert(Feed::subscription("Show A", "https://example.com/feed.xml"))
            .unwrap();

        let client = MockHttpClient::new();
        let reporter = NoopReporter::shared();

        let options = SyncOptions {
            max_episodes: 1,
            ..Default::default()
        };

        let summary = sync_library(&client, &mut store, dir.path(), &options, &reporter)
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 1);
        assert!(dir.path().join("Show A").join("Episode 2.mp3").exists());
        assert!(!dir.path().join("Show A").join("Episode 1.mp3").exists());
    }
}
