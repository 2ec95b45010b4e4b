// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Utc;

use crate::feed::fetch_entries;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::retry::with_retries;
use crate::store::FeedStore;

/// Total fetch attempts per feed before it is abandoned for the run
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Entries kept per feed at refresh time; older entries fall off the store
pub const DEFAULT_MAX_ENTRIES_PER_FEED: usize = 5;

/// Outcome of one refresh pass over the store
#[derive(Debug, Default)]
pub struct RefreshOutcome {
    /// Feeds whose snapshot was replaced
    pub refreshed: usize,
    /// Feeds abandoned this run, with their failure diagnostics
    pub failures: Vec<(String, String)>,
}

/// Refresh every candidate feed's entry snapshot.
///
/// Candidates are all stored feeds when `force` is set, otherwise exactly
/// the stale ones. Each candidate is fetched under the bounded retry
/// policy; a feed that exhausts its attempts is reported and abandoned,
/// never aborting the rest of the batch. On success the stored entries are
/// replaced with the first `max_entries_per_feed` fetched entries and the
/// refresh timestamp is set, whether or not the list changed.
pub async fn refresh_feeds<C: HttpClient>(
    client: &C,
    store: &mut FeedStore,
    max_entries_per_feed: usize,
    force: bool,
    reporter: &SharedProgressReporter,
) -> RefreshOutcome {
    let candidates = if force {
        store.all().to_vec()
    } else {
        store.stale(Utc::now())
    };

    let mut outcome = RefreshOutcome::default();

    for feed in candidates {
        reporter.report(ProgressEvent::FetchingFeed {
            title: feed.title.clone(),
            url: feed.url.clone(),
        });

        let fetched =
            with_retries(MAX_FETCH_ATTEMPTS, || fetch_entries(client, &feed.url)).await;

        let mut entries = match fetched {
            Ok(entries) => entries,
            Err(e) => {
                reporter.report(ProgressEvent::FeedRefreshFailed {
                    title: feed.title.clone(),
                    error: e.to_string(),
                });
                outcome.failures.push((feed.title.clone(), e.to_string()));
                continue;
            }
        };

        entries.truncate(max_entries_per_feed);
        let count = entries.len();

        match store.update_entries(&feed.title, entries, Utc::now()) {
            Ok(_) => {
                reporter.report(ProgressEvent::FeedRefreshed {
                    title: feed.title.clone(),
                    entries: count,
                });
                outcome.refreshed += 1;
            }
            Err(e) => {
                reporter.report(ProgressEvent::FeedRefreshFailed {
                    title: feed.title.clone(),
                    error: e.to_string(),
                });
                outcome.failures.push((feed.title.clone(), e.to_string()));
            }
        }
    }

    outcome
}
