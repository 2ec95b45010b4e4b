pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod opml;
pub mod progress;
pub mod refresh;
pub mod retry;
pub mod store;
pub mod sync;

// Re-export main types for convenience
pub use episode::{download_feed, episode_filename, sanitize_component};
pub use error::{DownloadError, FeedError, OpmlError, StoreError, SyncError};
pub use feed::{Entry, Feed, Link, fetch_entries, parse_entries};
pub use http::{BufferedResponse, HttpClient, HttpResponse, ReqwestClient, TransportOptions};
pub use opml::{Subscription, parse_opml};
pub use progress::{
    NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter, SkipReason,
};
pub use refresh::{DEFAULT_MAX_ENTRIES_PER_FEED, MAX_FETCH_ATTEMPTS, refresh_feeds};
pub use retry::{RetriesExhausted, with_retries};
pub use store::FeedStore;
pub use sync::{SyncOptions, SyncSummary, import_subscriptions, sync_library};
