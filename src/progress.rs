use std::sync::Arc;

/// Why an episode was skipped instead of downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination file already exists on disk
    AlreadyDownloaded,
    /// The entry carries no audio/mpeg link
    NoAudioEnclosure,
}

/// Events emitted while refreshing feeds and downloading episodes
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A stale feed is being fetched from its URL
    FetchingFeed { title: String, url: String },

    /// A feed was refreshed and its entry snapshot replaced
    FeedRefreshed { title: String, entries: usize },

    /// Refreshing a feed was abandoned for this run
    FeedRefreshFailed { title: String, error: String },

    /// The per-feed download directory could not be prepared
    FeedDirectoryFailed { title: String, error: String },

    /// A download is starting
    DownloadStarting {
        episode_title: String,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    /// Download progress update, reported once per chunk written
    DownloadProgress {
        episode_title: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// A download completed successfully
    DownloadCompleted {
        episode_title: String,
        bytes_downloaded: u64,
    },

    /// An episode was skipped without touching the network
    DownloadSkipped {
        episode_title: String,
        reason: SkipReason,
    },

    /// A download was abandoned after exhausting its retries
    DownloadFailed { episode_title: String, error: String },

    /// The whole run completed
    SyncCompleted {
        refreshed: usize,
        downloaded: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Trait for reporting progress events during a sync run.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
