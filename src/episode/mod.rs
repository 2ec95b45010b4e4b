mod download;
mod filename;

pub use download::{FeedDownloadOutcome, MAX_DOWNLOAD_ATTEMPTS, download_feed};
pub use filename::{episode_filename, partial_path, sanitize_component};
