use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::feed::Feed;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter, SkipReason};
use crate::retry::with_retries;

use super::filename::{episode_filename, partial_path, sanitize_component};

/// Total attempts per episode before it is abandoned for the run
pub const MAX_DOWNLOAD_ATTEMPTS: u32 = 3;

/// Outcome of one feed's download pass
#[derive(Debug, Default)]
pub struct FeedDownloadOutcome {
    /// Episodes newly written to disk
    pub downloaded: usize,
    /// Episodes skipped: already on disk, or no audio link
    pub skipped: usize,
    /// Episodes abandoned after exhausting their retries
    pub failed: usize,
    /// Failure diagnostics per abandoned episode
    pub failures: Vec<(String, String)>,
}

/// Download the most recent stored entries of one feed.
///
/// Episodes land in `output_root/<sanitized feed title>/<entry title>.mp3`,
/// at most `limit` of them, in stored order. An existing destination file
/// skips the entry without touching the network; an entry without an
/// audio link is skipped without error. Each download streams to a
/// `.partial` staging file renamed into place on completion, and runs
/// under the bounded retry policy; exhaustion is reported and the pass
/// moves on to the next entry.
pub async fn download_feed<C: HttpClient>(
    client: &C,
    feed: &Feed,
    output_root: &Path,
    limit: usize,
    reporter: &SharedProgressReporter,
) -> FeedDownloadOutcome {
    let mut outcome = FeedDownloadOutcome::default();

    let feed_dir = output_root.join(sanitize_component(&feed.title));
    if let Err(e) = prepare_feed_dir(&feed_dir) {
        // Filesystem trouble is fatal to this feed's pass only
        reporter.report(ProgressEvent::FeedDirectoryFailed {
            title: feed.title.clone(),
            error: e.to_string(),
        });
        outcome.failures.push((feed.title.clone(), e.to_string()));
        outcome.failed += 1;
        return outcome;
    }

    for entry in feed.entries.iter().take(limit) {
        let dest = feed_dir.join(episode_filename(&entry.title));

        if dest.exists() {
            reporter.report(ProgressEvent::DownloadSkipped {
                episode_title: entry.title.clone(),
                reason: SkipReason::AlreadyDownloaded,
            });
            outcome.skipped += 1;
            continue;
        }

        let Some(link) = entry.audio_link() else {
            reporter.report(ProgressEvent::DownloadSkipped {
                episode_title: entry.title.clone(),
                reason: SkipReason::NoAudioEnclosure,
            });
            outcome.skipped += 1;
            continue;
        };

        let result = with_retries(MAX_DOWNLOAD_ATTEMPTS, || {
            download_episode(client, &link.href, &entry.title, &dest, reporter)
        })
        .await;

        match result {
            Ok(_) => outcome.downloaded += 1,
            Err(e) => {
                reporter.report(ProgressEvent::DownloadFailed {
                    episode_title: entry.title.clone(),
                    error: e.to_string(),
                });
                outcome.failures.push((entry.title.clone(), e.to_string()));
                outcome.failed += 1;
            }
        }
    }

    outcome
}

/// Create the feed directory and sweep staging files left behind by
/// interrupted downloads
fn prepare_feed_dir(feed_dir: &Path) -> Result<(), DownloadError> {
    std::fs::create_dir_all(feed_dir).map_err(|e| DownloadError::DirectoryCreateFailed {
        path: feed_dir.to_path_buf(),
        source: e,
    })?;

    if let Ok(entries) = std::fs::read_dir(feed_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "partial") {
                let _ = std::fs::remove_file(&path);
            }
        }
    }

    Ok(())
}

/// Stream one episode to its destination path.
///
/// The body is written chunk by chunk to a staging file, with progress
/// reported per chunk, then renamed into place once fully consumed.
/// Returns the number of bytes downloaded.
async fn download_episode<C: HttpClient>(
    client: &C,
    url: &str,
    episode_title: &str,
    dest: &Path,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        episode_title: episode_title.to_string(),
        content_length: response.content_length,
    });

    let staging = partial_path(dest);

    let mut file = File::create(&staging)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: staging.clone(),
            source: e,
        })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: staging.clone(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            episode_title: episode_title.to_string(),
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: staging.clone(),
            source: e,
        })?;
    drop(file);

    tokio::fs::rename(&staging, dest)
        .await
        .map_err(|e| DownloadError::FinalizeFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

    reporter.report(ProgressEvent::DownloadCompleted {
        episode_title: episode_title.to_string(),
        bytes_downloaded,
    });

    Ok(bytes_downloaded)
}
