use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use podkeep::{
    FeedStore, NoopReporter, ProgressEvent, ProgressReporter, ReqwestClient,
    SharedProgressReporter, SkipReason, SyncOptions, TransportOptions, sync_library,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Track podcast subscriptions and archive new episodes
#[derive(Parser, Debug)]
#[command(name = "podkeep")]
#[command(about = "Track podcast subscriptions and archive new episodes")]
#[command(version)]
struct Args {
    /// Import a list of feeds from an OPML file, exported from another service
    #[arg(short = 'i', long)]
    import_opml: Option<PathBuf>,

    /// Refresh all feeds, even ones that are not stale
    #[arg(short = 'f', long)]
    force_updates: bool,

    /// Max number of episodes to download per show
    #[arg(short = 'm', long, default_value = "3")]
    max_episodes: usize,

    /// Location to download files to
    #[arg(short = 'o', long, default_value_os_t = default_output_dir())]
    output_dir: PathBuf,

    /// Accept invalid TLS certificates when fetching feeds and episodes
    #[arg(long)]
    insecure: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn default_output_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("podcasts")
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    main_bar: ProgressBar,
    download_bar: Mutex<Option<ProgressBar>>,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            main_bar,
            download_bar: Mutex::new(None),
        }
    }

    fn start_download_bar(&self, length: Option<u64>, message: String) {
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
            ))
            .unwrap()
            .progress_chars("█▓░");

        let bar = self.multi.add(ProgressBar::new(length.unwrap_or(0)));
        bar.set_style(style);
        bar.set_message(message);

        let mut slot = self.download_bar.lock().unwrap();
        if let Some(old) = slot.take() {
            old.finish_and_clear();
        }
        *slot = Some(bar);
    }

    fn finish_download_bar(&self) {
        if let Some(bar) = self.download_bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingFeed { title, .. } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Fetching feed: {}", title.cyan()));
            }

            ProgressEvent::FeedRefreshed { title, entries } => {
                self.main_bar.set_message(format!(
                    "{HEADPHONES}{} • {} entries kept",
                    title.bold().green(),
                    entries.to_string().cyan()
                ));
            }

            ProgressEvent::FeedRefreshFailed { title, error } => {
                let _ = self.multi.println(format!(
                    "{FAILURE}{} - {}",
                    title.red(),
                    error.dimmed()
                ));
            }

            ProgressEvent::FeedDirectoryFailed { title, error } => {
                let _ = self.multi.println(format!(
                    "{FAILURE}{} - {}",
                    title.red(),
                    error.dimmed()
                ));
            }

            ProgressEvent::DownloadStarting {
                episode_title,
                content_length,
            } => {
                self.start_download_bar(content_length, truncate_title(&episode_title, 40));
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                if let Some(bar) = self.download_bar.lock().unwrap().as_ref() {
                    if let Some(total) = total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(bytes_downloaded);
                }
            }

            ProgressEvent::DownloadCompleted { episode_title, .. } => {
                self.finish_download_bar();
                self.main_bar.set_message(format!(
                    "{SUCCESS}{}",
                    truncate_title(&episode_title, 40).green()
                ));
            }

            ProgressEvent::DownloadSkipped {
                episode_title,
                reason,
            } => {
                let note = match reason {
                    SkipReason::AlreadyDownloaded => "already downloaded",
                    SkipReason::NoAudioEnclosure => "no audio enclosure",
                };
                self.main_bar.set_message(format!(
                    "{HEADPHONES}{} ({note})",
                    truncate_title(&episode_title, 40).dimmed()
                ));
            }

            ProgressEvent::DownloadFailed {
                episode_title,
                error,
            } => {
                self.finish_download_bar();
                let _ = self.multi.println(format!(
                    "{FAILURE}{} - {}",
                    truncate_title(&episode_title, 30).red(),
                    error.red()
                ));
            }

            ProgressEvent::SyncCompleted {
                refreshed,
                downloaded,
                skipped,
                failed,
            } => {
                self.finish_download_bar();
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} refreshed, {} downloaded, {} skipped, {} failed",
                    "Sync complete:".bold().green(),
                    refreshed.to_string().cyan(),
                    downloaded.to_string().green().bold(),
                    skipped.to_string().yellow(),
                    if failed > 0 {
                        failed.to_string().red().bold()
                    } else {
                        failed.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.len() <= max_len {
        title.to_string()
    } else {
        format!("{}...", &title[..max_len.saturating_sub(3)])
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!(
        "\n{}{} {}\n",
        MICROPHONE,
        "podkeep".bold().magenta(),
        "- Podcast Archiver".dimmed()
    );

    let transport = TransportOptions {
        danger_accept_invalid_certs: args.insecure,
        ..Default::default()
    };
    let client = ReqwestClient::with_options(&transport).context("Failed to build HTTP client")?;

    let store_path = args.output_dir.join("feeds.json");
    let mut store = FeedStore::open(&store_path).context("Failed to open feed store")?;

    let options = SyncOptions {
        import_opml: args.import_opml.clone(),
        force_updates: args.force_updates,
        max_episodes: args.max_episodes,
        ..Default::default()
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let summary = sync_library(&client, &mut store, &args.output_dir, &options, &reporter)
        .await
        .context("Failed to sync podcast library")?;

    if !args.quiet && !summary.refresh_failures.is_empty() {
        println!("\n{}", "Feeds that could not be refreshed:".red().bold());
        for (title, error) in &summary.refresh_failures {
            println!("  {}{} - {}", CROSS, title.yellow(), error.dimmed());
        }
    }

    if !args.quiet && !summary.failed_episodes.is_empty() {
        println!("\n{}", "Failed episodes:".red().bold());
        for (title, error) in &summary.failed_episodes {
            println!("  {}{} - {}", CROSS, title.yellow(), error.dimmed());
        }
    }

    if !args.quiet {
        println!(
            "\n{FOLDER}Output: {}\n",
            args.output_dir.display().to_string().cyan()
        );
    }

    if summary.downloaded == 0 && (summary.failed > 0 || !summary.refresh_failures.is_empty()) {
        std::process::exit(1);
    }

    Ok(())
}
