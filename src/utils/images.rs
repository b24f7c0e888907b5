use crate::error::FetchError;
use crate::tcg::catalog::DownloadTask;
use crate::utils::http::{build_client, sanitize_url};
use async_trait::async_trait;
use futures::stream::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// Default ceiling on simultaneous image requests
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Retrieves the raw bytes behind an image URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Per-task outcome counts for one download batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadReport {
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

/// Batch check which destinations already exist to avoid re-downloading
pub fn batch_check_existing(tasks: &[DownloadTask]) -> Vec<bool> {
    tasks
        .par_iter()
        .map(|task| task.destination.exists())
        .collect()
}

/// Download every task with at most `max_concurrency` requests in flight.
///
/// Existing destinations are skipped without touching the network. A failed
/// task is logged and counted; it never stops the rest of the batch.
pub async fn download_all<F>(
    fetcher: &F,
    tasks: &[DownloadTask],
    max_concurrency: usize,
) -> DownloadReport
where
    F: ImageFetcher + ?Sized,
{
    let max_concurrency = max_concurrency.max(1);
    let existing = batch_check_existing(tasks);

    let pending: Vec<&DownloadTask> = tasks
        .iter()
        .zip(existing)
        .filter(|(_, exists)| !exists)
        .map(|(task, _)| task)
        .collect();
    let skipped = tasks.len() - pending.len();

    info!(
        "Found {} images, skipping {} that already exist, downloading {} with {} concurrent requests",
        tasks.len(),
        skipped,
        pending.len(),
        max_concurrency
    );

    if pending.is_empty() {
        return DownloadReport {
            skipped,
            ..DownloadReport::default()
        };
    }

    let pb = ProgressBar::new(pending.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let semaphore = Arc::new(Semaphore::new(max_concurrency));
    let downloaded = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    futures::stream::iter(pending)
        .map(|task| {
            let semaphore = semaphore.clone();
            let pb = pb.clone();
            let (downloaded, failed) = (&downloaded, &failed);
            async move {
                let result = match semaphore.acquire().await {
                    // Held until the file is written
                    Ok(_permit) => download_one(fetcher, task).await,
                    Err(e) => Err(FetchError::Io(std::io::Error::other(e))),
                };

                match result {
                    Ok(()) => {
                        downloaded.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        error!("Failed to download {}: {}", task.source_url, e);
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                pb.inc(1);
            }
        })
        .buffer_unordered(max_concurrency)
        .collect::<Vec<()>>()
        .await;

    pb.finish_with_message("Download complete!");

    let report = DownloadReport {
        downloaded: downloaded.load(Ordering::Relaxed),
        skipped,
        failed: failed.load(Ordering::Relaxed),
    };
    info!(
        "All image downloads finished: {} downloaded, {} skipped, {} failed",
        report.downloaded, report.skipped, report.failed
    );
    report
}

async fn download_one<F>(fetcher: &F, task: &DownloadTask) -> Result<(), FetchError>
where
    F: ImageFetcher + ?Sized,
{
    let bytes = fetcher.fetch(&sanitize_url(&task.source_url)).await?;

    if let Some(parent) = task.destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Only a complete file may appear at the destination, or a rerun would skip it
    let partial = partial_path(&task.destination);
    let written = match tokio::fs::write(&partial, &bytes).await {
        Ok(()) => tokio::fs::rename(&partial, &task.destination).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}

/// Temporary download location next to the destination
fn partial_path(destination: &Path) -> PathBuf {
    destination.with_extension("png.part")
}
