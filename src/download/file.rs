//! Single-file downloads with retries and a size ceiling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use rand::Rng;
use reqwest::{Client, Response, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;

use crate::error::{Error, Result};
use crate::fs::paths::ensure_dir;
use crate::output::progress::create_download_bar;

/// Attempts per file before giving up.
pub const MAX_ATTEMPTS: u32 = 5;

/// Minimum file size to show progress bar (20 MB).
const PROGRESS_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Base delay between attempts; grows linearly with the attempt number.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Per-call download settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    /// Abandon files larger than this many bytes.
    pub max_size: Option<u64>,
    /// Fetch again even when the destination exists.
    pub overwrite: bool,
}

/// What a download call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was fetched and written.
    Downloaded { bytes: u64 },
    /// The destination already existed; nothing was fetched.
    Skipped,
    /// The file is over the size ceiling; nothing was written.
    TooLarge { size: u64 },
}

impl DownloadOutcome {
    /// Whether the destination now holds the file.
    pub fn is_success(&self) -> bool {
        !matches!(self, DownloadOutcome::TooLarge { .. })
    }
}

enum AttemptError {
    Retryable(Error),
    Fatal(Error),
}

/// Downloads remote files to local paths.
#[derive(Clone)]
pub struct FileDownloader {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
    show_progress: bool,
}

impl FileDownloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            show_progress: false,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Show a progress bar for large files.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Download `url` to `dest`.
    ///
    /// An existing destination is left untouched unless `overwrite` is set.
    /// Transport failures and 5xx responses are retried; 4xx responses and
    /// local write errors are not. The file only appears at `dest` once it
    /// is complete.
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        options: DownloadOptions,
    ) -> Result<DownloadOutcome> {
        if !options.overwrite && tokio::fs::try_exists(dest).await? {
            tracing::debug!("Skipping existing file: {}", dest.display());
            return Ok(DownloadOutcome::Skipped);
        }

        if let Some(parent) = dest.parent() {
            ensure_dir(parent).await?;
        }

        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match self.attempt(url, dest, options.max_size).await {
                Ok(outcome) => return Ok(outcome),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(e)) => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.max_attempts,
                        url,
                        e
                    );
                    last_error = Some(e);
                    if attempt < self.max_attempts {
                        sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(Error::Download(format!(
            "{} failed after {} attempts: {}",
            url,
            self.max_attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.retry_delay.as_millis() as u64;
        let jitter = rand::thread_rng().gen_range(0..=base_ms / 2);
        Duration::from_millis(base_ms * attempt as u64 + jitter)
    }

    async fn attempt(
        &self,
        url: &str,
        dest: &Path,
        max_size: Option<u64>,
    ) -> std::result::Result<DownloadOutcome, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let err = Error::Download(format!("HTTP {} for {}", status, url));
            return Err(if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                AttemptError::Retryable(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        if let (Some(max), Some(length)) = (max_size, response.content_length()) {
            if length > max {
                tracing::debug!("{} is {} bytes, over the {} byte limit", url, length, max);
                return Ok(DownloadOutcome::TooLarge { size: length });
            }
        }

        let part = part_path(dest);
        let streamed = self.stream_to_file(response, &part, max_size).await;

        match streamed {
            Ok(Streamed::Complete(bytes)) => {
                tokio::fs::rename(&part, dest)
                    .await
                    .map_err(|e| AttemptError::Fatal(e.into()))?;
                Ok(DownloadOutcome::Downloaded { bytes })
            }
            Ok(Streamed::OverLimit(size)) => {
                let _ = tokio::fs::remove_file(&part).await;
                Ok(DownloadOutcome::TooLarge { size })
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }

    /// Stream to file
    async fn stream_to_file(
        &self,
        response: Response,
        path: &Path,
        max_size: Option<u64>,
    ) -> std::result::Result<Streamed, AttemptError> {
        let content_length = response.content_length();
        let progress = (self.show_progress
            && content_length.is_some_and(|l| l > PROGRESS_THRESHOLD))
        .then(|| create_download_bar(content_length.unwrap_or(0)));

        let mut file = File::create(path)
            .await
            .map_err(|e| AttemptError::Fatal(e.into()))?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                AttemptError::Retryable(Error::Download(format!("Stream error: {}", e)))
            })?;
            downloaded += chunk.len() as u64;

            if max_size.is_some_and(|max| downloaded > max) {
                if let Some(pb) = progress {
                    pb.finish_and_clear();
                }
                return Ok(Streamed::OverLimit(downloaded));
            }

            file.write_all(&chunk)
                .await
                .map_err(|e| AttemptError::Fatal(e.into()))?;

            if let Some(ref pb) = progress {
                pb.set_position(downloaded);
            }
        }

        file.flush()
            .await
            .map_err(|e| AttemptError::Fatal(e.into()))?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(Streamed::Complete(downloaded))
    }
}

enum Streamed {
    Complete(u64),
    OverLimit(u64),
}

/// Hidden sibling path used while a download is in flight.
fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.part", name, uuid::Uuid::new_v4()))
}
