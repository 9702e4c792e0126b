//! Persisting chunks to the archive tree.

use std::path::{Path, PathBuf};

use crate::archive::aggregator::Chunk;
use crate::archive::manifest::{EntryManifest, FileEntry};
use crate::download::{ArchiveStats, DownloadOptions, DownloadOutcome, FileDownloader};
use crate::error::Result;
use crate::fs::paths::{ensure_dir, ChannelLayout};
use crate::media::{FileItem, FileKind, TextItem};

/// Settings shared by every chunk written for one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    /// Write a side-car JSON with the source message for every recorded file.
    pub save_sources: bool,
    pub overwrite: bool,
    pub max_file_size: Option<u64>,
}

/// Writes file and text chunks for one channel.
pub struct ArchiveWriter {
    downloader: FileDownloader,
    layout: ChannelLayout,
    options: WriterOptions,
}

impl ArchiveWriter {
    pub fn new(downloader: FileDownloader, layout: ChannelLayout, options: WriterOptions) -> Self {
        Self {
            downloader,
            layout,
            options,
        }
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Download every file of `chunk` and record them in one manifest at
    /// `entries/<timestamp>/<first message id>.json`.
    ///
    /// The timestamp is taken when the manifest is written and bumped until
    /// the path is free, so every chunk gets its own file. Files that fail or
    /// exceed the size ceiling are counted in `stats` and left out of the
    /// manifest. Errors creating directories or writing the manifest are
    /// returned.
    pub async fn write_file_chunk(
        &self,
        chunk: &Chunk<FileItem>,
        kind: FileKind,
        stats: &mut ArchiveStats,
    ) -> Result<()> {
        let Some((first, last)) = chunk.span() else {
            return Ok(());
        };

        let files_dir = self.layout.files_dir(kind);
        ensure_dir(&files_dir).await?;

        let download_options = DownloadOptions {
            max_size: self.options.max_file_size,
            overwrite: self.options.overwrite,
        };

        let mut entries = Vec::with_capacity(chunk.len());
        for item in chunk.items() {
            let stored = item.stored_filename().to_string();
            let dest = files_dir.join(&stored);

            let outcome = match self.known_too_large(item) {
                Some(outcome) => Ok(outcome),
                None => self.downloader.download(&item.url, &dest, download_options).await,
            };

            match outcome {
                Ok(outcome) => {
                    stats.record_outcome(&outcome);
                    if let DownloadOutcome::TooLarge { size } = outcome {
                        tracing::warn!(
                            "Skipping {} from message {}: {} bytes is over the size limit",
                            item.filename,
                            item.message_id,
                            size
                        );
                        continue;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to download {} from message {}: {}",
                        item.filename,
                        item.message_id,
                        e
                    );
                    stats.increment_failed_file();
                    continue;
                }
            }

            if self.options.save_sources {
                if let Err(e) = self.write_source(item, kind, &stored).await {
                    tracing::warn!("Failed to write source for {}: {}", stored, e);
                }
            }

            entries.push(FileEntry {
                filename: stored,
                filename_original: item.filename.clone(),
                url: item.url.clone(),
                msgid: item.message_id.clone(),
            });
        }

        let (path, date) = self.free_entries_path(kind, first).await?;
        let manifest = EntryManifest::new(entries, date, (first, last));
        manifest.write_to(&path).await?;
        stats.increment_manifest();

        tracing::info!(
            "Wrote {} manifest {} ({}/{} files)",
            kind,
            path.display(),
            manifest.total,
            chunk.len()
        );
        Ok(())
    }

    /// Record the messages of `chunk` in one text manifest.
    pub async fn write_text_chunk(
        &self,
        chunk: &Chunk<TextItem>,
        stats: &mut ArchiveStats,
    ) -> Result<()> {
        let Some((first, last)) = chunk.span() else {
            return Ok(());
        };

        let text_dir = self.layout.text_dir();
        ensure_dir(&text_dir).await?;

        let manifest = EntryManifest::new(chunk.items().to_vec(), now_millis(), (first, last));
        let path = text_dir.join(format!("{}.json", first));
        manifest.write_to(&path).await?;

        stats.text_entries += manifest.total as u64;
        stats.increment_manifest();

        tracing::info!("Wrote text manifest {} ({} messages)", path.display(), manifest.total);
        Ok(())
    }

    /// First `entries/<ts>/<first>.json` not yet on disk, starting at now.
    async fn free_entries_path(&self, kind: FileKind, first: &str) -> Result<(PathBuf, i64)> {
        let mut timestamp = now_millis();
        loop {
            let dir = self.layout.entries_dir(kind, timestamp);
            let path = dir.join(format!("{}.json", first));
            if !tokio::fs::try_exists(&path).await? {
                ensure_dir(&dir).await?;
                return Ok((path, timestamp));
            }
            timestamp += 1;
        }
    }

    /// Attachments report their size up front; no request is needed to reject them.
    fn known_too_large(&self, item: &FileItem) -> Option<DownloadOutcome> {
        match (self.options.max_file_size, item.size) {
            (Some(max), Some(size)) if size > max => Some(DownloadOutcome::TooLarge { size }),
            _ => None,
        }
    }

    async fn write_source(&self, item: &FileItem, kind: FileKind, stored: &str) -> Result<()> {
        let sources_dir = self.layout.sources_dir(kind);
        ensure_dir(&sources_dir).await?;
        write_json(&sources_dir.join(format!("{}.json", stored)), &item.source).await
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
