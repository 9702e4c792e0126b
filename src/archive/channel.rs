//! Channel and guild archive drivers.

use std::path::PathBuf;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::api::client::{DiscordApi, MESSAGES_PAGE_SIZE};
use crate::api::history::{HistoryOptions, HistoryPaginator, MessageSource};
use crate::api::types::Channel;
use crate::archive::aggregator::{Chunk, ChunkAggregator};
use crate::archive::writer::{ArchiveWriter, WriterOptions};
use crate::download::{ArchiveStats, FileDownloader};
use crate::error::Result;
use crate::fs::paths::ChannelLayout;
use crate::media::{extract_items, FileItem, FileKind, TextItem};

/// Default number of items per manifest.
pub const DEFAULT_CHUNK_LENGTH: usize = 50;

/// Everything one archive call needs to know, fixed for its whole duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Archive root; must already exist.
    pub destination: PathBuf,
    pub media: bool,
    pub nonmedia: bool,
    pub text: bool,
    pub chunk_length: usize,
    /// Only messages older than this id.
    pub before: Option<String>,
    /// Only messages newer than this id.
    pub after: Option<String>,
    pub max_file_size: Option<u64>,
    pub save_sources: bool,
    pub overwrite: bool,
    /// Channels archived at once by [`archive_guild`].
    pub parallel_channels: usize,
    pub show_downloads: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("."),
            media: true,
            nonmedia: true,
            text: true,
            chunk_length: DEFAULT_CHUNK_LENGTH,
            before: None,
            after: None,
            max_file_size: None,
            save_sources: false,
            overwrite: false,
            parallel_channels: 1,
            show_downloads: true,
        }
    }
}

impl ArchiveOptions {
    fn history(&self) -> HistoryOptions {
        HistoryOptions {
            before: self.before.clone(),
            after: self.after.clone(),
            page_size: MESSAGES_PAGE_SIZE,
        }
    }

    fn writer(&self) -> WriterOptions {
        WriterOptions {
            save_sources: self.save_sources,
            overwrite: self.overwrite,
            max_file_size: self.max_file_size,
        }
    }

    fn wants(&self, kind: FileKind) -> bool {
        match kind {
            FileKind::Media => self.media,
            FileKind::NonMedia => self.nonmedia,
        }
    }
}

/// Result of one channel in a guild archive.
#[derive(Debug)]
pub struct ChannelResult {
    pub channel: Channel,
    pub result: Result<ArchiveStats>,
}

/// Archive one channel's history into `options.destination`.
///
/// Page fetch failures abort the run. Failed downloads and failed chunk
/// writes are counted in the returned stats. When `cancel` fires no further
/// pages are fetched, but whatever was already collected is still written.
pub async fn archive_channel(
    api: &DiscordApi,
    options: &ArchiveOptions,
    channel_id: &str,
    cancel: &CancellationToken,
) -> Result<ArchiveStats> {
    let channel = api.get_channel(channel_id).await?;
    archive_resolved_channel(api, options, &channel, cancel).await
}

/// Archive every text-bearing channel of a guild.
///
/// Up to `options.parallel_channels` channels run at once; they share the
/// client's request queue. A failing channel does not stop the others.
pub async fn archive_guild(
    api: &DiscordApi,
    options: &ArchiveOptions,
    guild_id: &str,
    cancel: &CancellationToken,
) -> Result<Vec<ChannelResult>> {
    let channels: Vec<Channel> = api
        .get_guild_channels(guild_id)
        .await?
        .into_iter()
        .filter(Channel::is_text_based)
        .collect();

    tracing::info!("Archiving {} channels of guild {}", channels.len(), guild_id);

    let results = stream::iter(channels)
        .map(|channel| async move {
            let result = archive_resolved_channel(api, options, &channel, cancel).await;
            if let Err(e) = &result {
                tracing::warn!("Channel {} failed: {}", channel.label(), e);
            }
            ChannelResult { channel, result }
        })
        .buffer_unordered(options.parallel_channels.max(1))
        .collect()
        .await;

    Ok(results)
}

async fn archive_resolved_channel(
    api: &DiscordApi,
    options: &ArchiveOptions,
    channel: &Channel,
    cancel: &CancellationToken,
) -> Result<ArchiveStats> {
    let layout = ChannelLayout::new(&options.destination, channel.guild_id.as_deref(), &channel.id)?;
    let downloader = FileDownloader::new(api.http_client().clone()).with_progress(options.show_downloads);
    let writer = ArchiveWriter::new(downloader, layout, options.writer());

    tracing::info!("Archiving channel {}", channel.label());
    let mut stats = archive_messages(api, &writer, options, &channel.id, cancel).await?;
    stats.channel_name = channel.name.clone();

    tracing::info!(
        "Finished {}: {} messages, {} files, {} manifests",
        channel.label(),
        stats.messages,
        stats.total_files(),
        stats.manifests_written
    );
    Ok(stats)
}

/// Walk `channel_id`'s history from `source` and write it through `writer`.
///
/// Chunks are written as soon as an aggregator emits them, in push order.
/// Remainders are flushed media first, then non-media, then text.
pub async fn archive_messages<S: MessageSource + ?Sized>(
    source: &S,
    writer: &ArchiveWriter,
    options: &ArchiveOptions,
    channel_id: &str,
    cancel: &CancellationToken,
) -> Result<ArchiveStats> {
    let mut stats = ArchiveStats::new(channel_id);
    let mut media = ChunkAggregator::new(options.chunk_length);
    let mut nonmedia = ChunkAggregator::new(options.chunk_length);
    let mut text = ChunkAggregator::new(options.chunk_length);

    let mut paginator = HistoryPaginator::new(source, channel_id, options.history())
        .with_cancellation(cancel.clone());

    while let Some(page) = paginator.next_page().await? {
        stats.record_page(page.messages.len());
        tracing::debug!(
            "Channel {}: page {} with {} messages",
            channel_id,
            stats.pages,
            page.messages.len()
        );

        for message in &page.messages {
            let items = extract_items(message);

            for file in items.files {
                if !options.wants(file.kind) {
                    continue;
                }
                let kind = file.kind;
                let aggregator = match kind {
                    FileKind::Media => &mut media,
                    FileKind::NonMedia => &mut nonmedia,
                };
                for chunk in aggregator.push(file) {
                    write_files(writer, &chunk, kind, &mut stats).await;
                }
            }

            if options.text {
                for chunk in text.push(items.text) {
                    write_text(writer, &chunk, &mut stats).await;
                }
            }
        }
    }

    if cancel.is_cancelled() {
        tracing::info!("Channel {} cancelled, flushing collected items", channel_id);
        stats.cancelled = true;
    }

    if let Some(chunk) = media.close() {
        write_files(writer, &chunk, FileKind::Media, &mut stats).await;
    }
    if let Some(chunk) = nonmedia.close() {
        write_files(writer, &chunk, FileKind::NonMedia, &mut stats).await;
    }
    if let Some(chunk) = text.close() {
        write_text(writer, &chunk, &mut stats).await;
    }

    Ok(stats)
}

async fn write_files(
    writer: &ArchiveWriter,
    chunk: &Chunk<FileItem>,
    kind: FileKind,
    stats: &mut ArchiveStats,
) {
    if let Err(e) = writer.write_file_chunk(chunk, kind, stats).await {
        tracing::error!("Failed to write {} chunk {:?}: {}", kind, chunk.span(), e);
        stats.increment_failed_chunk();
    }
}

async fn write_text(writer: &ArchiveWriter, chunk: &Chunk<TextItem>, stats: &mut ArchiveStats) {
    if let Err(e) = writer.write_text_chunk(chunk, stats).await {
        tracing::error!("Failed to write text chunk {:?}: {}", chunk.span(), e);
        stats.increment_failed_chunk();
    }
}
