//! Archive statistics.

use crate::download::file::DownloadOutcome;

/// Per-channel archive statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveStats {
    pub channel_id: String,
    pub channel_name: Option<String>,

    // Crawl
    pub pages: u64,
    pub messages: u64,

    // Files
    pub files_downloaded: u64,
    pub files_skipped: u64,
    pub files_too_large: u64,
    pub files_failed: u64,
    pub bytes_downloaded: u64,

    // Manifests
    pub text_entries: u64,
    pub manifests_written: u64,
    pub chunks_failed: u64,

    /// The run stopped early on request.
    pub cancelled: bool,
}

impl ArchiveStats {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            ..Default::default()
        }
    }

    /// Label used in summaries: `#name` when known, else the id.
    pub fn label(&self) -> String {
        match &self.channel_name {
            Some(name) => format!("#{}", name),
            None => self.channel_id.clone(),
        }
    }

    pub fn record_page(&mut self, messages: usize) {
        self.pages += 1;
        self.messages += messages as u64;
    }

    /// Count one file according to how its download ended.
    pub fn record_outcome(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { bytes } => {
                self.files_downloaded += 1;
                self.bytes_downloaded += bytes;
            }
            DownloadOutcome::Skipped => self.files_skipped += 1,
            DownloadOutcome::TooLarge { .. } => self.files_too_large += 1,
        }
    }

    pub fn increment_failed_file(&mut self) {
        self.files_failed += 1;
    }

    pub fn increment_manifest(&mut self) {
        self.manifests_written += 1;
    }

    pub fn increment_failed_chunk(&mut self) {
        self.chunks_failed += 1;
    }

    /// Files present on disk after the run (fetched now or earlier).
    pub fn total_files(&self) -> u64 {
        self.files_downloaded + self.files_skipped
    }
}

/// Global statistics across all channels.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GlobalStats {
    pub channels_archived: u64,
    pub channels_failed: u64,
    pub messages: u64,
    pub files_downloaded: u64,
    pub files_skipped: u64,
    pub files_too_large: u64,
    pub files_failed: u64,
    pub bytes_downloaded: u64,
    pub manifests_written: u64,
    pub chunks_failed: u64,
    pub cancelled: bool,
}

impl GlobalStats {
    /// Add statistics from a channel run.
    pub fn add_channel_stats(&mut self, stats: &ArchiveStats) {
        self.channels_archived += 1;
        self.messages += stats.messages;
        self.files_downloaded += stats.files_downloaded;
        self.files_skipped += stats.files_skipped;
        self.files_too_large += stats.files_too_large;
        self.files_failed += stats.files_failed;
        self.bytes_downloaded += stats.bytes_downloaded;
        self.manifests_written += stats.manifests_written;
        self.chunks_failed += stats.chunks_failed;
        self.cancelled |= stats.cancelled;
    }

    /// Mark a channel as failed.
    pub fn mark_channel_failed(&mut self) {
        self.channels_failed += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.channels_failed > 0
    }
}
