//! Download module.
//!
//! This module provides:
//! - Single-file downloads with retries and a size ceiling
//! - Archive statistics

pub mod file;
pub mod state;

pub use file::{DownloadOptions, DownloadOutcome, FileDownloader, MAX_ATTEMPTS};
pub use state::{ArchiveStats, GlobalStats};
