//! Discord Archiver - archive Discord channel history to local storage
//!
//! This library crawls the Discord REST API and writes a channel's messages,
//! attachments and linked files into an append-only directory tree.
//!
//! # Features
//!
//! - Rate-limited, serialized API request queue
//! - Backward-in-time history pagination
//! - Fixed-size batching into JSON entry manifests
//! - Idempotent file downloads with retries and a size ceiling
//! - Whole-guild archiving with bounded channel parallelism
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use discord_archiver::{archive_channel, Config, DiscordApi, RequestQueue};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let queue = RequestQueue::new(config.request_interval());
//!     let api = DiscordApi::new(&config.account.token, config.account.bot, queue)?;
//!
//!     let options = config.archive_options();
//!     let stats = archive_channel(&api, &options, "123456789012345678", &CancellationToken::new()).await?;
//!     println!("{} messages archived", stats.messages);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod archive;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;

// Re-exports for convenience
pub use api::{DiscordApi, RequestQueue};
pub use archive::{archive_channel, archive_guild, ArchiveOptions};
pub use config::Config;
pub use download::{ArchiveStats, GlobalStats};
pub use error::{Error, Result};
pub use media::{FileItem, FileKind, TextItem};
