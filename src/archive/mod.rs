//! Archive module.
//!
//! Provides:
//! - Chunk batching of archive items
//! - Entry manifests
//! - Chunk persistence
//! - Channel and guild drivers

pub mod aggregator;
pub mod channel;
pub mod manifest;
pub mod writer;

pub use aggregator::{Chunk, ChunkAggregator};
pub use channel::{
    archive_channel, archive_guild, archive_messages, ArchiveOptions, ChannelResult,
    DEFAULT_CHUNK_LENGTH,
};
pub use manifest::{EntryManifest, FileEntry};
pub use writer::{ArchiveWriter, WriterOptions};
