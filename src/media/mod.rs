//! Media module for archive items and message classification.

pub mod item;
pub mod parser;

pub use item::{ArchiveItem, FileItem, FileKind, FileOrigin, TextItem};
pub use parser::{extract_items, is_media_filename, MessageItems};
