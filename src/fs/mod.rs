//! Filesystem module.
//!
//! Provides:
//! - Archive directory layout and destination validation
//! - Stored filename generation

pub mod naming;
pub mod paths;

pub use naming::{sanitize_path_component, stored_filename, truncate_filename};
pub use paths::{ensure_dir, validate_destination, ChannelLayout, DM_GUILD_FOLDER};
