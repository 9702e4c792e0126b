//! Discord API module.
//!
//! This module provides:
//! - Serialized, rate-limited request queue
//! - HTTP client for the Discord REST API
//! - Backward history pagination
//! - Response shape validation and resource types

pub mod auth;
pub mod client;
pub mod history;
pub mod query;
pub mod queue;
pub mod shape;
pub mod types;

pub use client::{DiscordApi, ResponseBody, API_BASE, MESSAGES_PAGE_SIZE};
pub use history::{compare_snowflakes, HistoryOptions, HistoryPaginator, MessageSource, Page};
pub use query::{build_query, MessagesQuery, SearchQuery};
pub use queue::{RequestQueue, DEFAULT_INTERVAL};
pub use types::*;
