//! Configuration module for the discord-archiver.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Run mode selection
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{AccountConfig, Config, OptionsConfig, TargetConfig};
pub use modes::ArchiveMode;
pub use validation::{validate_config, validate_snowflake, validate_token};
