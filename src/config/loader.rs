//! Configuration structures and loading logic.

use crate::archive::{ArchiveOptions, DEFAULT_CHUNK_LENGTH};
use crate::config::modes::ArchiveMode;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    /// Only list guilds; set from the command line.
    #[serde(skip)]
    pub list_guilds: bool,
}

/// Account credentials configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Discord token.
    #[serde(default)]
    pub token: String,

    /// Whether the token belongs to a bot account.
    #[serde(default)]
    pub bot: bool,
}

/// What to archive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Archive every text channel of this guild.
    #[serde(default)]
    pub guild_id: Option<String>,

    /// Archive these channels.
    #[serde(default)]
    pub channel_ids: Vec<String>,
}

/// Archive options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Archive root directory.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Archive image, video and audio files.
    #[serde(default = "default_true")]
    pub media: bool,

    /// Archive all other files.
    #[serde(default = "default_true")]
    pub nonmedia: bool,

    /// Archive message text.
    #[serde(default = "default_true")]
    pub text: bool,

    /// Items per manifest.
    #[serde(default = "default_chunk_length")]
    pub chunk_length: usize,

    /// Only messages older than this id.
    #[serde(default)]
    pub before: Option<String>,

    /// Only messages newer than this id.
    #[serde(default)]
    pub after: Option<String>,

    /// Skip files larger than this many bytes.
    #[serde(default)]
    pub max_file_size: Option<u64>,

    /// Write the source message next to every file.
    #[serde(default)]
    pub save_sources: bool,

    /// Download files again even if they exist.
    #[serde(default)]
    pub overwrite: bool,

    /// Minimum delay between API requests.
    #[serde(default = "default_request_interval")]
    pub request_interval_ms: u64,

    /// Channels archived at once in guild mode.
    #[serde(default = "default_parallel_channels")]
    pub parallel_channels: usize,

    /// Whether to show download progress.
    #[serde(default = "default_true")]
    pub show_downloads: bool,

    /// API base URL override.
    #[serde(default)]
    pub api_base: Option<String>,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_directory: None,
            media: true,
            nonmedia: true,
            text: true,
            chunk_length: DEFAULT_CHUNK_LENGTH,
            before: None,
            after: None,
            max_file_size: None,
            save_sources: false,
            overwrite: false,
            request_interval_ms: default_request_interval(),
            parallel_channels: default_parallel_channels(),
            show_downloads: true,
            api_base: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_chunk_length() -> usize {
    DEFAULT_CHUNK_LENGTH
}

fn default_request_interval() -> u64 {
    1000
}

fn default_parallel_channels() -> usize {
    1
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Per-user config location, e.g. `~/.config/discord-archiver/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "discord-archiver")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.options
            .download_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.options.request_interval_ms)
    }

    /// What this run does.
    pub fn mode(&self) -> ArchiveMode {
        if self.list_guilds {
            ArchiveMode::ListGuilds
        } else if self.target.guild_id.is_some() && self.target.channel_ids.is_empty() {
            ArchiveMode::Guild
        } else {
            ArchiveMode::Channels
        }
    }

    /// Settings for one archive call.
    pub fn archive_options(&self) -> ArchiveOptions {
        let options = &self.options;
        ArchiveOptions {
            destination: self.download_directory(),
            media: options.media,
            nonmedia: options.nonmedia,
            text: options.text,
            chunk_length: options.chunk_length,
            before: options.before.clone(),
            after: options.after.clone(),
            max_file_size: options.max_file_size,
            save_sources: options.save_sources,
            overwrite: options.overwrite,
            parallel_channels: options.parallel_channels,
            show_downloads: options.show_downloads,
        }
    }
}
