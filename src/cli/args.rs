//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Discord channel archiver CLI.
#[derive(Parser, Debug)]
#[command(
    name = "discord-archiver",
    version,
    about = "Archive Discord channel history to local storage",
    long_about = "A CLI tool to archive the messages, attachments and linked files of Discord channels.\n\n\
                  Output is batched into JSON manifests; re-runs skip files that already exist."
)]
pub struct Args {
    /// Channel id(s) to archive.
    #[arg(short = 'C', long = "channel", num_args = 1..)]
    pub channels: Option<Vec<String>>,

    /// Archive every text channel of this guild.
    #[arg(short, long)]
    pub guild: Option<String>,

    /// List the guilds the account is in and exit.
    #[arg(long)]
    pub list_guilds: bool,

    /// Archive root directory.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Discord token.
    #[arg(short, long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// The token is a bot token.
    #[arg(long)]
    pub bot: bool,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Skip image, video and audio files.
    #[arg(long)]
    pub no_media: bool,

    /// Skip all other files.
    #[arg(long)]
    pub no_nonmedia: bool,

    /// Skip message text.
    #[arg(long)]
    pub no_text: bool,

    /// Items per manifest.
    #[arg(long)]
    pub chunk_length: Option<usize>,

    /// Only messages older than this id.
    #[arg(long)]
    pub before: Option<String>,

    /// Only messages newer than this id.
    #[arg(long)]
    pub after: Option<String>,

    /// Skip files larger than this many bytes.
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Save the source message of every file.
    #[arg(long)]
    pub save_sources: bool,

    /// Download files again even if they exist.
    #[arg(long)]
    pub overwrite: bool,

    /// Minimum delay between API requests in milliseconds.
    #[arg(long)]
    pub request_interval: Option<u64>,

    /// Channels archived at once in guild mode.
    #[arg(short = 'j', long)]
    pub parallel: Option<usize>,

    /// Hide download progress information.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        // Override targets if provided
        if let Some(channels) = self.channels {
            config.target.channel_ids = channels;
        }

        if let Some(guild) = self.guild {
            config.target.guild_id = Some(guild);
        }

        config.list_guilds = self.list_guilds;

        // Override account settings if provided
        if let Some(token) = self.token {
            config.account.token = token;
        }

        if self.bot {
            config.account.bot = true;
        }

        // Override options if provided
        let options = &mut config.options;

        if let Some(dir) = self.download_directory {
            options.download_directory = Some(dir);
        }

        if let Some(chunk_length) = self.chunk_length {
            options.chunk_length = chunk_length;
        }

        if let Some(before) = self.before {
            options.before = Some(before);
        }

        if let Some(after) = self.after {
            options.after = Some(after);
        }

        if let Some(max) = self.max_file_size {
            options.max_file_size = Some(max);
        }

        if let Some(interval) = self.request_interval {
            options.request_interval_ms = interval;
        }

        if let Some(parallel) = self.parallel {
            options.parallel_channels = parallel;
        }

        // Boolean flags (only override if set to non-default)
        if self.no_media {
            options.media = false;
        }

        if self.no_nonmedia {
            options.nonmedia = false;
        }

        if self.no_text {
            options.text = false;
        }

        if self.save_sources {
            options.save_sources = true;
        }

        if self.overwrite {
            options.overwrite = true;
        }

        if self.quiet {
            options.show_downloads = false;
        }
    }
}
