//! Run mode definitions.

use std::fmt;

/// What a run does, derived from the target configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveMode {
    /// Archive the listed channels.
    #[default]
    Channels,
    /// Archive every text channel of one guild.
    Guild,
    /// Print the guilds the account belongs to and exit.
    ListGuilds,
}

impl fmt::Display for ArchiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveMode::Channels => write!(f, "channels"),
            ArchiveMode::Guild => write!(f, "guild"),
            ArchiveMode::ListGuilds => write!(f, "list guilds"),
        }
    }
}
