//! Configuration validation logic.

use std::sync::OnceLock;

use crate::config::loader::Config;
use crate::config::modes::ArchiveMode;
use crate::error::{Error, Result};
use regex::Regex;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_token(&config.account.token)?;

    if config.mode() == ArchiveMode::ListGuilds {
        return Ok(());
    }

    validate_target(config)?;
    validate_options(config)?;

    Ok(())
}

/// Validate the Discord token.
pub fn validate_token(token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::MissingConfig("token".to_string()));
    }

    // Check for placeholder values
    let token_lower = token.to_lowercase();
    if token_lower.contains("replaceme") || token_lower.contains("your_token") {
        return Err(Error::ConfigValidation {
            field: "token".to_string(),
            message: "Token appears to be a placeholder. Please provide your actual Discord token."
                .to_string(),
        });
    }

    Ok(())
}

/// Check that `value` looks like a Discord id.
pub fn validate_snowflake(field: &str, value: &str) -> Result<()> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^\d{15,21}$").expect("snowflake pattern is valid"));

    if !pattern.is_match(value) {
        return Err(Error::ConfigValidation {
            field: field.to_string(),
            message: format!("'{}' is not a valid Discord id (15-21 digits)", value),
        });
    }

    Ok(())
}

fn validate_target(config: &Config) -> Result<()> {
    let target = &config.target;

    if target.guild_id.is_none() && target.channel_ids.is_empty() {
        return Err(Error::MissingConfig(
            "guild_id or channel_ids (at least one target required)".to_string(),
        ));
    }

    if let Some(guild_id) = &target.guild_id {
        validate_snowflake("guild_id", guild_id)?;
    }
    for channel_id in &target.channel_ids {
        validate_snowflake("channel_ids", channel_id)?;
    }

    Ok(())
}

fn validate_options(config: &Config) -> Result<()> {
    let options = &config.options;

    if options.chunk_length == 0 {
        return Err(Error::ConfigValidation {
            field: "chunk_length".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if options.parallel_channels == 0 {
        return Err(Error::ConfigValidation {
            field: "parallel_channels".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if !(options.media || options.nonmedia || options.text) {
        return Err(Error::ConfigValidation {
            field: "options".to_string(),
            message: "Nothing to archive: enable at least one of media, nonmedia or text"
                .to_string(),
        });
    }

    if let Some(before) = &options.before {
        validate_snowflake("before", before)?;
    }
    if let Some(after) = &options.after {
        validate_snowflake("after", after)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNEL: &str = "123456789012345678";

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.account.token = "token".into();
        config.target.channel_ids = vec![CHANNEL.into()];
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_token_required() {
        let mut config = valid_config();
        config.account.token = "  ".into();
        assert!(matches!(validate_config(&config), Err(Error::MissingConfig(_))));

        config.account.token = "YOUR_TOKEN_HERE".into();
        assert!(matches!(
            validate_config(&config),
            Err(Error::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_target_required_unless_listing() {
        let mut config = valid_config();
        config.target.channel_ids.clear();
        assert!(validate_config(&config).is_err());

        config.list_guilds = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_snowflake_shape() {
        assert!(validate_snowflake("x", CHANNEL).is_ok());
        assert!(validate_snowflake("x", "12345").is_err());
        assert!(validate_snowflake("x", "12345678901234567a").is_err());
        assert!(validate_snowflake("x", "1234567890123456789012").is_err());

        let mut config = valid_config();
        config.options.after = Some("yesterday".into());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_option_bounds() {
        let mut config = valid_config();
        config.options.chunk_length = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.options.parallel_channels = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.options.media = false;
        config.options.nonmedia = false;
        config.options.text = false;
        assert!(validate_config(&config).is_err());
    }
}
