//! Discord Archiver - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use discord_archiver::{
    api::{DiscordApi, RequestQueue},
    archive::{archive_channel, archive_guild, ArchiveOptions},
    cli::Args,
    config::{validate_config, ArchiveMode, Config},
    download::{ArchiveStats, GlobalStats},
    error::{exit_codes, Error, Result},
    fs::validate_destination,
    output::{
        create_spinner, print_banner, print_channel_stats, print_config_summary, print_error,
        print_global_stats, print_guilds, print_info, print_success, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::Destination { .. }
                | Error::TomlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::Api(_) | Error::Discord(_) | Error::RateLimited(_) => {
                    ExitCode::from(exit_codes::API_ERROR as u8)
                }
                Error::Download(_) => ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<i32> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Print banner
    print_banner();

    // Load configuration, falling back to the per-user location
    let config_path = if args.config.exists() {
        Some(args.config.clone())
    } else {
        Config::default_path().filter(|p| p.exists())
    };
    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => {
            print_warning(&format!(
                "Configuration file not found: {}",
                args.config.display()
            ));
            print_info("Using default configuration with CLI arguments");
            Config::default()
        }
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Validate configuration
    validate_config(&config)?;

    // Initialize API client
    let queue = RequestQueue::new(config.request_interval());
    let mut api = DiscordApi::new(&config.account.token, config.account.bot, queue)?;
    if let Some(base) = &config.options.api_base {
        api = api.with_base_url(base.clone());
    }

    // Validate token by fetching the current user
    let spinner = create_spinner("Connecting to Discord...");
    let user = api.get_current_user().await;
    spinner.finish_and_clear();
    let user = user?;
    print_info(&format!(
        "Logged in as: {}",
        user.global_name.as_deref().unwrap_or(&user.username)
    ));

    let mode = config.mode();
    if mode == ArchiveMode::ListGuilds {
        let guilds = api.get_current_user_guilds().await?;
        print_guilds(&guilds);
        return Ok(exit_codes::SUCCESS);
    }

    let options = config.archive_options();
    validate_destination(&options.destination)?;

    print_config_summary(
        &targets(&config),
        &mode.to_string(),
        &kinds(&options),
        &options.destination.display().to_string(),
    );

    // Stop fetching on Ctrl-C; collected items are still written
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                print_warning("Interrupted, finishing current chunks...");
                cancel.cancel();
            }
        });
    }

    let mut global_stats = GlobalStats::default();

    match mode {
        ArchiveMode::Guild => {
            let guild_id = config
                .target
                .guild_id
                .as_deref()
                .ok_or_else(|| Error::MissingConfig("guild_id".into()))?;
            let guild = api.get_guild(guild_id).await?;
            print_info(&format!("Archiving guild: {}", guild.name));

            for result in archive_guild(&api, &options, guild_id, &cancel).await? {
                record(&mut global_stats, &result.channel.label(), result.result);
            }
        }
        ArchiveMode::Channels => {
            for channel_id in &config.target.channel_ids {
                if cancel.is_cancelled() {
                    break;
                }
                print_info(&format!("Processing channel: {}", channel_id));
                let result = archive_channel(&api, &options, channel_id, &cancel).await;
                record(&mut global_stats, channel_id, result);
            }
        }
        ArchiveMode::ListGuilds => {}
    }

    // Print global statistics
    print_global_stats(&global_stats);

    if global_stats.cancelled {
        return Ok(exit_codes::ABORT);
    }
    if global_stats.has_failures() {
        print_warning(&format!(
            "{} channel(s) failed",
            global_stats.channels_failed
        ));
        return Ok(exit_codes::SOME_CHANNELS_FAILED);
    }

    print_success("Archive complete");
    Ok(exit_codes::SUCCESS)
}

fn record(global_stats: &mut GlobalStats, label: &str, result: Result<ArchiveStats>) {
    match result {
        Ok(stats) => {
            print_channel_stats(&stats);
            global_stats.add_channel_stats(&stats);
        }
        Err(e) => {
            print_error(&format!("Failed to archive {}: {}", label, e));
            global_stats.mark_channel_failed();
        }
    }
}

fn targets(config: &Config) -> Vec<String> {
    match &config.target.guild_id {
        Some(guild) if config.target.channel_ids.is_empty() => vec![format!("guild {}", guild)],
        _ => config.target.channel_ids.clone(),
    }
}

fn kinds(options: &ArchiveOptions) -> Vec<&'static str> {
    [
        (options.media, "media"),
        (options.nonmedia, "nonmedia"),
        (options.text, "text"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect()
}
