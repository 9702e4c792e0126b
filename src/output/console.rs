//! Console output utilities.

use console::style;

use crate::api::types::PartialGuild;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Discord Archiver                                  ║
║     Channel history to local storage                  ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(targets: &[String], mode: &str, kinds: &[&str], archive_dir: &str) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Targets: {}", targets.join(", "));
    println!("  Mode: {}", mode);
    println!("  Archiving: {}", kinds.join(", "));
    println!("  Directory: {}", archive_dir);
    println!();
}

/// Print the guilds an account belongs to.
pub fn print_guilds(guilds: &[PartialGuild]) {
    println!();
    println!("{}", style(format!("Guilds ({}):", guilds.len())).bold());
    for guild in guilds {
        let owner = if guild.owner { " (owner)" } else { "" };
        println!("  {}  {}{}", style(&guild.id).dim(), guild.name, owner);
    }
}
