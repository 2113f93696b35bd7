//! filmroll - mirror a Letterboxd watched-film list into a local collection
//!
//! Scrapes the member's film list, caches one high-resolution poster per
//! film and keeps `<slug>.json` records plus an aggregate snapshot in sync.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "filmroll")]
#[command(about = "Fetch movies from Letterboxd and cache posters")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    sync: cmd::sync::SyncArgs,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./filmroll.toml or ~/.config/filmroll/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(filmroll_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, progress bars show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let verbosity = filmroll_core::Verbosity::from_flags(cli.debug, is_tty);
    filmroll_core::init_logging(verbosity, multi);

    match run(cli, &progress) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, progress: &filmroll_core::SharedProgress) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match cli.command {
        None => cmd::sync::run(cli.sync, &config, progress),
        Some(Command::Config) => {
            print_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_config(config: &Config) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["User", &config.source.username]);
    table.add_row(vec!["Base URL", &config.source.base_url]);
    table.add_row(vec!["Max pages", &config.source.max_pages.to_string()]);
    table.add_row(vec![
        "Page delay",
        &format!("{}ms", config.source.page_delay_ms),
    ]);
    table.add_row(vec!["Poster strategy", config.posters.strategy.name()]);
    table.add_row(vec!["On poster failure", config.posters.on_failure.name()]);
    table.add_row(vec![
        "Download delay",
        &format!("{}ms", config.posters.download_delay_ms),
    ]);
    table.add_row(vec![
        "Content directory",
        &config.output.content_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Snapshot",
        &config.output.snapshot_path.display().to_string(),
    ]);
    table.add_row(vec!["Timeout", &format!("{}s", config.http.timeout_secs)]);

    eprintln!("\n{table}");
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_flags() {
        let cli = Cli::try_parse_from([
            "filmroll",
            "--force",
            "--user",
            "someone",
            "--strategy",
            "endpoint",
            "--on-poster-failure",
            "skip",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert!(cli.sync.force);
        assert_eq!(cli.sync.user.as_deref(), Some("someone"));
    }

    #[test]
    fn parses_config_subcommand() {
        let cli = Cli::try_parse_from(["filmroll", "config", "--debug"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Config)));
        assert!(cli.debug);
    }

    #[test]
    fn help_is_not_an_error_exit() {
        let err = Cli::try_parse_from(["filmroll", "-h"]).err().unwrap();
        assert_eq!(err.exit_code(), 0);
    }
}
