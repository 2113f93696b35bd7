//! Sync: scrape the film list and reconcile the local collection

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use filmroll_core::{ConstantDelay, HttpClient, HttpFetch, ProgressContext, SharedProgress};
use filmroll_letterboxd::{Paginator, Site, Strategy, build_resolver};
use filmroll_store::{FailurePolicy, ImageCache, ReconcileError, Reconciler, RunReport};

use crate::config::Config;

/// No films scraped
pub const EXIT_NO_FILMS: u8 = 1;
/// Poster resolver could not be initialized
pub const EXIT_RESOLVER_INIT: u8 = 2;
/// Poster failure under the fail-fast policy
pub const EXIT_POSTER_FAILURE: u8 = 3;

/// Recently added titles listed after a run
const RECENT_LIMIT: usize = 10;

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Re-resolve and re-download every poster, even valid cached ones
    #[arg(long)]
    pub force: bool,

    /// Letterboxd member whose watched films are mirrored
    #[arg(short, long)]
    pub user: Option<String>,

    /// How poster URLs are located
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// What to do when a poster cannot be resolved or downloaded
    #[arg(long, value_enum)]
    pub on_poster_failure: Option<PolicyArg>,

    /// Directory for per-film records and posters
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// Path of the aggregate snapshot
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum StrategyArg {
    /// Headless browser (needs the `chrome` feature)
    Rendered,
    /// Regex over the static film page
    Markup,
    /// AJAX poster fragment
    Endpoint,
}

impl From<StrategyArg> for Strategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Rendered => Strategy::Rendered,
            StrategyArg::Markup => Strategy::Markup,
            StrategyArg::Endpoint => Strategy::Endpoint,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum PolicyArg {
    FailFast,
    Skip,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::FailFast => FailurePolicy::FailFast,
            PolicyArg::Skip => FailurePolicy::SkipAndContinue,
        }
    }
}

/// Settings after CLI flags are layered over the config file
#[derive(Debug, Clone)]
struct Settings {
    site: Site,
    strategy: Strategy,
    policy: FailurePolicy,
    content_dir: PathBuf,
    snapshot_path: PathBuf,
    page_delay: ConstantDelay,
    download_delay: ConstantDelay,
    user_agent: String,
    timeout: Duration,
    force: bool,
}

impl Settings {
    fn resolve(args: SyncArgs, config: &Config) -> Self {
        let username = args.user.unwrap_or_else(|| config.source.username.clone());
        let mut site = Site::new(&config.source.base_url, &username);
        site.max_pages = config.source.max_pages;

        Self {
            site,
            strategy: args.strategy.map_or(config.posters.strategy, Into::into),
            policy: args
                .on_poster_failure
                .map_or(config.posters.on_failure, Into::into),
            content_dir: args
                .content_dir
                .unwrap_or_else(|| config.output.content_dir.clone()),
            snapshot_path: args
                .snapshot
                .unwrap_or_else(|| config.output.snapshot_path.clone()),
            page_delay: ConstantDelay::from_millis(config.source.page_delay_ms),
            download_delay: ConstantDelay::from_millis(config.posters.download_delay_ms),
            user_agent: config.http.user_agent.clone(),
            timeout: Duration::from_secs(config.http.timeout_secs),
            force: args.force,
        }
    }
}

pub fn run(args: SyncArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let settings = Settings::resolve(args, config);
    let site = &settings.site;

    log::info!("Fetching movies from Letterboxd");
    log::info!("  User: {}", site.username);
    log::info!("  Strategy: {}", settings.strategy);
    log::info!("  On poster failure: {}", settings.policy.name());
    log::info!("  Content: {}", settings.content_dir.display());
    if settings.force {
        log::info!("  Forcing poster refresh");
    }

    let client = HttpClient::new(&settings.user_agent, settings.timeout)
        .context("failed to build HTTP client")?;

    sync(&settings, &client, progress)
}

/// Scrape, build the resolver and reconcile; maps outcomes to exit codes.
fn sync(settings: &Settings, client: &dyn HttpFetch, progress: &ProgressContext) -> Result<ExitCode> {
    let site = &settings.site;

    let spinner = progress.stage_line("films");
    let films = Paginator::new(client, site, &settings.page_delay).fetch_all_with(|page, total| {
        spinner.set_message(format!("page {page}: {total} films"));
    });
    spinner.finish_and_clear();

    if films.is_empty() {
        log::error!("No movies found for {}", site.username);
        return Ok(ExitCode::from(EXIT_NO_FILMS));
    }
    log::info!("Scraped {} films", films.len());

    let resolver = match build_resolver(settings.strategy, client, site, &settings.user_agent) {
        Ok(resolver) => resolver,
        Err(e) => {
            log::error!("Cannot initialize {} poster resolver: {e}", settings.strategy);
            return Ok(ExitCode::from(EXIT_RESOLVER_INIT));
        }
    };

    let cache = ImageCache::open(&settings.content_dir, client, site.referer())
        .with_context(|| format!("failed to open {}", settings.content_dir.display()))?;

    let bar = progress.film_bar(films.len());
    let result = Reconciler::new(
        resolver.as_ref(),
        &cache,
        &settings.download_delay,
        &settings.snapshot_path,
    )
    .policy(settings.policy)
    .force(settings.force)
    .run(films, &bar);
    bar.finish_and_clear();

    match result {
        Ok(report) => {
            if progress.is_tty() {
                eprintln!("{}", report.format_table());
            } else {
                report.log();
            }
            log_recent_additions(&report);
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ ReconcileError::Poster { .. }) => {
            log::error!("{e}");
            Ok(ExitCode::from(EXIT_POSTER_FAILURE))
        }
        Err(ReconcileError::Storage(e)) => Err(e),
    }
}

fn log_recent_additions(report: &RunReport) {
    let (shown, more) = report.recent_additions(RECENT_LIMIT);
    if shown.is_empty() {
        return;
    }
    log::info!("Recently added movies:");
    for title in shown {
        log::info!("  + {title}");
    }
    if more > 0 {
        log::info!("  ... and {more} more");
    }
}
