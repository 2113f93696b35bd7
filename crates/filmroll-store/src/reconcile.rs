//! Collection reconciliation.
//!
//! Merges a fresh scrape into the content directory:
//! 1. Load existing records (by title) to tell additions from updates
//! 2. Deduplicate by title, sort case-insensitively
//! 3. Per film: reuse a valid cached poster or resolve + download, then
//!    write `<slug>.json` if its content changed
//! 4. Prune records (and posters) whose slug left the list
//! 5. Regenerate the snapshot
//!
//! A record is only ever written after its poster is on disk, so no
//! record points at a missing image.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use filmroll_core::Throttle;
use filmroll_letterboxd::{FilmRecord, PosterResolver};
use indicatif::ProgressBar;
use serde::Deserialize;

use crate::entry::{PersistedEntry, load_entries, record_stems};
use crate::image::{CacheError, CacheOutcome, ImageCache};
use crate::report::RunReport;
use crate::slug::slugify;
use crate::snapshot::{SnapshotEntry, write_snapshot};

/// Pause after the first film and every fifth one after it, once
/// downloads have started
const PAUSE_EVERY: usize = 5;
/// Films between progress log lines
const LOG_EVERY: usize = 10;

/// What to do when a film's poster cannot be resolved or downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum FailurePolicy {
    /// Abort the run; nothing is pruned and no snapshot is written
    #[default]
    #[serde(rename = "fail-fast")]
    FailFast,
    /// Log, count as skipped, keep going
    #[serde(rename = "skip")]
    SkipAndContinue,
}

impl FailurePolicy {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "fail-fast" => Some(Self::FailFast),
            "skip" => Some(Self::SkipAndContinue),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::SkipAndContinue => "skip",
        }
    }
}

#[derive(Debug)]
pub enum ReconcileError {
    /// Poster failure under [`FailurePolicy::FailFast`]
    Poster {
        title: String,
        slug: String,
        reason: String,
    },
    /// Content directory or snapshot I/O
    Storage(anyhow::Error),
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poster {
                title,
                slug,
                reason,
            } => write!(f, "failed to resolve poster for {title} ({slug}): {reason}"),
            Self::Storage(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for ReconcileError {}

impl From<anyhow::Error> for ReconcileError {
    fn from(e: anyhow::Error) -> Self {
        Self::Storage(e)
    }
}

impl From<CacheError> for ReconcileError {
    fn from(e: CacheError) -> Self {
        Self::Storage(anyhow::Error::new(e))
    }
}

/// Drop repeated titles (first occurrence wins) and sort by lowercase title.
pub fn dedupe_and_sort(films: Vec<FilmRecord>) -> Vec<FilmRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<FilmRecord> = films
        .into_iter()
        .filter(|f| seen.insert(f.title.clone()))
        .collect();
    unique.sort_by_cached_key(|f| f.title.to_lowercase());
    unique
}

/// Slug a film is stored under: scraped when present, else synthesized
pub fn film_slug(film: &FilmRecord) -> String {
    film.slug
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&film.title))
}

/// Drives one sync of the content directory.
pub struct Reconciler<'a> {
    resolver: &'a dyn PosterResolver,
    cache: &'a ImageCache<'a>,
    throttle: &'a dyn Throttle,
    snapshot_path: PathBuf,
    policy: FailurePolicy,
    force: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        resolver: &'a dyn PosterResolver,
        cache: &'a ImageCache<'a>,
        throttle: &'a dyn Throttle,
        snapshot_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            cache,
            throttle,
            snapshot_path: snapshot_path.into(),
            policy: FailurePolicy::default(),
            force: false,
        }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Re-resolve and re-download every poster, even valid cached ones
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    fn content_dir(&self) -> &Path {
        self.cache.dir()
    }

    /// Reconcile `films` into the content directory.
    pub fn run(&self, films: Vec<FilmRecord>, bar: &ProgressBar) -> Result<RunReport, ReconcileError> {
        let start = Instant::now();
        let dir = self.content_dir();

        let existing = load_entries(dir)?;
        log::info!("Found {} existing movies", existing.len());

        let films = dedupe_and_sort(films);
        let total = films.len();
        log::info!("Processing {total} movies with the {} resolver", self.resolver.name());
        bar.set_length(total as u64);

        let mut report = RunReport {
            total,
            ..Default::default()
        };
        let mut current_slugs = HashSet::with_capacity(total);
        let mut snapshot = Vec::with_capacity(total);

        for (i, film) in films.iter().enumerate() {
            let slug = film_slug(film);
            bar.set_message(film.title.clone());

            if slug.is_empty() {
                log::warn!("No usable slug for {:?}, skipping", film.title);
                report.skipped += 1;
                report.skipped_titles.push(film.title.clone());
                bar.inc(1);
                continue;
            }
            current_slugs.insert(slug.clone());
            snapshot.push(SnapshotEntry {
                title: film.title.clone(),
                url: film.url.clone(),
                slug: slug.clone(),
            });

            match self.ensure_poster(&slug)? {
                Ok(outcome) => {
                    match &outcome {
                        CacheOutcome::Downloaded(_) => {
                            report.downloaded += 1;
                            log::debug!("Downloaded poster for {}", film.title);
                        }
                        CacheOutcome::Reused(_) => report.reused += 1,
                    }
                    let changed = PersistedEntry::new(&film.title, &film.url, &slug, outcome.filename())
                        .write_to(dir)?;
                    if existing.contains_key(&film.title) {
                        report.updated += 1;
                        if !changed {
                            report.unchanged += 1;
                        }
                    } else {
                        report.added += 1;
                        report.added_titles.push(film.title.clone());
                    }
                }
                Err(reason) => {
                    self.settle_failed(film, &slug)?;
                    match self.policy {
                        FailurePolicy::FailFast => {
                            return Err(ReconcileError::Poster {
                                title: film.title.clone(),
                                slug,
                                reason,
                            });
                        }
                        FailurePolicy::SkipAndContinue => {
                            log::warn!("Skipping {} ({slug}): {reason}", film.title);
                            report.skipped += 1;
                            report.skipped_titles.push(film.title.clone());
                        }
                    }
                }
            }

            bar.inc(1);
            if (i + 1) % LOG_EVERY == 0 {
                log::info!("Processed {}/{total} movies...", i + 1);
            }
            if report.downloaded > 0 && i % PAUSE_EVERY == 0 {
                self.throttle.pause();
            }
        }

        report.removed = self.prune(&current_slugs)?;
        write_snapshot(&self.snapshot_path, &snapshot)?;

        report.elapsed = start.elapsed();
        Ok(report)
    }

    /// Outer error: storage failure. Inner error: poster failure, subject
    /// to the failure policy.
    fn ensure_poster(&self, slug: &str) -> Result<Result<CacheOutcome, String>, ReconcileError> {
        if !self.force {
            if let Some(filename) = self.cache.find_cached(slug)? {
                return Ok(Ok(CacheOutcome::Reused(filename)));
            }
        }

        let resolved = match self.resolver.resolve(slug) {
            Ok(resolved) => resolved,
            Err(e) => return Ok(Err(e.to_string())),
        };
        log::debug!("Resolved {slug} -> {}", resolved.url);

        let cached = if self.force {
            self.cache.replace(slug, &resolved.url)
        } else {
            self.cache.ensure_cached(slug, &resolved.url)
        };
        match cached {
            Ok(outcome) => Ok(Ok(outcome)),
            Err(e @ CacheError::Io { .. }) => Err(e.into()),
            Err(e) => Ok(Err(e.to_string())),
        }
    }

    /// After a poster failure, keep the record only if a valid poster is
    /// still on disk, and point it there.
    fn settle_failed(&self, film: &FilmRecord, slug: &str) -> Result<(), ReconcileError> {
        let dir = self.content_dir();
        match self.cache.find_cached(slug)? {
            Some(filename) => {
                PersistedEntry::new(&film.title, &film.url, slug, &filename).write_to(dir)?;
            }
            None => {
                let path = PersistedEntry::path_in(dir, slug);
                if path.exists() {
                    log::warn!("Removing record without poster: {}", path.display());
                    std::fs::remove_file(&path).map_err(|e| {
                        anyhow::Error::new(e).context(format!("failed to remove {}", path.display()))
                    })?;
                }
            }
        }
        Ok(())
    }

    fn prune(&self, current_slugs: &HashSet<String>) -> Result<usize, ReconcileError> {
        let dir = self.content_dir();
        let mut removed = 0;
        for stem in record_stems(dir)? {
            if current_slugs.contains(&stem) {
                continue;
            }
            let path = PersistedEntry::path_in(dir, &stem);
            std::fs::remove_file(&path).map_err(|e| {
                anyhow::Error::new(e).context(format!("failed to remove {}", path.display()))
            })?;
            self.cache.remove(&stem)?;
            log::info!("Removed {stem} (no longer in list)");
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film(title: &str, slug: Option<&str>) -> FilmRecord {
        FilmRecord {
            title: title.to_string(),
            url: format!("https://letterboxd.com/film/{}/", slug.unwrap_or("x")),
            slug: slug.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn dedupe_keeps_first_and_sorts_case_insensitively() {
        let films = vec![
            film("heat", Some("heat-1995")),
            film("Alien", Some("alien")),
            film("heat", Some("heat-1986")),
            film("Brazil", Some("brazil")),
        ];
        let unique = dedupe_and_sort(films);
        let titles: Vec<_> = unique.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Alien", "Brazil", "heat"]);
        assert_eq!(unique[2].slug.as_deref(), Some("heat-1995"));
    }

    #[test]
    fn film_slug_falls_back_to_title() {
        assert_eq!(film_slug(&film("The Lobster", None)), "the-lobster");
        assert_eq!(film_slug(&film("The Lobster", Some(""))), "the-lobster");
        assert_eq!(film_slug(&film("The Lobster", Some("the-lobster-2015"))), "the-lobster-2015");
    }

    #[test]
    fn policy_names() {
        assert_eq!(FailurePolicy::from_name("skip"), Some(FailurePolicy::SkipAndContinue));
        assert_eq!(FailurePolicy::from_name("fail-fast"), Some(FailurePolicy::FailFast));
        assert_eq!(FailurePolicy::from_name("abort"), None);
        assert_eq!(FailurePolicy::default().name(), "fail-fast");
    }

    #[test]
    fn poster_error_display() {
        let err = ReconcileError::Poster {
            title: "Heat".to_string(),
            slug: "heat-1995".to_string(),
            reason: "poster not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to resolve poster for Heat (heat-1995): poster not found"
        );
    }
}
