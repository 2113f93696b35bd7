//! Per-film records: `<slug>.json` in the content directory

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fsutil::write_if_changed;

/// One persisted film record, consumed by the site's content collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub title: String,
    #[serde(rename = "letterboxdUrl")]
    pub letterboxd_url: String,
    /// Relative to the record: `./<slug>.<ext>`
    pub poster: String,
    pub slug: String,
}

impl PersistedEntry {
    pub fn new(title: &str, url: &str, slug: &str, poster_file: &str) -> Self {
        Self {
            title: title.to_string(),
            letterboxd_url: url.to_string(),
            poster: format!("./{poster_file}"),
            slug: slug.to_string(),
        }
    }

    pub fn path_in(dir: &Path, slug: &str) -> PathBuf {
        dir.join(format!("{slug}.json"))
    }

    /// Write to `dir/<slug>.json`, two-space pretty JSON.
    ///
    /// Returns false when the file already held exactly this content.
    pub fn write_to(&self, dir: &Path) -> Result<bool> {
        let path = Self::path_in(dir, &self.slug);
        let json = serde_json::to_string_pretty(self).context("failed to serialize entry")?;
        write_if_changed(&path, json.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// Every `*.json` stem in `dir`
pub fn record_stems(dir: &Path) -> Result<Vec<String>> {
    let pattern = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut stems: Vec<String> = glob::glob(&pattern)
        .context("invalid glob pattern")?
        .filter_map(|e| e.ok())
        .filter(|p| p.is_file())
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    stems.sort();
    Ok(stems)
}

/// Load every record in `dir` indexed by title.
///
/// Unreadable or malformed files are logged and skipped.
pub fn load_entries(dir: &Path) -> Result<HashMap<String, PersistedEntry>> {
    let mut entries = HashMap::new();
    if !dir.exists() {
        return Ok(entries);
    }
    for stem in record_stems(dir)? {
        let path = PersistedEntry::path_in(dir, &stem);
        match PersistedEntry::read_from(&path) {
            Ok(entry) => {
                entries.insert(entry.title.clone(), entry);
            }
            Err(e) => log::warn!("Ignoring record: {e:#}"),
        }
    }
    Ok(entries)
}
