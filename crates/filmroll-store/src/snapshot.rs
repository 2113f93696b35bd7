//! Aggregate collection snapshot (`movies.json`)

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::fsutil::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub title: String,
    pub url: String,
    pub slug: String,
}

/// Tab-indented JSON array
pub fn to_tab_json(entries: &[SnapshotEntry]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    entries
        .serialize(&mut ser)
        .context("failed to serialize snapshot")?;
    Ok(buf)
}

/// Regenerate the snapshot at `path`, creating parent directories.
pub fn write_snapshot(path: &Path, entries: &[SnapshotEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let bytes = to_tab_json(entries)?;
    write_atomic(path, &bytes).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn tab_indented() {
        let entries = vec![SnapshotEntry {
            title: "Alien".to_string(),
            url: "https://letterboxd.com/film/alien/".to_string(),
            slug: "alien".to_string(),
        }];
        let json = String::from_utf8(to_tab_json(&entries).unwrap()).unwrap();
        assert_eq!(
            json,
            "[\n\t{\n\t\t\"title\": \"Alien\",\n\t\t\"url\": \"https://letterboxd.com/film/alien/\",\n\t\t\"slug\": \"alien\"\n\t}\n]"
        );
    }

    #[test]
    fn writes_into_missing_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("movies.json");
        write_snapshot(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
