//! Local slug synthesis for films the scraper gave no slug for

use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"));
static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// Lowercase, drop punctuation, collapse whitespace/hyphen runs to one
/// hyphen, trim hyphens. Unicode word characters are kept.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    SEPARATOR_RUNS
        .replace_all(&stripped, "-")
        .trim_matches('-')
        .to_string()
}
