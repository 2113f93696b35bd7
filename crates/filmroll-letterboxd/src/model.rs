//! Film records produced by the scraper

/// One film as scraped from a list page.
///
/// `slug` is the identity key on the remote site; `title` is for display
/// and may repeat across re-releases.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilmRecord {
    /// Display title, possibly including the release year
    pub title: String,
    /// Canonical detail-page URL
    pub url: String,
    pub slug: Option<String>,
    pub film_id: Option<u64>,
    pub cache_busting_key: Option<String>,
    /// List-page thumbnail. Never downloaded.
    pub thumbnail_url: Option<String>,
}

/// A poster URL ready for download.
///
/// Exactly this URL is fetched; it is never re-derived downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPoster {
    pub slug: String,
    pub url: String,
}
