//! Poster resolution from a browser-rendered film page.
//!
//! The film page hydrates its poster client-side, so the static HTML only
//! holds a placeholder. The rendering engine sits behind [`PageRenderer`];
//! poster selection and the size rewrite live here and know nothing about
//! the engine.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::rewrite::{absolute_url, parse_srcset, upscale_poster_url};
use super::{PosterResolver, ResolveError};
use crate::config::Site;
use crate::model::ResolvedPoster;

/// Alt-text prefix that marks the film poster (not cast photos or backdrops)
pub const POSTER_ALT_MARKER: &str = "Poster for";

/// Selector handed to the renderer
pub const POSTER_SELECTOR: &str = r#"img[alt^="Poster for"]"#;

/// Placeholder image served until the real poster loads
const EMPTY_POSTER: &str = "empty-poster";

static CDN_POSTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^/]+/resized/(?:sm/upload|film-poster)/").expect("valid CDN regex")
});

/// Rendering engine failure
#[derive(Debug)]
pub enum RenderError {
    Launch(String),
    Navigation { url: String, message: String },
    Script(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Launch(msg) => write!(f, "launch: {msg}"),
            Self::Navigation { url, message } => write!(f, "navigate to {url}: {message}"),
            Self::Script(msg) => write!(f, "script: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Live properties of one `<img>` after rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderedImage {
    pub alt: Option<String>,
    /// Source the browser actually resolved
    pub current_src: Option<String>,
    pub srcset: Option<String>,
    pub src: Option<String>,
    pub data_src: Option<String>,
}

/// Narrow view of a browser: load a page, read image properties.
pub trait PageRenderer {
    /// Load `url` and wait for it to settle
    fn navigate(&self, url: &str) -> Result<(), RenderError>;

    /// Read properties of every element matching `selector` on the current page
    fn query_images(&self, selector: &str) -> Result<Vec<RenderedImage>, RenderError>;
}

/// Poster resolver driving a [`PageRenderer`]
pub struct RenderedResolver {
    renderer: Box<dyn PageRenderer>,
    site: Site,
}

impl RenderedResolver {
    pub fn new(renderer: Box<dyn PageRenderer>, site: Site) -> Self {
        Self { renderer, site }
    }
}

impl PosterResolver for RenderedResolver {
    fn name(&self) -> &'static str {
        "rendered"
    }

    fn resolve(&self, slug: &str) -> Result<ResolvedPoster, ResolveError> {
        let page_url = self.site.film_url(slug);
        log::debug!("Visiting film page: {page_url}");
        self.renderer.navigate(&page_url)?;

        let images = self.renderer.query_images(POSTER_SELECTOR)?;
        let candidates: Vec<String> = images
            .iter()
            .filter(|img| {
                img.alt
                    .as_deref()
                    .is_some_and(|alt| alt.starts_with(POSTER_ALT_MARKER))
            })
            .filter_map(pick_source)
            .map(|src| absolute_url(src, &self.site.base_url))
            .collect();

        // CDN resized paths carry the size tier we can rewrite
        let chosen = candidates
            .iter()
            .find(|c| CDN_POSTER.is_match(c))
            .or_else(|| candidates.first())
            .ok_or_else(|| {
                ResolveError::not_found(slug, format!("no '{POSTER_ALT_MARKER}' image on {page_url}"))
            })?;
        log::debug!("Found poster src: {chosen}");

        let url = upscale_poster_url(chosen).ok_or_else(|| {
            ResolveError::not_found(slug, format!("no 230/345 size tier in {chosen}"))
        })?;
        log::debug!("Rewritten poster src: {url}");

        Ok(ResolvedPoster {
            slug: slug.to_string(),
            url,
        })
    }
}

fn usable(url: &str) -> bool {
    !url.is_empty() && !url.contains(EMPTY_POSTER)
}

/// Best source of one image: resolved `currentSrc`, then the last (largest)
/// `srcset` candidate, then the static `src`/`data-src`.
fn pick_source(img: &RenderedImage) -> Option<&str> {
    if let Some(current) = img.current_src.as_deref().filter(|u| usable(u)) {
        return Some(current);
    }
    if let Some(last) = img
        .srcset
        .as_deref()
        .and_then(|s| parse_srcset(s).last().map(|c| c.url))
        .filter(|u| usable(u))
    {
        return Some(last);
    }
    img.src
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(img.data_src.as_deref())
        .filter(|u| usable(u))
}
