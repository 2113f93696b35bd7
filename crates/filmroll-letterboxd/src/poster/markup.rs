//! Poster resolution from the raw film page HTML.
//!
//! The film page embeds its poster URL in markup and inline JSON even
//! before hydration. We take the first CDN poster path found anywhere in
//! the document rather than relying on a particular element.

use std::sync::LazyLock;

use filmroll_core::{HttpFetch, Request};
use regex::Regex;

use super::rewrite::{absolute_url, upscale_poster_url};
use super::{PosterResolver, ResolveError};
use crate::config::Site;
use crate::model::ResolvedPoster;

static CDN_POSTER_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:https?:)?//[^"'\s<>()]+/resized/(?:film-poster|sm/upload)/[^"'\s<>()]+"#)
        .expect("valid poster regex")
});

/// Poster resolver reading the static film page
pub struct MarkupResolver<'a> {
    fetcher: &'a dyn HttpFetch,
    site: Site,
}

impl<'a> MarkupResolver<'a> {
    pub fn new(fetcher: &'a dyn HttpFetch, site: Site) -> Self {
        Self { fetcher, site }
    }
}

impl PosterResolver for MarkupResolver<'_> {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn resolve(&self, slug: &str) -> Result<ResolvedPoster, ResolveError> {
        let page_url = self.site.film_url(slug);
        log::debug!("Fetching film page: {page_url}");
        let html = self.fetcher.get(&Request::html(&page_url))?.text();

        let found = first_poster_url(&html).ok_or_else(|| {
            ResolveError::not_found(slug, format!("no CDN poster path in {page_url}"))
        })?;
        let found = absolute_url(&found, &self.site.base_url);
        log::debug!("Found poster src: {found}");

        let url = upscale_poster_url(&found).ok_or_else(|| {
            ResolveError::not_found(slug, format!("no 230/345 size tier in {found}"))
        })?;

        Ok(ResolvedPoster {
            slug: slug.to_string(),
            url,
        })
    }
}

/// First CDN poster reference in `html`, with HTML-escaped ampersands undone
fn first_poster_url(html: &str) -> Option<String> {
    CDN_POSTER_IN_TEXT
        .find(html)
        .map(|m| m.as_str().replace("&amp;", "&"))
}
