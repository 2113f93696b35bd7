//! Poster resolution from the AJAX poster fragment.

use std::sync::LazyLock;

use filmroll_core::{HttpFetch, Request};
use scraper::{Html, Selector};

use super::rewrite::{absolute_url, parse_srcset, upscale_poster_url};
use super::{PosterResolver, ResolveError};
use crate::config::Site;
use crate::model::ResolvedPoster;

/// Fragment size requested; its 2x srcset entry is the 230x345 tier
const FRAGMENT_SIZE: &str = "115x172";

static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("static selector"));

/// Poster resolver reading `/ajax/poster/film/<slug>/std/115x172/`
pub struct EndpointResolver<'a> {
    fetcher: &'a dyn HttpFetch,
    site: Site,
}

impl<'a> EndpointResolver<'a> {
    pub fn new(fetcher: &'a dyn HttpFetch, site: Site) -> Self {
        Self { fetcher, site }
    }

    fn fragment_url(&self, slug: &str) -> String {
        format!(
            "{}/ajax/poster/film/{slug}/std/{FRAGMENT_SIZE}/",
            self.site.base_url
        )
    }
}

impl PosterResolver for EndpointResolver<'_> {
    fn name(&self) -> &'static str {
        "endpoint"
    }

    fn resolve(&self, slug: &str) -> Result<ResolvedPoster, ResolveError> {
        let fragment_url = self.fragment_url(slug);
        log::debug!("Fetching poster fragment: {fragment_url}");
        let html = self.fetcher.get(&Request::html(&fragment_url))?.text();

        let candidates = fragment_candidates(&html);
        if candidates.is_empty() {
            return Err(ResolveError::not_found(slug, "no poster image in fragment"));
        }

        candidates
            .iter()
            .map(|c| absolute_url(c, &self.site.base_url))
            .find_map(|c| upscale_poster_url(&c))
            .map(|url| ResolvedPoster {
                slug: slug.to_string(),
                url,
            })
            .ok_or_else(|| ResolveError::not_found(slug, "no fragment candidate has a 230/345 size tier"))
    }
}

/// Candidate URLs in preference order: `2x` srcset entry, other srcset
/// entries, then `src`.
fn fragment_candidates(html: &str) -> Vec<String> {
    let doc = Html::parse_fragment(html);
    let Some(img) = doc.select(&IMG).find(|img| {
        let el = img.value();
        !el.attr("class").unwrap_or_default().contains("empty-poster")
            && !el.attr("src").unwrap_or_default().contains("empty-poster")
    }) else {
        return Vec::new();
    };
    let el = img.value();

    let srcset = parse_srcset(el.attr("srcset").unwrap_or_default());
    let (doubled, rest): (Vec<_>, Vec<_>) =
        srcset.into_iter().partition(|c| c.descriptor == Some("2x"));

    doubled
        .into_iter()
        .chain(rest)
        .map(|c| c.url)
        .chain(el.attr("src"))
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}
