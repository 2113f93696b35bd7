//! Film list page extraction.
//!
//! The site serves two markup generations:
//! - placeholder markup: `LazyPoster` component stubs carrying data attributes,
//!   hydrated client-side (no script execution needed to read them)
//! - legacy markup: `li.poster-container` items with a `film-poster` div
//!
//! Placeholder markup wins when present; legacy is only scanned when a page
//! contains no placeholders. Pagination detection is independent of both.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::Site;
use crate::model::FilmRecord;

static LAZY_POSTER: LazyLock<Selector> =
    LazyLock::new(|| sel(r#"[data-component-class$="LazyPoster"]"#));
static POSTER_CONTAINER: LazyLock<Selector> = LazyLock::new(|| sel("li.poster-container"));
static FILM_POSTER_DIV: LazyLock<Selector> = LazyLock::new(|| sel(r#"div[class*="film-poster"]"#));
static IMG: LazyLock<Selector> = LazyLock::new(|| sel("img"));
static NEXT_LINK: LazyLock<Selector> = LazyLock::new(|| sel("div.pagination a.next"));

static YEAR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d{4}$").expect("valid year regex"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Which markup generation a page was parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupMode {
    Placeholder,
    Legacy,
}

/// Everything one list page yields
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub records: Vec<FilmRecord>,
    pub has_next: bool,
    pub mode: MarkupMode,
}

/// Parse one list page into film records.
///
/// Containers missing the attributes needed for a slug or title are
/// dropped silently.
pub fn parse_page(html: &str, site: &Site) -> ParsedPage {
    let doc = Html::parse_document(html);

    let placeholders: Vec<ElementRef<'_>> = doc.select(&LAZY_POSTER).collect();
    let (records, mode) = if placeholders.is_empty() {
        let records = doc
            .select(&POSTER_CONTAINER)
            .filter_map(|li| parse_legacy(li, site))
            .collect();
        (records, MarkupMode::Legacy)
    } else {
        let records = placeholders
            .into_iter()
            .filter_map(|el| parse_placeholder(el, site))
            .collect();
        (records, MarkupMode::Placeholder)
    };

    ParsedPage {
        records,
        has_next: doc.select(&NEXT_LINK).next().is_some(),
        mode,
    }
}

/// Human title from a slug: `the-lobster-2015` -> `The Lobster`
pub fn title_from_slug(slug: &str) -> String {
    let without_year = YEAR_SUFFIX.replace(slug, "");
    without_year
        .split('-')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Non-empty trimmed attribute value
fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_placeholder(el: ElementRef<'_>, site: &Site) -> Option<FilmRecord> {
    let link = attr(el, "data-item-link").or_else(|| attr(el, "data-target-link"));

    let slug_from_link = link
        .filter(|l| l.contains("/film/"))
        .and_then(|l| l.trim_end_matches('/').rsplit('/').next())
        .filter(|s| !s.is_empty());
    let slug = slug_from_link
        .or_else(|| attr(el, "data-item-slug"))?
        .to_string();

    let title = attr(el, "data-original-title")
        .or_else(|| attr(el, "data-item-name"))
        .map(str::to_string)
        .unwrap_or_else(|| title_from_slug(&slug));
    if title.is_empty() {
        return None;
    }

    let url = match link {
        Some(l) if l.starts_with('/') => site.absolute(l),
        Some(l) if l.starts_with("http") => l.to_string(),
        _ => site.film_url(&slug),
    };

    let film_id = attr(el, "data-film-id").and_then(|v| v.parse().ok());
    let cache_busting_key = attr(el, "data-resolvable-poster-path").and_then(cache_busting_key);
    let thumbnail_url = attr(el, "data-poster-url")
        .filter(|p| p.starts_with('/'))
        .map(|p| site.absolute(p));

    Some(FilmRecord {
        title,
        url,
        slug: Some(slug),
        film_id,
        cache_busting_key,
        thumbnail_url,
    })
}

/// `cacheBustingKey` from the JSON blob in `data-resolvable-poster-path`
fn cache_busting_key(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    match value.get("cacheBustingKey")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_legacy(li: ElementRef<'_>, site: &Site) -> Option<FilmRecord> {
    let poster = li.select(&FILM_POSTER_DIV).next()?;
    let slug = attr(poster, "data-film-slug")?.to_string();
    let img = poster.select(&IMG).next();

    let title = attr(poster, "data-original-title")
        .or_else(|| img.and_then(|i| attr(i, "data-original-title")))
        .or_else(|| img.and_then(|i| attr(i, "alt")))
        .map(str::to_string)
        .unwrap_or_else(|| title_from_slug(&slug));
    if title.is_empty() {
        return None;
    }

    let thumbnail_url = match attr(poster, "data-poster-url") {
        Some(p) => Some(site.absolute(p)),
        None => img
            .and_then(|i| attr(i, "data-src").or_else(|| attr(i, "src")))
            .filter(|src| !src.contains("empty-poster"))
            .map(str::to_string),
    };

    Some(FilmRecord {
        title,
        url: site.film_url(&slug),
        slug: Some(slug),
        film_id: None,
        cache_busting_key: None,
        thumbnail_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER_PAGE: &str = r#"
<html><body>
<ul class="poster-list">
  <li class="griditem">
    <div class="react-component" data-component-class="globals.comps.LazyPoster"
         data-film-id="51452" data-item-slug="ignored-slug"
         data-item-name="The Lobster" data-original-title="The Lobster (2015)"
         data-item-link="/film/the-lobster/"
         data-poster-url="/film/the-lobster/image-150/"
         data-resolvable-poster-path='{"postered":true,"cacheBustingKey":"a1b2c3"}'></div>
  </li>
  <li class="griditem">
    <div class="react-component" data-component-class="globals.comps.LazyPoster"
         data-item-slug="novocaine-2025"></div>
  </li>
  <li class="griditem">
    <div class="react-component" data-component-class="globals.comps.LazyPoster"
         data-item-name="No Slug Anywhere"></div>
  </li>
</ul>
<div class="pagination"><a class="next" href="/someone/films/page/2/">Older</a></div>
</body></html>"#;

    const LEGACY_PAGE: &str = r#"
<html><body>
<ul class="poster-list">
  <li class="poster-container">
    <div class="really-lazy-load poster film-poster film-poster-1"
         data-film-slug="amelie" data-poster-url="/film/amelie/image-150/">
      <img src="https://s.ltrbxd.com/static/img/empty-poster-150.png" alt="Amélie" />
    </div>
  </li>
  <li class="poster-container">
    <div class="poster film-poster" data-film-slug="heat-1995">
      <img src="https://s.ltrbxd.com/static/img/empty-poster-150.png" />
    </div>
  </li>
  <li class="poster-container">
    <div class="poster film-poster">
      <img alt="Missing Slug" />
    </div>
  </li>
</ul>
</body></html>"#;

    fn site() -> Site {
        Site::new("https://letterboxd.com", "someone")
    }

    #[test]
    fn placeholder_prefers_link_slug_and_original_title() {
        let page = parse_page(PLACEHOLDER_PAGE, &site());
        assert_eq!(page.mode, MarkupMode::Placeholder);
        let lobster = &page.records[0];
        assert_eq!(lobster.slug.as_deref(), Some("the-lobster"));
        assert_eq!(lobster.title, "The Lobster (2015)");
        assert_eq!(lobster.url, "https://letterboxd.com/film/the-lobster/");
        assert_eq!(lobster.film_id, Some(51452));
        assert_eq!(lobster.cache_busting_key.as_deref(), Some("a1b2c3"));
        assert_eq!(
            lobster.thumbnail_url.as_deref(),
            Some("https://letterboxd.com/film/the-lobster/image-150/")
        );
    }

    #[test]
    fn placeholder_falls_back_to_slug_attribute_and_derived_title() {
        let page = parse_page(PLACEHOLDER_PAGE, &site());
        let novocaine = &page.records[1];
        assert_eq!(novocaine.slug.as_deref(), Some("novocaine-2025"));
        assert_eq!(novocaine.title, "Novocaine");
        assert_eq!(novocaine.url, "https://letterboxd.com/film/novocaine-2025/");
        assert_eq!(novocaine.film_id, None);
    }

    #[test]
    fn placeholder_without_slug_is_dropped() {
        let page = parse_page(PLACEHOLDER_PAGE, &site());
        assert_eq!(page.records.len(), 2);
        assert!(page.records.iter().all(|r| r.title != "No Slug Anywhere"));
    }

    #[test]
    fn legacy_markup_used_when_no_placeholders() {
        let page = parse_page(LEGACY_PAGE, &site());
        assert_eq!(page.mode, MarkupMode::Legacy);
        assert_eq!(page.records.len(), 2);

        let amelie = &page.records[0];
        assert_eq!(amelie.title, "Amélie");
        assert_eq!(amelie.slug.as_deref(), Some("amelie"));
        assert_eq!(amelie.url, "https://letterboxd.com/film/amelie/");
        assert_eq!(
            amelie.thumbnail_url.as_deref(),
            Some("https://letterboxd.com/film/amelie/image-150/")
        );

        let heat = &page.records[1];
        assert_eq!(heat.title, "Heat");
        assert_eq!(heat.thumbnail_url, None);
    }

    #[test]
    fn next_page_detected_in_both_modes() {
        assert!(parse_page(PLACEHOLDER_PAGE, &site()).has_next);
        assert!(!parse_page(LEGACY_PAGE, &site()).has_next);

        let legacy_with_next = LEGACY_PAGE.replace(
            "</ul>",
            r#"</ul><div class="pagination"><a class="next" href="/p/2/">Older</a></div>"#,
        );
        assert!(parse_page(&legacy_with_next, &site()).has_next);
    }

    #[test]
    fn pagination_without_next_link() {
        let html = r#"<div class="pagination"><a class="previous" href="/p/1/">Newer</a></div>"#;
        assert!(!parse_page(html, &site()).has_next);
    }

    #[test]
    fn empty_page_yields_nothing() {
        let page = parse_page("<html><body></body></html>", &site());
        assert!(page.records.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn title_from_slug_strips_year() {
        assert_eq!(title_from_slug("the-lobster-2015"), "The Lobster");
        assert_eq!(title_from_slug("novocaine-2025"), "Novocaine");
        assert_eq!(title_from_slug("blade-runner-2049"), "Blade Runner");
        assert_eq!(title_from_slug("alien"), "Alien");
    }

    #[test]
    fn cache_busting_key_accepts_numbers() {
        assert_eq!(
            cache_busting_key(r#"{"cacheBustingKey":12}"#).as_deref(),
            Some("12")
        );
        assert_eq!(cache_busting_key("not json"), None);
        assert_eq!(cache_busting_key(r#"{"postered":true}"#), None);
    }
}
