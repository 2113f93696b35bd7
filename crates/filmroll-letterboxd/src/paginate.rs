//! Film list pagination

use filmroll_core::{HttpFetch, Request, Throttle};

use crate::config::Site;
use crate::extract::parse_page;
use crate::model::FilmRecord;

/// Walks a member's film list one page at a time.
pub struct Paginator<'a> {
    fetcher: &'a dyn HttpFetch,
    site: &'a Site,
    throttle: &'a dyn Throttle,
}

impl<'a> Paginator<'a> {
    pub fn new(fetcher: &'a dyn HttpFetch, site: &'a Site, throttle: &'a dyn Throttle) -> Self {
        Self {
            fetcher,
            site,
            throttle,
        }
    }

    /// Fetch and parse one list page.
    ///
    /// Transport failures are logged and reported as an empty last page,
    /// which callers treat as end of list.
    pub fn fetch_page(&self, page: u32) -> (Vec<FilmRecord>, bool) {
        let url = self.site.list_page_url(page);
        log::debug!("Fetching list page {page}: {url}");

        match self.fetcher.get(&Request::html(url)) {
            Ok(resp) => {
                let parsed = parse_page(&resp.text(), self.site);
                log::info!(
                    "Found {} films on page {page} ({:?} markup)",
                    parsed.records.len(),
                    parsed.mode
                );
                (parsed.records, parsed.has_next)
            }
            Err(e) => {
                log::warn!("Error fetching page {page}: {e}");
                (Vec::new(), false)
            }
        }
    }

    /// Fetch every page until one is empty, no next page is signaled, or
    /// the page ceiling is reached.
    pub fn fetch_all(&self) -> Vec<FilmRecord> {
        self.fetch_all_with(|_, _| {})
    }

    /// Like [`fetch_all`](Self::fetch_all), calling `on_page(page, total_so_far)`
    /// after each non-empty page.
    pub fn fetch_all_with(&self, mut on_page: impl FnMut(u32, usize)) -> Vec<FilmRecord> {
        let mut films = Vec::new();

        for page in 1..=self.site.max_pages {
            let (records, has_next) = self.fetch_page(page);
            if records.is_empty() {
                break;
            }
            films.extend(records);
            on_page(page, films.len());
            log::debug!("Total films so far: {}", films.len());

            if !has_next {
                break;
            }
            if page == self.site.max_pages {
                log::warn!(
                    "Stopped at page ceiling ({}) with more pages signaled",
                    self.site.max_pages
                );
                break;
            }
            self.throttle.pause();
        }

        films
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use filmroll_core::NoDelay;
    use filmroll_core::fixture::FixtureFetcher;

    use super::*;

    fn poster(slug: &str, title: &str) -> String {
        format!(
            r#"<div class="react-component" data-component-class="globals.comps.LazyPoster"
                data-item-slug="{slug}" data-item-name="{title}"
                data-item-link="/film/{slug}/"></div>"#
        )
    }

    fn page(posters: &[(&str, &str)], next: bool) -> String {
        let body: String = posters.iter().map(|(s, t)| poster(s, t)).collect();
        let pagination = if next {
            r#"<div class="pagination"><a class="next" href="/someone/films/page/2/">Older</a></div>"#
        } else {
            ""
        };
        format!("<html><body>{body}{pagination}</body></html>")
    }

    struct CountingThrottle(Cell<usize>);

    impl Throttle for CountingThrottle {
        fn pause(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn stops_when_no_next_page() {
        let site = Site::new("https://lb.test", "someone");
        let fetcher = FixtureFetcher::new()
            .html(
                "https://lb.test/someone/films/",
                &page(&[("heat-1995", "Heat"), ("alien", "Alien")], true),
            )
            .html(
                "https://lb.test/someone/films/page/2/",
                &page(&[("brazil", "Brazil")], false),
            );
        let throttle = CountingThrottle(Cell::new(0));

        let films = Paginator::new(&fetcher, &site, &throttle).fetch_all();

        assert_eq!(films.len(), 3);
        assert_eq!(fetcher.requests().len(), 2);
        assert_eq!(fetcher.hits("https://lb.test/someone/films/page/3/"), 0);
        // One pause between page 1 and page 2, none after the last page
        assert_eq!(throttle.0.get(), 1);
    }

    #[test]
    fn stops_on_empty_page_even_if_next_signaled() {
        let site = Site::new("https://lb.test", "someone");
        let fetcher = FixtureFetcher::new()
            .html(
                "https://lb.test/someone/films/",
                &page(&[("alien", "Alien")], true),
            )
            .html("https://lb.test/someone/films/page/2/", &page(&[], true));

        let films = Paginator::new(&fetcher, &site, &NoDelay).fetch_all();

        assert_eq!(films.len(), 1);
        assert_eq!(fetcher.hits("https://lb.test/someone/films/page/3/"), 0);
    }

    #[test]
    fn transport_error_ends_the_list() {
        let site = Site::new("https://lb.test", "someone");
        let fetcher = FixtureFetcher::new()
            .html(
                "https://lb.test/someone/films/",
                &page(&[("alien", "Alien")], true),
            )
            .status("https://lb.test/someone/films/page/2/", 503);

        let paginator = Paginator::new(&fetcher, &site, &NoDelay);
        assert_eq!(paginator.fetch_page(2), (Vec::new(), false));
        assert_eq!(paginator.fetch_all().len(), 1);
    }

    #[test]
    fn page_ceiling_bounds_the_loop() {
        let mut site = Site::new("https://lb.test", "someone");
        site.max_pages = 2;
        let fetcher = FixtureFetcher::new()
            .html(
                "https://lb.test/someone/films/",
                &page(&[("alien", "Alien")], true),
            )
            .html(
                "https://lb.test/someone/films/page/2/",
                &page(&[("brazil", "Brazil")], true),
            )
            .html(
                "https://lb.test/someone/films/page/3/",
                &page(&[("heat", "Heat")], false),
            );

        let films = Paginator::new(&fetcher, &site, &NoDelay).fetch_all();

        assert_eq!(films.len(), 2);
        assert_eq!(fetcher.hits("https://lb.test/someone/films/page/3/"), 0);
    }

    #[test]
    fn on_page_reports_running_total() {
        let site = Site::new("https://lb.test", "someone");
        let fetcher = FixtureFetcher::new()
            .html(
                "https://lb.test/someone/films/",
                &page(&[("a", "A"), ("b", "B")], true),
            )
            .html(
                "https://lb.test/someone/films/page/2/",
                &page(&[("c", "C")], false),
            );
        let mut seen = Vec::new();

        Paginator::new(&fetcher, &site, &NoDelay).fetch_all_with(|p, n| seen.push((p, n)));

        assert_eq!(seen, vec![(1, 2), (2, 3)]);
    }
}
