//! Integration tests for filmroll-letterboxd
//!
//! These tests require network access and are marked #[ignore] by default.
//! Run with: cargo test -p filmroll-letterboxd --test integration -- --ignored

use std::time::Duration;

use filmroll_core::{DEFAULT_USER_AGENT, HttpClient, NoDelay};
use filmroll_letterboxd::{Paginator, Site, Strategy, build_resolver};

fn client() -> HttpClient {
    HttpClient::new(DEFAULT_USER_AGENT, Duration::from_secs(30)).expect("client builds")
}

/// First list page of the default member parses into records
#[test]
#[ignore]
fn fetch_first_list_page() {
    let client = client();
    let site = Site::default();

    let (films, _has_next) = Paginator::new(&client, &site, &NoDelay).fetch_page(1);

    assert!(!films.is_empty(), "expected films on page 1");
    assert!(films.iter().all(|f| f.slug.is_some()));
    assert!(films.iter().all(|f| f.url.starts_with("https://letterboxd.com/film/")));
}

fn assert_resolves(strategy: Strategy) {
    let client = client();
    let site = Site::default();
    let resolver = build_resolver(strategy, &client, &site, DEFAULT_USER_AGENT)
        .ok()
        .expect("resolver builds");

    let poster = resolver.resolve("the-lobster").expect("poster resolves");

    assert!(poster.url.contains("-0-2000-0-3000-"), "got {}", poster.url);
}

#[test]
#[ignore]
fn markup_strategy_resolves_live_poster() {
    assert_resolves(Strategy::Markup);
}

#[test]
#[ignore]
fn endpoint_strategy_resolves_live_poster() {
    assert_resolves(Strategy::Endpoint);
}

#[cfg(feature = "chrome")]
#[test]
#[ignore]
fn rendered_strategy_resolves_live_poster() {
    assert_resolves(Strategy::Rendered);
}
