use filmroll_letterboxd::{Site, parse_page, upscale_poster_url};

/// Synthetic list page with `n` placeholder posters, shaped like a real one
fn placeholder_page(n: usize) -> String {
    let mut html = String::from("<html><body><ul class=\"poster-list\">");
    for i in 0..n {
        html.push_str(&format!(
            r#"<li class="griditem"><div class="react-component"
                data-component-class="globals.comps.LazyPoster"
                data-film-id="{i}" data-item-slug="film-{i}" data-item-name="Film {i}"
                data-item-link="/film/film-{i}/"
                data-resolvable-poster-path='{{"cacheBustingKey":"k{i}"}}'></div></li>"#
        ));
    }
    html.push_str(r#"</ul><div class="pagination"><a class="next" href="/p/2/">Older</a></div>"#);
    html.push_str("</body></html>");
    html
}

#[divan::bench(args = [18, 72])]
fn parse_placeholder_page(bencher: divan::Bencher, n: usize) {
    let html = placeholder_page(n);
    let site = Site::default();
    bencher.bench(|| {
        let page = parse_page(&html, &site);
        assert_eq!(page.records.len(), n);
    });
}

#[divan::bench]
fn upscale(bencher: divan::Bencher) {
    let url = "https://a.ltrbxd.com/resized/film-poster/5/1/4/5/2/51452-the-lobster-0-230-0-345-crop.jpg?v=7f0a2b";
    bencher.bench(|| upscale_poster_url(divan::black_box(url)));
}

fn main() {
    divan::main();
}
