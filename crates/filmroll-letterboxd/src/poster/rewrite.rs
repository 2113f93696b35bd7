//! Poster URL helpers: size-tier rewrite, srcset parsing, absolutizing.

use url::Url;

/// Rewrite a list-size poster URL to the largest size tier.
///
/// The CDN encodes the rendered size in the file name (`-0-230-0-345-`
/// is 230x345); swapping in `-0-2000-0-3000-` yields the 2000x3000 render
/// of the same crop. Only the path is touched, the query (cache-busting
/// `?v=` token) is reattached as-is.
///
/// Returns `None` when neither size token is present: a URL we cannot
/// upscale is never passed through as if it were high resolution.
pub fn upscale_poster_url(url: &str) -> Option<String> {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };

    if !path.contains("-0-230-") && !path.contains("-0-345-") {
        return None;
    }
    let upscaled = path
        .replace("-0-230-", "-0-2000-")
        .replace("-0-345-", "-0-3000-");

    Some(match query {
        Some(q) if !q.is_empty() => format!("{upscaled}?{q}"),
        _ => upscaled,
    })
}

/// Make a poster reference absolute: protocol-relative gets `https:`,
/// root-relative gets the site base.
pub fn absolute_url(url: &str, base_url: &str) -> String {
    if url.starts_with("//") {
        return format!("https:{url}");
    }
    Url::parse(base_url)
        .and_then(|base| base.join(url))
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

/// One `srcset` entry: URL plus optional descriptor (`2x`, `460w`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetCandidate<'a> {
    pub url: &'a str,
    pub descriptor: Option<&'a str>,
}

pub fn parse_srcset(srcset: &str) -> Vec<SrcsetCandidate<'_>> {
    srcset
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next()?;
            Some(SrcsetCandidate {
                url,
                descriptor: parts.next(),
            })
        })
        .collect()
}
