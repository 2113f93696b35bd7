//! Poster URL resolution.
//!
//! Every strategy answers the same question: given a film slug, what is
//! the 2000x3000 poster URL? They differ only in where they read the
//! list-size URL from before applying [`upscale_poster_url`]:
//!
//! | strategy   | source                                            |
//! |------------|---------------------------------------------------|
//! | `rendered` | `img[alt^="Poster for"]` on the rendered film page |
//! | `markup`   | first CDN poster path in the raw film page HTML   |
//! | `endpoint` | 2x `srcset` entry from the AJAX poster fragment   |

pub mod endpoint;
pub mod markup;
pub mod rendered;
pub mod rewrite;

#[cfg(feature = "chrome")]
pub mod chrome;

use filmroll_core::{FetchError, HttpFetch};
use serde::Deserialize;

use crate::config::Site;
use crate::model::ResolvedPoster;

pub use endpoint::EndpointResolver;
pub use markup::MarkupResolver;
pub use rendered::{PageRenderer, RenderError, RenderedImage, RenderedResolver};
pub use rewrite::{absolute_url, upscale_poster_url};

/// Resolves a film slug to its high-resolution poster URL.
pub trait PosterResolver {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Locate the poster and rewrite it to the high-resolution tier.
    ///
    /// Never returns a low-resolution fallback: if the located URL carries
    /// no known size tier, resolution fails.
    fn resolve(&self, slug: &str) -> Result<ResolvedPoster, ResolveError>;
}

/// Why a poster could not be resolved
#[derive(Debug)]
pub enum ResolveError {
    /// Page loaded but held no usable, rewritable poster URL
    NotFound { slug: String, reason: String },
    /// Page could not be fetched
    Transport(FetchError),
    /// Rendering engine failed (navigation or script evaluation)
    Render(RenderError),
}

impl ResolveError {
    fn not_found(slug: &str, reason: impl Into<String>) -> Self {
        Self::NotFound {
            slug: slug.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { slug, reason } => write!(f, "poster not found for {slug}: {reason}"),
            Self::Transport(e) => write!(f, "poster page fetch failed: {e}"),
            Self::Render(e) => write!(f, "poster page render failed: {e}"),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<FetchError> for ResolveError {
    fn from(e: FetchError) -> Self {
        Self::Transport(e)
    }
}

impl From<RenderError> for ResolveError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

/// Resolver could not be constructed (missing or broken rendering engine)
#[derive(Debug)]
pub enum InitError {
    /// Strategy needs a capability this build does not include
    Unavailable(String),
    /// Capability present but failed to start
    Launch(RenderError),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "{msg}"),
            Self::Launch(e) => write!(f, "renderer failed to start: {e}"),
        }
    }
}

impl std::error::Error for InitError {}

/// Which resolver to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Rendered,
    Markup,
    Endpoint,
}

impl Strategy {
    /// Parse CLI/config string into enum
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "rendered" => Some(Self::Rendered),
            "markup" => Some(Self::Markup),
            "endpoint" => Some(Self::Endpoint),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rendered => "rendered",
            Self::Markup => "markup",
            Self::Endpoint => "endpoint",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the configured resolver.
///
/// `rendered` launches a headless browser (with the `chrome` feature) and
/// fails with [`InitError`] when none is available.
pub fn build_resolver<'a>(
    strategy: Strategy,
    fetcher: &'a dyn HttpFetch,
    site: &Site,
    user_agent: &str,
) -> Result<Box<dyn PosterResolver + 'a>, InitError> {
    match strategy {
        Strategy::Markup => Ok(Box::new(MarkupResolver::new(fetcher, site.clone()))),
        Strategy::Endpoint => Ok(Box::new(EndpointResolver::new(fetcher, site.clone()))),
        Strategy::Rendered => build_rendered(site, user_agent),
    }
}

#[cfg(feature = "chrome")]
fn build_rendered<'a>(
    site: &Site,
    user_agent: &str,
) -> Result<Box<dyn PosterResolver + 'a>, InitError> {
    let renderer = chrome::ChromeRenderer::launch(user_agent).map_err(InitError::Launch)?;
    Ok(Box::new(RenderedResolver::new(
        Box::new(renderer),
        site.clone(),
    )))
}

#[cfg(not(feature = "chrome"))]
fn build_rendered<'a>(
    _site: &Site,
    _user_agent: &str,
) -> Result<Box<dyn PosterResolver + 'a>, InitError> {
    Err(InitError::Unavailable(
        "the rendered poster strategy needs a headless browser; \
         rebuild with `--features chrome` or pick the markup/endpoint strategy"
            .to_string(),
    ))
}
