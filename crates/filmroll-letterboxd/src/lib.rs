//! Filmroll Letterboxd - scraping side of the film collection mirror
//!
//! Pages through a member's watched-film list, extracts film records from
//! either markup generation the site serves, and resolves each film's
//! high-resolution poster URL through one of several interchangeable
//! strategies.
//!
//! # Example
//!
//! ```ignore
//! use filmroll_core::{ConstantDelay, HttpClient, DEFAULT_USER_AGENT};
//! use filmroll_letterboxd::{Paginator, Site};
//!
//! let client = HttpClient::new(DEFAULT_USER_AGENT, Duration::from_secs(30))?;
//! let site = Site::default();
//! let films = Paginator::new(&client, &site, &ConstantDelay::from_millis(500)).fetch_all();
//! println!("Scraped {} films", films.len());
//! ```

pub mod config;
pub mod extract;
pub mod model;
pub mod paginate;
pub mod poster;

// Re-exports
pub use config::Site;
pub use extract::{ParsedPage, parse_page, title_from_slug};
pub use model::{FilmRecord, ResolvedPoster};
pub use paginate::Paginator;
pub use poster::{
    InitError, PosterResolver, ResolveError, Strategy, build_resolver, upscale_poster_url,
};
