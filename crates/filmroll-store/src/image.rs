//! Poster image cache.
//!
//! Images live next to the records as `<slug>.<ext>`. A cached file only
//! counts when its leading bytes carry a known image signature: an HTML
//! error page saved under `.jpg` is deleted and fetched again.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use filmroll_core::{FetchError, HttpFetch, Request};

use crate::fsutil::{cleanup_tmp_files, write_atomic};

/// Extensions a cached poster may carry, in lookup order
pub const KNOWN_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

const DEFAULT_EXTENSION: &str = "jpg";

/// Result of [`ImageCache::ensure_cached`]; carries the file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    Reused(String),
    Downloaded(String),
}

impl CacheOutcome {
    pub fn filename(&self) -> &str {
        match self {
            Self::Reused(name) | Self::Downloaded(name) => name,
        }
    }
}

#[derive(Debug)]
pub enum CacheError {
    Transport(FetchError),
    /// Server answered with something other than an image
    NotImage { content_type: String },
    /// Body claimed to be an image but has no known signature
    BadSignature,
    Io { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "download failed: {e}"),
            Self::NotImage { content_type } => {
                write!(f, "download rejected: content type {content_type:?}")
            }
            Self::BadSignature => write!(f, "download rejected: not an image"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FetchError> for CacheError {
    fn from(e: FetchError) -> Self {
        Self::Transport(e)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Extension from the URL path suffix; query and fragment are ignored.
pub fn sniff_extension(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let Some((_, ext)) = file.rsplit_once('.') else {
        return DEFAULT_EXTENSION;
    };
    let ext = ext.to_ascii_lowercase();
    KNOWN_EXTENSIONS
        .into_iter()
        .find(|known| *known == ext)
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Whether `bytes` start with a JPEG, PNG, WEBP (RIFF) or GIF signature
pub fn has_image_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8])
        || bytes.starts_with(&[0x89, b'P', b'N', b'G'])
        || bytes.starts_with(b"RIFF")
        || bytes.starts_with(b"GIF8")
}

/// Check the file's leading bytes; unreadable files are invalid.
pub fn is_valid_image(path: &Path) -> bool {
    let mut header = [0u8; 12];
    let read = File::open(path).and_then(|mut f| f.read(&mut header));
    match read {
        Ok(n) => has_image_signature(&header[..n]),
        Err(_) => false,
    }
}

/// Directory of cached posters plus the transport used to fill it
pub struct ImageCache<'a> {
    dir: PathBuf,
    fetcher: &'a dyn HttpFetch,
    referer: String,
}

impl<'a> ImageCache<'a> {
    /// Open (creating if needed) and clear stale partial writes.
    pub fn open(
        dir: impl Into<PathBuf>,
        fetcher: &'a dyn HttpFetch,
        referer: impl Into<String>,
    ) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        cleanup_tmp_files(&dir)?;
        Ok(Self {
            dir,
            fetcher,
            referer: referer.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Existing valid poster for `slug` under any known extension.
    ///
    /// Invalid files found along the way are deleted.
    pub fn find_cached(&self, slug: &str) -> Result<Option<String>, CacheError> {
        for ext in KNOWN_EXTENSIONS {
            let filename = format!("{slug}.{ext}");
            let path = self.dir.join(&filename);
            if !path.exists() {
                continue;
            }
            if is_valid_image(&path) {
                return Ok(Some(filename));
            }
            log::warn!("Removing invalid image file: {filename}");
            fs::remove_file(&path).map_err(io_err(&path))?;
        }
        Ok(None)
    }

    /// Make sure a valid poster for `slug` exists, downloading `url` if not.
    pub fn ensure_cached(&self, slug: &str, url: &str) -> Result<CacheOutcome, CacheError> {
        let filename = format!("{slug}.{}", sniff_extension(url));
        let path = self.dir.join(&filename);

        if path.exists() {
            if is_valid_image(&path) {
                return Ok(CacheOutcome::Reused(filename));
            }
            log::warn!("Removing invalid image file: {filename}");
            fs::remove_file(&path).map_err(io_err(&path))?;
        }

        self.download(url, &path)?;
        Ok(CacheOutcome::Downloaded(filename))
    }

    /// Download `url` over whatever poster `slug` has now.
    ///
    /// The current file stays in place until the new body has been
    /// validated and renamed over it; copies under other extensions are
    /// removed only after that.
    pub fn replace(&self, slug: &str, url: &str) -> Result<CacheOutcome, CacheError> {
        let filename = format!("{slug}.{}", sniff_extension(url));
        self.download(url, &self.dir.join(&filename))?;

        for ext in KNOWN_EXTENSIONS {
            let other = format!("{slug}.{ext}");
            if other != filename {
                remove_if_present(&self.dir.join(other))?;
            }
        }
        Ok(CacheOutcome::Downloaded(filename))
    }

    fn download(&self, url: &str, path: &Path) -> Result<(), CacheError> {
        log::debug!("Downloading from: {url}");
        let response = self.fetcher.get(&Request::image(url, &self.referer))?;

        let content_type = response.content_type.unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(CacheError::NotImage { content_type });
        }
        if !has_image_signature(&response.body) {
            return Err(CacheError::BadSignature);
        }

        write_atomic(path, &response.body).map_err(io_err(path))
    }

    /// Delete the poster for `slug` under every known extension.
    ///
    /// Returns how many files were removed.
    pub fn remove(&self, slug: &str) -> Result<usize, CacheError> {
        let mut removed = 0;
        for ext in KNOWN_EXTENSIONS {
            if remove_if_present(&self.dir.join(format!("{slug}.{ext}")))? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn remove_if_present(path: &Path) -> Result<bool, CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(path)(e)),
    }
}

#[cfg(test)]
mod tests {
    use filmroll_core::fixture::FixtureFetcher;
    use tempfile::TempDir;

    use super::*;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];
    const POSTER_URL: &str = "https://a.ltrbxd.com/resized/film-poster/h-0-2000-0-3000-crop.jpg?v=9";

    #[test]
    fn sniff_extension_cases() {
        assert_eq!(sniff_extension(POSTER_URL), "jpg");
        assert_eq!(sniff_extension("https://cdn/x.PNG"), "png");
        assert_eq!(sniff_extension("https://cdn/x.webp?v=1"), "webp");
        assert_eq!(sniff_extension("https://cdn/x.jpeg#frag"), "jpeg");
        assert_eq!(sniff_extension("https://cdn/x.gif"), "jpg");
        assert_eq!(sniff_extension("https://cdn.example/poster"), "jpg");
    }

    #[test]
    fn signatures() {
        assert!(has_image_signature(JPEG));
        assert!(has_image_signature(b"\x89PNG\r\n\x1a\n"));
        assert!(has_image_signature(b"RIFF\0\0\0\0WEBP"));
        assert!(has_image_signature(b"GIF89a"));
        assert!(!has_image_signature(b"<!DOCTYPE html>"));
        assert!(!has_image_signature(b""));
    }

    #[test]
    fn downloads_and_then_reuses() {
        let dir = TempDir::new().unwrap();
        let fetcher = FixtureFetcher::new().bytes(POSTER_URL, "image/jpeg", JPEG);
        let cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();

        let first = cache.ensure_cached("heat-1995", POSTER_URL).unwrap();
        assert_eq!(first, CacheOutcome::Downloaded("heat-1995.jpg".to_string()));
        let second = cache.ensure_cached("heat-1995", POSTER_URL).unwrap();
        assert_eq!(second, CacheOutcome::Reused("heat-1995.jpg".to_string()));

        assert_eq!(fetcher.hits(POSTER_URL), 1);
        let request = &fetcher.requests()[0];
        assert_eq!(request.referer.as_deref(), Some("https://letterboxd.com/"));
    }

    #[test]
    fn rejects_html_without_writing() {
        let dir = TempDir::new().unwrap();
        let fetcher =
            FixtureFetcher::new().bytes(POSTER_URL, "text/html", b"<html>blocked</html>");
        let cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();

        let err = cache.ensure_cached("heat-1995", POSTER_URL).unwrap_err();
        assert!(matches!(err, CacheError::NotImage { .. }));
        assert!(!dir.path().join("heat-1995.jpg").exists());
    }

    #[test]
    fn rejects_http_error() {
        let dir = TempDir::new().unwrap();
        let fetcher = FixtureFetcher::new().status(POSTER_URL, 403);
        let cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();

        assert!(matches!(
            cache.ensure_cached("heat-1995", POSTER_URL).unwrap_err(),
            CacheError::Transport(_)
        ));
    }

    #[test]
    fn corrupt_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("heat-1995.jpg"), b"<html>oops</html>").unwrap();
        let fetcher = FixtureFetcher::new().bytes(POSTER_URL, "image/jpeg", JPEG);
        let cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();

        let outcome = cache.ensure_cached("heat-1995", POSTER_URL).unwrap();
        assert!(matches!(outcome, CacheOutcome::Downloaded(_)));
        assert_eq!(fs::read(dir.path().join("heat-1995.jpg")).unwrap(), JPEG);
    }

    #[test]
    fn find_cached_checks_every_extension_and_drops_invalid() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alien.jpg"), b"not an image").unwrap();
        fs::write(dir.path().join("alien.png"), b"\x89PNG\r\n\x1a\n").unwrap();
        let fetcher = FixtureFetcher::new();
        let cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();

        assert_eq!(cache.find_cached("alien").unwrap().as_deref(), Some("alien.png"));
        assert!(!dir.path().join("alien.jpg").exists());
        assert_eq!(cache.find_cached("brazil").unwrap(), None);
    }

    #[test]
    fn remove_covers_all_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alien.jpg"), JPEG).unwrap();
        fs::write(dir.path().join("alien.webp"), b"RIFF").unwrap();
        let fetcher = FixtureFetcher::new();
        let cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();

        assert_eq!(cache.remove("alien").unwrap(), 2);
        assert_eq!(cache.remove("alien").unwrap(), 0);
    }

    #[test]
    fn replace_keeps_current_file_when_download_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("heat-1995.jpg"), JPEG).unwrap();
        let fetcher = FixtureFetcher::new().status(POSTER_URL, 503);
        let cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();

        assert!(cache.replace("heat-1995", POSTER_URL).is_err());
        assert_eq!(fs::read(dir.path().join("heat-1995.jpg")).unwrap(), JPEG);
    }

    #[test]
    fn replace_overwrites_and_drops_other_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("heat-1995.jpg"), b"\xFF\xD8old").unwrap();
        fs::write(dir.path().join("heat-1995.png"), b"\x89PNG\r\n\x1a\n").unwrap();
        let fetcher = FixtureFetcher::new().bytes(POSTER_URL, "image/jpeg", JPEG);
        let cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();

        let outcome = cache.replace("heat-1995", POSTER_URL).unwrap();
        assert_eq!(outcome, CacheOutcome::Downloaded("heat-1995.jpg".to_string()));
        assert_eq!(fs::read(dir.path().join("heat-1995.jpg")).unwrap(), JPEG);
        assert!(!dir.path().join("heat-1995.png").exists());
    }

    #[test]
    fn open_clears_stale_tmp() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("heat-1995.jpg.tmp"), b"partial").unwrap();
        let fetcher = FixtureFetcher::new();
        let _cache = ImageCache::open(dir.path(), &fetcher, "https://letterboxd.com/").unwrap();
        assert!(!dir.path().join("heat-1995.jpg.tmp").exists());
    }
}
