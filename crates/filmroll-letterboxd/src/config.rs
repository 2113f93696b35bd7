//! Remote site configuration

/// Where to scrape from and how far to page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Site root without trailing slash
    pub base_url: String,
    /// Member whose watched films are mirrored
    pub username: String,
    /// Runaway-loop guard for pagination
    pub max_pages: u32,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            base_url: "https://letterboxd.com".to_string(),
            username: "icepuma".to_string(),
            max_pages: 20,
        }
    }
}

impl Site {
    pub fn new(base_url: &str, username: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            ..Default::default()
        }
    }

    /// List page URL; page 1 is the unnumbered path
    pub fn list_page_url(&self, page: u32) -> String {
        if page > 1 {
            format!("{}/{}/films/page/{page}/", self.base_url, self.username)
        } else {
            format!("{}/{}/films/", self.base_url, self.username)
        }
    }

    /// Canonical film detail page
    pub fn film_url(&self, slug: &str) -> String {
        format!("{}/film/{slug}/", self.base_url)
    }

    /// Referer sent with image downloads
    pub fn referer(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Absolute form of a root-relative path (`/film/x/` -> `https://.../film/x/`)
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
