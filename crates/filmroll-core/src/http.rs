//! Blocking HTTP GET over a shared async client.
//!
//! Uses async reqwest internally but presents a sync interface: every
//! network call in a sync run is a suspension point, nothing overlaps.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::header;

/// Browser-like User-Agent sent with every request unless overridden
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error types for fetch operations
#[derive(Debug)]
pub enum FetchError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// Error for a non-2xx response
    pub fn status(status: u16) -> Self {
        Self::Http {
            status: Some(status),
            message: "unexpected status".to_string(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
        }
    }
}

/// What the caller is about to read from the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Html,
    Image,
}

/// A read-only GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub accept: Accept,
    pub referer: Option<String>,
}

impl Request {
    pub fn html(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accept: Accept::Html,
            referer: None,
        }
    }

    pub fn image(url: impl Into<String>, referer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accept: Accept::Image,
            referer: Some(referer.into()),
        }
    }
}

/// A fully buffered 2xx response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport seam: everything that talks to the remote site goes through this.
///
/// Implementations must return `Err` for non-2xx statuses so callers only
/// ever see content they can parse.
pub trait HttpFetch {
    fn get(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// reqwest-backed [`HttpFetch`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::from_reqwest(&e))?;
        Ok(Self { inner })
    }
}

impl HttpFetch for HttpClient {
    fn get(&self, request: &Request) -> Result<Response, FetchError> {
        let accept = match request.accept {
            Accept::Html => HTML_ACCEPT,
            Accept::Image => IMAGE_ACCEPT,
        };

        SHARED_RUNTIME.handle().block_on(async {
            let mut builder = self
                .inner
                .get(&request.url)
                .header(header::ACCEPT, accept);
            if let Some(referer) = &request.referer {
                builder = builder.header(header::REFERER, referer);
            }

            let response = builder
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| FetchError::from_reqwest(&e))?;

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))?;

            Ok(Response {
                status,
                content_type,
                body: body.to_vec(),
            })
        })
    }
}
