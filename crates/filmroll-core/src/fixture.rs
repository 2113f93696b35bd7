//! In-memory [`HttpFetch`] for tests: canned responses keyed by URL.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::http::{FetchError, HttpFetch, Request, Response};

#[derive(Debug, Clone)]
enum Route {
    Ok(Response),
    Status(u16),
}

/// Canned responses keyed by exact URL; unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    routes: HashMap<String, Route>,
    requests: RefCell<Vec<Request>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as `text/html` at `url`
    pub fn html(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route::Ok(Response {
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: body.as_bytes().to_vec(),
            }),
        );
        self
    }

    /// Serve raw bytes with an explicit content type at `url`
    pub fn bytes(mut self, url: &str, content_type: &str, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            Route::Ok(Response {
                status: 200,
                content_type: Some(content_type.to_string()),
                body: body.to_vec(),
            }),
        );
        self
    }

    /// Fail requests to `url` with an HTTP status
    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_string(), Route::Status(status));
        self
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// How many times `url` was requested
    pub fn hits(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.url == url).count()
    }
}

impl HttpFetch for FixtureFetcher {
    fn get(&self, request: &Request) -> Result<Response, FetchError> {
        self.requests.borrow_mut().push(request.clone());
        match self.routes.get(&request.url) {
            Some(Route::Ok(resp)) => Ok(resp.clone()),
            Some(Route::Status(code)) => Err(FetchError::status(*code)),
            None => Err(FetchError::status(404)),
        }
    }
}
