//! Filmroll Core - Common infrastructure for the film collection mirror
//!
//! HTTP transport, logging, progress reporting and request pacing shared
//! by the scraper, the collection store and the CLI.

pub mod http;
pub mod logging;
pub mod progress;
pub mod throttle;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

// Re-exports for convenience
pub use http::{
    Accept, FetchError, HttpClient, HttpFetch, Request, Response, SHARED_RUNTIME,
    DEFAULT_USER_AGENT,
};
pub use logging::{IndicatifLogger, Verbosity, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use throttle::{ConstantDelay, NoDelay, Throttle};
