pub mod browser;
pub mod http;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use browser::{BrowserSession, BrowserSettings};
pub use http::HttpFetcher;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    BrowserUnavailable,
}

/// How long to wait before a loaded page is considered ready to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Load event plus a short settle period for late requests.
    NetworkIdle,
    /// DOM ready, then poll until `selector` matches or `timeout` expires.
    ContentLoaded {
        selector: &'static str,
        timeout: Duration,
    },
}

/// Something that can turn a URL into page HTML.
///
/// `Ok(None)` means the loader gave up without a hard failure, e.g. after
/// exhausting its retries.
#[async_trait]
pub trait PageLoader: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self, url: &str, strategy: LoadStrategy) -> Result<Option<String>, FetchError>;
}

/// A long-lived fetch resource that has to be torn down once the run ends.
#[async_trait]
pub trait SessionShutdown: Send + Sync {
    /// Release everything. Calling it again is a no-op.
    async fn shutdown(&self);
}
