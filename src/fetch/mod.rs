// src/fetch/mod.rs
// =============================================================================
// This module turns a URL into page content plus the links on that page.
//
// The crawler only talks to the `PageFetcher` trait, so tests can swap in a
// fake web (see src/testing.rs) and the real program uses HttpFetcher.
//
// Submodules:
// - http: fetches over HTTP with reqwest and pulls <a href> out with scraper
// =============================================================================

mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;
use thiserror::Error;

// A fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The URL that was requested
    pub url: String,
    /// Raw response body (HTML, XML, ...)
    pub content: String,
    /// href values exactly as they appear on the page (may be relative)
    pub links: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError>;
}
