//! # Downloader Module
//!
//! The transport side of the media pipeline.
//!
//! The pipeline never fetches anything itself: it calls a [`Downloader`] once
//! per distinct fingerprint and caches whatever comes back. Retries, timeouts
//! and connection handling are the downloader's business.
//!
//! - [`Downloader`]: the trait the pipeline calls
//! - [`HttpDownloader`]: a `reqwest` implementation honoring the request's
//!   [`StatusHandling`](crate::StatusHandling)
//! - [`redirect`]: redirect following shared by HTTP implementations

mod client;
pub mod redirect;

pub use client::HttpDownloader;

use async_trait::async_trait;

use crate::error::SpiderError;
use crate::request::Request;
use crate::response::Response;
use crate::state::SpiderInfo;

/// Fetches a request and returns its response.
#[async_trait]
pub trait Downloader: Send + Sync + 'static {
    async fn download(
        &self,
        request: Request,
        info: &SpiderInfo,
    ) -> Result<Response, SpiderError>;
}
