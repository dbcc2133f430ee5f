//! Error types used across the media pipeline.
//!
//! Three layers of failure are kept apart:
//! - [`SpiderError`] is raised by a [`Downloader`](crate::Downloader) when a
//!   transfer does not produce a usable response.
//! - [`MediaError`] is the failure payload of a single media request. It is
//!   cached and replayed to every waiter, it never aborts an item.
//! - [`PipelineError`] is an item-level failure, surfaced to whoever called
//!   `process_item`.

use thiserror::Error;
use url::Url;

/// Errors raised while fetching a request.
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Invalid URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Ignoring non-handled response (status code {status}) for {url}")]
    HttpStatus { status: u16, url: Url },

    #[error("Gave up after {max} redirects while fetching {url}")]
    TooManyRedirects { url: Url, max: usize },

    #[error("Invalid redirect location {location:?} from {url}")]
    InvalidRedirect { url: Url, location: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    GeneralError(String),
}

/// The failure side of a media outcome.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The downloader could not fetch the resource.
    #[error("download failed")]
    Download(#[from] SpiderError),

    /// A policy rejected the downloaded response, e.g. an unexpected status.
    #[error("{0}")]
    Media(String),

    /// A policy hook failed before or after the download.
    #[error("media hook failed")]
    Hook(#[source] anyhow::Error),

    /// The future driving the download was dropped before it resolved.
    #[error("download of {url} was abandoned before completion")]
    Abandoned { url: Url },
}

impl MediaError {
    /// Builds a [`MediaError::Media`] from any displayable message.
    pub fn media(message: impl Into<String>) -> Self {
        MediaError::Media(message.into())
    }

    /// Renders the error followed by every error in its source chain.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            rendered.push_str(": caused by: ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}

/// Item-level errors returned by a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Spider '{spider}' is not open in pipeline '{pipeline}'")]
    SpiderNotOpen { spider: String, pipeline: String },

    #[error("Item error: {0}")]
    ItemError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
