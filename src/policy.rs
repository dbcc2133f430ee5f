//! # Policy Module
//!
//! Defines the `MediaPolicy` trait: the per-resource-type behavior plugged
//! into a [`MediaPipeline`](crate::MediaPipeline).
//!
//! ## Overview
//!
//! The pipeline owns deduplication, waiting and per-item completion. A policy
//! only decides *what* to download for an item and *what* a finished download
//! means for that kind of media. Every hook has a default body, so a policy
//! implements only what it needs:
//!
//! - `get_media_requests`: the requests an item needs (none by default)
//! - `media_to_download`: adjust a request, or resolve it without downloading
//! - `media_downloaded` / `media_failed`: turn a finished download into the
//!   value cached for every request with the same fingerprint
//! - `item_completed`: finalize the item once all its requests resolved
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_media::prelude::*;
//!
//! struct ImageUrls;
//!
//! #[async_trait]
//! impl MediaPolicy for ImageUrls {
//!     type Item = Product;
//!
//!     fn name(&self) -> &str {
//!         "ImagesPipeline"
//!     }
//!
//!     fn get_media_requests(
//!         &self,
//!         item: &Product,
//!         _info: &SpiderInfo,
//!     ) -> Result<MediaRequests, PipelineError> {
//!         MediaRequests::from_urls(&item.image_urls)
//!     }
//!
//!     async fn item_completed(
//!         &self,
//!         results: Vec<MediaOutcome>,
//!         mut item: Product,
//!         _info: &SpiderInfo,
//!     ) -> Result<Product, PipelineError> {
//!         item.images_fetched = results.iter().filter(|r| r.is_ok()).count();
//!         Ok(item)
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use crate::error::{MediaError, PipelineError};
use crate::request::Request;
use crate::response::Response;
use crate::state::SpiderInfo;

/// The success payload of a media request.
#[derive(Debug, Clone)]
pub enum MediaValue {
    /// The downloaded response itself.
    Response(Response),
    /// Anything a policy derived from it, e.g. stored file metadata.
    Value(Value),
}

impl MediaValue {
    pub fn as_response(&self) -> Option<&Response> {
        match self {
            MediaValue::Response(response) => Some(response),
            MediaValue::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            MediaValue::Value(value) => Some(value),
            MediaValue::Response(_) => None,
        }
    }
}

impl From<Response> for MediaValue {
    fn from(response: Response) -> Self {
        MediaValue::Response(response)
    }
}

impl From<Value> for MediaValue {
    fn from(value: Value) -> Self {
        MediaValue::Value(value)
    }
}

impl From<&str> for MediaValue {
    fn from(value: &str) -> Self {
        MediaValue::Value(Value::from(value))
    }
}

/// The settled result of one media request.
///
/// Every request sharing a fingerprint receives a clone of the same `Arc`.
pub type MediaOutcome = Arc<Result<MediaValue, MediaError>>;

/// The requests an item needs: none, one or many.
#[derive(Debug, Clone, Default)]
pub enum MediaRequests {
    #[default]
    None,
    One(Request),
    Many(Vec<Request>),
}

impl MediaRequests {
    /// Builds one GET request per URL.
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> Result<Self, PipelineError> {
        let requests = urls
            .iter()
            .map(|url| {
                Request::parse(url.as_ref()).map_err(|e| {
                    PipelineError::ItemError(format!("invalid media URL {:?}: {}", url.as_ref(), e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MediaRequests::Many(requests))
    }

    /// Flattens into a list, keeping the original order.
    pub fn into_vec(self) -> Vec<Request> {
        match self {
            MediaRequests::None => Vec::new(),
            MediaRequests::One(request) => vec![request],
            MediaRequests::Many(requests) => requests,
        }
    }
}

impl From<Request> for MediaRequests {
    fn from(request: Request) -> Self {
        MediaRequests::One(request)
    }
}

impl From<Option<Request>> for MediaRequests {
    fn from(request: Option<Request>) -> Self {
        request.map_or(MediaRequests::None, MediaRequests::One)
    }
}

impl From<Vec<Request>> for MediaRequests {
    fn from(requests: Vec<Request>) -> Self {
        MediaRequests::Many(requests)
    }
}

impl FromIterator<Request> for MediaRequests {
    fn from_iter<T: IntoIterator<Item = Request>>(iter: T) -> Self {
        MediaRequests::Many(iter.into_iter().collect())
    }
}

/// What to do with a request before it reaches the downloader.
#[derive(Debug, Clone)]
pub enum MediaAction {
    /// Go through deduplication and, if needed, download it.
    Download,
    /// Use this value and skip the downloader.
    ///
    /// A resolved value is neither cached nor shared with concurrent requests
    /// for the same fingerprint; the policy is responsible for returning the
    /// same thing every time.
    Resolved(MediaValue),
}

/// Name of a policy that does not override [`MediaPolicy::name`].
pub const DEFAULT_POLICY_NAME: &str = "MediaPipeline";

/// Per-media-type behavior of a [`MediaPipeline`](crate::MediaPipeline).
#[async_trait]
pub trait MediaPolicy: Send + Sync + 'static {
    /// The item type flowing through the pipeline.
    type Item: Send + Sync + 'static;

    /// Name used in logs and for the `<NAME>_MEDIA_ALLOW_REDIRECTS` setting,
    /// which only applies to policies with a name of their own.
    fn name(&self) -> &str {
        DEFAULT_POLICY_NAME
    }

    /// Per-policy default for redirect handling, used when neither the builder
    /// nor the settings decide.
    fn allow_redirects(&self) -> Option<bool> {
        None
    }

    /// Returns the requests `item` needs downloaded.
    fn get_media_requests(
        &self,
        _item: &Self::Item,
        _info: &SpiderInfo,
    ) -> Result<MediaRequests, PipelineError> {
        Ok(MediaRequests::None)
    }

    /// Runs for every request before deduplication.
    ///
    /// The request may be modified in place. An error is treated as a failed
    /// download of that request.
    async fn media_to_download(
        &self,
        _request: &mut Request,
        _info: &SpiderInfo,
        _item: &Self::Item,
    ) -> Result<MediaAction, MediaError> {
        Ok(MediaAction::Download)
    }

    /// Runs once per fingerprint when its download succeeded.
    async fn media_downloaded(
        &self,
        response: Response,
        _request: &Request,
        _info: &SpiderInfo,
        _item: &Self::Item,
    ) -> Result<MediaValue, MediaError> {
        Ok(MediaValue::Response(response))
    }

    /// Runs once per fingerprint when its download failed.
    async fn media_failed(
        &self,
        error: MediaError,
        _request: &Request,
        _info: &SpiderInfo,
        _item: &Self::Item,
    ) -> Result<MediaValue, MediaError> {
        Err(error)
    }

    /// Finalizes `item` once all of its requests resolved. `results` follows
    /// the order returned by `get_media_requests`.
    async fn item_completed(
        &self,
        results: Vec<MediaOutcome>,
        item: Self::Item,
        info: &SpiderInfo,
    ) -> Result<Self::Item, PipelineError> {
        if info.settings().log_failed_results {
            log_failed_results(self.name(), &results, info);
        }
        Ok(item)
    }
}

/// Logs every failed outcome at ERROR level, with the error's source chain.
pub fn log_failed_results(policy_name: &str, results: &[MediaOutcome], info: &SpiderInfo) {
    for outcome in results {
        if let Err(err) = outcome.as_ref() {
            error!(
                spider = info.spider_name(),
                "{} found errors processing media: {}",
                policy_name,
                err.chain()
            );
        }
    }
}

/// A policy that needs nothing: items pass through untouched.
pub struct DefaultMediaPolicy<I> {
    _item: std::marker::PhantomData<fn() -> I>,
}

impl<I> Default for DefaultMediaPolicy<I> {
    fn default() -> Self {
        DefaultMediaPolicy {
            _item: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<I: Send + Sync + 'static> MediaPolicy for DefaultMediaPolicy<I> {
    type Item = I;
}
