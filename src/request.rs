//! Media requests and the status-handling policy they carry.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use url::Url;

use crate::error::SpiderError;

/// Which non-2xx statuses a downloader must return as normal responses instead
/// of acting on them (following a redirect) or turning them into an error.
///
/// Successful (2xx) statuses are always handled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusHandling {
    /// Only 2xx. Redirects are followed, everything else is an error.
    #[default]
    Default,
    /// Every status is handed back untouched, redirects included.
    All,
    /// The listed statuses are handed back in addition to 2xx.
    Only(Vec<u16>),
    /// Every status outside the range is handed back.
    Except(RangeInclusive<u16>),
}

impl StatusHandling {
    /// Returns true when a response with `status` goes back to the caller as is.
    pub fn handles(&self, status: u16) -> bool {
        if (200..300).contains(&status) {
            return true;
        }
        match self {
            StatusHandling::Default => false,
            StatusHandling::All => true,
            StatusHandling::Only(list) => list.contains(&status),
            StatusHandling::Except(range) => !range.contains(&status),
        }
    }
}

/// A request for a single media resource.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Free-form data carried along with the request.
    pub meta: Map<String, Value>,
    pub status_handling: StatusHandling,
}

impl Request {
    /// Creates a GET request for `url`.
    pub fn new(url: Url) -> Self {
        Request {
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            meta: Map::new(),
            status_handling: StatusHandling::Default,
        }
    }

    /// Parses `url` and creates a GET request for it.
    pub fn parse(url: &str) -> Result<Self, SpiderError> {
        Ok(Request::new(Url::parse(url)?))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_status_handling(mut self, handling: StatusHandling) -> Self {
        self.status_handling = handling;
        self
    }
}
