use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use url::Url;

/// A fetched response, as handed back by a [`Downloader`](crate::Downloader).
#[derive(Debug, Clone)]
pub struct Response {
    /// The final URL, after any redirects were followed.
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// The URL of the request that produced this response.
    pub request_url: Url,
}

impl Response {
    /// Creates an empty `200 OK` response for `url`.
    pub fn new(url: Url) -> Self {
        Response {
            request_url: url.clone(),
            url,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}
