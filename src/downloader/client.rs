use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::trace;

use super::Downloader;
use super::redirect::{DEFAULT_MAX_REDIRECTS, follow_redirects};
use crate::error::SpiderError;
use crate::request::Request;
use crate::response::Response;
use crate::state::SpiderInfo;

/// A [`Downloader`] backed by `reqwest`.
///
/// Redirects are followed here rather than by the client, so that a request
/// asking for 3xx statuses back actually gets them.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    max_redirects: usize,
}

impl HttpDownloader {
    /// Creates a downloader with a 30 second timeout.
    pub fn new() -> Result<Self, SpiderError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client. It must not follow redirects on its own.
    pub fn with_client(client: Client) -> Self {
        HttpDownloader {
            client,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    async fn send_once(&self, request: Request) -> Result<Response, SpiderError> {
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;

        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Response {
            url,
            status,
            headers,
            body,
            request_url: request.url,
        })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        request: Request,
        info: &SpiderInfo,
    ) -> Result<Response, SpiderError> {
        trace!(spider = info.spider_name(), "Fetching {}", request.url);
        follow_redirects(request, self.max_redirects, |req| self.send_once(req)).await
    }
}
