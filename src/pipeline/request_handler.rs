//! Contains the deduplicating dispatcher of the media pipeline.
//!
//! Every media request goes through `process_request`:
//!
//! - the request is tagged with its status handling and passed through the
//!   policy's `media_to_download` hook, which may resolve it on the spot
//! - its fingerprint is claimed in the spider's [`SpiderInfo`]
//! - a cached outcome is returned as is, an in-flight one is waited for, and
//!   an unseen one is downloaded, post-processed by the policy, cached and
//!   fanned out to everybody who waited for it

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::MediaPipeline;
use crate::error::MediaError;
use crate::policy::{MediaAction, MediaOutcome, MediaPolicy, MediaValue};
use crate::request::Request;
use crate::state::{Claim, SpiderInfo};

impl<P: MediaPolicy> MediaPipeline<P> {
    /// Resolves one media request against the coordination state of `info`.
    ///
    /// The downloader is called at most once per fingerprint for the lifetime
    /// of the session, and `media_downloaded`/`media_failed` run exactly once,
    /// for the caller that performed the download. Every caller asking for
    /// the same fingerprint gets a clone of the same `Arc`.
    pub async fn process_request(
        &self,
        mut request: Request,
        info: &SpiderInfo,
        item: &P::Item,
    ) -> MediaOutcome {
        info.stats().increment_media_requested();
        self.modify_media_request(&mut request);

        let hook_error = match self.policy.media_to_download(&mut request, info, item).await {
            Ok(MediaAction::Download) => None,
            Ok(MediaAction::Resolved(value)) => {
                debug!(
                    "{} resolved {} without downloading",
                    self.policy.name(),
                    request.url
                );
                info.stats().increment_pre_resolved();
                return Arc::new(Ok(value));
            }
            Err(e) => {
                warn!(
                    spider = info.spider_name(),
                    "{} could not prepare {}: {}",
                    self.policy.name(),
                    request.url,
                    e
                );
                Some(e)
            }
        };

        let fingerprint = self.fingerprinter.fingerprint(&request);
        match info.claim(&fingerprint, &request.url) {
            Claim::Cached(outcome) => {
                info.stats().increment_cache_hits();
                outcome
            }
            Claim::Wait(rx) => {
                info.stats().increment_waits();
                match rx.await {
                    Ok(outcome) => outcome,
                    Err(_) => Arc::new(Err(MediaError::Abandoned { url: request.url })),
                }
            }
            Claim::Download(in_flight) => {
                let result = match hook_error {
                    Some(err) => {
                        info.stats().increment_hook_failures();
                        self.policy.media_failed(err, &request, info, item).await
                    }
                    None => self.download(&request, info, item).await,
                };
                in_flight.resolve(Arc::new(result))
            }
        }
    }

    async fn download(
        &self,
        request: &Request,
        info: &SpiderInfo,
        item: &P::Item,
    ) -> Result<MediaValue, MediaError> {
        info.stats().increment_downloads_started();
        trace!("Downloading media {}", request.url);
        let start_time = Instant::now();

        let result = match self.downloader.download(request.clone(), info).await {
            Ok(response) => {
                trace!(
                    "Downloaded {} (status {}) in {:?}",
                    request.url,
                    response.status.as_u16(),
                    start_time.elapsed()
                );
                self.policy
                    .media_downloaded(response, request, info, item)
                    .await
            }
            Err(e) => {
                debug!(
                    "Download of {} failed after {:?}: {}",
                    request.url,
                    start_time.elapsed(),
                    e
                );
                self.policy
                    .media_failed(MediaError::Download(e), request, info, item)
                    .await
            }
        };
        info.stats().record_download_outcome(result.is_ok());
        result
    }
}
