//! The `MediaPipeline` struct: configuration and per-spider sessions.
//!
//! Each open spider gets its own [`SpiderInfo`]; nothing is shared between
//! sessions. Closing a spider drops its cache without flushing anything.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::Pipeline;
use crate::downloader::Downloader;
use crate::error::PipelineError;
use crate::fingerprint::{Fingerprint, RequestFingerprinter};
use crate::policy::MediaPolicy;
use crate::request::{Request, StatusHandling};
use crate::settings::MediaSettings;
use crate::state::SpiderInfo;

/// Coordinates media downloads for items, deduplicating across items.
pub struct MediaPipeline<P: MediaPolicy> {
    pub(super) policy: P,
    pub(super) downloader: Arc<dyn Downloader>,
    pub(super) fingerprinter: Arc<dyn RequestFingerprinter>,
    settings: MediaSettings,
    sessions: DashMap<String, Arc<SpiderInfo>>,
}

impl<P: MediaPolicy> MediaPipeline<P> {
    pub(crate) fn new(
        policy: P,
        downloader: Arc<dyn Downloader>,
        fingerprinter: Arc<dyn RequestFingerprinter>,
        settings: MediaSettings,
    ) -> Self {
        MediaPipeline {
            policy,
            downloader,
            fingerprinter,
            settings,
            sessions: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn settings(&self) -> &MediaSettings {
        &self.settings
    }

    /// Allocates fresh coordination state for `spider`. Reopening a spider
    /// starts from an empty cache.
    pub fn open_session(&self, spider: &str) -> Arc<SpiderInfo> {
        let info = SpiderInfo::new(spider, self.settings);
        if self
            .sessions
            .insert(spider.to_string(), Arc::clone(&info))
            .is_some()
        {
            debug!("Spider '{}' reopened, previous media cache dropped", spider);
        }
        info!(
            "Media pipeline '{}' opened for spider '{}'",
            self.policy.name(),
            spider
        );
        info
    }

    /// Releases the coordination state of `spider`.
    pub fn close_session(&self, spider: &str) -> Option<Arc<SpiderInfo>> {
        let closed = self.sessions.remove(spider).map(|(_, info)| info);
        if let Some(info) = &closed {
            info!(
                "Media pipeline '{}' closed for spider '{}' ({} resources cached)",
                self.policy.name(),
                spider,
                info.downloaded_count()
            );
        }
        closed
    }

    /// The coordination state of an open spider.
    pub fn session(&self, spider: &str) -> Option<Arc<SpiderInfo>> {
        self.sessions.get(spider).map(|entry| Arc::clone(entry.value()))
    }

    pub fn fingerprint(&self, request: &Request) -> Fingerprint {
        self.fingerprinter.fingerprint(request)
    }

    /// Tags `request` with the statuses the downloader must hand back.
    ///
    /// With redirects allowed, the downloader follows 3xx itself and returns
    /// everything else. Otherwise every status comes back untouched.
    pub fn modify_media_request(&self, request: &mut Request) {
        request.status_handling = if self.settings.allow_redirects {
            StatusHandling::Except(300..=399)
        } else {
            StatusHandling::All
        };
    }
}

#[async_trait]
impl<P: MediaPolicy> Pipeline<P::Item> for MediaPipeline<P> {
    fn name(&self) -> &str {
        self.policy.name()
    }

    async fn open_spider(&self, spider: &str) -> Result<(), PipelineError> {
        self.open_session(spider);
        Ok(())
    }

    async fn process_item(
        &self,
        item: P::Item,
        spider: &str,
    ) -> Result<Option<P::Item>, PipelineError> {
        let info = self
            .session(spider)
            .ok_or_else(|| PipelineError::SpiderNotOpen {
                spider: spider.to_string(),
                pipeline: self.policy.name().to_string(),
            })?;
        self.process_item_with(item, &info).await.map(Some)
    }

    async fn close_spider(&self, spider: &str) -> Result<(), PipelineError> {
        self.close_session(spider);
        Ok(())
    }
}
