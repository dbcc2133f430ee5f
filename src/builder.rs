//! # Builder Module
//!
//! Provides the `MediaPipelineBuilder`, a fluent API for assembling a
//! [`MediaPipeline`] from a policy and its collaborators.
//!
//! ## Overview
//!
//! A media pipeline needs a [`MediaPolicy`], a [`Downloader`] and a
//! [`RequestFingerprinter`]. The builder fills in defaults for the last two
//! ([`HttpDownloader`] and [`DefaultFingerprinter`]) and resolves the media
//! settings, letting explicit calls win over [`Settings`] keys.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_media::{MediaPipelineBuilder, Settings};
//!
//! let settings = Settings::from_json_str(r#"{"MEDIA_ALLOW_REDIRECTS": true}"#)?;
//! let pipeline = MediaPipelineBuilder::new(ImagesPolicy::default())
//!     .settings(settings)
//!     .log_failed_results(false)
//!     .build()?;
//! ```

use std::sync::Arc;
use tracing::debug;

use crate::downloader::{Downloader, HttpDownloader};
use crate::error::SpiderError;
use crate::fingerprint::{DefaultFingerprinter, RequestFingerprinter};
use crate::pipeline::MediaPipeline;
use crate::policy::MediaPolicy;
use crate::settings::{MediaSettings, Settings};

pub struct MediaPipelineBuilder<P: MediaPolicy> {
    policy: P,
    downloader: Option<Arc<dyn Downloader>>,
    fingerprinter: Arc<dyn RequestFingerprinter>,
    settings: Settings,
    allow_redirects: Option<bool>,
    log_failed_results: Option<bool>,
}

impl<P: MediaPolicy> MediaPipelineBuilder<P> {
    /// Creates a new builder around `policy`.
    pub fn new(policy: P) -> Self {
        MediaPipelineBuilder {
            policy,
            downloader: None,
            fingerprinter: Arc::new(DefaultFingerprinter),
            settings: Settings::default(),
            allow_redirects: None,
            log_failed_results: None,
        }
    }

    /// Sets the downloader used for every distinct media request.
    pub fn downloader<D: Downloader>(mut self, downloader: D) -> Self {
        self.downloader = Some(Arc::new(downloader));
        self
    }

    /// Shares an existing downloader with the pipeline.
    pub fn shared_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Replaces the default fingerprinter.
    pub fn fingerprinter<F: RequestFingerprinter + 'static>(mut self, fingerprinter: F) -> Self {
        self.fingerprinter = Arc::new(fingerprinter);
        self
    }

    /// Settings to resolve the media options from.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Forces redirect handling for this pipeline, whatever the settings say.
    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }

    /// Enables or disables logging of failed media results.
    pub fn log_failed_results(mut self, enabled: bool) -> Self {
        self.log_failed_results = Some(enabled);
        self
    }

    /// Builds the `MediaPipeline`, creating an [`HttpDownloader`] if none was given.
    pub fn build(self) -> Result<MediaPipeline<P>, SpiderError> {
        let mut media_settings = MediaSettings::resolve(
            &self.settings,
            self.policy.name(),
            self.policy.allow_redirects(),
        );
        if let Some(allow) = self.allow_redirects {
            media_settings.allow_redirects = allow;
        }
        if let Some(enabled) = self.log_failed_results {
            media_settings.log_failed_results = enabled;
        }

        let downloader = match self.downloader {
            Some(downloader) => downloader,
            None => Arc::new(HttpDownloader::new()?),
        };

        debug!(
            "Building media pipeline '{}' with {:?}",
            self.policy.name(),
            media_settings
        );
        Ok(MediaPipeline::new(
            self.policy,
            downloader,
            self.fingerprinter,
            media_settings,
        ))
    }
}
