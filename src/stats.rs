//! # Statistics Module
//!
//! Counters describing what the media pipeline did during one session.
//!
//! ## Key Metrics Tracked
//!
//! - **Request Metrics**: media requests seen, served from cache, parked behind
//!   an in-flight download, or resolved by the policy without downloading
//! - **Download Metrics**: downloads started, succeeded, failed and abandoned,
//!   plus requests whose filter hook failed before any download
//! - **Item Metrics**: items that went through the completion barrier
//!
//! ## Example
//!
//! ```rust,ignore
//! let stats = info.stats();
//! println!("{}", stats.to_json_string_pretty()?);
//! ```

use crate::error::SpiderError;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};

/// Collects counters about media processing for one spider session.
#[derive(Debug, serde::Serialize)]
pub struct MediaStats {
    #[serde(skip)]
    pub start_time: Instant,

    // Request-related metrics
    pub media_requested: AtomicUsize,
    pub cache_hits: AtomicUsize,
    pub waits: AtomicUsize,
    pub pre_resolved: AtomicUsize,

    // Download-related metrics
    pub downloads_started: AtomicUsize,
    pub downloads_succeeded: AtomicUsize,
    pub downloads_failed: AtomicUsize,
    pub downloads_abandoned: AtomicUsize,
    pub hook_failures: AtomicUsize,

    // Item-related metrics
    pub items_completed: AtomicUsize,
}

impl Default for MediaStats {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaStats {
    /// Creates a new `MediaStats` with all counters at zero.
    pub fn new() -> Self {
        MediaStats {
            start_time: Instant::now(),
            media_requested: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            waits: AtomicUsize::new(0),
            pre_resolved: AtomicUsize::new(0),
            downloads_started: AtomicUsize::new(0),
            downloads_succeeded: AtomicUsize::new(0),
            downloads_failed: AtomicUsize::new(0),
            downloads_abandoned: AtomicUsize::new(0),
            hook_failures: AtomicUsize::new(0),
            items_completed: AtomicUsize::new(0),
        }
    }

    pub(crate) fn increment_media_requested(&self) {
        self.media_requested.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_waits(&self) {
        self.waits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_pre_resolved(&self) {
        self.pre_resolved.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_downloads_started(&self) {
        self.downloads_started.fetch_add(1, Ordering::SeqCst);
    }

    /// Records the final outcome of a download.
    pub(crate) fn record_download_outcome(&self, success: bool) {
        if success {
            self.downloads_succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.downloads_failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn increment_downloads_abandoned(&self) {
        self.downloads_abandoned.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_hook_failures(&self) {
        self.hook_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_completed(&self) {
        self.items_completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Shorthand for reading a counter.
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Converts the counters into a JSON string.
    pub fn to_json_string(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Converts the counters into a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
