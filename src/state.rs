//! Per-spider coordination state of the media pipeline.
//!
//! `SpiderInfo` is the deduplication cache shared by every item processed
//! during one spider session. Each fingerprint moves through three states:
//! - unseen;
//! - downloading, with a (possibly empty) FIFO list of waiters;
//! - downloaded, with its outcome cached for the rest of the session.
//!
//! All transitions happen under one short, synchronous lock that is never held
//! across an `.await`, so "check cache, then mark downloading" is atomic for
//! every caller of the same fingerprint.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace};
use url::Url;

use crate::error::MediaError;
use crate::fingerprint::Fingerprint;
use crate::policy::MediaOutcome;
use crate::settings::MediaSettings;
use crate::stats::MediaStats;

#[derive(Default)]
struct CoordinationTable {
    downloading: HashSet<Fingerprint>,
    waiting: HashMap<Fingerprint, Vec<oneshot::Sender<MediaOutcome>>>,
    downloaded: HashMap<Fingerprint, MediaOutcome>,
}

/// Coordination state for one open spider.
pub struct SpiderInfo {
    spider_name: String,
    settings: MediaSettings,
    stats: MediaStats,
    table: Mutex<CoordinationTable>,
}

/// What a caller has to do to obtain the outcome of a fingerprint.
pub(crate) enum Claim<'a> {
    /// Already downloaded.
    Cached(MediaOutcome),
    /// Someone else is downloading it; the receiver fires on resolution.
    Wait(oneshot::Receiver<MediaOutcome>),
    /// The caller now owns the download and must resolve it.
    Download(InFlight<'a>),
}

impl SpiderInfo {
    /// Creates a new, atomically reference-counted `SpiderInfo`.
    pub fn new(spider_name: impl Into<String>, settings: MediaSettings) -> Arc<Self> {
        Arc::new(SpiderInfo {
            spider_name: spider_name.into(),
            settings,
            stats: MediaStats::new(),
            table: Mutex::new(CoordinationTable::default()),
        })
    }

    pub fn spider_name(&self) -> &str {
        &self.spider_name
    }

    pub fn settings(&self) -> &MediaSettings {
        &self.settings
    }

    pub fn stats(&self) -> &MediaStats {
        &self.stats
    }

    pub fn is_downloading(&self, fingerprint: &Fingerprint) -> bool {
        self.table.lock().downloading.contains(fingerprint)
    }

    pub fn is_downloaded(&self, fingerprint: &Fingerprint) -> bool {
        self.table.lock().downloaded.contains_key(fingerprint)
    }

    /// Number of callers parked behind the in-flight download of
    /// `fingerprint`, or `None` when it is not downloading.
    pub fn waiter_count(&self, fingerprint: &Fingerprint) -> Option<usize> {
        self.table.lock().waiting.get(fingerprint).map(Vec::len)
    }

    /// The cached outcome of `fingerprint`, if it was downloaded.
    pub fn cached(&self, fingerprint: &Fingerprint) -> Option<MediaOutcome> {
        self.table.lock().downloaded.get(fingerprint).cloned()
    }

    pub fn downloaded_count(&self) -> usize {
        self.table.lock().downloaded.len()
    }

    pub(crate) fn claim(&self, fingerprint: &Fingerprint, url: &Url) -> Claim<'_> {
        let mut table = self.table.lock();

        if let Some(outcome) = table.downloaded.get(fingerprint) {
            trace!("Cache hit for {} ({})", url, fingerprint);
            return Claim::Cached(Arc::clone(outcome));
        }

        if table.downloading.contains(fingerprint) {
            let (tx, rx) = oneshot::channel();
            let waiters = table.waiting.entry(fingerprint.clone()).or_default();
            waiters.push(tx);
            debug!(
                "{} is already downloading, parked as waiter #{}",
                url,
                waiters.len()
            );
            return Claim::Wait(rx);
        }

        table.downloading.insert(fingerprint.clone());
        table.waiting.insert(fingerprint.clone(), Vec::new());
        Claim::Download(InFlight {
            info: self,
            fingerprint: fingerprint.clone(),
            url: url.clone(),
            settled: false,
        })
    }
}

/// Ownership of one in-flight download.
///
/// Dropping it unresolved puts the fingerprint back to unseen and fails every
/// waiter with [`MediaError::Abandoned`].
pub(crate) struct InFlight<'a> {
    info: &'a SpiderInfo,
    fingerprint: Fingerprint,
    url: Url,
    settled: bool,
}

impl InFlight<'_> {
    /// Caches `outcome` and hands the same `Arc` to every waiter, in the order
    /// they registered.
    pub(crate) fn resolve(mut self, outcome: MediaOutcome) -> MediaOutcome {
        self.settled = true;
        let waiters = {
            let mut table = self.info.table.lock();
            table.downloading.remove(&self.fingerprint);
            table
                .downloaded
                .insert(self.fingerprint.clone(), Arc::clone(&outcome));
            table.waiting.remove(&self.fingerprint).unwrap_or_default()
        };

        trace!("Resolved {} for {} waiter(s)", self.url, waiters.len());
        for waiter in waiters {
            // A waiter whose future was dropped no longer cares.
            let _ = waiter.send(Arc::clone(&outcome));
        }
        outcome
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let waiters = {
            let mut table = self.info.table.lock();
            table.downloading.remove(&self.fingerprint);
            table.waiting.remove(&self.fingerprint).unwrap_or_default()
        };
        debug!(
            "Download of {} abandoned, failing {} waiter(s)",
            self.url,
            waiters.len()
        );
        self.info.stats.increment_downloads_abandoned();

        let outcome: MediaOutcome = Arc::new(Err(MediaError::Abandoned {
            url: self.url.clone(),
        }));
        for waiter in waiters {
            let _ = waiter.send(Arc::clone(&outcome));
        }
    }
}
