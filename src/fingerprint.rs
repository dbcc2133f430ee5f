//! Request fingerprinting.
//!
//! A fingerprint is the only key the media pipeline deduplicates on: two
//! requests with the same fingerprint are the same resource, whatever else
//! differs between them (meta, headers).

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

use crate::request::Request;

/// Stable identifier of a media resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Fingerprint(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes fingerprints. Implementations must be deterministic and pure.
pub trait RequestFingerprinter: Send + Sync {
    fn fingerprint(&self, request: &Request) -> Fingerprint;
}

impl<F> RequestFingerprinter for F
where
    F: Fn(&Request) -> Fingerprint + Send + Sync,
{
    fn fingerprint(&self, request: &Request) -> Fingerprint {
        self(request)
    }
}

/// SHA-256 over the method, the canonical URL and the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFingerprinter;

impl RequestFingerprinter for DefaultFingerprinter {
    fn fingerprint(&self, request: &Request) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(request.method.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(canonicalize_url(&request.url).as_bytes());
        hasher.update([0u8]);
        hasher.update(&request.body);
        Fingerprint(hex::encode(hasher.finalize()))
    }
}

/// Drops the fragment and sorts the query pairs.
pub fn canonicalize_url(url: &Url) -> String {
    let mut canonical = url.clone();
    canonical.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        canonical.set_query(None);
    } else {
        pairs.sort();
        canonical.query_pairs_mut().clear().extend_pairs(pairs);
    }
    canonical.to_string()
}
