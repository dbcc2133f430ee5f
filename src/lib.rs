//! # spider-media
//!
//! Media download coordination for `spider-lib` item pipelines.
//!
//! Items scraped by a spider often point at auxiliary resources (images,
//! files). A [`MediaPipeline`] downloads those resources for every item while
//! guaranteeing that:
//!
//! - each distinct resource (by [`Fingerprint`]) is downloaded at most once per
//!   spider session, even when many items ask for it concurrently;
//! - every item asking for a resource receives the same cached outcome;
//! - an item is finalized only once all of its resources resolved, with the
//!   results in the order the item asked for them.
//!
//! What to download and what a download means is decided by a [`MediaPolicy`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_media::prelude::*;
//!
//! struct Thumbnails;
//!
//! #[async_trait]
//! impl MediaPolicy for Thumbnails {
//!     type Item = serde_json::Value;
//!
//!     fn get_media_requests(
//!         &self,
//!         item: &Self::Item,
//!         _info: &SpiderInfo,
//!     ) -> Result<MediaRequests, PipelineError> {
//!         let urls: Vec<&str> = item["image_urls"]
//!             .as_array()
//!             .map(|urls| urls.iter().filter_map(|u| u.as_str()).collect())
//!             .unwrap_or_default();
//!         MediaRequests::from_urls(&urls)
//!     }
//! }
//!
//! async fn run(items: Vec<serde_json::Value>) -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = MediaPipelineBuilder::new(Thumbnails).build()?;
//!     pipeline.open_spider("example").await?;
//!     for item in items {
//!         pipeline.process_item(item, "example").await?;
//!     }
//!     pipeline.close_spider("example").await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod downloader;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod policy;
pub mod prelude;
pub mod request;
pub mod response;
pub mod settings;
pub mod state;
pub mod stats;

pub use builder::MediaPipelineBuilder;
pub use downloader::{Downloader, HttpDownloader};
pub use error::{MediaError, PipelineError, SpiderError};
pub use fingerprint::{DefaultFingerprinter, Fingerprint, RequestFingerprinter};
pub use pipeline::{MediaPipeline, Pipeline};
pub use policy::{
    DefaultMediaPolicy, MediaAction, MediaOutcome, MediaPolicy, MediaRequests, MediaValue,
};
pub use request::{Request, StatusHandling};
pub use response::Response;
pub use settings::{MediaSettings, Settings};
pub use state::SpiderInfo;
pub use stats::MediaStats;

pub use async_trait::async_trait;
