//! # Pipeline Module
//!
//! Implements the media download coordination engine.
//!
//! ## Overview
//!
//! [`MediaPipeline`] sits between "this item needs N resources" and "this item
//! is done". For every item it asks the policy which requests are needed,
//! pushes each of them through the deduplicating dispatcher, waits for all of
//! them and hands the ordered results back to the policy.
//!
//! ## Key Components
//!
//! - **Pipeline**: the item pipeline interface the surrounding crawler drives
//! - **MediaPipeline**: session management and configuration (`core`)
//! - **Request Handler**: one request in, one shared outcome out, at most one
//!   download per fingerprint per session (`request_handler`)
//! - **Item Processor**: the per-item completion barrier (`item_processor`)

mod core;
mod item_processor;
mod request_handler;

pub use self::core::MediaPipeline;

use async_trait::async_trait;

use crate::error::PipelineError;

/// An item pipeline stage.
#[async_trait]
pub trait Pipeline<I: Send + 'static>: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called once when `spider` starts.
    async fn open_spider(&self, _spider: &str) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Processes one item. `Ok(None)` drops it.
    async fn process_item(&self, item: I, spider: &str) -> Result<Option<I>, PipelineError>;

    /// Called once when `spider` finishes.
    async fn close_spider(&self, _spider: &str) -> Result<(), PipelineError> {
        Ok(())
    }
}
