//! A "prelude" for users of the `spider-media` crate.
//!
//! This prelude re-exports the most commonly used traits, structs, and macros
//! so that they can be easily imported.
//!
//! # Example
//!
//! ```
//! use spider_media::prelude::*;
//! ```

pub use crate::{
    // Core structs
    MediaPipeline,
    MediaPipelineBuilder,
    SpiderInfo,
    // Core traits
    Downloader,
    MediaPolicy,
    Pipeline,
    // Hook types
    MediaAction,
    MediaOutcome,
    MediaRequests,
    MediaValue,
    Request,
    Response,
    // Errors
    MediaError,
    PipelineError,
    SpiderError,
    // Essential re-exports for trait implementation
    async_trait,
};
