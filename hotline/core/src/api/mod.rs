//! REST Content API
//!
//! Typed access to the Hal's Hotline content server through a common trait,
//! so screens and the player can be tested without HTTP.
//!
//! # Usage
//!
//! ```ignore
//! use hotline_core::api::{ContentApi, HttpContentApi};
//!
//! let api = HttpContentApi::from_config(&config);
//! let podcasts = api.podcasts().await?;
//! ```

mod http;
mod traits;
mod types;

pub use http::{HttpContentApi, DEFAULT_REQUEST_TIMEOUT};
pub use traits::{resolve_media_url, ContentApi, PlayCountSink};
pub use types::{
    Article, Business, FeedItem, HotlineEntry, HotlineSubmission, Podcast, Product,
};
