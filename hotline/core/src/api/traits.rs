//! Content API Traits
//!
//! Trait definitions for the REST content backend. Screens and the player
//! depend on these seams, not on HTTP.
//!
//! # Design Philosophy
//!
//! - [`ContentApi`]: read-only lists plus the hotline submission
//! - [`PlayCountSink`]: fire-and-forget play-count reporting, split out so
//!   the player does not need the whole content surface

use async_trait::async_trait;

use super::types::{
    Article, Business, FeedItem, HotlineEntry, HotlineSubmission, Podcast, Product,
};
use crate::error::ApiError;

/// REST content backend
#[async_trait]
pub trait ContentApi: PlayCountSink {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// `GET /articles`
    async fn articles(&self) -> Result<Vec<Article>, ApiError>;

    /// `GET /podcasts`
    async fn podcasts(&self) -> Result<Vec<Podcast>, ApiError>;

    /// `GET /products`
    async fn products(&self) -> Result<Vec<Product>, ApiError>;

    /// `GET /businesses`
    async fn businesses(&self) -> Result<Vec<Business>, ApiError>;

    /// `GET /feed`
    async fn feed(&self) -> Result<Vec<FeedItem>, ApiError>;

    /// `GET /hotline`
    async fn hotline_history(&self) -> Result<Vec<HotlineEntry>, ApiError>;

    /// `POST /hotline`
    async fn submit_hotline(&self, submission: &HotlineSubmission) -> Result<(), ApiError>;
}

/// Receiver of play-count increments
#[async_trait]
pub trait PlayCountSink: Send + Sync + 'static {
    /// `POST /podcasts/{id}/play`
    async fn record_play(&self, podcast_id: u64) -> Result<(), ApiError>;
}

/// Resolve a possibly-relative media path against the API base
///
/// Empty or missing paths resolve to `None`. Anything starting with `http`
/// is already absolute and is returned unchanged.
#[must_use]
pub fn resolve_media_url(base: &str, path: Option<&str>) -> Option<String> {
    let path = path?;
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http") {
        return Some(path.to_string());
    }
    Some(format!("{base}{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:3000/api";

    #[test]
    fn test_resolve_relative_path() {
        assert_eq!(
            resolve_media_url(BASE, Some("/uploads/ep1.mp3")).as_deref(),
            Some("http://localhost:3000/api/uploads/ep1.mp3")
        );
    }

    #[test]
    fn test_resolve_absolute_unchanged() {
        let url = "https://cdn.example.com/ep1.mp3";
        assert_eq!(resolve_media_url(BASE, Some(url)).as_deref(), Some(url));
    }

    #[test]
    fn test_resolve_empty_or_missing() {
        assert_eq!(resolve_media_url(BASE, Some("")), None);
        assert_eq!(resolve_media_url(BASE, None), None);
    }
}
