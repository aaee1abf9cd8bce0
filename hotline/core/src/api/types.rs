//! Content Types
//!
//! JSON shapes served by the REST backend. Field names follow the wire
//! format (camelCase); timestamps are kept as the strings the server sends.

use serde::{Deserialize, Serialize};

/// A local business in the directory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    /// Business id
    pub id: String,
    /// Business name
    pub name: String,
    /// Directory category
    pub category: String,
    /// Street address
    pub address: String,
    /// Phone number
    pub phone: String,
    /// Website URL
    pub website: String,
    /// One-line summary
    pub summary: String,
    /// Long description
    pub description: String,
    /// Image URL
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A news article
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Article id
    pub id: u64,
    /// Headline
    pub title: String,
    /// Teaser
    pub summary: String,
    /// Markdown body
    pub content: String,
    /// Byline
    pub author: String,
    /// Header image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Publication time as sent by the server
    pub created_at: String,
    /// Category used by the list filter
    #[serde(default)]
    pub category: Option<String>,
}

/// A podcast episode
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
    /// Podcast id
    pub id: u64,
    /// Episode title
    pub title: String,
    /// Show notes
    pub description: String,
    /// Host name
    pub host: String,
    /// Audio URL, absolute or relative to the API base
    pub audio_url: String,
    /// Artwork URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Human-readable duration label ("42:10")
    pub duration: String,
    /// Publication time as sent by the server
    pub created_at: String,
}

/// A shop product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id
    pub id: String,
    /// Product name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Description
    pub description: String,
    /// Image URL
    pub image_url: String,
}

/// A social post mirrored into the home feed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Feed item id
    pub id: u64,
    /// Source platform ("twitter", "instagram", ...)
    pub platform: String,
    /// Post text
    pub content: String,
    /// Author display name
    pub author_name: String,
    /// Author handle without the leading `@`
    pub author_handle: String,
    /// Attached media
    #[serde(default)]
    pub media_urls: Vec<String>,
    /// Link to the original post
    #[serde(default)]
    pub original_url: String,
    /// Post time as sent by the server
    pub posted_at: String,
}

/// A voice message previously sent to the hotline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotlineEntry {
    /// Entry id
    pub id: u64,
    /// Caller name
    pub name: String,
    /// Uploaded recording
    pub audio_url: String,
    /// Submission time as sent by the server
    pub created_at: String,
}

/// Body of a hotline submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotlineSubmission {
    /// Caller name
    pub name: String,
    /// URL returned by the blob upload
    pub audio_url: String,
}
