//! Chat Data Types
//!
//! Domain types for the topic chat plus the raw document shapes the realtime
//! store holds in its `messages` and `chat_topics` collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Wrap a store document id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Topic identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(pub String);

impl TopicId {
    /// Wrap a store document id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAuthor {
    /// Device-local user id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name at the time of writing
    pub name: String,
    /// Avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ChatAuthor {
    /// Create an author without an avatar
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
        }
    }

    /// Set avatar URL
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// A chat topic
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic id
    pub id: TopicId,
    /// Title shown above the thread and as provenance on old messages
    pub title: String,
    /// Whether new messages are currently accepted for this topic
    pub is_active: bool,
}

/// A durable chat message as observed through a subscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Store-assigned id, unique within the feed
    pub id: MessageId,
    /// Message body
    pub text: String,
    /// Author
    pub author: ChatAuthor,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
    /// Topic the message was written under
    pub topic_id: Option<TopicId>,
}

impl ChatMessage {
    /// Build from a raw store document
    ///
    /// A document whose server timestamp has not resolved yet is stamped with
    /// `received_at`.
    #[must_use]
    pub fn from_doc(doc: MessageDoc, received_at: DateTime<Utc>) -> Self {
        Self {
            id: MessageId(doc.id),
            text: doc.text,
            author: doc.user,
            created_at: doc.created_at.unwrap_or(received_at),
            topic_id: doc.topic_id.map(TopicId),
        }
    }

    /// Whether the message belongs to a topic other than the active one
    ///
    /// Untagged messages are never de-emphasized.
    #[must_use]
    pub fn is_deemphasized(&self, active: Option<&Topic>) -> bool {
        match (&self.topic_id, active) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(topic_id), Some(active)) => *topic_id != active.id,
        }
    }
}

// ============================================================================
// Store documents
// ============================================================================

/// Raw document from the `messages` collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDoc {
    /// Document id (not part of the document body)
    #[serde(skip)]
    pub id: String,
    /// Message body
    pub text: String,
    /// Server timestamp, `None` while the write is still pending
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Topic tag
    #[serde(default)]
    pub topic_id: Option<String>,
    /// Author
    pub user: ChatAuthor,
}

/// Raw document from the `chat_topics` collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDoc {
    /// Document id (not part of the document body)
    #[serde(skip)]
    pub id: String,
    /// Topic title
    pub title: String,
    /// Active flag
    #[serde(default)]
    pub is_active: bool,
}

impl TopicDoc {
    /// Create a topic document
    pub fn new(id: impl Into<String>, title: impl Into<String>, is_active: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_active,
        }
    }
}

impl From<TopicDoc> for Topic {
    fn from(doc: TopicDoc) -> Self {
        Self {
            id: TopicId(doc.id),
            title: doc.title,
            is_active: doc.is_active,
        }
    }
}

/// A message write; the store assigns id and timestamp
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMessage {
    /// Message body
    pub text: String,
    /// Author
    pub author: ChatAuthor,
    /// Active topic at send time
    pub topic_id: TopicId,
}
