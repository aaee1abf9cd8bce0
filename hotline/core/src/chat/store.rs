//! Realtime Document Store
//!
//! The chat is backed by a remote document store with two collections,
//! `chat_topics` and `messages`. The store pushes *snapshots*: every change
//! delivers the full current query result, never a diff.
//!
//! [`DocumentStore`] is the seam; [`MemoryStore`] is an in-process
//! implementation used for tests and offline mode.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

use super::message::{MessageDoc, MessageId, NewMessage, TopicDoc};

/// Store failures
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write (permissions, rules)
    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Snapshot-delivering document store
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Watch the whole `chat_topics` collection
    ///
    /// The current snapshot is delivered immediately, then one snapshot per
    /// change. Dropping the receiver releases the watch.
    async fn watch_topics(&self) -> Result<mpsc::UnboundedReceiver<Vec<TopicDoc>>, StoreError>;

    /// Watch the newest `limit` documents of `messages`, newest first
    async fn watch_messages(
        &self,
        limit: usize,
    ) -> Result<mpsc::UnboundedReceiver<Vec<MessageDoc>>, StoreError>;

    /// Durably append a message; the store assigns id and timestamp
    async fn add_message(&self, message: NewMessage) -> Result<MessageId, StoreError>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

struct MessageWatcher {
    limit: usize,
    tx: mpsc::UnboundedSender<Vec<MessageDoc>>,
}

struct Inner {
    topics: Vec<TopicDoc>,
    messages: Vec<MessageDoc>,
    topic_watchers: Vec<mpsc::UnboundedSender<Vec<TopicDoc>>>,
    message_watchers: Vec<MessageWatcher>,
    next_id: u64,
    last_timestamp: Option<DateTime<Utc>>,
    available: bool,
}

impl Inner {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + ChronoDuration::milliseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn newest_messages(&self, limit: usize) -> Vec<MessageDoc> {
        let mut docs = self.messages.clone();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        docs.truncate(limit);
        docs
    }

    fn broadcast_topics(&mut self) {
        let snapshot = self.topics.clone();
        self.topic_watchers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    fn broadcast_messages(&mut self) {
        let mut watchers = std::mem::take(&mut self.message_watchers);
        watchers.retain(|w| w.tx.send(self.newest_messages(w.limit)).is_ok());
        self.message_watchers = watchers;
    }
}

/// In-process [`DocumentStore`]
///
/// Cloning shares the same collections.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, available store
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                topics: Vec::new(),
                messages: Vec::new(),
                topic_watchers: Vec::new(),
                message_watchers: Vec::new(),
                next_id: 1,
                last_timestamp: None,
                available: true,
            })),
        }
    }

    /// Replace the topic collection and notify watchers
    pub fn set_topics(&self, topics: Vec<TopicDoc>) {
        let mut inner = self.inner.lock();
        inner.topics = topics;
        inner.broadcast_topics();
    }

    /// Toggle availability; while unavailable every call fails
    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    /// Number of durable messages
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner.lock().messages.len()
    }

    /// Number of live watches (topic + message)
    #[must_use]
    pub fn active_watches(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .topic_watchers
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
            + inner
                .message_watchers
                .iter()
                .filter(|w| !w.tx.is_closed())
                .count()
    }

    fn check_available(inner: &Inner) -> Result<(), StoreError> {
        if inner.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn watch_topics(&self) -> Result<mpsc::UnboundedReceiver<Vec<TopicDoc>>, StoreError> {
        let mut inner = self.inner.lock();
        Self::check_available(&inner)?;

        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is alive, this cannot fail
        let _ = tx.send(inner.topics.clone());
        inner.topic_watchers.push(tx);
        Ok(rx)
    }

    async fn watch_messages(
        &self,
        limit: usize,
    ) -> Result<mpsc::UnboundedReceiver<Vec<MessageDoc>>, StoreError> {
        let mut inner = self.inner.lock();
        Self::check_available(&inner)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(inner.newest_messages(limit));
        inner.message_watchers.push(MessageWatcher { limit, tx });
        Ok(rx)
    }

    async fn add_message(&self, message: NewMessage) -> Result<MessageId, StoreError> {
        let mut inner = self.inner.lock();
        Self::check_available(&inner)?;

        let id = format!("msg_{:06}", inner.next_id);
        inner.next_id += 1;
        let created_at = inner.next_timestamp();

        inner.messages.push(MessageDoc {
            id: id.clone(),
            text: message.text,
            created_at: Some(created_at),
            topic_id: Some(message.topic_id.0),
            user: message.author,
        });
        inner.broadcast_messages();

        tracing::trace!(id = %id, "Stored message");
        Ok(MessageId(id))
    }
}
