//! Message Stream
//!
//! Turns the store's raw snapshot watches into typed, ordered snapshots for
//! UI surfaces, and owns the active-topic pointer that gates sending.
//!
//! # Subscriptions
//!
//! Each `subscribe_*` call opens exactly one upstream watch and forwards its
//! snapshots through a [`Subscription`]. The watch is released when the
//! subscription is unsubscribed or dropped (typically when the owning screen
//! goes away). A released subscription never yields again, even if the
//! upstream already queued more snapshots; subscribing again starts a fresh
//! sequence.
//!
//! The active-topic pointer only lives as long as some topics subscription
//! does. When the last one is released (or its upstream ends) the pointer is
//! cleared, so [`MessageStream::send`] refuses to post into a topic it can no
//! longer see closing.

use std::collections::{BTreeMap, HashSet};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::Utc;
use futures::Stream;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::message::{ChatAuthor, ChatMessage, MessageId, NewMessage, Topic, TopicDoc, TopicId};
use super::store::{DocumentStore, StoreError};
use crate::error::ValidationError;

/// Default number of messages kept per subscription
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;

/// Why a send did not reach the store
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SendError {
    /// No topic is active; composing is disabled in this state
    #[error("No active topic, chat is closed")]
    NoActiveTopic,

    /// Rejected locally
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The durable write failed
    #[error("Failed to send message: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// Snapshots
// ============================================================================

/// Full state of the topic collection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopicsSnapshot {
    /// Every topic by id, active or not
    pub topics_by_id: BTreeMap<TopicId, Topic>,
    /// The single active topic, if any
    pub active: Option<Topic>,
}

impl TopicsSnapshot {
    /// Build from raw documents
    ///
    /// If more than one document is flagged active, the last one encountered
    /// wins and a warning is logged.
    #[must_use]
    pub fn from_docs(docs: Vec<TopicDoc>) -> Self {
        let mut topics_by_id = BTreeMap::new();
        let mut active: Option<Topic> = None;
        let mut active_count = 0usize;

        for doc in docs {
            let topic = Topic::from(doc);
            if topic.is_active {
                active_count += 1;
                active = Some(topic.clone());
            }
            topics_by_id.insert(topic.id.clone(), topic);
        }

        if active_count > 1 {
            tracing::warn!(
                active_count,
                chosen = ?active.as_ref().map(|t| t.id.as_str()),
                "Multiple chat topics are marked active, using the last one"
            );
        }

        Self {
            topics_by_id,
            active,
        }
    }

    /// Title of a topic, for provenance labels on old messages
    #[must_use]
    pub fn title_of(&self, id: &TopicId) -> Option<&str> {
        self.topics_by_id.get(id).map(|t| t.title.as_str())
    }

    /// Whether sending is currently possible
    #[must_use]
    pub fn can_compose(&self) -> bool {
        self.active.is_some()
    }
}

/// The newest messages, newest first
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageSnapshot {
    messages: Vec<ChatMessage>,
}

impl MessageSnapshot {
    /// Order messages newest first (ties broken by id, descending) and keep
    /// at most `limit`
    #[must_use]
    pub fn new(mut messages: Vec<ChatMessage>, limit: usize) -> Self {
        messages.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        messages.truncate(limit);
        Self { messages }
    }

    /// Messages, newest first
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate newest first
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Message ids, newest first
    pub fn ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.messages.iter().map(|m| m.id.clone())
    }
}

// ============================================================================
// Active Topic
// ============================================================================

/// Active topic plus the number of topic subscriptions keeping it current
#[derive(Debug, Default)]
struct ActiveTopic {
    topic: Option<Topic>,
    watchers: usize,
}

/// One topics subscription's hold on the active-topic pointer
///
/// Released exactly once; the last release clears the pointer. A released
/// lease never writes again, even from a forwarder that has not yet observed
/// its abort.
#[derive(Debug)]
struct TopicLease {
    state: Arc<RwLock<ActiveTopic>>,
    released: AtomicBool,
}

impl TopicLease {
    fn acquire(state: &Arc<RwLock<ActiveTopic>>) -> Arc<Self> {
        state.write().watchers += 1;
        Arc::new(Self {
            state: Arc::clone(state),
            released: AtomicBool::new(false),
        })
    }

    fn publish(&self, active: Option<&Topic>) {
        let mut state = self.state.write();
        if !self.released.load(Ordering::Acquire) {
            state.topic = active.cloned();
        }
    }

    fn release(&self) {
        let mut state = self.state.write();
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        state.watchers = state.watchers.saturating_sub(1);
        if state.watchers == 0 && state.topic.take().is_some() {
            tracing::debug!("Last topic subscription released, chat closed locally");
        }
    }
}

impl Drop for TopicLease {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// A live snapshot subscription
///
/// Infinite while held. Implements [`Stream`].
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    forwarder: Option<JoinHandle<()>>,
    lease: Option<Arc<TopicLease>>,
    closed: bool,
}

impl<T> Subscription<T> {
    fn new(rx: mpsc::UnboundedReceiver<T>, forwarder: JoinHandle<()>) -> Self {
        Self {
            rx,
            forwarder: Some(forwarder),
            lease: None,
            closed: false,
        }
    }

    fn with_lease(mut self, lease: Arc<TopicLease>) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Wait for the next snapshot
    ///
    /// Returns `None` once unsubscribed or when the upstream ends.
    pub async fn recv(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    /// Take a queued snapshot without waiting
    pub fn try_recv(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Take the newest queued snapshot, discarding older ones
    pub fn latest(&mut self) -> Option<T> {
        let mut latest = None;
        while let Some(snapshot) = self.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }

    /// Release the upstream watch; no snapshot is yielded afterwards
    pub fn unsubscribe(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        if let Some(lease) = self.lease.take() {
            lease.release();
        }
        self.rx.close();
        tracing::debug!("Chat subscription released");
    }

    /// Whether the subscription is still live
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.closed
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<T> Unpin for Subscription<T> {}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        this.rx.poll_recv(cx)
    }
}

// ============================================================================
// Message Stream
// ============================================================================

/// Typed view over the chat collections
pub struct MessageStream<S: DocumentStore> {
    store: Arc<S>,
    active_topic: Arc<RwLock<ActiveTopic>>,
    visible: Arc<RwLock<HashSet<MessageId>>>,
}

impl<S: DocumentStore> Clone for MessageStream<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            active_topic: Arc::clone(&self.active_topic),
            visible: Arc::clone(&self.visible),
        }
    }
}

impl<S: DocumentStore> MessageStream<S> {
    /// Create a stream over a store
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            active_topic: Arc::new(RwLock::new(ActiveTopic::default())),
            visible: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// The active topic as of the last topic snapshot received
    ///
    /// `None` while no topics subscription is held.
    #[must_use]
    pub fn active_topic(&self) -> Option<Topic> {
        self.active_topic.read().topic.clone()
    }

    /// Ids in the newest message snapshot forwarded by any subscription
    #[must_use]
    pub fn visible_message_ids(&self) -> HashSet<MessageId> {
        self.visible.read().clone()
    }

    /// Subscribe to the topic collection
    ///
    /// Also keeps the active-topic pointer used by [`send`](Self::send)
    /// current while the subscription is held. Once the last topics
    /// subscription is gone the pointer is cleared.
    ///
    /// # Errors
    ///
    /// Returns the store error if the watch cannot be opened.
    pub async fn subscribe_topics(&self) -> Result<Subscription<TopicsSnapshot>, StoreError> {
        let mut upstream = self.store.watch_topics().await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let lease = TopicLease::acquire(&self.active_topic);
        let forwarder_lease = Arc::clone(&lease);

        let forwarder = tokio::spawn(async move {
            while let Some(docs) = upstream.recv().await {
                let snapshot = TopicsSnapshot::from_docs(docs);
                forwarder_lease.publish(snapshot.active.as_ref());
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
            forwarder_lease.release();
        });

        tracing::debug!("Subscribed to chat topics");
        Ok(Subscription::new(rx, forwarder).with_lease(lease))
    }

    /// Subscribe to the newest `limit` messages
    ///
    /// # Errors
    ///
    /// Returns the store error if the watch cannot be opened.
    pub async fn subscribe_messages(
        &self,
        limit: usize,
    ) -> Result<Subscription<MessageSnapshot>, StoreError> {
        let mut upstream = self.store.watch_messages(limit).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let visible = Arc::clone(&self.visible);

        let forwarder = tokio::spawn(async move {
            while let Some(docs) = upstream.recv().await {
                let received_at = Utc::now();
                let messages = docs
                    .into_iter()
                    .map(|doc| ChatMessage::from_doc(doc, received_at))
                    .collect();
                let snapshot = MessageSnapshot::new(messages, limit);
                *visible.write() = snapshot.ids().collect();
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
        });

        tracing::debug!(limit, "Subscribed to chat messages");
        Ok(Subscription::new(rx, forwarder))
    }

    /// Durably send a message under the active topic
    ///
    /// The message becomes visible only through the message subscription.
    ///
    /// # Errors
    ///
    /// - [`SendError::Invalid`] if the text is blank (no store call)
    /// - [`SendError::NoActiveTopic`] if no topic is active (no store call)
    /// - [`SendError::Store`] if the write fails
    pub async fn send(&self, text: &str, author: &ChatAuthor) -> Result<(), SendError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let topic = self.active_topic().ok_or(SendError::NoActiveTopic)?;

        let message = NewMessage {
            text: text.to_string(),
            author: author.clone(),
            topic_id: topic.id,
        };

        match self.store.add_message(message).await {
            Ok(id) => {
                tracing::debug!(id = %id, "Message stored");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error sending message");
                Err(e.into())
            }
        }
    }
}
