//! Chat Composer
//!
//! Builds optimistic entries for messages the local user sends and merges
//! them with the durable snapshot for display.
//!
//! The subscribed snapshot is the source of truth and is never edited here.
//! A pending entry lives only until its durable copy shows up. The two cannot
//! be matched by id (the local id is temporary, the store assigns its own), so
//! matching is by author, text and a time window. Messages that were already
//! on screen when the entry was created never count as its copy, so an older
//! identical message cannot swallow a new send.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::message::{ChatAuthor, ChatMessage, MessageId};
use super::store::DocumentStore;
use super::stream::{MessageSnapshot, MessageStream, SendError};
use crate::error::ValidationError;

/// Default correlation window between a local send and its server echo
pub const DEFAULT_CORRELATION_WINDOW: Duration = Duration::from_secs(120);

/// A locally constructed message awaiting its durable copy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMessage {
    /// Temporary local id (`local_<uuid>`)
    pub local_id: String,
    /// Message body
    pub text: String,
    /// Local author
    pub author: ChatAuthor,
    /// Local creation time
    pub created_at: DateTime<Utc>,
    /// Confirmed ids already visible when this entry was created
    baseline: HashSet<MessageId>,
}

impl PendingMessage {
    fn matches(&self, confirmed: &ChatMessage, window: chrono::Duration) -> bool {
        !self.baseline.contains(&confirmed.id)
            && self.author.id == confirmed.author.id
            && self.text.trim() == confirmed.text.trim()
            && self
                .created_at
                .checked_sub_signed(window)
                .map_or(true, |earliest| confirmed.created_at >= earliest)
    }
}

/// One row of the rendered thread
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEntry {
    /// Shown before server confirmation
    Pending(PendingMessage),
    /// Durable copy from the subscription
    Confirmed(ChatMessage),
}

impl ChatEntry {
    /// Message body
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Pending(p) => &p.text,
            Self::Confirmed(m) => &m.text,
        }
    }

    /// Whether this entry still awaits confirmation
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Optimistic sender and reconciler
#[derive(Debug)]
pub struct ChatComposer {
    pending: Vec<PendingMessage>,
    /// Confirmed messages that already absorbed a pending entry
    absorbed: HashSet<MessageId>,
    /// Ids in the last reconciled snapshot
    seen: HashSet<MessageId>,
    window: chrono::Duration,
}

impl Default for ChatComposer {
    fn default() -> Self {
        Self::new(DEFAULT_CORRELATION_WINDOW)
    }
}

impl ChatComposer {
    /// Create a composer with the given correlation window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            pending: Vec::new(),
            absorbed: HashSet::new(),
            seen: HashSet::new(),
            window: chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Build an optimistic entry
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyMessage`] for blank text.
    pub fn compose(&self, text: &str, author: &ChatAuthor) -> Result<PendingMessage, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(PendingMessage {
            local_id: format!("local_{}", uuid::Uuid::new_v4()),
            text: text.to_string(),
            author: author.clone(),
            created_at: Utc::now(),
            baseline: self.seen.clone(),
        })
    }

    /// Show an optimistic entry and hand the message to the stream
    ///
    /// Messages the stream has already delivered are excluded from matching
    /// this entry, even if this composer never reconciled them. On failure
    /// the optimistic entry is withdrawn again.
    ///
    /// # Errors
    ///
    /// Returns whatever [`MessageStream::send`] returns.
    pub async fn submit<S: DocumentStore>(
        &mut self,
        stream: &MessageStream<S>,
        text: &str,
        author: &ChatAuthor,
    ) -> Result<(), SendError> {
        let mut pending = self.compose(text, author)?;
        pending.baseline.extend(stream.visible_message_ids());
        let local_id = pending.local_id.clone();
        self.pending.push(pending);

        if let Err(e) = stream.send(text, author).await {
            self.pending.retain(|p| p.local_id != local_id);
            return Err(e);
        }
        Ok(())
    }

    /// Entries still waiting for their durable copy, oldest first
    #[must_use]
    pub fn pending(&self) -> &[PendingMessage] {
        &self.pending
    }

    /// Merge a snapshot with the pending entries
    ///
    /// Pending entries matched by a confirmed message are removed for good;
    /// each confirmed message absorbs at most one pending entry over the
    /// composer's lifetime. Remaining pending entries come first (newest
    /// first), then the snapshot in its own order.
    pub fn reconcile(&mut self, snapshot: &MessageSnapshot) -> Vec<ChatEntry> {
        // Oldest confirmed first, so the oldest pending is absorbed first
        for confirmed in snapshot.messages().iter().rev() {
            if self.pending.is_empty() {
                break;
            }
            if self.absorbed.contains(&confirmed.id) {
                continue;
            }
            if let Some(pos) = self
                .pending
                .iter()
                .position(|p| p.matches(confirmed, self.window))
            {
                let pending = self.pending.remove(pos);
                tracing::trace!(
                    local_id = %pending.local_id,
                    id = %confirmed.id,
                    "Optimistic message confirmed"
                );
                self.absorbed.insert(confirmed.id.clone());
            }
        }

        // Ids that left the window can never absorb again
        self.absorbed
            .retain(|id| snapshot.iter().any(|m| &m.id == id));
        self.seen = snapshot.ids().collect();

        self.pending
            .iter()
            .rev()
            .cloned()
            .map(ChatEntry::Pending)
            .chain(snapshot.iter().cloned().map(ChatEntry::Confirmed))
            .collect()
    }
}
