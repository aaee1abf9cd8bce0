//! Topic Chat
//!
//! Client-side synchronization for the shared chat thread.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  submit()   ┌───────────────┐  add_message()  ┌───────────────┐
//! │ ChatComposer │ ──────────► │ MessageStream │ ──────────────► │ DocumentStore │
//! │  (pending)   │             │ (active topic)│                 │ (remote/mem)  │
//! └──────┬───────┘             └───────┬───────┘                 └───────┬───────┘
//!        │ reconcile()                 │  Subscription<Snapshot>         │
//!        ▼                             ◄─────────────────────────────────┘
//!   Vec<ChatEntry>  ◄──────── MessageSnapshot (full, ordered)
//! ```
//!
//! - The store pushes full snapshots; the stream types and orders them.
//! - The composer shows optimistic entries and drops them when the durable
//!   copy arrives.
//! - Sending requires an active topic. Historical messages stay visible
//!   whatever the active topic is.

mod composer;
mod message;
mod store;
mod stream;

pub use composer::{ChatComposer, ChatEntry, PendingMessage, DEFAULT_CORRELATION_WINDOW};
pub use message::{
    ChatAuthor, ChatMessage, MessageDoc, MessageId, NewMessage, Topic, TopicDoc, TopicId,
};
pub use store::{DocumentStore, MemoryStore, StoreError};
pub use stream::{
    MessageSnapshot, MessageStream, SendError, Subscription, TopicsSnapshot,
    DEFAULT_MESSAGE_LIMIT,
};
