//! Hotline Core - Headless Client Core for Hal's Hotline
//!
//! This crate holds the client-side logic of the Hal's Hotline community app
//! (directory, articles, podcasts, shop, hotline voice messages, topic chat),
//! independent of any UI framework. A mobile shell, a desktop app or the
//! bundled CLI drive it the same way.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          UI Surfaces                              │
//! │   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────────┐   │
//! │   │  Mobile  │   │ Desktop  │   │   CLI    │   │    Tests     │   │
//! │   └────┬─────┘   └────┬─────┘   └────┬─────┘   └──────┬───────┘   │
//! │        └──────────────┴──────┬───────┴────────────────┘           │
//! └──────────────────────────────┼───────────────────────────────────┘
//!                                │ snapshots / watch channels
//! ┌──────────────────────────────┼───────────────────────────────────┐
//! │                         HOTLINE CORE                              │
//! │   ┌──────────┐  ┌───────────┐  ┌─────────┐  ┌─────────────────┐   │
//! │   │   Chat   │  │  Player   │  │   API   │  │ Cart / Profile  │   │
//! │   │ stream + │  │ single    │  │ reqwest │  │ Hotline         │   │
//! │   │ composer │  │ writer    │  │         │  │                 │   │
//! │   └────┬─────┘  └─────┬─────┘  └────┬────┘  └─────────────────┘   │
//! └────────┼──────────────┼─────────────┼────────────────────────────┘
//!          ▼              ▼             ▼
//!   DocumentStore    AudioBackend    REST server
//! ```
//!
//! # Key Types
//!
//! - [`MessageStream`]: live topic and message snapshots, plus `send`
//! - [`ChatComposer`]: optimistic pending entries reconciled with snapshots
//! - [`PlaybackController`]: the one podcast playback session
//! - [`HttpContentApi`]: REST client for articles, podcasts, shop, directory
//! - [`ClientConfig`]: layered configuration (CLI > env > file > defaults)
//!
//! # Module Overview
//!
//! - [`api`]: REST content types and client
//! - [`cart`]: shopping cart
//! - [`catalog`]: category filter and directory search
//! - [`chat`]: realtime chat stream, store seam and composer
//! - [`config`]: configuration loading
//! - [`error`]: error taxonomy
//! - [`hotline`]: voice message recorder and submission
//! - [`player`]: podcast playback state machine
//! - [`user`]: anonymous device profile
//!
//! # No UI Dependencies
//!
//! Nothing in here pulls in a UI framework or blocks the runtime.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod hotline;
pub mod player;
pub mod user;

pub use api::{ContentApi, HttpContentApi, PlayCountSink};
pub use cart::{Cart, CartItem};
pub use chat::{
    ChatAuthor, ChatComposer, ChatEntry, ChatMessage, DocumentStore, MemoryStore, MessageSnapshot,
    MessageStream, Subscription, Topic, TopicsSnapshot,
};
pub use config::{load_config, ClientConfig, ConfigOverrides, ConfigSource};
pub use error::{ApiError, ClientError, PermissionError, PlaybackError, ValidationError};
pub use hotline::{HotlineRecorder, HotlineService};
pub use player::{PlaybackController, PlaybackSession, PlaybackState, PlayerSettings, Track};
pub use user::{FileKeyValueStore, KeyValueStore, UserProfile};
