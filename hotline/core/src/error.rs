//! Error Taxonomy
//!
//! Every fallible operation in the client core reports one of the error kinds
//! below. None of them are fatal: each is caught at the boundary of the async
//! operation that produced it, logged, and turned into a UI state by the
//! surface.
//!
//! | Kind               | Raised by                       | Surface behavior              |
//! |--------------------|---------------------------------|-------------------------------|
//! | [`ApiError`]        | REST requests                   | empty/error list, no retry    |
//! | [`ValidationError`] | composer, hotline, profile      | action blocked locally        |
//! | [`PlaybackError`]   | player resource load/seek       | player falls back to Idle     |
//! | [`PermissionError`] | microphone, notifications       | alert, feature disabled       |

use thiserror::Error;

use crate::chat::{SendError, StoreError};
use crate::config::ConfigError;
use crate::hotline::RecorderError;
use crate::user::ProfileError;

/// REST request failures (the "network" class of errors)
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, ...)
    #[error("Request to {url} failed: {source}")]
    Network {
        /// Requested URL
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The body was not the JSON shape the endpoint promises
    #[error("Unexpected response body from {url}: {reason}")]
    Decode {
        /// Requested URL
        url: String,
        /// Decoder message
        reason: String,
    },
}

impl ApiError {
    /// Whether the failure happened before any response arrived
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Input rejected locally before any network call is issued
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Chat message text is empty after trimming
    #[error("Message text is empty")]
    EmptyMessage,

    /// Hotline submission has no caller name
    #[error("Please enter your name")]
    MissingName,

    /// Display name is empty after trimming
    #[error("Display name cannot be empty")]
    EmptyDisplayName,
}

/// Audio resource failures
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Track has no usable audio URL
    #[error("Invalid audio URL for track {track_id}")]
    InvalidSource {
        /// Podcast identifier
        track_id: u64,
    },

    /// The audio backend could not load or decode the source
    #[error("Failed to load {url}: {reason}")]
    LoadFailed {
        /// Resolved audio URL
        url: String,
        /// Backend message
        reason: String,
    },

    /// A transport control needs a loaded track
    #[error("No track is loaded")]
    NothingLoaded,

    /// The resource refused a seek
    #[error("Seek failed: {0}")]
    SeekFailed(String),
}

/// Device permission refused by the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// Microphone access denied (hotline recording)
    #[error("Microphone permission denied")]
    Microphone,

    /// Notification access denied (breaking news alerts)
    #[error("Notification permission denied")]
    Notifications,
}

/// Any error the client core can report
#[derive(Debug, Error)]
pub enum ClientError {
    /// REST failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local validation failure
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Playback failure
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Permission refused
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Chat send failure
    #[error(transparent)]
    Send(#[from] SendError),

    /// Realtime store or blob storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Voice recorder failure
    #[error(transparent)]
    Recorder(#[from] RecorderError),

    /// Profile persistence failure
    #[error(transparent)]
    Profile(#[from] ProfileError),
}
