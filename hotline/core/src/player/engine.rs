//! Audio Engine Traits
//!
//! Platform audio is an external collaborator. The controller talks to it
//! through two seams:
//!
//! - [`AudioBackend`]: process-level audio session setup and resource loading
//! - [`AudioResource`]: one loaded source with transport controls
//!
//! Implementations wrap the platform player (AVPlayer, ExoPlayer, rodio, ...).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PlaybackError;

/// Process-wide audio session options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioSessionOptions {
    /// Keep playing when the ringer switch is on silent
    pub plays_in_silent_mode: bool,
    /// Keep playing when the app is backgrounded
    pub play_in_background: bool,
    /// Whether the session also allows microphone capture
    pub allows_recording: bool,
}

impl Default for AudioSessionOptions {
    fn default() -> Self {
        Self {
            plays_in_silent_mode: true,
            play_in_background: true,
            allows_recording: false,
        }
    }
}

/// Status reported by a loaded resource
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceStatus {
    /// Current position
    pub position: Duration,
    /// Total duration, zero while unknown
    pub duration: Duration,
    /// Whether audio is being produced
    pub playing: bool,
    /// Whether playback is stalled waiting for data
    pub buffering: bool,
    /// Whether the end of the source was reached
    pub finished: bool,
}

/// Lock-screen / control-center metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NowPlaying {
    /// Episode title
    pub title: String,
    /// Podcast host
    pub artist: String,
    /// Artwork URL
    pub artwork_url: Option<String>,
    /// Album title
    pub album: String,
}

/// Audio backend
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Apply session options (called once at startup)
    async fn configure_session(&self, options: &AudioSessionOptions) -> Result<(), PlaybackError>;

    /// Load a source, ready to play
    ///
    /// The returned resource is the only live one; the caller releases the
    /// previous resource before calling this.
    async fn load(&self, url: &str) -> Result<Box<dyn AudioResource>, PlaybackError>;
}

/// A loaded audio source
#[async_trait]
pub trait AudioResource: Send + Sync {
    /// Start or resume
    fn play(&mut self);

    /// Pause, keeping position
    fn pause(&mut self);

    /// Seek; clamping is up to the resource
    async fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;

    /// Current status
    fn status(&self) -> ResourceStatus;

    /// Publish lock-screen metadata
    fn set_now_playing(&mut self, info: &NowPlaying) -> Result<(), PlaybackError>;

    /// Stop and free the underlying platform resource
    fn release(&mut self);
}
