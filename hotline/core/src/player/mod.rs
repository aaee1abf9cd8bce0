//! Podcast Player
//!
//! One global playback state machine shared by every screen.
//!
//! - [`PlaybackController`]: the single writer (play, pause, seek, skip, close)
//! - [`PlaybackSession`]: the state projection screens render
//! - [`AudioBackend`] / [`AudioResource`]: the platform audio seam
//!
//! # Usage
//!
//! ```ignore
//! use hotline_core::player::{PlaybackController, PlayerSettings, Track};
//!
//! let mut player = PlaybackController::new(backend, Arc::new(api), PlayerSettings::default());
//! player.start().await;
//!
//! let mut session = player.subscribe();
//! player.play(Track::from(&podcast)).await?;
//! assert!(session.borrow_and_update().is_playing());
//! ```

mod controller;
mod engine;
mod state;

pub use controller::{PlaybackController, PlayerSettings};
pub use engine::{AudioBackend, AudioResource, AudioSessionOptions, NowPlaying, ResourceStatus};
pub use state::{PlaybackSession, PlaybackState, Track};
