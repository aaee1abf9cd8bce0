//! Playback State
//!
//! The state projection every screen reads. Only the controller writes it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::Podcast;

/// Playback state machine
///
/// ```text
///            play(new)              ready
///   Idle ─────────────► Loading ───────────► Playing ◄──┐
///    ▲                     │ load failed       │  ▲      │ data arrives
///    │◄────────────────────┘            pause  ▼  │ play │
///    │                                     Paused │   Buffering
///    │◄──── close / interrupt ─────────────────────┴──────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded
    #[default]
    Idle,
    /// A new track is being loaded
    Loading,
    /// Audio is playing
    Playing,
    /// Paused by the user or at the end of the track
    Paused,
    /// Stalled waiting for data
    Buffering,
}

/// The playable part of a podcast episode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Podcast id
    pub id: u64,
    /// Episode title
    pub title: String,
    /// Host name
    pub host: String,
    /// Audio URL, absolute or relative to the API base
    pub audio_url: String,
    /// Artwork URL, absolute or relative to the API base
    pub image_url: Option<String>,
}

impl From<&Podcast> for Track {
    fn from(podcast: &Podcast) -> Self {
        Self {
            id: podcast.id,
            title: podcast.title.clone(),
            host: podcast.host.clone(),
            audio_url: podcast.audio_url.clone(),
            image_url: podcast.image_url.clone(),
        }
    }
}

/// The single playback session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSession {
    /// Current track; `None` means idle
    pub track: Option<Track>,
    /// State machine position
    pub state: PlaybackState,
    /// Current position
    pub position: Duration,
    /// Total duration, zero while unknown
    pub duration: Duration,
}

impl PlaybackSession {
    pub(crate) fn loading(track: Track) -> Self {
        Self {
            track: Some(track),
            state: PlaybackState::Loading,
            position: Duration::ZERO,
            duration: Duration::ZERO,
        }
    }

    /// Whether audio is playing
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Whether playback is stalled
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        self.state == PlaybackState::Buffering
    }

    /// Whether nothing is loaded
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == PlaybackState::Idle
    }

    /// Id of the current track
    #[must_use]
    pub fn track_id(&self) -> Option<u64> {
        self.track.as_ref().map(|t| t.id)
    }

    /// Progress in `0.0..=1.0`, zero while the duration is unknown
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_is_idle() {
        let session = PlaybackSession::default();
        assert!(session.is_idle());
        assert!(session.track.is_none());
        assert!(!session.is_playing());
    }

    #[test]
    fn test_progress() {
        let session = PlaybackSession {
            position: Duration::from_secs(30),
            duration: Duration::from_secs(120),
            ..Default::default()
        };
        assert!((session.progress() - 0.25).abs() < f64::EPSILON);

        let unknown = PlaybackSession {
            position: Duration::from_secs(30),
            ..Default::default()
        };
        assert!(unknown.progress().abs() < f64::EPSILON);
    }
}
