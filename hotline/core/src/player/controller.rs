//! Playback Controller
//!
//! Owns the one audio session of the app. Every screen (podcast list, detail
//! page, mini player) reads the same [`PlaybackSession`] through
//! [`PlaybackController::subscribe`]; all mutation goes through the methods
//! below, so there is exactly one writer.
//!
//! At most one [`AudioResource`] is alive at any time: a new track releases
//! the old resource before the new one is loaded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::engine::{AudioBackend, AudioResource, AudioSessionOptions, NowPlaying};
use super::state::{PlaybackSession, PlaybackState, Track};
use crate::api::{resolve_media_url, PlayCountSink};
use crate::config::ClientConfig;
use crate::error::PlaybackError;

/// Controller settings
#[derive(Clone, Debug)]
pub struct PlayerSettings {
    /// Base for relative audio/artwork URLs
    pub api_base_url: String,
    /// Skip forward/backward step
    pub skip_interval: Duration,
    /// Album title for now-playing metadata
    pub now_playing_album: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl PlayerSettings {
    /// Take the player settings out of the client configuration
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            skip_interval: config.skip_interval,
            now_playing_album: config.now_playing_album.clone(),
        }
    }
}

/// The app-wide podcast player
pub struct PlaybackController<B: AudioBackend, C: PlayCountSink> {
    backend: Arc<B>,
    play_counts: Arc<C>,
    settings: PlayerSettings,
    resource: Option<Box<dyn AudioResource>>,
    session: PlaybackSession,
    tx: watch::Sender<PlaybackSession>,
}

impl<B: AudioBackend, C: PlayCountSink> PlaybackController<B, C> {
    /// Create an idle controller
    pub fn new(backend: B, play_counts: Arc<C>, settings: PlayerSettings) -> Self {
        let (tx, _rx) = watch::channel(PlaybackSession::default());
        Self {
            backend: Arc::new(backend),
            play_counts,
            settings,
            resource: None,
            session: PlaybackSession::default(),
            tx,
        }
    }

    /// Configure the audio session; failure is logged, not fatal
    pub async fn start(&self) {
        if let Err(e) = self
            .backend
            .configure_session(&AudioSessionOptions::default())
            .await
        {
            tracing::error!(error = %e, "Audio mode setup failed");
        }
    }

    /// Watch the session; every screen reads through this
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSession> {
        self.tx.subscribe()
    }

    /// Current session
    #[must_use]
    pub fn snapshot(&self) -> PlaybackSession {
        self.session.clone()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.session.state
    }

    /// Play a track
    ///
    /// The current track toggles between playing and paused. Any other track
    /// replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError`] if the new track cannot be loaded; the
    /// controller is then idle.
    pub async fn play(&mut self, track: Track) -> Result<(), PlaybackError> {
        if self.session.track_id() == Some(track.id) {
            self.toggle_play_pause();
            return Ok(());
        }

        self.release_resource();
        self.session = PlaybackSession::loading(track.clone());
        self.publish();

        let mut resource = match self.load(&track).await {
            Ok(resource) => resource,
            Err(e) => {
                tracing::error!(track_id = track.id, error = %e, "Error playing podcast");
                self.session = PlaybackSession::default();
                self.publish();
                return Err(e);
            }
        };

        resource.play();
        if let Err(e) = resource.set_now_playing(&self.now_playing(&track)) {
            tracing::warn!(error = %e, "Failed to set lock screen metadata");
        }
        let status = resource.status();
        self.resource = Some(resource);

        self.session.state = PlaybackState::Playing;
        self.session.duration = status.duration;
        self.publish();
        tracing::info!(track_id = track.id, title = %track.title, "Playing podcast");

        self.record_play(track.id);
        Ok(())
    }

    /// Pause when playing, resume when paused or buffering
    ///
    /// No-op while idle or loading.
    pub fn toggle_play_pause(&mut self) {
        let Some(resource) = self.resource.as_mut() else {
            return;
        };

        match self.session.state {
            PlaybackState::Playing => {
                resource.pause();
                self.session.state = PlaybackState::Paused;
            }
            PlaybackState::Paused | PlaybackState::Buffering => {
                resource.play();
                self.session.state = PlaybackState::Playing;
            }
            PlaybackState::Idle | PlaybackState::Loading => return,
        }
        self.publish();
    }

    /// Seek to an absolute position
    ///
    /// Out-of-range positions are left to the resource to clamp; the session
    /// reports where the resource actually landed.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::NothingLoaded`] while idle, or the resource's error.
    pub async fn seek_to(&mut self, position: Duration) -> Result<(), PlaybackError> {
        let resource = self.resource.as_mut().ok_or(PlaybackError::NothingLoaded)?;
        resource.seek(position).await?;
        self.session.position = resource.status().position;
        self.publish();
        Ok(())
    }

    /// Jump forward by the skip interval, never past the end
    ///
    /// With an unknown duration this seeks to the current position.
    ///
    /// # Errors
    ///
    /// Same as [`seek_to`](Self::seek_to).
    pub async fn skip_forward(&mut self) -> Result<(), PlaybackError> {
        let PlaybackSession {
            position, duration, ..
        } = self.session;
        let target = if duration.is_zero() {
            position
        } else {
            (position + self.settings.skip_interval).min(duration)
        };
        tracing::debug!(?position, ?duration, ?target, "Skipping forward");
        self.seek_to(target).await
    }

    /// Jump back by the skip interval, never before zero
    ///
    /// # Errors
    ///
    /// Same as [`seek_to`](Self::seek_to).
    pub async fn skip_backward(&mut self) -> Result<(), PlaybackError> {
        let PlaybackSession {
            position, duration, ..
        } = self.session;
        let mut target = position.saturating_sub(self.settings.skip_interval);
        if !duration.is_zero() {
            target = target.min(duration);
        }
        self.seek_to(target).await
    }

    /// Pull position, duration and buffering from the resource
    pub fn refresh(&mut self) {
        let Some(resource) = self.resource.as_ref() else {
            return;
        };
        let status = resource.status();
        let before = self.session.clone();

        self.session.position = status.position;
        self.session.duration = status.duration;

        let current = self.session.state;
        self.session.state = match current {
            PlaybackState::Playing | PlaybackState::Buffering if status.finished => {
                self.session.position = status.duration;
                PlaybackState::Paused
            }
            PlaybackState::Playing if status.buffering => PlaybackState::Buffering,
            PlaybackState::Buffering if !status.buffering => PlaybackState::Playing,
            state => state,
        };

        if self.session != before {
            self.publish();
        }
    }

    /// Stop playback, release the resource and clear the track
    pub fn close_player(&mut self) {
        if self.session.is_idle() && self.resource.is_none() {
            return;
        }
        self.release_resource();
        self.session = PlaybackSession::default();
        self.publish();
        tracing::debug!("Player closed");
    }

    /// Forced stop from another flow, e.g. hotline recording
    pub fn interrupt(&mut self, reason: &str) {
        if let Some(track_id) = self.session.track_id() {
            tracing::info!(track_id, reason, "Playback interrupted");
        }
        self.close_player();
    }

    async fn load(&self, track: &Track) -> Result<Box<dyn AudioResource>, PlaybackError> {
        let url = resolve_media_url(&self.settings.api_base_url, Some(&track.audio_url))
            .ok_or(PlaybackError::InvalidSource { track_id: track.id })?;
        self.backend.load(&url).await
    }

    fn now_playing(&self, track: &Track) -> NowPlaying {
        NowPlaying {
            title: track.title.clone(),
            artist: track.host.clone(),
            artwork_url: resolve_media_url(&self.settings.api_base_url, track.image_url.as_deref()),
            album: self.settings.now_playing_album.clone(),
        }
    }

    fn record_play(&self, track_id: u64) {
        let sink = Arc::clone(&self.play_counts);
        tokio::spawn(async move {
            if let Err(e) = sink.record_play(track_id).await {
                tracing::warn!(track_id, error = %e, "Failed to track play");
            }
        });
    }

    fn release_resource(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.release();
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.session.clone());
    }
}

impl<B: AudioBackend, C: PlayCountSink> Drop for PlaybackController<B, C> {
    fn drop(&mut self) {
        self.release_resource();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::player::engine::ResourceStatus;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct EngineLog {
        loads: Vec<String>,
        releases: Vec<String>,
        seeks: Vec<Duration>,
        status: ResourceStatus,
        fail_urls: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct FakeBackend {
        log: Arc<Mutex<EngineLog>>,
    }

    struct FakeResource {
        url: String,
        log: Arc<Mutex<EngineLog>>,
    }

    #[async_trait]
    impl AudioBackend for FakeBackend {
        async fn configure_session(&self, _: &AudioSessionOptions) -> Result<(), PlaybackError> {
            Ok(())
        }

        async fn load(&self, url: &str) -> Result<Box<dyn AudioResource>, PlaybackError> {
            let mut log = self.log.lock();
            if log.fail_urls.iter().any(|u| u == url) {
                return Err(PlaybackError::LoadFailed {
                    url: url.to_string(),
                    reason: "decode error".to_string(),
                });
            }
            log.loads.push(url.to_string());
            Ok(Box::new(FakeResource {
                url: url.to_string(),
                log: Arc::clone(&self.log),
            }))
        }
    }

    #[async_trait]
    impl AudioResource for FakeResource {
        fn play(&mut self) {
            self.log.lock().status.playing = true;
        }

        fn pause(&mut self) {
            self.log.lock().status.playing = false;
        }

        async fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
            let mut log = self.log.lock();
            log.seeks.push(position);
            let duration = log.status.duration;
            log.status.position = if duration.is_zero() {
                position
            } else {
                position.min(duration)
            };
            Ok(())
        }

        fn status(&self) -> ResourceStatus {
            self.log.lock().status
        }

        fn set_now_playing(&mut self, _: &NowPlaying) -> Result<(), PlaybackError> {
            Ok(())
        }

        fn release(&mut self) {
            self.log.lock().releases.push(self.url.clone());
        }
    }

    struct ChannelSink(mpsc::UnboundedSender<u64>);

    #[async_trait]
    impl PlayCountSink for ChannelSink {
        async fn record_play(&self, podcast_id: u64) -> Result<(), ApiError> {
            let _ = self.0.send(podcast_id);
            Ok(())
        }
    }

    fn track(id: u64) -> Track {
        Track {
            id,
            title: format!("Episode {id}"),
            host: "Hal".to_string(),
            audio_url: format!("/audio/{id}.mp3"),
            image_url: None,
        }
    }

    fn controller() -> (
        PlaybackController<FakeBackend, ChannelSink>,
        Arc<Mutex<EngineLog>>,
        mpsc::UnboundedReceiver<u64>,
    ) {
        let backend = FakeBackend::default();
        let log = Arc::clone(&backend.log);
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = PlayerSettings {
            api_base_url: "http://localhost:3000/api".to_string(),
            ..PlayerSettings::default()
        };
        (
            PlaybackController::new(backend, Arc::new(ChannelSink(tx)), settings),
            log,
            rx,
        )
    }

    #[tokio::test]
    async fn test_play_loads_and_plays() {
        let (mut player, log, mut plays) = controller();

        player.play(track(1)).await.unwrap();

        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.snapshot().track_id(), Some(1));
        assert_eq!(
            log.lock().loads,
            vec!["http://localhost:3000/api/audio/1.mp3".to_string()]
        );
        assert_eq!(plays.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_same_track_toggles_without_reload() {
        let (mut player, log, _plays) = controller();

        player.play(track(1)).await.unwrap();
        player.play(track(1)).await.unwrap();
        assert_eq!(player.state(), PlaybackState::Paused);

        player.play(track(1)).await.unwrap();
        assert_eq!(player.state(), PlaybackState::Playing);

        let log = log.lock();
        assert_eq!(log.loads.len(), 1);
        assert!(log.releases.is_empty());
    }

    #[tokio::test]
    async fn test_new_track_releases_old_resource_once() {
        let (mut player, log, mut plays) = controller();

        player.play(track(1)).await.unwrap();
        player.play(track(2)).await.unwrap();

        {
            let log = log.lock();
            assert_eq!(log.loads.len(), 2);
            assert!(log.loads[1].ends_with("/audio/2.mp3"));
            assert_eq!(log.releases.len(), 1);
            assert!(log.releases[0].ends_with("/audio/1.mp3"));
        }
        assert_eq!(plays.recv().await, Some(1));
        assert_eq!(plays.recv().await, Some(2));
    }

    #[tokio::test]
    async fn test_failed_load_falls_back_to_idle() {
        let (mut player, log, mut plays) = controller();
        player.play(track(1)).await.unwrap();
        log.lock()
            .fail_urls
            .push("http://localhost:3000/api/audio/2.mp3".to_string());

        let result = player.play(track(2)).await;

        assert!(matches!(result, Err(PlaybackError::LoadFailed { .. })));
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(player.snapshot().track.is_none());
        // Old resource was released before the failed load
        assert_eq!(log.lock().releases.len(), 1);
        // Only the successful replacement counted a play
        assert_eq!(plays.recv().await, Some(1));
        assert!(plays.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_audio_url_is_invalid_source() {
        let (mut player, log, _plays) = controller();
        let mut bad = track(9);
        bad.audio_url = String::new();

        let result = player.play(bad).await;
        assert_eq!(result, Err(PlaybackError::InvalidSource { track_id: 9 }));
        assert!(player.snapshot().is_idle());
        assert!(log.lock().loads.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_is_noop_when_idle() {
        let (mut player, _log, _plays) = controller();
        let rx = player.subscribe();

        player.toggle_play_pause();

        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_seek_requires_loaded_track() {
        let (mut player, _log, _plays) = controller();
        assert_eq!(
            player.seek_to(Duration::from_secs(5)).await,
            Err(PlaybackError::NothingLoaded)
        );
    }

    #[tokio::test]
    async fn test_seek_past_end_reports_clamped_position() {
        let (mut player, log, _plays) = controller();
        log.lock().status.duration = Duration::from_secs(100);
        player.play(track(1)).await.unwrap();
        let mut rx = player.subscribe();

        player.seek_to(Duration::from_secs(500)).await.unwrap();

        assert_eq!(log.lock().seeks.last(), Some(&Duration::from_secs(500)));
        assert_eq!(player.snapshot().position, Duration::from_secs(100));
        assert_eq!(rx.borrow_and_update().position, Duration::from_secs(100));
    }

    #[tokio::test]
    async fn test_skip_forward_clamps_to_duration() {
        let (mut player, log, _plays) = controller();
        log.lock().status.duration = Duration::from_secs(100);
        player.play(track(1)).await.unwrap();

        player.seek_to(Duration::from_secs(90)).await.unwrap();
        player.skip_forward().await.unwrap();

        assert_eq!(player.snapshot().position, Duration::from_secs(100));
        assert_eq!(log.lock().seeks.last(), Some(&Duration::from_secs(100)));
    }

    #[tokio::test]
    async fn test_skip_forward_with_unknown_duration_stays_put() {
        let (mut player, log, _plays) = controller();
        player.play(track(1)).await.unwrap();
        player.seek_to(Duration::from_secs(42)).await.unwrap();

        player.skip_forward().await.unwrap();

        assert_eq!(player.snapshot().position, Duration::from_secs(42));
        assert_eq!(log.lock().seeks.last(), Some(&Duration::from_secs(42)));
    }

    #[tokio::test]
    async fn test_skip_backward_clamps_to_zero() {
        let (mut player, log, _plays) = controller();
        log.lock().status.duration = Duration::from_secs(100);
        player.play(track(1)).await.unwrap();
        player.seek_to(Duration::from_secs(10)).await.unwrap();

        player.skip_backward().await.unwrap();
        assert_eq!(player.snapshot().position, Duration::ZERO);

        player.seek_to(Duration::from_secs(50)).await.unwrap();
        player.skip_backward().await.unwrap();
        assert_eq!(player.snapshot().position, Duration::from_secs(35));
    }

    #[tokio::test]
    async fn test_refresh_tracks_buffering_and_end() {
        let (mut player, log, _plays) = controller();
        player.play(track(1)).await.unwrap();

        log.lock().status.buffering = true;
        player.refresh();
        assert_eq!(player.state(), PlaybackState::Buffering);

        log.lock().status.buffering = false;
        player.refresh();
        assert_eq!(player.state(), PlaybackState::Playing);

        {
            let mut log = log.lock();
            log.status.duration = Duration::from_secs(60);
            log.status.finished = true;
        }
        player.refresh();
        assert_eq!(player.state(), PlaybackState::Paused);
        assert_eq!(player.snapshot().position, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_buffering_toggles_to_playing() {
        let (mut player, log, _plays) = controller();
        player.play(track(1)).await.unwrap();
        log.lock().status.buffering = true;
        player.refresh();

        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_close_player_releases_and_clears() {
        let (mut player, log, _plays) = controller();
        let rx = player.subscribe();
        player.play(track(1)).await.unwrap();

        player.close_player();

        assert!(rx.borrow().is_idle());
        assert!(rx.borrow().track.is_none());
        assert_eq!(log.lock().releases.len(), 1);
        assert_eq!(
            player.seek_to(Duration::from_secs(1)).await,
            Err(PlaybackError::NothingLoaded)
        );
    }

    #[tokio::test]
    async fn test_interrupt_stops_playback() {
        let (mut player, log, _plays) = controller();
        player.play(track(3)).await.unwrap();

        player.interrupt("hotline recording");

        assert!(player.snapshot().is_idle());
        assert_eq!(log.lock().releases.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_loading_then_playing() {
        let (mut player, _log, _plays) = controller();
        let mut rx = player.subscribe();

        player.play(track(1)).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let session = rx.borrow_and_update().clone();
        assert_eq!(session.state, PlaybackState::Playing);
        assert_eq!(session.track.map(|t| t.title), Some("Episode 1".to_string()));
    }

    #[tokio::test]
    async fn test_drop_releases_resource() {
        let (mut player, log, _plays) = controller();
        player.play(track(1)).await.unwrap();

        drop(player);
        assert_eq!(log.lock().releases.len(), 1);
    }
}
