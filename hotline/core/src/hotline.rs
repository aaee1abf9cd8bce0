//! Hotline Voice Messages
//!
//! Record a short voice message, preview it, then send it with a caller name.
//!
//! ```text
//!          start              stop
//!   Idle ─────────► Recording ─────► Recorded(path)
//!    ▲                                   │
//!    └──────────── discard / sent ───────┘
//! ```
//!
//! A recorded take can be previewed through the same [`AudioBackend`] the
//! podcast player uses. The preview resource belongs to the recorder and is
//! released when the preview stops, plays to the end, or the take goes away.
//!
//! Submitting uploads the file through a [`BlobStore`] and posts the
//! resulting URL to the content API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::{ContentApi, HotlineEntry, HotlineSubmission};
use crate::chat::StoreError;
use crate::error::{ClientError, PermissionError, PlaybackError, ValidationError};
use crate::player::{AudioBackend, AudioResource};

/// Recorder failures
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecorderError {
    /// Microphone access refused
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// `stop` without a recording in progress
    #[error("Not recording")]
    NotRecording,

    /// The platform recorder failed
    #[error("Recorder failed: {0}")]
    Device(String),

    /// The take could not be played back
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Platform microphone
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Ask for (or confirm) microphone access
    async fn request_permission(&self) -> bool;

    /// Begin capturing
    async fn start(&mut self) -> Result<(), RecorderError>;

    /// Finish capturing and return the recorded file
    async fn stop(&mut self) -> Result<PathBuf, RecorderError>;
}

/// Blob storage for recordings
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a file and return its public URL
    async fn upload(&self, path: &Path) -> Result<String, StoreError>;
}

/// Recorder state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RecorderState {
    /// Nothing captured
    #[default]
    Idle,
    /// Capturing
    Recording,
    /// A take is ready to preview or send
    Recorded(PathBuf),
}

/// Voice message recorder
pub struct HotlineRecorder<M: Microphone> {
    microphone: M,
    state: RecorderState,
    preview: Option<Box<dyn AudioResource>>,
}

impl<M: Microphone> HotlineRecorder<M> {
    /// Recorder over a platform microphone
    pub fn new(microphone: M) -> Self {
        Self {
            microphone,
            state: RecorderState::Idle,
            preview: None,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    /// The recorded take, if any
    #[must_use]
    pub fn recording(&self) -> Option<&Path> {
        match &self.state {
            RecorderState::Recorded(path) => Some(path),
            _ => None,
        }
    }

    /// Start a new take, replacing any previous one
    ///
    /// Starting while already recording is a no-op.
    pub async fn start(&mut self) -> Result<(), RecorderError> {
        if self.state == RecorderState::Recording {
            return Ok(());
        }

        self.stop_preview();
        if !self.microphone.request_permission().await {
            tracing::warn!("Microphone permission denied");
            return Err(PermissionError::Microphone.into());
        }

        self.microphone.start().await?;
        self.state = RecorderState::Recording;
        tracing::info!("Recording started");
        Ok(())
    }

    /// Stop the current take
    pub async fn stop(&mut self) -> Result<PathBuf, RecorderError> {
        if self.state != RecorderState::Recording {
            return Err(RecorderError::NotRecording);
        }

        match self.microphone.stop().await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Recording stopped");
                self.state = RecorderState::Recorded(path.clone());
                Ok(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to stop recording");
                self.state = RecorderState::Idle;
                Err(e)
            }
        }
    }

    /// Drop the recorded take, stopping any preview
    pub fn discard(&mut self) {
        self.stop_preview();
        if let RecorderState::Recorded(path) = &self.state {
            tracing::debug!(path = %path.display(), "Recording discarded");
        }
        self.state = RecorderState::Idle;
    }

    /// Play the recorded take from the start
    ///
    /// A preview already running is released first.
    ///
    /// # Errors
    ///
    /// - [`RecorderError::NotRecording`] if there is no take
    /// - [`RecorderError::Playback`] if the backend cannot load it
    pub async fn preview<B: AudioBackend>(&mut self, backend: &B) -> Result<(), RecorderError> {
        let Some(path) = self.recording() else {
            return Err(RecorderError::NotRecording);
        };
        let url = format!("file://{}", path.display());

        self.stop_preview();
        let mut resource = backend.load(&url).await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to load recording preview");
            e
        })?;
        resource.play();
        self.preview = Some(resource);
        tracing::debug!(url = %url, "Previewing recording");
        Ok(())
    }

    /// Stop the preview and free its resource
    pub fn stop_preview(&mut self) {
        if let Some(mut resource) = self.preview.take() {
            resource.pause();
            resource.release();
            tracing::debug!("Recording preview stopped");
        }
    }

    /// Whether the preview is still playing
    ///
    /// Once the take has played to the end the preview is released, so the
    /// next [`preview`](Self::preview) starts over.
    pub fn poll_preview(&mut self) -> bool {
        let finished = match &self.preview {
            Some(resource) => resource.status().finished,
            None => return false,
        };
        if finished {
            tracing::debug!("Recording preview finished");
            self.stop_preview();
        }
        !finished
    }
}

impl<M: Microphone> Drop for HotlineRecorder<M> {
    fn drop(&mut self) {
        self.stop_preview();
    }
}

/// Sends recordings to the hotline
pub struct HotlineService<A: ContentApi, B: BlobStore> {
    api: Arc<A>,
    blobs: Arc<B>,
}

impl<A: ContentApi, B: BlobStore> HotlineService<A, B> {
    /// Service over the content API and blob storage
    pub fn new(api: Arc<A>, blobs: Arc<B>) -> Self {
        Self { api, blobs }
    }

    /// Upload `recording` and post it under `name`
    ///
    /// A blank name fails before anything is uploaded.
    pub async fn submit(
        &self,
        recording: &Path,
        name: &str,
    ) -> Result<HotlineSubmission, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }

        let audio_url = self.blobs.upload(recording).await.map_err(|e| {
            tracing::error!(error = %e, path = %recording.display(), "Recording upload failed");
            e
        })?;

        let submission = HotlineSubmission {
            name: name.to_string(),
            audio_url,
        };
        self.api.submit_hotline(&submission).await?;

        tracing::info!(audio_url = %submission.audio_url, "Hotline message sent");
        Ok(submission)
    }

    /// Submit the recorder's take and reset it on success
    pub async fn submit_take<M: Microphone>(
        &self,
        recorder: &mut HotlineRecorder<M>,
        name: &str,
    ) -> Result<HotlineSubmission, ClientError> {
        let Some(path) = recorder.recording().map(Path::to_path_buf) else {
            return Err(RecorderError::NotRecording.into());
        };
        let submission = self.submit(&path, name).await?;
        recorder.discard();
        Ok(submission)
    }

    /// Previously sent messages
    pub async fn history(&self) -> Result<Vec<HotlineEntry>, ClientError> {
        Ok(self.api.hotline_history().await?)
    }
}
