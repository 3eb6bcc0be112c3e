//! Layered notification delivery.
//!
//! The visual flash fires first and never waits on audio. Audio is then
//! tried in order: cached or freshly loaded clip, then the synthesised tone
//! sequence, then nothing. Each layer catches its own failure.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::backend::AudioBackend;
use super::tones::ToneSequence;
use super::visual::{FlashPlan, VisualAlert, DEFAULT_FLASH_HOLD};
use super::NotificationKind;
use crate::error::AudioError;
use crate::settings::{AudioPreferences, DEFAULT_AUDIO_VOLUME};

/// Ceiling on waiting for a freshly loaded clip to become playable.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(2);

/// Which audio layer ended up handling a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioOutcome {
    /// Audio disabled in settings; the backend was not touched.
    Muted,
    Clip,
    Synthesized,
    /// Every layer failed.
    Silent,
}

pub struct NotificationDispatcher<A: AudioBackend, V: VisualAlert> {
    backend: A,
    visual: V,
    /// Loaded clips by kind. Filled on first successful load, never evicted.
    /// Overlapping first notifications share one load.
    clips: HashMap<NotificationKind, OnceCell<A::Clip>>,
    readiness_timeout: Duration,
    flash_hold: Duration,
}

impl<A: AudioBackend, V: VisualAlert> NotificationDispatcher<A, V> {
    pub fn new(backend: A, visual: V) -> Self {
        Self {
            backend,
            visual,
            clips: NotificationKind::ALL.into_iter().map(|kind| (kind, OnceCell::new())).collect(),
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            flash_hold: DEFAULT_FLASH_HOLD,
        }
    }

    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    pub fn with_flash_hold(mut self, hold: Duration) -> Self {
        self.flash_hold = hold;
        self
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }

    pub fn visual(&self) -> &V {
        &self.visual
    }

    pub fn is_cached(&self, kind: NotificationKind) -> bool {
        self.clips.get(&kind).is_some_and(|cell| cell.initialized())
    }

    /// Deliver one notification. Never fails.
    pub async fn notify(&self, kind: NotificationKind, prefs: AudioPreferences) -> AudioOutcome {
        self.visual.flash(&FlashPlan::for_kind(kind, self.flash_hold));
        if !prefs.enabled {
            return AudioOutcome::Muted;
        }
        self.play_audio(kind, prefs.volume).await
    }

    async fn play_audio(&self, kind: NotificationKind, volume: Option<f32>) -> AudioOutcome {
        match self.play_clip(kind, volume).await {
            Ok(()) => return AudioOutcome::Clip,
            Err(e) => debug!(kind = kind.as_str(), error = %e, "clip layer failed, synthesising"),
        }
        match self.play_tones(kind, volume) {
            Ok(()) => AudioOutcome::Synthesized,
            Err(e) => {
                warn!(kind = kind.as_str(), error = %e, "audio notification failed");
                AudioOutcome::Silent
            }
        }
    }

    async fn play_clip(&self, kind: NotificationKind, volume: Option<f32>) -> Result<(), AudioError> {
        let cell = self
            .clips
            .get(&kind)
            .ok_or_else(|| AudioError::Unavailable(format!("no clip slot for {}", kind.as_str())))?;
        let clip = cell.get_or_try_init(|| self.load_clip(kind)).await?;
        self.backend
            .play_clip(clip, volume.unwrap_or(DEFAULT_AUDIO_VOLUME))
            .await
    }

    async fn load_clip(&self, kind: NotificationKind) -> Result<A::Clip, AudioError> {
        let clip = self.backend.load_clip(kind.clip_file()).await?;
        match tokio::time::timeout(self.readiness_timeout, self.backend.wait_ready(&clip)).await {
            Ok(ready) => ready?,
            Err(_) => debug!(
                kind = kind.as_str(),
                timeout_ms = self.readiness_timeout.as_millis() as u64,
                "clip not ready in time, playing anyway"
            ),
        }
        Ok(clip)
    }

    /// Schedule every tone of the sequence. Counts as synthesized when at
    /// least one tone was accepted.
    fn play_tones(&self, kind: NotificationKind, volume: Option<f32>) -> Result<(), AudioError> {
        self.backend.resume()?;
        let mut played = 0;
        let mut last_error = None;
        for tone in ToneSequence::for_kind(kind).schedule(volume) {
            match self.backend.play_tone(&tone) {
                Ok(()) => played += 1,
                Err(e) => {
                    debug!(kind = kind.as_str(), frequency_hz = tone.frequency_hz, error = %e, "tone dropped");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if played == 0 => Err(e),
            _ => Ok(()),
        }
    }
}
