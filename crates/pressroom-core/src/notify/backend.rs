use super::tones::ScheduledTone;
use crate::error::AudioError;

/// Audio output used by the notification dispatcher.
///
/// Two capabilities: playing pre-rendered clips (asynchronous load and
/// playback) and synthesising single tones (scheduled synchronously at an
/// offset). Either may be missing, in which case the methods return
/// `AudioError::Unavailable`.
#[allow(async_fn_in_trait)]
pub trait AudioBackend {
    /// Handle to a loaded clip, kept by the dispatcher for every replay.
    type Clip;

    async fn load_clip(&self, file_name: &str) -> Result<Self::Clip, AudioError>;

    /// Resolves once the clip can play through. Backends that load eagerly
    /// keep the default.
    async fn wait_ready(&self, _clip: &Self::Clip) -> Result<(), AudioError> {
        Ok(())
    }

    async fn play_clip(&self, clip: &Self::Clip, volume: f32) -> Result<(), AudioError>;

    /// Wake a suspended output before synthesising.
    fn resume(&self) -> Result<(), AudioError> {
        Ok(())
    }

    fn play_tone(&self, tone: &ScheduledTone) -> Result<(), AudioError>;
}

/// Backend for environments with no audio output at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudio;

impl AudioBackend for NoAudio {
    type Clip = ();

    async fn load_clip(&self, _file_name: &str) -> Result<(), AudioError> {
        Err(AudioError::Unavailable("no audio output".into()))
    }

    async fn play_clip(&self, _clip: &(), _volume: f32) -> Result<(), AudioError> {
        Err(AudioError::Unavailable("no audio output".into()))
    }

    fn play_tone(&self, _tone: &ScheduledTone) -> Result<(), AudioError> {
        Err(AudioError::Unavailable("no audio output".into()))
    }
}
