use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::SettingsError;

/// Longest allowed stage duration, in seconds (30 minutes).
pub const MAX_STAGE_SECS: u32 = 1800;

pub const DEFAULT_STEEP_SECS: u32 = 240;
pub const DEFAULT_BREW_SECS: u32 = 480;
pub const DEFAULT_AUDIO_VOLUME: f32 = 0.5;

/// User-facing brew settings.
///
/// Persisted as one flat camelCase JSON record. Each field falls back to its
/// default independently when missing from the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    #[serde(default = "default_steep_seconds")]
    pub steep_seconds: u32,
    #[serde(default = "default_brew_seconds")]
    pub brew_seconds: u32,
    #[serde(default = "default_true")]
    pub audio_enabled: bool,
    #[serde(default = "default_audio_volume")]
    pub audio_volume: f32,
}

fn default_steep_seconds() -> u32 {
    DEFAULT_STEEP_SECS
}
fn default_brew_seconds() -> u32 {
    DEFAULT_BREW_SECS
}
fn default_true() -> bool {
    true
}
fn default_audio_volume() -> f32 {
    DEFAULT_AUDIO_VOLUME
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            steep_seconds: DEFAULT_STEEP_SECS,
            brew_seconds: DEFAULT_BREW_SECS,
            audio_enabled: true,
            audio_volume: DEFAULT_AUDIO_VOLUME,
        }
    }
}

impl TimerSettings {
    /// Rebuild settings from a stored JSON record, one field at a time.
    ///
    /// Missing fields take their default. A field of the wrong type or out of
    /// range also takes its default, with a warning, and leaves the other
    /// fields alone. The volume is clamped.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            steep_seconds: stored_field(record, "steepSeconds", DEFAULT_STEEP_SECS, stage_secs),
            brew_seconds: stored_field(record, "brewSeconds", DEFAULT_BREW_SECS, stage_secs),
            audio_enabled: stored_field(record, "audioEnabled", true, Value::as_bool),
            audio_volume: stored_field(record, "audioVolume", DEFAULT_AUDIO_VOLUME, |v| {
                v.as_f64().map(|v| v as f32).filter(|v| v.is_finite()).map(clamp_volume)
            }),
        }
    }

    /// Audio preferences as consumed by the notification dispatcher.
    pub fn audio(&self) -> AudioPreferences {
        AudioPreferences {
            enabled: self.audio_enabled,
            volume: Some(self.audio_volume),
        }
    }
}

/// Audio enable flag and volume handed along with each notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioPreferences {
    pub enabled: bool,
    /// `None` means "not configured"; the tone layer then uses 0.5.
    pub volume: Option<f32>,
}

impl Default for AudioPreferences {
    fn default() -> Self {
        TimerSettings::default().audio()
    }
}

/// A settings change as typed by the user, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsProposal {
    /// Whole seconds or `M:SS`, as text.
    pub steep_seconds: String,
    /// Whole seconds or `M:SS`, as text.
    pub brew_seconds: String,
    pub audio_enabled: bool,
    pub audio_volume: f32,
}

impl SettingsProposal {
    pub fn new(
        steep_seconds: impl Into<String>,
        brew_seconds: impl Into<String>,
        audio_enabled: bool,
        audio_volume: f32,
    ) -> Self {
        Self {
            steep_seconds: steep_seconds.into(),
            brew_seconds: brew_seconds.into(),
            audio_enabled,
            audio_volume,
        }
    }

    /// Proposal that keeps everything in `current` as it is.
    pub fn from_current(current: &TimerSettings) -> Self {
        Self::new(
            current.steep_seconds.to_string(),
            current.brew_seconds.to_string(),
            current.audio_enabled,
            current.audio_volume,
        )
    }

    /// Validate into concrete settings.
    ///
    /// Both durations must parse and lie in (0, 1800]. Any violation rejects
    /// the whole proposal. The volume is clamped, never rejected.
    pub fn validate(&self) -> Result<TimerSettings, SettingsError> {
        let steep = parse_seconds(&self.steep_seconds);
        let brew = parse_seconds(&self.brew_seconds);
        match (steep, brew) {
            (Some(steep), Some(brew)) if in_stage_range(steep) && in_stage_range(brew) => {
                Ok(TimerSettings {
                    steep_seconds: steep as u32,
                    brew_seconds: brew as u32,
                    audio_enabled: self.audio_enabled,
                    audio_volume: clamp_volume(self.audio_volume),
                })
            }
            _ => Err(SettingsError::Invalid),
        }
    }
}

/// `"270"` and `"4:30"` both give 270. Seconds after a colon must be below 60.
fn parse_seconds(input: &str) -> Option<i64> {
    let input = input.trim();
    match input.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes = minutes.trim().parse::<i64>().ok()?;
            let seconds = seconds.trim().parse::<i64>().ok()?;
            if minutes < 0 || !(0..60).contains(&seconds) {
                return None;
            }
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        None => input.parse::<i64>().ok(),
    }
}

fn stored_field<T>(
    record: &Map<String, Value>,
    key: &str,
    default: T,
    read: impl FnOnce(&Value) -> Option<T>,
) -> T {
    let Some(value) = record.get(key) else {
        return default;
    };
    read(value).unwrap_or_else(|| {
        warn!(field = key, value = %value, "ignoring invalid stored setting");
        default
    })
}

fn stage_secs(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .and_then(|secs| u32::try_from(secs).ok())
        .filter(|&secs| in_stage_range(secs as i64))
}

fn in_stage_range(secs: i64) -> bool {
    secs > 0 && secs <= MAX_STAGE_SECS as i64
}

/// Clamp to [0, 1]; non-finite input falls back to the default volume.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        DEFAULT_AUDIO_VOLUME
    }
}
