//! Completion notifications: audio with fallback, plus a visual flash.
//!
//! The stage machine only files `NotificationRequest`s through a `Notifier`.
//! Something else (the session runtime, or a test) decides when to hand them
//! to the `NotificationDispatcher`, which owns all of the audio policy.

mod backend;
mod dispatcher;
mod tones;
mod visual;

pub use backend::{AudioBackend, NoAudio};
pub use dispatcher::{AudioOutcome, NotificationDispatcher, DEFAULT_READINESS_TIMEOUT};
pub use tones::{Envelope, ScheduledTone, ToneSequence, TONE_ATTACK};
pub use visual::{flash_color, FlashPlan, VisualAlert, DEFAULT_FLASH_HOLD};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::settings::AudioPreferences;

/// Which stage transition an alert is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SteepingComplete,
    StirReminder,
    BrewingComplete,
    Default,
}

impl NotificationKind {
    /// Parse a tag, mapping anything unrecognised to `Default`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "steeping_complete" => Self::SteepingComplete,
            "stir_reminder" => Self::StirReminder,
            "brewing_complete" => Self::BrewingComplete,
            _ => Self::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SteepingComplete => "steeping_complete",
            Self::StirReminder => "stir_reminder",
            Self::BrewingComplete => "brewing_complete",
            Self::Default => "default",
        }
    }

    /// File name of the pre-rendered clip for this kind.
    pub fn clip_file(self) -> &'static str {
        match self {
            Self::SteepingComplete => "steeping-complete.wav",
            Self::StirReminder => "stir-reminder.wav",
            Self::BrewingComplete => "brewing-complete.wav",
            Self::Default => "default-notification.wav",
        }
    }

    /// Important alerts flash twice.
    pub fn is_important(self) -> bool {
        matches!(self, Self::StirReminder | Self::BrewingComplete)
    }

    pub const ALL: [NotificationKind; 4] = [
        Self::SteepingComplete,
        Self::StirReminder,
        Self::BrewingComplete,
        Self::Default,
    ];
}

/// A notification the stage machine wants delivered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub kind: NotificationKind,
    /// How long to wait before dispatching. Zero for immediate.
    pub delay: Duration,
    /// Audio preferences at the time the request was filed.
    pub audio: AudioPreferences,
}

/// Receives notification requests from the stage machine.
///
/// Implementations must not block; delivery happens elsewhere.
pub trait Notifier {
    fn notify(&mut self, request: NotificationRequest);
}

/// Collects requests in order. Handy for headless use and tests.
impl Notifier for Vec<NotificationRequest> {
    fn notify(&mut self, request: NotificationRequest) {
        self.push(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tags_map_to_default() {
        assert_eq!(NotificationKind::from_tag("stir_reminder"), NotificationKind::StirReminder);
        assert_eq!(NotificationKind::from_tag("unknown_type"), NotificationKind::Default);
        assert_eq!(NotificationKind::from_tag(""), NotificationKind::Default);
    }

    #[test]
    fn tags_roundtrip_through_as_str() {
        for kind in NotificationKind::ALL {
            assert_eq!(NotificationKind::from_tag(kind.as_str()), kind);
        }
    }

    #[test]
    fn clip_files_are_distinct() {
        let mut files: Vec<_> = NotificationKind::ALL.iter().map(|k| k.clip_file()).collect();
        files.sort_unstable();
        files.dedup();
        assert_eq!(files.len(), 4);
    }
}
