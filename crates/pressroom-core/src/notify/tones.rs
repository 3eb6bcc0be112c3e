use std::time::Duration;

use super::NotificationKind;
use crate::settings::DEFAULT_AUDIO_VOLUME;

/// Ramp-up time at the start of each tone, to avoid clicks.
pub const TONE_ATTACK: Duration = Duration::from_millis(10);

/// Fixed beep pattern for one notification kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSequence {
    pub frequencies_hz: &'static [f32],
    pub durations: &'static [Duration],
    /// Silence between consecutive tones.
    pub gap: Duration,
}

const STEEPING_COMPLETE: ToneSequence = ToneSequence {
    frequencies_hz: &[800.0, 600.0],
    durations: &[Duration::from_millis(300), Duration::from_millis(300)],
    gap: Duration::from_millis(200),
};

const STIR_REMINDER: ToneSequence = ToneSequence {
    frequencies_hz: &[400.0],
    durations: &[Duration::from_millis(500)],
    gap: Duration::ZERO,
};

const BREWING_COMPLETE: ToneSequence = ToneSequence {
    frequencies_hz: &[600.0, 800.0, 1000.0],
    durations: &[
        Duration::from_millis(200),
        Duration::from_millis(200),
        Duration::from_millis(400),
    ],
    gap: Duration::from_millis(150),
};

const DEFAULT_BEEP: ToneSequence = ToneSequence {
    frequencies_hz: &[800.0],
    durations: &[Duration::from_millis(300)],
    gap: Duration::ZERO,
};

/// Gain envelope: linear ramp 0 -> `peak` over `attack`, then linear ramp
/// back to 0 by the end of the tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub peak: f32,
    pub attack: Duration,
}

/// One tone placed on the backend's timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTone {
    pub frequency_hz: f32,
    pub duration: Duration,
    /// Offset from the moment the sequence is scheduled.
    pub start_offset: Duration,
    pub envelope: Envelope,
}

impl ToneSequence {
    pub fn for_kind(kind: NotificationKind) -> &'static ToneSequence {
        match kind {
            NotificationKind::SteepingComplete => &STEEPING_COMPLETE,
            NotificationKind::StirReminder => &STIR_REMINDER,
            NotificationKind::BrewingComplete => &BREWING_COMPLETE,
            NotificationKind::Default => &DEFAULT_BEEP,
        }
    }

    /// Lay the tones out back to back with `gap` after each one.
    ///
    /// A missing volume plays at 0.5; a configured one is used as-is.
    pub fn schedule(&self, volume: Option<f32>) -> Vec<ScheduledTone> {
        let envelope = Envelope {
            peak: volume.unwrap_or(DEFAULT_AUDIO_VOLUME),
            attack: TONE_ATTACK,
        };
        let mut offset = Duration::ZERO;
        self.frequencies_hz
            .iter()
            .zip(self.durations)
            .map(|(&frequency_hz, &duration)| {
                let tone = ScheduledTone {
                    frequency_hz,
                    duration,
                    start_offset: offset,
                    envelope,
                };
                offset += duration + self.gap;
                tone
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steeping_complete_is_two_falling_beeps() {
        let tones = ToneSequence::for_kind(NotificationKind::SteepingComplete).schedule(Some(0.7));
        assert_eq!(tones.len(), 2);
        assert_eq!(tones[0].frequency_hz, 800.0);
        assert_eq!(tones[1].frequency_hz, 600.0);
        assert_eq!(tones[0].start_offset, Duration::ZERO);
        assert_eq!(tones[1].start_offset, Duration::from_millis(500));
        assert!(tones.iter().all(|t| t.envelope.peak == 0.7));
    }

    #[test]
    fn brewing_complete_rises_with_150ms_gaps() {
        let tones = ToneSequence::for_kind(NotificationKind::BrewingComplete).schedule(None);
        let freqs: Vec<f32> = tones.iter().map(|t| t.frequency_hz).collect();
        assert_eq!(freqs, [600.0, 800.0, 1000.0]);
        let offsets: Vec<u128> = tones.iter().map(|t| t.start_offset.as_millis()).collect();
        assert_eq!(offsets, [0, 350, 700]);
        assert_eq!(tones[2].duration, Duration::from_millis(400));
    }

    #[test]
    fn missing_volume_defaults_but_zero_is_kept() {
        let unset = ToneSequence::for_kind(NotificationKind::Default).schedule(None);
        assert_eq!(unset[0].envelope.peak, 0.5);
        let silent = ToneSequence::for_kind(NotificationKind::Default).schedule(Some(0.0));
        assert_eq!(silent[0].envelope.peak, 0.0);
    }

    #[test]
    fn every_kind_has_matching_frequency_and_duration_lists() {
        for kind in NotificationKind::ALL {
            let seq = ToneSequence::for_kind(kind);
            assert_eq!(seq.frequencies_hz.len(), seq.durations.len(), "{kind:?}");
        }
        assert_eq!(ToneSequence::for_kind(NotificationKind::StirReminder).frequencies_hz, [400.0]);
    }
}
