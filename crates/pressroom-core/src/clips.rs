//! Offline generator for the pre-rendered notification clips.
//!
//! Each clip is a 1-3-5-8 major arpeggio of sine tones with linear fades,
//! written as 44.1kHz mono 16-bit PCM WAV.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

use crate::error::Result;
use crate::notify::NotificationKind;

pub const SAMPLE_RATE: u32 = 44_100;

const NOTE_SECS: f32 = 0.3;
const GAP_SECS: f32 = 0.1;
const FADE_SECS: f32 = 0.1;
const AMPLITUDE: f32 = 0.3;

/// Natural note names usable as arpeggio roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Note {
    const SCALE: [Note; 7] = [Note::C, Note::D, Note::E, Note::F, Note::G, Note::A, Note::B];

    /// Semitones from A within the same octave.
    fn offset_from_a(self) -> i32 {
        match self {
            Note::C => -9,
            Note::D => -7,
            Note::E => -5,
            Note::F => -4,
            Note::G => -2,
            Note::A => 0,
            Note::B => 2,
        }
    }

    fn scale_index(self) -> usize {
        Self::SCALE.iter().position(|&n| n == self).unwrap_or(0)
    }
}

/// Equal-temperament frequency, A4 = 440Hz.
pub fn note_frequency(note: Note, octave: i32) -> f32 {
    let semitones = note.offset_from_a() + (octave - 4) * 12;
    440.0 * 2f32.powf(semitones as f32 / 12.0)
}

/// Root, major third, perfect fifth and the root an octave up.
///
/// Thirds and fifths are taken from the C major scale (diatonic degrees
/// 3 and 5 counted from the root).
pub fn arpeggio(root: Note, octave: i32) -> [f32; 4] {
    let root_index = root.scale_index();
    let degree = |steps: usize| {
        let index = root_index + steps;
        let note = Note::SCALE[index % 7];
        note_frequency(note, octave + (index / 7) as i32)
    };
    [degree(0), degree(2), degree(4), note_frequency(root, octave + 1)]
}

/// A sine tone with linear fade-in and fade-out.
pub fn tone(frequency: f32, secs: f32, fade: f32) -> Vec<f32> {
    let samples = (SAMPLE_RATE as f32 * secs) as usize;
    (0..samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let mut amplitude = (2.0 * std::f32::consts::PI * frequency * t).sin();
            if t < fade {
                amplitude *= t / fade;
            } else if t > secs - fade {
                amplitude *= (secs - t) / fade;
            }
            amplitude * AMPLITUDE
        })
        .collect()
}

/// Four notes separated by short silences.
pub fn arpeggio_samples(root: Note, octave: i32) -> Vec<f32> {
    let gap = vec![0.0; (SAMPLE_RATE as f32 * GAP_SECS) as usize];
    let notes = arpeggio(root, octave);
    let mut samples = Vec::new();
    for (i, freq) in notes.iter().enumerate() {
        samples.extend(tone(*freq, NOTE_SECS, FADE_SECS));
        if i + 1 < notes.len() {
            samples.extend_from_slice(&gap);
        }
    }
    samples
}

pub fn write_wav(path: &Path, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Root and octave used for each notification kind.
pub fn clip_voice(kind: NotificationKind) -> (Note, i32) {
    match kind {
        NotificationKind::SteepingComplete => (Note::C, 4),
        NotificationKind::StirReminder => (Note::G, 4),
        NotificationKind::BrewingComplete => (Note::F, 3),
        NotificationKind::Default => (Note::A, 4),
    }
}

/// Write all four clips into `dir`, creating it if needed.
pub fn generate_all(dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(NotificationKind::ALL.len());
    for kind in NotificationKind::ALL {
        let (root, octave) = clip_voice(kind);
        let path = dir.join(kind.clip_file());
        write_wav(&path, &arpeggio_samples(root, octave))?;
        info!(path = %path.display(), "generated clip");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.5
    }

    #[test]
    fn a4_is_440() {
        assert!(close(note_frequency(Note::A, 4), 440.0));
        assert!(close(note_frequency(Note::C, 4), 261.63));
        assert!(close(note_frequency(Note::A, 5), 880.0));
    }

    #[test]
    fn c_major_arpeggio() {
        let [c, e, g, c5] = arpeggio(Note::C, 4);
        assert!(close(c, 261.63));
        assert!(close(e, 329.63));
        assert!(close(g, 392.0));
        assert!(close(c5, 523.25));
    }

    #[test]
    fn g_arpeggio_wraps_into_next_octave() {
        let [g, b, d5, g5] = arpeggio(Note::G, 4);
        assert!(close(g, 392.0));
        assert!(close(b, 493.88));
        assert!(close(d5, 587.33));
        assert!(close(g5, 783.99));
    }

    #[test]
    fn tone_fades_from_and_to_silence() {
        let samples = tone(440.0, 0.3, 0.1);
        assert_eq!(samples.len(), (SAMPLE_RATE as f32 * 0.3) as usize);
        assert_eq!(samples[0], 0.0);
        assert!(samples.last().unwrap().abs() < 0.01);
        assert!(samples.iter().all(|s| s.abs() <= AMPLITUDE + f32::EPSILON));
    }

    #[test]
    fn arpeggio_has_three_gaps() {
        let samples = arpeggio_samples(Note::A, 4);
        let note = (SAMPLE_RATE as f32 * NOTE_SECS) as usize;
        let gap = (SAMPLE_RATE as f32 * GAP_SECS) as usize;
        assert_eq!(samples.len(), 4 * note + 3 * gap);
    }

    #[test]
    fn generate_all_writes_readable_wavs() {
        let dir = tempfile::tempdir().unwrap();
        let written = generate_all(&dir.path().join("clips")).unwrap();
        assert_eq!(written.len(), 4);
        for path in written {
            let reader = hound::WavReader::open(&path).unwrap();
            let spec = reader.spec();
            assert_eq!(spec.channels, 1);
            assert_eq!(spec.sample_rate, SAMPLE_RATE);
            assert_eq!(spec.bits_per_sample, 16);
            assert!(reader.duration() > 0);
        }
    }
}
