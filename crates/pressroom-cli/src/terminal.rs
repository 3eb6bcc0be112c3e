//! Terminal collaborators for an interactive brew session.
//!
//! The display redraws a single status line, flashes become truecolor
//! banners, and audio is the terminal bell gated on a readable clip.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use pressroom_core::display::{format_clock, DisplayFrame, DisplaySink, Urgency};
use pressroom_core::error::AudioError;
use pressroom_core::notify::{AudioBackend, FlashPlan, ScheduledTone, VisualAlert};
use pressroom_core::settings::TimerSettings;
use tracing::{debug, trace};

const BAR_WIDTH: usize = 24;
const BELL: &str = "\x07";
const RESET: &str = "\x1b[0m";

/// Redraws one status line per frame.
#[derive(Default)]
pub struct TerminalDisplay {
    last_stage: Option<pressroom_core::timer::Stage>,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for TerminalDisplay {
    fn render(&mut self, frame: &DisplayFrame) {
        let mut out = io::stdout().lock();
        // A new stage starts on its own line so the previous one stays visible.
        if self.last_stage.is_some_and(|s| s != frame.stage) {
            let _ = writeln!(out);
        }
        self.last_stage = Some(frame.stage);

        let filled = ((frame.progress * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
        let _ = write!(
            out,
            "\r\x1b[2K{}{:>5}{} [{}{}] {} - {}",
            urgency_color(frame.urgency),
            frame.time_text,
            RESET,
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            frame.stage_title,
            frame.stage_description,
        );
        let _ = out.flush();
    }

    fn show_settings(&mut self, settings: &TimerSettings) {
        println!();
        println!("  steep   {}", format_clock(settings.steep_seconds));
        println!("  brew    {}", format_clock(settings.brew_seconds));
        println!(
            "  audio   {} (volume {:.2})",
            if settings.audio_enabled { "on" } else { "off" },
            settings.audio_volume
        );
        println!("  save <steep> <brew> | defaults | close");
    }

    fn hide_settings(&mut self) {
        println!("  settings closed");
    }
}

fn urgency_color(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Low => "",
        Urgency::Medium => "\x1b[33m",
        Urgency::High => "\x1b[31m",
    }
}

/// Prints a colored banner per flash repeat.
#[derive(Default)]
pub struct TerminalFlash;

impl VisualAlert for TerminalFlash {
    fn flash(&self, plan: &FlashPlan) {
        let Some((r, g, b)) = parse_hex_color(plan.color) else {
            debug!(color = plan.color, "unparseable flash color");
            return;
        };
        trace!(color = plan.color, repeats = plan.repeats, hold_ms = plan.hold.as_millis() as u64, "flash");
        let mut out = io::stdout().lock();
        let _ = writeln!(out);
        for _ in 0..plan.repeats {
            let _ = writeln!(out, "\x1b[48;2;{r};{g};{b}m{:width$}{RESET}", "", width = BAR_WIDTH + 16);
        }
        let _ = out.flush();
    }
}

fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// A clip that passed WAV validation.
#[derive(Debug, Clone)]
pub struct TerminalClip {
    pub path: PathBuf,
    pub length: Duration,
}

/// Rings the terminal bell.
///
/// Clips are validated with hound so a missing or corrupt file drops the
/// dispatcher through to the tone layer, exactly as a real player would.
pub struct TerminalAudio {
    clip_dir: PathBuf,
}

impl TerminalAudio {
    pub fn new(clip_dir: PathBuf) -> Self {
        Self { clip_dir }
    }

    fn ring(&self) -> Result<(), AudioError> {
        let mut out = io::stdout().lock();
        out.write_all(BELL.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| AudioError::Playback(e.to_string()))
    }
}

impl AudioBackend for TerminalAudio {
    type Clip = TerminalClip;

    async fn load_clip(&self, file_name: &str) -> Result<TerminalClip, AudioError> {
        let path = self.clip_dir.join(file_name);
        let load_failed = |message: String| AudioError::ClipLoad {
            clip: file_name.to_string(),
            message,
        };
        let reader = hound::WavReader::open(&path).map_err(|e| load_failed(e.to_string()))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 || reader.duration() == 0 {
            return Err(load_failed("empty clip".into()));
        }
        let length = Duration::from_secs_f64(reader.duration() as f64 / spec.sample_rate as f64);
        debug!(path = %path.display(), length_ms = length.as_millis() as u64, "clip loaded");
        Ok(TerminalClip { path, length })
    }

    async fn play_clip(&self, clip: &TerminalClip, volume: f32) -> Result<(), AudioError> {
        if volume <= 0.0 {
            trace!(path = %clip.path.display(), "clip at zero volume");
            return Ok(());
        }
        trace!(path = %clip.path.display(), length_ms = clip.length.as_millis() as u64, volume, "ringing for clip");
        self.ring()
    }

    fn play_tone(&self, tone: &ScheduledTone) -> Result<(), AudioError> {
        // One bell per sequence; the remaining tones would only stack up.
        if tone.start_offset.is_zero() && tone.envelope.peak > 0.0 {
            self.ring()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flash_colors() {
        assert_eq!(parse_hex_color("#DCA561"), Some((0xDC, 0xA5, 0x61)));
        assert_eq!(parse_hex_color("#7E9CD8"), Some((0x7E, 0x9C, 0xD8)));
        assert_eq!(parse_hex_color("76946A"), None);
        assert_eq!(parse_hex_color("#12"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[tokio::test]
    async fn missing_clip_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = TerminalAudio::new(dir.path().to_path_buf());
        let err = audio.load_clip("stir-reminder.wav").await.unwrap_err();
        assert!(matches!(err, AudioError::ClipLoad { ref clip, .. } if clip == "stir-reminder.wav"));
    }

    #[tokio::test]
    async fn generated_clip_loads() {
        let dir = tempfile::tempdir().unwrap();
        pressroom_core::clips::generate_all(dir.path()).unwrap();
        let audio = TerminalAudio::new(dir.path().to_path_buf());
        let clip = audio.load_clip("brewing-complete.wav").await.unwrap();
        // four 0.3s notes and three 0.1s gaps
        assert!((clip.length.as_secs_f64() - 1.5).abs() < 0.01);
    }
}
