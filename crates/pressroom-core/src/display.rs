//! Projection of stage state onto a display sink.
//!
//! Rendering itself belongs to the sink; this module only decides what text,
//! progress and urgency to show.

use serde::{Deserialize, Serialize};

use crate::settings::TimerSettings;
use crate::timer::{Stage, StageState};

/// Remaining seconds at or below which urgency is high.
pub const HIGH_URGENCY_SECS: u32 = 10;
/// Remaining seconds at or below which urgency is medium.
pub const MEDIUM_URGENCY_SECS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    /// Only countdown stages can be urgent.
    pub fn for_state(state: &StageState) -> Self {
        if !state.stage.is_timed() {
            return Urgency::Low;
        }
        match state.remaining_secs {
            r if r <= HIGH_URGENCY_SECS => Urgency::High,
            r if r <= MEDIUM_URGENCY_SECS => Urgency::Medium,
            _ => Urgency::Low,
        }
    }
}

/// Everything the sink needs for one redraw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayFrame {
    pub time_text: String,
    pub stage_title: String,
    pub stage_description: String,
    pub progress: f64,
    pub urgency: Urgency,
    pub stage: Stage,
}

impl DisplayFrame {
    /// Idle previews the configured steep time; every other stage shows what
    /// is left of its countdown.
    pub fn project(state: &StageState, settings: &TimerSettings) -> Self {
        let shown_secs = match state.stage {
            Stage::Idle => settings.steep_seconds,
            _ => state.remaining_secs,
        };
        Self {
            time_text: format_clock(shown_secs),
            stage_title: state.stage.title().to_string(),
            stage_description: state.stage.description().to_string(),
            progress: state.progress(),
            urgency: Urgency::for_state(state),
            stage: state.stage,
        }
    }
}

/// `M:SS`, or `MM:SS` from ten minutes up.
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Something that can show frames and the settings view.
pub trait DisplaySink {
    fn render(&mut self, frame: &DisplayFrame);

    fn show_settings(&mut self, _settings: &TimerSettings) {}

    fn hide_settings(&mut self) {}
}

/// Keeps the sink in step with the stage machine.
pub struct DisplaySync<D: DisplaySink> {
    sink: D,
    settings_open: bool,
}

impl<D: DisplaySink> DisplaySync<D> {
    pub fn new(sink: D) -> Self {
        Self {
            sink,
            settings_open: false,
        }
    }

    pub fn sync(&mut self, state: &StageState, settings: &TimerSettings) -> DisplayFrame {
        let frame = DisplayFrame::project(state, settings);
        self.sink.render(&frame);
        frame
    }

    pub fn open_settings(&mut self, settings: &TimerSettings) {
        self.settings_open = true;
        self.sink.show_settings(settings);
    }

    pub fn close_settings(&mut self) {
        self.settings_open = false;
        self.sink.hide_settings();
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }
}
