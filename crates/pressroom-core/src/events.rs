use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::display::Urgency;
use crate::settings::SaveOutcome;
use crate::timer::Stage;

/// Every state change of the stage machine produces an Event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    StageStarted {
        stage: Stage,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    StageCompleted {
        stage: Stage,
        next: Stage,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    SettingsSaved {
        outcome: SaveOutcome,
        at: DateTime<Utc>,
    },
    SettingsReset {
        outcome: SaveOutcome,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        stage: Stage,
        remaining_secs: u32,
        total_secs: u32,
        running: bool,
        progress: f64,
        urgency: Urgency,
        at: DateTime<Utc>,
    },
}
