mod model;
mod store;

pub use model::{
    clamp_volume, AudioPreferences, SettingsProposal, TimerSettings, DEFAULT_AUDIO_VOLUME,
    DEFAULT_BREW_SECS, DEFAULT_STEEP_SECS, MAX_STAGE_SECS,
};
pub use store::{SaveOutcome, SettingsStore, SETTINGS_KEY};
