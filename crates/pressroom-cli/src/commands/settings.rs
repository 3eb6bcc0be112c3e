use clap::Subcommand;
use pressroom_core::error::{CoreError, Result};
use pressroom_core::settings::{SaveOutcome, SettingsProposal, SettingsStore};
use pressroom_core::storage::Database;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the saved settings as JSON
    Show,
    /// Change one or more settings
    Set {
        /// Steep time as seconds or M:SS (1s to 30:00)
        #[arg(long)]
        steep: Option<String>,
        /// Final brew time as seconds or M:SS (1s to 30:00)
        #[arg(long)]
        brew: Option<String>,
        /// Enable or disable audio notifications
        #[arg(long)]
        audio: Option<bool>,
        /// Notification volume, clamped to 0.0-1.0
        #[arg(long, allow_negative_numbers = true)]
        volume: Option<f32>,
    },
    /// Restore the default settings
    Reset,
}

pub fn run(action: SettingsAction) -> Result<()> {
    let mut store = SettingsStore::open(Database::open()?);

    let outcome = match action {
        SettingsAction::Show => None,
        SettingsAction::Set {
            steep,
            brew,
            audio,
            volume,
        } => {
            let mut proposal = SettingsProposal::from_current(store.current());
            if let Some(steep) = steep {
                proposal.steep_seconds = steep;
            }
            if let Some(brew) = brew {
                proposal.brew_seconds = brew;
            }
            if let Some(audio) = audio {
                proposal.audio_enabled = audio;
            }
            if let Some(volume) = volume {
                proposal.audio_volume = volume;
            }
            Some(store.save(&proposal)?)
        }
        SettingsAction::Reset => Some(store.reset_to_defaults()),
    };

    println!("{}", serde_json::to_string_pretty(store.current())?);
    if outcome == Some(SaveOutcome::MemoryOnly) {
        return Err(CoreError::Custom("settings could not be written to the database".into()));
    }
    Ok(())
}
