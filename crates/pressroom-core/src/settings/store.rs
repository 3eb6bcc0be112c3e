//! Settings persistence through a key-value collaborator.
//!
//! The in-memory copy is authoritative for the running session; the store is
//! best-effort durability. Storage failures are logged and swallowed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::model::{SettingsProposal, TimerSettings};
use crate::error::SettingsError;
use crate::storage::KeyValueStore;

/// Key under which the whole settings record is stored.
pub const SETTINGS_KEY: &str = "press_settings";

/// How far a successful save got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Applied in memory and written to the store.
    Persisted,
    /// Applied in memory; the write failed and was logged.
    MemoryOnly,
}

/// Validated settings backed by a key-value store.
pub struct SettingsStore<S: KeyValueStore> {
    store: S,
    current: TimerSettings,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Wrap a store without reading it. Settings start at their defaults.
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: TimerSettings::default(),
        }
    }

    /// Wrap a store and load the persisted record right away.
    pub fn open(store: S) -> Self {
        let mut settings = Self::new(store);
        settings.load();
        settings
    }

    pub fn current(&self) -> &TimerSettings {
        &self.current
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the persisted record into memory.
    ///
    /// Absent, unreadable or non-object records yield the defaults. Otherwise
    /// each field is read on its own and a bad one only resets itself.
    pub fn load(&mut self) -> &TimerSettings {
        self.current = match self.store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(record)) => TimerSettings::from_record(&record),
                Ok(_) => {
                    warn!("stored settings are not a record, using defaults");
                    TimerSettings::default()
                }
                Err(e) => {
                    warn!(error = %e, "could not parse stored settings, using defaults");
                    TimerSettings::default()
                }
            },
            Ok(None) => TimerSettings::default(),
            Err(e) => {
                warn!(error = %e, "could not read stored settings, using defaults");
                TimerSettings::default()
            }
        };
        &self.current
    }

    /// Validate and apply a proposal.
    ///
    /// Rejected proposals leave the current settings untouched. Accepted ones
    /// are applied in memory before the write is attempted.
    pub fn save(&mut self, proposal: &SettingsProposal) -> Result<SaveOutcome, SettingsError> {
        let next = proposal.validate()?;
        self.current = next;
        Ok(self.persist())
    }

    /// Restore and persist the four defaults.
    pub fn reset_to_defaults(&mut self) -> SaveOutcome {
        self.current = TimerSettings::default();
        self.persist()
    }

    fn persist(&mut self) -> SaveOutcome {
        let raw = match serde_json::to_string(&self.current) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "could not serialize settings");
                return SaveOutcome::MemoryOnly;
            }
        };
        match self.store.set(SETTINGS_KEY, &raw) {
            Ok(()) => SaveOutcome::Persisted,
            Err(e) => {
                warn!(error = %e, "could not save settings, keeping them for this session only");
                SaveOutcome::MemoryOnly
            }
        }
    }
}
