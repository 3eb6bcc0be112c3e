//! # Pressroom Core Library
//!
//! Core logic for the Pressroom French-press brewing timer. The CLI binary is
//! a thin terminal layer over this crate.
//!
//! ## Architecture
//!
//! - **Stage Machine**: a caller-driven state machine (Idle, Steeping, Stir,
//!   Brewing, Complete) that advances only when a valid tick token is
//!   delivered to `tick()`
//! - **Settings**: validated steep/brew durations and audio preferences,
//!   persisted as a JSON record in a key-value store
//! - **Notifications**: audio cues with a clip, synthesized tone and silent
//!   fallback chain, plus a visual flash that always runs
//! - **Display**: projection of stage state onto a pluggable display sink
//! - **Storage**: SQLite key-value persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`StageMachine`]: brewing state machine
//! - [`SettingsStore`]: settings persistence and validation
//! - [`NotificationDispatcher`]: audio and visual notification delivery
//! - [`Session`]: async runtime tying ticks, commands and notifications together

pub mod clips;
pub mod display;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod settings;
pub mod storage;
pub mod timer;

pub use display::{DisplayFrame, DisplaySink, DisplaySync, Urgency};
pub use error::{AudioError, ConfigError, CoreError, SettingsError, StoreError};
pub use events::Event;
pub use notify::{
    AudioBackend, AudioOutcome, FlashPlan, NoAudio, NotificationDispatcher, NotificationKind,
    NotificationRequest, Notifier, VisualAlert,
};
pub use session::{QueuedNotifier, Session, SessionCommand};
pub use settings::{AudioPreferences, SaveOutcome, SettingsProposal, SettingsStore, TimerSettings};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timer::{Stage, StageMachine, StageState, TickToken};
