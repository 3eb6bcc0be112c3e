//! Brew stage machine.
//!
//! Owns the current stage and its countdown. It never sleeps and never
//! spawns: the caller delivers ticks with the token handed out when the
//! countdown was armed, and notifications are only filed with the injected
//! `Notifier`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Steeping --0s--> Stir --continue--> Brewing --0s--> Complete
//!   ^                                                                   |
//!   +------------------------------ reset (from any stage) -------------+
//! ```

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, trace};

use super::stage::{Stage, StageState};
use super::ticker::{TickToken, Ticker};
use crate::display::{DisplayFrame, DisplaySink, DisplaySync, Urgency};
use crate::error::SettingsError;
use crate::events::Event;
use crate::notify::{NotificationKind, NotificationRequest, Notifier};
use crate::settings::{SettingsProposal, SettingsStore, TimerSettings};
use crate::storage::KeyValueStore;

/// Gap between the steeping-complete and stir-reminder notifications.
pub const DEFAULT_STIR_REMINDER_DELAY: Duration = Duration::from_millis(500);

pub struct StageMachine<S: KeyValueStore, N: Notifier, D: DisplaySink> {
    state: StageState,
    ticker: Ticker,
    settings: SettingsStore<S>,
    notifier: N,
    display: DisplaySync<D>,
    stir_reminder_delay: Duration,
}

impl<S: KeyValueStore, N: Notifier, D: DisplaySink> StageMachine<S, N, D> {
    /// Create an idle machine and draw its first frame.
    pub fn new(settings: SettingsStore<S>, notifier: N, display: D) -> Self {
        let mut machine = Self {
            state: StageState::IDLE,
            ticker: Ticker::new(),
            settings,
            notifier,
            display: DisplaySync::new(display),
            stir_reminder_delay: DEFAULT_STIR_REMINDER_DELAY,
        };
        machine.render();
        machine
    }

    pub fn with_stir_reminder_delay(mut self, delay: Duration) -> Self {
        self.stir_reminder_delay = delay;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &StageState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn settings(&self) -> &TimerSettings {
        self.settings.current()
    }

    pub fn settings_store(&self) -> &SettingsStore<S> {
        &self.settings
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn display(&self) -> &D {
        self.display.sink()
    }

    pub fn settings_view_open(&self) -> bool {
        self.display.settings_open()
    }

    /// Token the next tick must carry, while a countdown is running.
    pub fn tick_token(&self) -> Option<TickToken> {
        self.ticker.current()
    }

    pub fn frame(&self) -> DisplayFrame {
        DisplayFrame::project(&self.state, self.settings.current())
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            stage: self.state.stage,
            remaining_secs: self.state.remaining_secs,
            total_secs: self.state.total_secs,
            running: self.state.running,
            progress: self.state.progress(),
            urgency: Urgency::for_state(&self.state),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin steeping with the currently saved steep time.
    ///
    /// Valid from any stage; a running countdown is cancelled first.
    pub fn start(&mut self) -> Option<Event> {
        self.ticker.cancel();
        let secs = self.settings.current().steep_seconds;
        Some(self.begin(Stage::Steeping, secs))
    }

    /// Move from the stir gate into final brewing. No-op anywhere else.
    pub fn continue_to_next_stage(&mut self) -> Option<Event> {
        if self.state.stage != Stage::Stir {
            debug!(stage = self.state.stage.as_str(), "continue ignored outside stir");
            return None;
        }
        let secs = self.settings.current().brew_seconds;
        Some(self.begin(Stage::Brewing, secs))
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.ticker.cancel();
        self.state = StageState::IDLE;
        info!("timer reset");
        self.render();
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Deliver one tick. Returns `Some(Event::StageCompleted)` when the
    /// countdown runs out; stale or unexpected ticks are dropped.
    pub fn tick(&mut self, token: TickToken) -> Option<Event> {
        if !self.ticker.accepts(token) || !self.state.running {
            trace!("dropping stale tick");
            return None;
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        trace!(remaining = self.state.remaining_secs, "tick");
        if self.state.remaining_secs == 0 {
            return self.complete();
        }
        self.render();
        None
    }

    /// Validate and apply new settings, closing the settings view.
    ///
    /// # Errors
    /// Returns `SettingsError::Invalid` and changes nothing when the
    /// durations are rejected.
    pub fn save_settings(&mut self, proposal: &SettingsProposal) -> Result<Event, SettingsError> {
        let outcome = self.settings.save(proposal)?;
        self.display.close_settings();
        if self.state.stage == Stage::Idle {
            self.render();
        }
        Ok(Event::SettingsSaved {
            outcome,
            at: Utc::now(),
        })
    }

    pub fn reset_settings_to_defaults(&mut self) -> Option<Event> {
        let outcome = self.settings.reset_to_defaults();
        if self.display.settings_open() {
            self.display.open_settings(self.settings.current());
        }
        if self.state.stage == Stage::Idle {
            self.render();
        }
        Some(Event::SettingsReset {
            outcome,
            at: Utc::now(),
        })
    }

    pub fn open_settings_view(&mut self) {
        self.display.open_settings(self.settings.current());
    }

    pub fn close_settings_view(&mut self) {
        self.display.close_settings();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self, stage: Stage, secs: u32) -> Event {
        self.state = StageState::countdown(stage, secs);
        self.ticker.arm();
        info!(stage = stage.as_str(), secs, "stage started");
        self.render();
        Event::StageStarted {
            stage,
            duration_secs: secs,
            at: Utc::now(),
        }
    }

    fn complete(&mut self) -> Option<Event> {
        self.ticker.cancel();
        self.state.running = false;
        self.state.remaining_secs = 0;
        let finished = self.state.stage;
        let next = match finished {
            Stage::Steeping => Stage::Stir,
            Stage::Brewing => Stage::Complete,
            _ => return None,
        };
        self.state.stage = next;
        info!(from = finished.as_str(), to = next.as_str(), "stage complete");
        self.render();

        match next {
            Stage::Stir => {
                self.request(NotificationKind::SteepingComplete, Duration::ZERO);
                self.request(NotificationKind::StirReminder, self.stir_reminder_delay);
            }
            _ => self.request(NotificationKind::BrewingComplete, Duration::ZERO),
        }

        Some(Event::StageCompleted {
            stage: finished,
            next,
            at: Utc::now(),
        })
    }

    fn request(&mut self, kind: NotificationKind, delay: Duration) {
        self.notifier.notify(NotificationRequest {
            kind,
            delay,
            audio: self.settings.current().audio(),
        });
    }

    fn render(&mut self) {
        self.display.sync(&self.state, self.settings.current());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SETTINGS_KEY;
    use crate::storage::MemoryStore;

    #[derive(Default)]
    struct Frames(Vec<DisplayFrame>);

    impl DisplaySink for Frames {
        fn render(&mut self, frame: &DisplayFrame) {
            self.0.push(frame.clone());
        }
    }

    type TestMachine = StageMachine<MemoryStore, Vec<NotificationRequest>, Frames>;

    fn machine_with(steep: u32, brew: u32) -> TestMachine {
        let record = format!(r#"{{"steepSeconds":{steep},"brewSeconds":{brew}}}"#);
        let settings = SettingsStore::open(MemoryStore::with_entry(SETTINGS_KEY, &record));
        StageMachine::new(settings, Vec::new(), Frames::default())
    }

    fn run_ticks(m: &mut TestMachine, n: u32) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..n {
            if let Some(token) = m.tick_token() {
                events.extend(m.tick(token));
            }
        }
        events
    }

    fn kinds(m: &TestMachine) -> Vec<NotificationKind> {
        m.notifier().iter().map(|r| r.kind).collect()
    }

    #[test]
    fn starts_idle_and_renders() {
        let m = machine_with(240, 480);
        assert_eq!(*m.state(), StageState::IDLE);
        assert!(m.tick_token().is_none());
        assert_eq!(m.display().0.len(), 1);
        assert_eq!(m.display().0[0].time_text, "4:00");
    }

    #[test]
    fn start_arms_steeping_countdown() {
        let mut m = machine_with(90, 480);
        let event = m.start();
        assert!(matches!(
            event,
            Some(Event::StageStarted { stage: Stage::Steeping, duration_secs: 90, .. })
        ));
        assert_eq!(*m.state(), StageState::countdown(Stage::Steeping, 90));
        assert!(m.state().running);
        assert!(m.tick_token().is_some());
    }

    #[test]
    fn ticking_total_times_completes_steeping_once() {
        let mut m = machine_with(3, 5);
        m.start();

        let events = run_ticks(&mut m, 2);
        assert!(events.is_empty());
        assert_eq!(m.state().remaining_secs, 1);
        assert!(m.notifier().is_empty());

        let events = run_ticks(&mut m, 1);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::StageCompleted { stage: Stage::Steeping, next: Stage::Stir, .. }
        ));
        assert_eq!(m.stage(), Stage::Stir);
        assert_eq!(m.state().remaining_secs, 0);
        assert!(!m.state().running);
        assert!(m.tick_token().is_none());

        assert_eq!(kinds(&m), [NotificationKind::SteepingComplete, NotificationKind::StirReminder]);
        assert_eq!(m.notifier()[0].delay, Duration::ZERO);
        assert_eq!(m.notifier()[1].delay, DEFAULT_STIR_REMINDER_DELAY);
    }

    #[test]
    fn stir_is_a_gate() {
        let mut m = machine_with(1, 5);
        m.start();
        run_ticks(&mut m, 1);
        assert_eq!(m.stage(), Stage::Stir);

        // nothing armed, so nothing ticks
        assert!(run_ticks(&mut m, 10).is_empty());
        assert_eq!(m.stage(), Stage::Stir);
    }

    #[test]
    fn continue_twice_enters_brewing_once() {
        let mut m = machine_with(1, 7);
        m.start();
        run_ticks(&mut m, 1);

        assert!(m.continue_to_next_stage().is_some());
        let after_first = *m.state();
        let token = m.tick_token();
        assert!(m.continue_to_next_stage().is_none());

        assert_eq!(*m.state(), after_first);
        assert_eq!(m.tick_token(), token);
        assert_eq!(*m.state(), StageState::countdown(Stage::Brewing, 7));
    }

    #[test]
    fn continue_mid_brew_does_not_restart_countdown() {
        let mut m = machine_with(1, 10);
        m.start();
        run_ticks(&mut m, 1);
        m.continue_to_next_stage();
        run_ticks(&mut m, 4);
        assert!(m.continue_to_next_stage().is_none());
        assert_eq!(m.state().remaining_secs, 6);
    }

    #[test]
    fn continue_is_ignored_outside_stir() {
        let mut m = machine_with(5, 5);
        assert!(m.continue_to_next_stage().is_none());
        assert_eq!(m.stage(), Stage::Idle);
        m.start();
        assert!(m.continue_to_next_stage().is_none());
        assert_eq!(m.stage(), Stage::Steeping);
    }

    #[test]
    fn brewing_completes_with_single_notification() {
        let mut m = machine_with(1, 2);
        m.start();
        run_ticks(&mut m, 1);
        m.continue_to_next_stage();
        m.notifier_mut().clear();

        let events = run_ticks(&mut m, 2);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::StageCompleted { stage: Stage::Brewing, next: Stage::Complete, .. }
        ));
        assert_eq!(kinds(&m), [NotificationKind::BrewingComplete]);
        assert_eq!(m.stage(), Stage::Complete);
        assert!(!m.state().running);
    }

    #[test]
    fn reset_from_any_stage_returns_to_idle() {
        for ticks_before_reset in [0u32, 1, 2, 3, 5] {
            let mut m = machine_with(2, 2);
            m.start();
            run_ticks(&mut m, ticks_before_reset.min(2));
            if m.stage() == Stage::Stir && ticks_before_reset > 2 {
                m.continue_to_next_stage();
                run_ticks(&mut m, ticks_before_reset - 2);
            }
            assert!(matches!(m.reset(), Some(Event::TimerReset { .. })));
            assert_eq!(*m.state(), StageState::IDLE);
            assert!(m.tick_token().is_none());
        }
    }

    #[test]
    fn ticks_scheduled_before_reset_are_ignored() {
        let mut m = machine_with(10, 10);
        m.start();
        let stale = m.tick_token().unwrap();
        m.reset();
        for _ in 0..20 {
            assert!(m.tick(stale).is_none());
        }
        assert_eq!(*m.state(), StageState::IDLE);
        assert!(m.notifier().is_empty());
    }

    #[test]
    fn restart_cancels_previous_schedule() {
        let mut m = machine_with(10, 10);
        m.start();
        let old = m.tick_token().unwrap();
        run_ticks(&mut m, 3);
        m.start();
        let new = m.tick_token().unwrap();
        assert_ne!(old, new);

        assert!(m.tick(old).is_none());
        assert_eq!(m.state().remaining_secs, 10);
        m.tick(new);
        assert_eq!(m.state().remaining_secs, 9);
    }

    #[test]
    fn durations_are_read_when_a_stage_begins() {
        let mut m = machine_with(240, 480);
        m.save_settings(&SettingsProposal::new("60", "120", true, 0.5)).unwrap();
        m.start();
        assert_eq!(m.state().total_secs, 60);

        // changing brew time during steeping applies to the brewing stage
        m.save_settings(&SettingsProposal::new("60", "90", true, 0.5)).unwrap();
        assert_eq!(m.state().total_secs, 60);
        run_ticks(&mut m, 60);
        m.continue_to_next_stage();
        assert_eq!(m.state().total_secs, 90);
    }

    #[test]
    fn notifications_carry_current_audio_preferences() {
        let mut m = machine_with(1, 1);
        m.save_settings(&SettingsProposal::new("1", "1", false, 0.2)).unwrap();
        m.start();
        run_ticks(&mut m, 1);
        assert!(m.notifier().iter().all(|r| !r.audio.enabled && r.audio.volume == Some(0.2)));
    }

    #[test]
    fn rejected_settings_keep_view_open_and_values() {
        let mut m = machine_with(240, 480);
        m.open_settings_view();
        let err = m.save_settings(&SettingsProposal::new("0", "480", true, 0.5));
        assert_eq!(err.unwrap_err(), SettingsError::Invalid);
        assert!(m.settings_view_open());
        assert_eq!(m.settings().steep_seconds, 240);

        m.save_settings(&SettingsProposal::new("300", "480", true, 0.5)).unwrap();
        assert!(!m.settings_view_open());
    }

    #[test]
    fn saving_while_idle_refreshes_preview() {
        let mut m = machine_with(240, 480);
        m.save_settings(&SettingsProposal::new("330", "480", true, 0.5)).unwrap();
        assert_eq!(m.display().0.last().unwrap().time_text, "5:30");
        let stored = m.settings_store().store().get(SETTINGS_KEY).unwrap().unwrap();
        assert!(stored.contains(r#""steepSeconds":330"#));
    }

    #[test]
    fn reset_settings_restores_defaults() {
        let mut m = machine_with(60, 60);
        assert!(matches!(m.reset_settings_to_defaults(), Some(Event::SettingsReset { .. })));
        assert_eq!(*m.settings(), TimerSettings::default());
        assert_eq!(m.frame().time_text, "4:00");
    }

    #[test]
    fn urgency_follows_countdown() {
        let mut m = machine_with(40, 40);
        m.start();
        assert_eq!(m.frame().urgency, Urgency::Low);
        run_ticks(&mut m, 15);
        assert_eq!(m.frame().urgency, Urgency::Medium);
        run_ticks(&mut m, 20);
        assert_eq!(m.frame().urgency, Urgency::High);
    }

    #[test]
    fn snapshot_reports_state() {
        let mut m = machine_with(100, 100);
        m.start();
        run_ticks(&mut m, 25);
        match m.snapshot() {
            Event::StateSnapshot {
                stage,
                remaining_secs,
                total_secs,
                running,
                progress,
                ..
            } => {
                assert_eq!(stage, Stage::Steeping);
                assert_eq!(remaining_secs, 75);
                assert_eq!(total_secs, 100);
                assert!(running);
                assert_eq!(progress, 0.25);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
