//! Single-threaded session runtime.
//!
//! Drives a `StageMachine` from a one-second interval and a command channel,
//! and hands queued notifications to the dispatcher on separate local tasks
//! so slow audio never holds up a tick.
//!
//! `Session::run` uses `spawn_local`, so it must be polled inside a
//! `tokio::task::LocalSet` on a current-thread runtime.

use std::rc::Rc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::display::DisplaySink;
use crate::error::SettingsError;
use crate::events::Event;
use crate::notify::{AudioBackend, NotificationDispatcher, NotificationRequest, Notifier, VisualAlert};
use crate::settings::{SettingsProposal, SettingsStore};
use crate::storage::KeyValueStore;
use crate::timer::{StageMachine, TICK_PERIOD};

/// User commands accepted by a running session.
#[derive(Debug)]
pub enum SessionCommand {
    Start,
    Continue,
    Reset,
    SaveSettings {
        proposal: SettingsProposal,
        reply: Option<oneshot::Sender<Result<Event, SettingsError>>>,
    },
    ResetSettings,
    OpenSettings,
    CloseSettings,
    /// Reply with an `Event::StateSnapshot`.
    Status {
        reply: oneshot::Sender<Event>,
    },
    Quit,
}

/// Notifier that queues requests for the session loop.
#[derive(Debug, Clone)]
pub struct QueuedNotifier {
    tx: mpsc::UnboundedSender<NotificationRequest>,
}

impl QueuedNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&mut self, request: NotificationRequest) {
        if self.tx.send(request).is_err() {
            debug!(kind = request.kind.as_str(), "notification queue closed, dropping");
        }
    }
}

pub struct Session<S, D, A, V>
where
    S: KeyValueStore,
    D: DisplaySink,
    A: AudioBackend,
    V: VisualAlert,
{
    machine: StageMachine<S, QueuedNotifier, D>,
    notifications: mpsc::UnboundedReceiver<NotificationRequest>,
    dispatcher: Rc<NotificationDispatcher<A, V>>,
}

impl<S, D, A, V> Session<S, D, A, V>
where
    S: KeyValueStore,
    D: DisplaySink,
    A: AudioBackend + 'static,
    V: VisualAlert + 'static,
{
    pub fn new(settings: SettingsStore<S>, display: D, dispatcher: NotificationDispatcher<A, V>) -> Self {
        let (notifier, notifications) = QueuedNotifier::channel();
        Self {
            machine: StageMachine::new(settings, notifier, display),
            notifications,
            dispatcher: Rc::new(dispatcher),
        }
    }

    pub fn with_stir_reminder_delay(mut self, delay: std::time::Duration) -> Self {
        self.machine = self.machine.with_stir_reminder_delay(delay);
        self
    }

    pub fn machine(&self) -> &StageMachine<S, QueuedNotifier, D> {
        &self.machine
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher<A, V> {
        &self.dispatcher
    }

    /// Run until `Quit` arrives or every command sender is dropped.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) -> Self {
        let mut ticks = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut armed = self.machine.tick_token();

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Some(token) = self.machine.tick_token() {
                        self.machine.tick(token);
                    }
                }
                Some(request) = self.notifications.recv() => self.dispatch(request),
                command = commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.apply(command) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }

            // A freshly armed countdown gets a full second before its first tick.
            let current = self.machine.tick_token();
            if current != armed {
                if current.is_some() {
                    ticks.reset();
                }
                armed = current;
            }
        }

        info!("session ended");
        self
    }

    fn apply(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Start => {
                self.machine.start();
            }
            SessionCommand::Continue => {
                self.machine.continue_to_next_stage();
            }
            SessionCommand::Reset => {
                self.machine.reset();
            }
            SessionCommand::SaveSettings { proposal, reply } => {
                let result = self.machine.save_settings(&proposal);
                if let Err(e) = &result {
                    info!(error = %e, "settings rejected");
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            SessionCommand::ResetSettings => {
                self.machine.reset_settings_to_defaults();
            }
            SessionCommand::OpenSettings => self.machine.open_settings_view(),
            SessionCommand::CloseSettings => self.machine.close_settings_view(),
            SessionCommand::Status { reply } => {
                let _ = reply.send(self.machine.snapshot());
            }
            SessionCommand::Quit => return false,
        }
        true
    }

    fn dispatch(&self, request: NotificationRequest) {
        let dispatcher = Rc::clone(&self.dispatcher);
        tokio::task::spawn_local(async move {
            if !request.delay.is_zero() {
                tokio::time::sleep(request.delay).await;
            }
            let outcome = dispatcher.notify(request.kind, request.audio).await;
            debug!(kind = request.kind.as_str(), ?outcome, "notification delivered");
        });
    }
}
