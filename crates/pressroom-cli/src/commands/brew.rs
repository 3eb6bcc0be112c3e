//! Interactive brew session on the terminal.
//!
//! One line per command on stdin. The session runs on a current-thread
//! runtime inside a `LocalSet`, with stdin feeding its command channel.

use std::path::PathBuf;

use pressroom_core::error::{Result, INVALID_TIMES_MESSAGE};
use pressroom_core::notify::NotificationDispatcher;
use pressroom_core::session::{Session, SessionCommand};
use pressroom_core::settings::{SettingsProposal, SettingsStore, TimerSettings};
use pressroom_core::storage::{Database, KeyValueStore, MemoryStore};
use pressroom_core::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::LocalSet;
use tracing::warn;

use crate::terminal::{TerminalAudio, TerminalDisplay, TerminalFlash};

const HELP: &str = "commands: start | continue | reset | status | settings | save <steep> <brew> [on|off] [volume] | defaults | close | quit";

/// A parsed stdin line.
#[derive(Debug)]
enum Input {
    Command(SessionCommand),
    Save {
        steep: String,
        brew: String,
        audio: Option<bool>,
        volume: Option<f32>,
    },
    Status,
    Help,
    Unknown(String),
}

fn parse_line(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let input = match words.next()? {
        "start" | "s" => Input::Command(SessionCommand::Start),
        "continue" | "c" => Input::Command(SessionCommand::Continue),
        "reset" | "r" => Input::Command(SessionCommand::Reset),
        "settings" => Input::Command(SessionCommand::OpenSettings),
        "close" => Input::Command(SessionCommand::CloseSettings),
        "defaults" => Input::Command(SessionCommand::ResetSettings),
        "quit" | "q" | "exit" => Input::Command(SessionCommand::Quit),
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "save" => {
            let steep = words.next().unwrap_or_default().to_string();
            let brew = words.next().unwrap_or_default().to_string();
            let audio = match words.next() {
                Some("on") => Some(true),
                Some("off") => Some(false),
                Some(other) => return Some(Input::Unknown(format!("save ... {other}"))),
                None => None,
            };
            let volume = match words.next() {
                Some(v) => match v.parse::<f32>() {
                    Ok(v) => Some(v),
                    Err(_) => return Some(Input::Unknown(format!("volume {v}"))),
                },
                None => None,
            };
            Input::Save {
                steep,
                brew,
                audio,
                volume,
            }
        }
        other => Input::Unknown(other.to_string()),
    };
    Some(input)
}

fn open_store() -> Box<dyn KeyValueStore> {
    match Database::open() {
        Ok(db) => Box::new(db),
        Err(e) => {
            warn!(error = %e, "settings database unavailable, changes will not be kept");
            Box::new(MemoryStore::new())
        }
    }
}

pub fn run() -> Result<()> {
    let config = Config::load_or_default();
    let clip_dir = config.clip_dir().unwrap_or_else(|e| {
        warn!(error = %e, "clip directory unavailable");
        PathBuf::from("clips")
    });

    let settings = SettingsStore::open(open_store());
    let initial = *settings.current();
    let dispatcher = NotificationDispatcher::new(TerminalAudio::new(clip_dir), TerminalFlash)
        .with_readiness_timeout(config.readiness_timeout())
        .with_flash_hold(config.flash_hold());
    let session = Session::new(settings, TerminalDisplay::new(), dispatcher)
        .with_stir_reminder_delay(config.stir_reminder_delay());

    println!("{HELP}");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let (tx, rx) = mpsc::unbounded_channel();
    let local = LocalSet::new();
    local.block_on(&runtime, async move {
        tokio::task::spawn_local(read_commands(tx, initial));
        session.run(rx).await;
    });
    drop(local);
    // stdin is read on a blocking thread that may still be parked in read()
    runtime.shutdown_background();
    println!();
    Ok(())
}

/// Forward stdin lines to the session until quit or EOF.
///
/// Keeps its own copy of the settings so `save` can carry the audio
/// preferences the user did not mention.
async fn read_commands(tx: mpsc::UnboundedSender<SessionCommand>, mut known: TimerSettings) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "could not read stdin");
                break;
            }
        };
        let Some(input) = parse_line(&line) else {
            continue;
        };
        let command = match input {
            Input::Command(command) => {
                if matches!(command, SessionCommand::ResetSettings) {
                    known = TimerSettings::default();
                }
                command
            }
            Input::Save {
                steep,
                brew,
                audio,
                volume,
            } => {
                let proposal = SettingsProposal::new(
                    steep,
                    brew,
                    audio.unwrap_or(known.audio_enabled),
                    volume.unwrap_or(known.audio_volume),
                );
                let (reply_tx, reply_rx) = oneshot::channel();
                let command = SessionCommand::SaveSettings {
                    proposal: proposal.clone(),
                    reply: Some(reply_tx),
                };
                if tx.send(command).is_err() {
                    return;
                }
                match reply_rx.await {
                    Ok(Ok(_)) => {
                        if let Ok(saved) = proposal.validate() {
                            known = saved;
                        }
                        println!("\n  settings saved");
                    }
                    Ok(Err(_)) => println!("\n  {INVALID_TIMES_MESSAGE}"),
                    Err(_) => return,
                }
                continue;
            }
            Input::Status => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if tx.send(SessionCommand::Status { reply: reply_tx }).is_err() {
                    return;
                }
                match reply_rx.await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(json) => println!("\n{json}"),
                        Err(e) => warn!(error = %e, "could not serialize snapshot"),
                    },
                    Err(_) => return,
                }
                continue;
            }
            Input::Help => {
                println!("\n{HELP}");
                continue;
            }
            Input::Unknown(word) => {
                println!("\n  unknown command: {word}");
                continue;
            }
        };
        let quit = matches!(command, SessionCommand::Quit);
        if tx.send(command).is_err() || quit {
            return;
        }
    }
    let _ = tx.send(SessionCommand::Quit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_commands() {
        assert!(matches!(parse_line("start"), Some(Input::Command(SessionCommand::Start))));
        assert!(matches!(parse_line("  c "), Some(Input::Command(SessionCommand::Continue))));
        assert!(matches!(parse_line("reset"), Some(Input::Command(SessionCommand::Reset))));
        assert!(matches!(parse_line("defaults"), Some(Input::Command(SessionCommand::ResetSettings))));
        assert!(matches!(parse_line("q"), Some(Input::Command(SessionCommand::Quit))));
        assert!(matches!(parse_line("status"), Some(Input::Status)));
        assert!(parse_line("").is_none());
        assert!(matches!(parse_line("brew"), Some(Input::Unknown(ref w)) if w == "brew"));
    }

    #[test]
    fn parses_save_arguments() {
        match parse_line("save 300 600") {
            Some(Input::Save { steep, brew, audio, volume }) => {
                assert_eq!((steep.as_str(), brew.as_str()), ("300", "600"));
                assert_eq!(audio, None);
                assert_eq!(volume, None);
            }
            other => panic!("Expected Save, got {other:?}"),
        }
        match parse_line("save 300 600 off 0.2") {
            Some(Input::Save { audio, volume, .. }) => {
                assert_eq!(audio, Some(false));
                assert_eq!(volume, Some(0.2));
            }
            other => panic!("Expected Save, got {other:?}"),
        }
        // missing durations are left for validation to reject
        assert!(matches!(parse_line("save"), Some(Input::Save { ref steep, .. }) if steep.is_empty()));
        assert!(matches!(parse_line("save 1 1 maybe"), Some(Input::Unknown(_))));
    }
}
