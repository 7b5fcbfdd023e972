//! Interactive timer session.
//!
//! Binds the timer engine, its 1 Hz driver and the playback controller to
//! line commands read from stdin:
//!
//! | Command                     | Effect                                 |
//! |-----------------------------|----------------------------------------|
//! | `t`, `toggle`               | start or pause the countdown           |
//! | `r`, `reset`                | reload the current phase               |
//! | `set focus\|short\|long N`  | change a duration (next phase onwards) |
//! | `set tick on\|off`          | toggle the per-second tick             |
//! | `set end-sound on\|off`     | toggle the phase-end chime             |
//! | `play ID`                   | play, pause or switch ambient track    |
//! | `stop`                      | stop ambient playback                  |
//! | `status`                    | print timer and playback status        |
//! | `q`, `quit`                 | end the session                        |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, warn};

use super::commands::parse_seconds;
use super::display::Display;
use crate::catalog::find_track;
use crate::config::save_settings;
use crate::sound::{acquire, PlaybackController, ToneSynthesizer};
use crate::timer::{TimerCommand, TimerDriver, TimerEngine};
use crate::types::{TimerMode, TimerSettings, Track};

/// How often pending track loads are checked.
const LOAD_POLL_PERIOD: Duration = Duration::from_millis(200);

/// Sound effects that can be switched during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundToggle {
    Tick,
    SessionEnd,
}

/// A parsed stdin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Toggle,
    Reset,
    Set { mode: TimerMode, seconds: u32 },
    SetSound { sound: SoundToggle, enabled: bool },
    Play(String),
    Stop,
    Status,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns a user-facing message for unknown or malformed commands.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head.to_lowercase().as_str() {
        "t" | "toggle" => SessionCommand::Toggle,
        "r" | "reset" => SessionCommand::Reset,
        "stop" => SessionCommand::Stop,
        "status" => SessionCommand::Status,
        "q" | "quit" | "exit" => SessionCommand::Quit,
        "play" => {
            let id = words
                .next()
                .ok_or_else(|| "play にはトラックIDを指定してください".to_string())?;
            SessionCommand::Play(id.to_string())
        }
        "set" => match words.next() {
            Some("tick") => SessionCommand::SetSound {
                sound: SoundToggle::Tick,
                enabled: parse_switch(words.next())?,
            },
            Some("end-sound") => SessionCommand::SetSound {
                sound: SoundToggle::SessionEnd,
                enabled: parse_switch(words.next())?,
            },
            target => {
                let mode = match target {
                    Some("focus") => TimerMode::Focus,
                    Some("short") => TimerMode::ShortBreak,
                    Some("long") => TimerMode::LongBreak,
                    _ => {
                        return Err(
                            "set focus|short|long 秒数 または set tick|end-sound on|off の形式で指定してください"
                                .to_string(),
                        )
                    }
                };
                let seconds = words
                    .next()
                    .ok_or_else(|| "秒数を指定してください".to_string())
                    .and_then(parse_seconds)?;
                SessionCommand::Set { mode, seconds }
            }
        },
        other => return Err(format!("不明なコマンドです: {}", other)),
    };

    if words.next().is_some() {
        return Err(format!("余分な引数があります: {}", line.trim()));
    }
    Ok(Some(command))
}

fn parse_switch(word: Option<&str>) -> Result<bool, String> {
    match word.map(str::to_lowercase).as_deref() {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err("on または off を指定してください".to_string()),
    }
}

/// Returns `settings` with one sound effect switched.
pub fn apply_sound_toggle(
    settings: &TimerSettings,
    sound: SoundToggle,
    enabled: bool,
) -> TimerSettings {
    let (tick, session_end) = match sound {
        SoundToggle::Tick => (enabled, settings.enable_session_end_sound),
        SoundToggle::SessionEnd => (settings.enable_tick_sound, enabled),
    };
    settings.clone().with_sounds(tick, session_end)
}

/// Everything a session needs besides the terminal.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Initial settings (file plus flags)
    pub settings: TimerSettings,
    /// Where `set` persists changed settings
    pub settings_path: Option<PathBuf>,
    /// Ambient track catalog
    pub catalog: Vec<Track>,
    /// Track to start with
    pub initial_track: Option<String>,
}

/// Runs an interactive session until `quit`, EOF or Ctrl-C.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run_session(options: SessionOptions) -> Result<()> {
    let SessionOptions {
        mut settings,
        settings_path,
        catalog,
        initial_track,
    } = options;

    // Starting a session counts as the user gesture that unlocks audio.
    acquire().unlock();

    let (event_tx, mut events) = mpsc::unbounded_channel();
    let engine = Arc::new(Mutex::new(TimerEngine::new(
        settings.clone(),
        Arc::new(ToneSynthesizer),
        event_tx,
    )));
    let (driver, commands) = TimerDriver::new(Arc::clone(&engine));
    let driver_task = tokio::spawn(driver.run());

    let mut player = PlaybackController::with_rodio();

    Display::show_welcome(engine.lock().await.state());

    if let Some(id) = initial_track {
        play_track(&mut player, &catalog, &id);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut load_poll = interval(LOAD_POLL_PERIOD);
    load_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    debug!("stdin closed");
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        Display::show_error(&message);
                        continue;
                    }
                };

                match command {
                    SessionCommand::Quit => break,
                    SessionCommand::Toggle => send(&commands, TimerCommand::Toggle),
                    SessionCommand::Reset => send(&commands, TimerCommand::Reset),
                    SessionCommand::Set { mode, seconds } => {
                        settings.set_duration(mode, seconds);
                        send(&commands, TimerCommand::UpdateSettings(settings.clone()));
                        Display::show_info(&format!(
                            "{}の時間を{}に設定しました (次のフェーズから適用)",
                            Display::mode_label(mode),
                            Display::format_clock(seconds)
                        ));
                        persist(settings_path.as_deref(), &settings);
                    }
                    SessionCommand::SetSound { sound, enabled } => {
                        settings = apply_sound_toggle(&settings, sound, enabled);
                        send(&commands, TimerCommand::UpdateSettings(settings.clone()));
                        let label = match sound {
                            SoundToggle::Tick => "ティック音",
                            SoundToggle::SessionEnd => "終了音",
                        };
                        let state = if enabled { "オン" } else { "オフ" };
                        Display::show_info(&format!("{}を{}にしました", label, state));
                        persist(settings_path.as_deref(), &settings);
                    }
                    SessionCommand::Play(id) => play_track(&mut player, &catalog, &id),
                    SessionCommand::Stop => {
                        player.stop_all();
                        Display::show_info("環境音を停止しました");
                    }
                    SessionCommand::Status => {
                        Display::show_timer(engine.lock().await.state());
                        Display::show_playback(&player.status(), player.is_loading());
                    }
                }
            }
            Some(event) = events.recv() => {
                Display::show_event(&event);
            }
            _ = load_poll.tick() => {
                match player.poll() {
                    Some(Ok(track)) => Display::show_info(&format!("\n環境音: {} を再生しています", track.title)),
                    Some(Err(e)) => {
                        Display::show_error(&e.to_string());
                        Display::show_info(&format!("  {}", e.suggestion()));
                    }
                    None => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Ctrl-C received");
                break;
            }
        }
    }

    send(&commands, TimerCommand::Shutdown);
    driver_task.await.context("Timer driver task failed")?;
    player.stop_all();
    println!();
    Ok(())
}

fn send(commands: &mpsc::UnboundedSender<TimerCommand>, command: TimerCommand) {
    if commands.send(command).is_err() {
        warn!("Timer driver is no longer running");
    }
}

fn persist(path: Option<&Path>, settings: &TimerSettings) {
    if let Some(path) = path {
        if let Err(e) = save_settings(path, settings) {
            warn!("Failed to save settings: {}", e);
        }
    }
}

fn play_track(player: &mut PlaybackController, catalog: &[Track], id: &str) {
    let Some(track) = find_track(catalog, id) else {
        Display::show_error(&format!("トラックが見つかりません: {}", id));
        return;
    };

    if let Err(e) = player.play(track) {
        Display::show_error(&e.to_string());
        return;
    }

    let status = player.status();
    if player.is_loading() {
        Display::show_info(&format!("環境音: {} を読み込んでいます", track.title));
    } else if status.is_playing {
        Display::show_info(&format!("環境音: {} を再生しています", track.title));
    } else {
        Display::show_info(&format!("環境音: {} を停止しました", track.title));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_parse_short_and_long_forms() {
        assert_eq!(parse_command("t"), Ok(Some(SessionCommand::Toggle)));
        assert_eq!(parse_command("toggle"), Ok(Some(SessionCommand::Toggle)));
        assert_eq!(parse_command("R"), Ok(Some(SessionCommand::Reset)));
        assert_eq!(parse_command("quit"), Ok(Some(SessionCommand::Quit)));
        assert_eq!(parse_command(" q "), Ok(Some(SessionCommand::Quit)));
        assert_eq!(parse_command("stop"), Ok(Some(SessionCommand::Stop)));
        assert_eq!(parse_command("status"), Ok(Some(SessionCommand::Status)));
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse_command("set focus 900"),
            Ok(Some(SessionCommand::Set {
                mode: TimerMode::Focus,
                seconds: 900
            }))
        );
        assert_eq!(
            parse_command("set short 60"),
            Ok(Some(SessionCommand::Set {
                mode: TimerMode::ShortBreak,
                seconds: 60
            }))
        );
        assert_eq!(
            parse_command("set long 1200"),
            Ok(Some(SessionCommand::Set {
                mode: TimerMode::LongBreak,
                seconds: 1200
            }))
        );
    }

    #[test]
    fn test_parse_set_errors() {
        assert!(parse_command("set").is_err());
        assert!(parse_command("set nap 60").is_err());
        assert!(parse_command("set focus").is_err());
        assert!(parse_command("set focus 0").is_err());
        assert!(parse_command("set focus ten").is_err());
        assert!(parse_command("set focus 60 extra").is_err());
    }

    #[test]
    fn test_parse_sound_toggles() {
        assert_eq!(
            parse_command("set tick off"),
            Ok(Some(SessionCommand::SetSound {
                sound: SoundToggle::Tick,
                enabled: false
            }))
        );
        assert_eq!(
            parse_command("set tick ON"),
            Ok(Some(SessionCommand::SetSound {
                sound: SoundToggle::Tick,
                enabled: true
            }))
        );
        assert_eq!(
            parse_command("set end-sound off"),
            Ok(Some(SessionCommand::SetSound {
                sound: SoundToggle::SessionEnd,
                enabled: false
            }))
        );
        assert_eq!(
            parse_command("set end-sound on"),
            Ok(Some(SessionCommand::SetSound {
                sound: SoundToggle::SessionEnd,
                enabled: true
            }))
        );
    }

    #[test]
    fn test_parse_sound_toggle_errors() {
        assert!(parse_command("set tick").is_err());
        assert!(parse_command("set tick maybe").is_err());
        assert!(parse_command("set end-sound 1").is_err());
        assert!(parse_command("set tick on now").is_err());
    }

    #[test]
    fn test_apply_sound_toggle_keeps_other_settings() {
        let settings = TimerSettings::default().with_focus_seconds(900);

        let quiet = apply_sound_toggle(&settings, SoundToggle::Tick, false);
        assert!(!quiet.enable_tick_sound);
        assert!(quiet.enable_session_end_sound);
        assert_eq!(quiet.focus_seconds, 900);

        let silent = apply_sound_toggle(&quiet, SoundToggle::SessionEnd, false);
        assert!(!silent.enable_tick_sound);
        assert!(!silent.enable_session_end_sound);

        let restored = apply_sound_toggle(&silent, SoundToggle::Tick, true);
        assert!(restored.enable_tick_sound);
        assert!(!restored.enable_session_end_sound);
    }

    #[test]
    fn test_sound_toggle_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = apply_sound_toggle(&TimerSettings::default(), SoundToggle::Tick, false);

        persist(Some(path.as_path()), &settings);

        let saved = crate::config::load_settings(&path).unwrap();
        assert!(!saved.enable_tick_sound);
        assert!(saved.enable_session_end_sound);
    }

    #[test]
    fn test_parse_play() {
        assert_eq!(
            parse_command("play rain"),
            Ok(Some(SessionCommand::Play("rain".to_string())))
        );
        assert!(parse_command("play").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let err = parse_command("dance").unwrap_err();
        assert!(err.contains("dance"));
    }
}
