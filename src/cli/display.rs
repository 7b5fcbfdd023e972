//! Display utilities for the Pomodoro Ambient CLI.
//!
//! This module provides formatted output for:
//! - Timer events and status
//! - Playback status
//! - The track catalog
//! - Error messages

use std::io::Write;

use crate::timer::TimerEvent;
use crate::types::{PlaybackStatus, TimerMode, TimerState, Track, TrackKind};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the session banner and the command help.
    pub fn show_welcome(state: &TimerState) {
        println!("ポモドーロタイマー");
        println!("─────────────────────────────");
        Self::show_timer(state);
        println!();
        println!("コマンド: t=開始/一時停止  r=リセット  set focus|short|long 秒数");
        println!("          play ID  stop  status  q=終了");
    }

    /// Shows one timer event.
    pub fn show_event(event: &TimerEvent) {
        match event {
            TimerEvent::Tick { remaining_seconds } => Self::show_tick(*remaining_seconds),
            TimerEvent::Started {
                mode,
                remaining_seconds,
            } => {
                println!(
                    "\n> {}を開始しました (残り {})",
                    Self::mode_label(*mode),
                    Self::format_clock(*remaining_seconds)
                );
            }
            TimerEvent::Paused { remaining_seconds } => {
                println!(
                    "\n|| 一時停止しました (残り {})",
                    Self::format_clock(*remaining_seconds)
                );
            }
            TimerEvent::Reset {
                mode,
                remaining_seconds,
            } => {
                println!(
                    "\n[] {}をリセットしました ({})",
                    Self::mode_label(*mode),
                    Self::format_clock(*remaining_seconds)
                );
            }
            TimerEvent::PhaseCompleted {
                finished,
                next,
                session_count,
            } => {
                println!(
                    "\n* {}が終了しました。{}",
                    Self::mode_label(*finished),
                    Self::completion_hint(*finished)
                );
                println!(
                    "  次は{} (セッション #{}) - t で開始",
                    Self::mode_label(*next),
                    session_count
                );
            }
        }
    }

    /// Overwrites the current line with the remaining time.
    pub fn show_tick(remaining_seconds: u32) {
        print!("\r  残り時間: {}   ", Self::format_clock(remaining_seconds));
        let _ = std::io::stdout().flush();
    }

    /// Shows the timer state.
    pub fn show_timer(state: &TimerState) {
        let status = if state.is_active {
            "実行中"
        } else {
            "停止中"
        };
        println!("モード: {} ({})", Self::mode_label(state.mode), status);
        println!("残り時間: {}", Self::format_clock(state.time_left_seconds));
        println!("セッション: #{}", state.session_count);
    }

    /// Shows what the playback controller is doing.
    pub fn show_playback(status: &PlaybackStatus, is_loading: bool) {
        match &status.active_track {
            Some(track) if is_loading => println!("環境音: {} (読み込み中)", track.title),
            Some(track) if status.is_playing => println!("環境音: {} (再生中)", track.title),
            Some(track) => println!("環境音: {} (停止中)", track.title),
            None => println!("環境音: なし"),
        }
    }

    /// Shows the track catalog.
    pub fn show_tracks(tracks: &[&Track]) {
        if tracks.is_empty() {
            println!("トラックがありません");
            return;
        }
        for track in tracks {
            let kind = match track.kind() {
                TrackKind::Synth => "合成",
                TrackKind::File => "音源",
            };
            println!(
                "{:<14} {:<16} {:<7} {}",
                track.id,
                track.title,
                track.category.as_str(),
                kind
            );
        }
    }

    /// Shows an informational message.
    pub fn show_info(message: &str) {
        println!("{}", message);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Returns the Japanese label of a mode.
    pub fn mode_label(mode: TimerMode) -> &'static str {
        match mode {
            TimerMode::Focus => "集中",
            TimerMode::ShortBreak => "短い休憩",
            TimerMode::LongBreak => "長い休憩",
        }
    }

    /// Returns the nudge printed when a phase of `finished` ends.
    pub fn completion_hint(finished: TimerMode) -> &'static str {
        if finished.is_break() {
            "集中に戻りましょう"
        } else {
            "少し休憩しましょう"
        }
    }

    /// Formats remaining seconds as `MM:SS`.
    pub fn format_clock(total_seconds: u32) -> String {
        let (minutes, seconds) = Self::format_time(total_seconds);
        format!("{:02}:{:02}", minutes, seconds)
    }

    /// Formats remaining seconds as (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NoiseKind, TrackCategory};

    mod format_time_tests {
        use super::*;

        #[test]
        fn test_format_time_zero() {
            assert_eq!(Display::format_time(0), (0, 0));
        }

        #[test]
        fn test_format_time_mixed() {
            assert_eq!(Display::format_time(90), (1, 30));
        }

        #[test]
        fn test_format_time_large() {
            assert_eq!(Display::format_time(120 * 60 + 59), (120, 59));
        }

        #[test]
        fn test_format_clock_pads() {
            assert_eq!(Display::format_clock(0), "00:00");
            assert_eq!(Display::format_clock(65), "01:05");
            assert_eq!(Display::format_clock(1500), "25:00");
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_mode_labels() {
            assert_eq!(Display::mode_label(TimerMode::Focus), "集中");
            assert_eq!(Display::mode_label(TimerMode::ShortBreak), "短い休憩");
            assert_eq!(Display::mode_label(TimerMode::LongBreak), "長い休憩");
        }

        #[test]
        fn test_completion_hint_depends_on_finished_mode() {
            assert_eq!(Display::completion_hint(TimerMode::Focus), "少し休憩しましょう");
            assert_eq!(Display::completion_hint(TimerMode::ShortBreak), "集中に戻りましょう");
            assert_eq!(Display::completion_hint(TimerMode::LongBreak), "集中に戻りましょう");
        }

        #[test]
        fn test_show_every_event() {
            // Verifies the functions don't panic
            Display::show_event(&TimerEvent::Started {
                mode: TimerMode::Focus,
                remaining_seconds: 1500,
            });
            Display::show_event(&TimerEvent::Tick {
                remaining_seconds: 1499,
            });
            Display::show_event(&TimerEvent::Paused {
                remaining_seconds: 1499,
            });
            Display::show_event(&TimerEvent::Reset {
                mode: TimerMode::Focus,
                remaining_seconds: 1500,
            });
            Display::show_event(&TimerEvent::PhaseCompleted {
                finished: TimerMode::Focus,
                next: TimerMode::LongBreak,
                session_count: 4,
            });
        }

        #[test]
        fn test_show_timer_and_welcome() {
            let state = TimerState::new(1500);
            Display::show_timer(&state);
            Display::show_welcome(&state);
        }

        #[test]
        fn test_show_playback_variants() {
            let track = Track::synth("pink-noise", "Pink Noise", TrackCategory::Noise, NoiseKind::Pink);
            Display::show_playback(&PlaybackStatus::default(), false);
            Display::show_playback(
                &PlaybackStatus {
                    active_track: Some(track.clone()),
                    is_playing: true,
                },
                false,
            );
            Display::show_playback(
                &PlaybackStatus {
                    active_track: Some(track),
                    is_playing: false,
                },
                true,
            );
        }

        #[test]
        fn test_show_tracks_empty() {
            Display::show_tracks(&[]);
        }

        #[test]
        fn test_show_error() {
            Display::show_error("Test error message");
        }
    }
}
