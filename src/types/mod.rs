//! Core data types for the Pomodoro Timer.
//!
//! This module defines the data structures used for:
//! - Timer modes, settings and observable timer state
//! - Track catalog records and their playback sources
//! - Observable playback status

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Maximum duration accepted for any single phase (24 hours).
pub const MAX_PHASE_SECONDS: u32 = 24 * 60 * 60;

/// Default number of focus sessions before a long break.
pub const DEFAULT_SESSIONS_BEFORE_LONG_BREAK: u32 = 4;

// ============================================================================
// TimerMode
// ============================================================================

/// The phase the timer is currently counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerMode {
    /// Focused work
    #[default]
    Focus,
    /// Short break between focus sessions
    ShortBreak,
    /// Long break after the configured number of focus sessions
    LongBreak,
}

impl TimerMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
        }
    }

    /// Returns true for either break mode.
    pub fn is_break(&self) -> bool {
        matches!(self, TimerMode::ShortBreak | TimerMode::LongBreak)
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimerSettings
// ============================================================================

/// User-editable timer settings.
///
/// The engine reads these only when a phase begins, on manual reset, and on
/// the zero-reached transition. A phase already in progress keeps the
/// duration it started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    /// Focus duration in seconds
    pub focus_seconds: u32,
    /// Short break duration in seconds
    pub short_break_seconds: u32,
    /// Long break duration in seconds
    pub long_break_seconds: u32,
    /// Focus sessions completed before a long break
    pub sessions_before_long_break: u32,
    /// Play a tick every second while counting down
    pub enable_tick_sound: bool,
    /// Play a chime when a phase completes
    pub enable_session_end_sound: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_seconds: 25 * 60,
            short_break_seconds: 5 * 60,
            long_break_seconds: 15 * 60,
            sessions_before_long_break: DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
            enable_tick_sound: true,
            enable_session_end_sound: true,
        }
    }
}

impl TimerSettings {
    /// Returns the configured duration for `mode` in seconds.
    pub fn duration(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_seconds,
            TimerMode::ShortBreak => self.short_break_seconds,
            TimerMode::LongBreak => self.long_break_seconds,
        }
    }

    /// Sets the duration for `mode` in seconds.
    pub fn set_duration(&mut self, mode: TimerMode, seconds: u32) {
        match mode {
            TimerMode::Focus => self.focus_seconds = seconds,
            TimerMode::ShortBreak => self.short_break_seconds = seconds,
            TimerMode::LongBreak => self.long_break_seconds = seconds,
        }
    }

    /// Creates new settings with the specified focus duration.
    pub fn with_focus_seconds(mut self, seconds: u32) -> Self {
        self.focus_seconds = seconds;
        self
    }

    /// Creates new settings with the specified short break duration.
    pub fn with_short_break_seconds(mut self, seconds: u32) -> Self {
        self.short_break_seconds = seconds;
        self
    }

    /// Creates new settings with the specified long break duration.
    pub fn with_long_break_seconds(mut self, seconds: u32) -> Self {
        self.long_break_seconds = seconds;
        self
    }

    /// Creates new settings with the specified long break threshold.
    pub fn with_sessions_before_long_break(mut self, sessions: u32) -> Self {
        self.sessions_before_long_break = sessions;
        self
    }

    /// Creates new settings with both sound toggles set.
    pub fn with_sounds(mut self, tick: bool, session_end: bool) -> Self {
        self.enable_tick_sound = tick;
        self.enable_session_end_sound = session_end;
        self
    }

    /// Validates the settings.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        for mode in [TimerMode::Focus, TimerMode::ShortBreak, TimerMode::LongBreak] {
            let seconds = self.duration(mode);
            if seconds == 0 || seconds > MAX_PHASE_SECONDS {
                return Err(format!(
                    "{}の時間は1-{}秒の範囲で指定してください",
                    mode, MAX_PHASE_SECONDS
                ));
            }
        }
        if self.sessions_before_long_break == 0 {
            return Err("長い休憩までのセッション数は1以上で指定してください".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Observable state of the timer engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    /// Current phase
    pub mode: TimerMode,
    /// Remaining seconds in the current phase
    pub time_left_seconds: u32,
    /// Whether the countdown is running
    pub is_active: bool,
    /// Focus sessions in the current long-break cycle, starting at 1
    pub session_count: u32,
}

impl TimerState {
    /// Creates the initial state: inactive focus phase with a full duration.
    pub fn new(focus_seconds: u32) -> Self {
        Self {
            mode: TimerMode::Focus,
            time_left_seconds: focus_seconds,
            is_active: false,
            session_count: 1,
        }
    }
}

// ============================================================================
// Tracks
// ============================================================================

/// Kind of procedurally generated noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoiseKind {
    White,
    Pink,
    Brown,
}

impl NoiseKind {
    /// Returns the string representation of the noise kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseKind::White => "white",
            NoiseKind::Pink => "pink",
            NoiseKind::Brown => "brown",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog category, used only for external filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackCategory {
    Noise,
    Nature,
    Music,
}

impl TrackCategory {
    /// Returns the string representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackCategory::Noise => "noise",
            TrackCategory::Nature => "nature",
            TrackCategory::Music => "music",
        }
    }
}

/// Whether a track is decoded from a file or synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackKind {
    File,
    Synth,
}

/// Where a track's audio comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceDescriptor {
    /// A local audio file decoded and looped.
    File(PathBuf),
    /// Noise synthesized on the fly.
    Synth(NoiseKind),
}

/// An immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Catalog category
    pub category: TrackCategory,
    /// Audio source
    pub source: SourceDescriptor,
}

impl Track {
    /// Creates a file-backed track.
    pub fn file(
        id: impl Into<String>,
        title: impl Into<String>,
        category: TrackCategory,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category,
            source: SourceDescriptor::File(path.into()),
        }
    }

    /// Creates a synthesized noise track.
    pub fn synth(
        id: impl Into<String>,
        title: impl Into<String>,
        category: TrackCategory,
        kind: NoiseKind,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category,
            source: SourceDescriptor::Synth(kind),
        }
    }

    /// Returns whether the track is file-backed or synthesized.
    pub fn kind(&self) -> TrackKind {
        match self.source {
            SourceDescriptor::File(_) => TrackKind::File,
            SourceDescriptor::Synth(_) => TrackKind::Synth,
        }
    }
}

// ============================================================================
// PlaybackStatus
// ============================================================================

/// Observable state of the playback controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    /// The track currently loaded, if any
    pub active_track: Option<Track>,
    /// Whether audio is actually being produced
    pub is_playing: bool,
}

// ============================================================================
// Tests
// ============================================================================
