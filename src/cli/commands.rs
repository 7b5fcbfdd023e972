//! Command definitions for the Pomodoro Ambient CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::sound::Effect;
use crate::types::{NoiseKind, TimerSettings, TrackCategory, MAX_PHASE_SECONDS};

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro Ambient CLI - focus timer with ambient noise
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro-ambient",
    version,
    about = "環境音付きポモドーロタイマー",
    long_about = "ターミナル上で動作するポモドーロタイマー。\n\
                  合成ノイズや環境音を再生しながら集中と休憩を繰り返します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the bundled audio files
    #[arg(long, global = true, value_name = "DIR")]
    pub assets: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an interactive timer session
    Run(RunArgs),

    /// List the ambient track catalog
    Tracks {
        /// Only show tracks of this category
        #[arg(short, long, value_enum)]
        category: Option<CategoryArg>,
    },

    /// Play synthesized noise until Ctrl-C
    Noise {
        /// Noise color
        #[arg(value_enum)]
        kind: NoiseArg,
    },

    /// Play a single sound effect
    Effect {
        /// Effect to play
        #[arg(value_enum)]
        effect: EffectArg,
    },

    /// Print the effective settings
    Config,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command. Unset values come from the settings file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Focus duration in seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub focus: Option<u32>,

    /// Short break duration in seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub short_break: Option<u32>,

    /// Long break duration in seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub long_break: Option<u32>,

    /// Focus sessions before a long break
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=99))]
    pub sessions: Option<u32>,

    /// Disable the per-second tick sound
    #[arg(long)]
    pub no_tick: bool,

    /// Disable the session-end chime
    #[arg(long)]
    pub no_end_sound: bool,

    /// Start playing this track immediately
    #[arg(short, long, value_name = "ID")]
    pub track: Option<String>,
}

impl RunArgs {
    /// Applies the flags on top of file settings.
    pub fn apply_to(&self, mut settings: TimerSettings) -> TimerSettings {
        if let Some(seconds) = self.focus {
            settings.focus_seconds = seconds;
        }
        if let Some(seconds) = self.short_break {
            settings.short_break_seconds = seconds;
        }
        if let Some(seconds) = self.long_break {
            settings.long_break_seconds = seconds;
        }
        if let Some(sessions) = self.sessions {
            settings.sessions_before_long_break = sessions;
        }
        if self.no_tick {
            settings.enable_tick_sound = false;
        }
        if self.no_end_sound {
            settings.enable_session_end_sound = false;
        }
        settings
    }
}

// ============================================================================
// Value Enums
// ============================================================================

/// Noise color argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseArg {
    White,
    Pink,
    Brown,
}

impl From<NoiseArg> for NoiseKind {
    fn from(arg: NoiseArg) -> Self {
        match arg {
            NoiseArg::White => NoiseKind::White,
            NoiseArg::Pink => NoiseKind::Pink,
            NoiseArg::Brown => NoiseKind::Brown,
        }
    }
}

/// Sound effect argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectArg {
    Tick,
    FocusEnd,
    BreakEnd,
}

impl From<EffectArg> for Effect {
    fn from(arg: EffectArg) -> Self {
        match arg {
            EffectArg::Tick => Effect::Tick,
            EffectArg::FocusEnd => Effect::FocusEnd,
            EffectArg::BreakEnd => Effect::BreakEnd,
        }
    }
}

/// Track category argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryArg {
    Noise,
    Nature,
    Music,
}

impl From<CategoryArg> for TrackCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Noise => TrackCategory::Noise,
            CategoryArg::Nature => TrackCategory::Nature,
            CategoryArg::Music => TrackCategory::Music,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a phase duration in seconds (1 to one day).
pub(crate) fn parse_seconds(s: &str) -> Result<u32, String> {
    let seconds: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("秒数は整数で指定してください: {}", s))?;
    if seconds == 0 || seconds > MAX_PHASE_SECONDS {
        return Err(format!(
            "秒数は1から{}の範囲で指定してください",
            MAX_PHASE_SECONDS
        ));
    }
    Ok(seconds)
}

// ============================================================================
// Tests
// ============================================================================
