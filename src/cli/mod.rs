//! CLI module for the Pomodoro Ambient timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `session`: Interactive timer session driven by stdin

pub mod commands;
pub mod display;
pub mod session;

pub use commands::{CategoryArg, Cli, Commands, EffectArg, NoiseArg, RunArgs};
pub use display::Display;
pub use session::{
    apply_sound_toggle, parse_command, run_session, SessionCommand, SessionOptions, SoundToggle,
};
