//! Pomodoro Ambient Library
//!
//! This library provides the core functionality for the Pomodoro Ambient CLI.
//! It includes:
//! - Timer engine for focus/break cycles and its 1 Hz driver
//! - Audio context, procedural noise and sound effects
//! - Playback controller for one ambient track at a time
//! - Track catalog and settings file handling
//! - CLI command parsing and display utilities

pub mod catalog;
pub mod cli;
pub mod config;
pub mod sound;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    NoiseKind, PlaybackStatus, SourceDescriptor, TimerMode, TimerSettings, TimerState, Track,
    TrackCategory, TrackKind,
};

// Re-export timer types
pub use timer::{next_phase, TimerCommand, TimerDriver, TimerEngine, TimerEvent};

// Re-export sound types
pub use sound::{
    acquire, play_effect, synthesize, AudioBackend, AudioContext, Effect, LoopableSource,
    MockAudioBackend, MockSoundEffects, PlaybackController, PlaybackError, RodioBackend,
    SoundEffects, SoundError, ToneSynthesizer,
};

// Re-export config types
pub use config::{load_settings, save_settings, ConfigError};
