//! Audio engine for the Pomodoro Timer.
//!
//! This module provides:
//!
//! - A process-wide audio context with lazy init and resume-on-suspend
//! - Procedural noise (white, pink, brown) looped from a two-second buffer
//! - Procedural sound effects for the timer (tick, focus end, break end)
//! - A playback controller that keeps exactly one ambient track alive
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │   TimerEngine    │        │PlaybackController│
//! └────────┬─────────┘        └────────┬─────────┘
//!          │ SoundEffects              │ AudioBackend
//!          ▼                           ▼
//! ┌──────────────────┐        ┌──────────────────┐
//! │ ToneSynthesizer  │        │  RodioBackend    │──▶ NoiseSynthesizer
//! └────────┬─────────┘        └────────┬─────────┘
//!          │                           │
//!          └──────────┬────────────────┘
//!                     ▼
//!            ┌──────────────────┐
//!            │   AudioContext   │ ← one per process
//!            └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use pomodoro_ambient::sound::{play_effect, Effect, PlaybackController};
//! use pomodoro_ambient::types::{NoiseKind, Track, TrackCategory};
//!
//! play_effect(Effect::FocusEnd);
//!
//! let mut player = PlaybackController::with_rodio();
//! let pink = Track::synth("pink-noise", "Pink Noise", TrackCategory::Noise, NoiseKind::Pink);
//! player.play(&pink).expect("synth tracks never fail to load");
//! ```

mod backend;
mod context;
mod error;
mod noise;
mod player;
mod tone;

pub use backend::{
    AudioBackend, MockAudioBackend, MockHandleRecord, MockSource, RodioBackend, SourceHandle,
};
pub use context::{acquire, AudioContext, ContextState, FALLBACK_SAMPLE_RATE};
pub use error::{PlaybackError, SoundError};
pub use noise::{
    noise_buffer, synthesize, synthesize_on, LoopableSource, DEFAULT_NOISE_GAIN,
    NOISE_BUFFER_SECONDS,
};
pub use player::{PlaybackController, FILE_VOLUME};
pub use tone::{play_effect, play_effect_on, render, render_with, Effect, ToneSynthesizer};

/// The sound effects the timer triggers.
///
/// Implementations must never fail or block the caller; errors are logged
/// inside the implementation.
pub trait SoundEffects: Send + Sync {
    /// Plays the per-second tick.
    fn tick(&self);

    /// Plays the chime for a completed focus phase.
    fn focus_end(&self);

    /// Plays the chime for a completed break.
    fn break_end(&self);
}

/// Mock sound effects for testing.
#[derive(Debug, Default)]
pub struct MockSoundEffects {
    calls: std::sync::Mutex<Vec<Effect>>,
}

impl MockSoundEffects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Effect> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[must_use]
    pub fn count(&self, effect: Effect) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| **e == effect)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn record(&self, effect: Effect) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(effect);
    }
}

impl SoundEffects for MockSoundEffects {
    fn tick(&self) {
        self.record(Effect::Tick);
    }

    fn focus_end(&self) {
        self.record(Effect::FocusEnd);
    }

    fn break_end(&self) {
        self.record(Effect::BreakEnd);
    }
}
