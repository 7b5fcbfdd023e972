//! Timer engine for the Pomodoro Timer.
//!
//! This module provides the core timer state machine:
//! - Countdown driven by an external 1 Hz `tick()`
//! - Mode transitions (Focus → Short/Long Break → Focus)
//! - Long break after the configured number of focus sessions
//! - Sound effects and events on every transition
//!
//! Settings are read only when a phase begins: on the zero-reached
//! transition, on `reset()`, and when `toggle_active()` restarts a phase
//! frozen at zero. Editing settings never changes a phase in progress.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::sound::SoundEffects;
use crate::types::{TimerMode, TimerSettings, TimerState};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for display and external integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started or resumed
    Started {
        mode: TimerMode,
        remaining_seconds: u32,
    },
    /// Countdown paused
    Paused { remaining_seconds: u32 },
    /// Current phase reloaded from settings
    Reset {
        mode: TimerMode,
        remaining_seconds: u32,
    },
    /// One second elapsed
    Tick { remaining_seconds: u32 },
    /// A phase reached zero and the next one is loaded (inactive)
    PhaseCompleted {
        finished: TimerMode,
        next: TimerMode,
        session_count: u32,
    },
}

// ============================================================================
// Transition table
// ============================================================================

/// Computes the mode and session count that follow `mode`.
///
/// `threshold` is the number of focus sessions before a long break.
pub fn next_phase(mode: TimerMode, session_count: u32, threshold: u32) -> (TimerMode, u32) {
    match mode {
        TimerMode::Focus if session_count >= threshold => (TimerMode::LongBreak, session_count),
        TimerMode::Focus => (TimerMode::ShortBreak, session_count),
        TimerMode::ShortBreak => (TimerMode::Focus, session_count + 1),
        TimerMode::LongBreak => (TimerMode::Focus, 1),
    }
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Pomodoro state machine.
pub struct TimerEngine {
    /// Current timer state
    state: TimerState,
    /// Latest settings snapshot
    settings: TimerSettings,
    /// Sound effect sink
    effects: Arc<dyn SoundEffects>,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an inactive engine in focus mode with a full focus duration.
    pub fn new(
        settings: TimerSettings,
        effects: Arc<dyn SoundEffects>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self {
            state: TimerState::new(settings.duration(TimerMode::Focus)),
            settings,
            effects,
            event_tx,
        }
    }

    /// Advances the countdown by one second.
    ///
    /// No-op unless active with time left. Reaching zero runs the phase
    /// transition in the same call, so no other operation can observe an
    /// active timer at zero.
    pub fn tick(&mut self) {
        if !self.state.is_active || self.state.time_left_seconds == 0 {
            return;
        }

        if self.settings.enable_tick_sound {
            self.effects.tick();
        }
        self.state.time_left_seconds -= 1;
        self.emit(TimerEvent::Tick {
            remaining_seconds: self.state.time_left_seconds,
        });

        if self.state.time_left_seconds == 0 {
            self.on_zero_reached();
        }
    }

    /// Starts or pauses the countdown.
    ///
    /// Starting at zero first reloads the current mode's duration from the
    /// current settings.
    pub fn toggle_active(&mut self) {
        if self.state.time_left_seconds == 0 {
            self.state.time_left_seconds = self.settings.duration(self.state.mode);
        }
        self.state.is_active = !self.state.is_active;

        if self.state.is_active {
            self.emit(TimerEvent::Started {
                mode: self.state.mode,
                remaining_seconds: self.state.time_left_seconds,
            });
        } else {
            self.emit(TimerEvent::Paused {
                remaining_seconds: self.state.time_left_seconds,
            });
        }
    }

    /// Stops the countdown and reloads the current mode's duration.
    pub fn reset(&mut self) {
        self.state.is_active = false;
        self.state.time_left_seconds = self.settings.duration(self.state.mode);

        self.emit(TimerEvent::Reset {
            mode: self.state.mode,
            remaining_seconds: self.state.time_left_seconds,
        });
    }

    /// Replaces the settings snapshot. The running phase is untouched.
    pub fn update_settings(&mut self, settings: TimerSettings) {
        debug!("Timer settings updated: {:?}", settings);
        self.settings = settings;
    }

    /// Returns the current settings snapshot.
    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Returns a reference to the current timer state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Returns true while the host should deliver ticks.
    pub fn is_clock_enabled(&self) -> bool {
        self.state.is_active && self.state.time_left_seconds > 0
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(any(test, feature = "test-utils"))]
    pub fn state_mut(&mut self) -> &mut TimerState {
        &mut self.state
    }

    /// Handles the zero-reached transition.
    fn on_zero_reached(&mut self) {
        let finished = self.state.mode;
        let (next, session_count) = next_phase(
            finished,
            self.state.session_count,
            self.settings.sessions_before_long_break,
        );

        self.state.is_active = false;
        self.state.mode = next;
        self.state.time_left_seconds = self.settings.duration(next);
        self.state.session_count = session_count;

        debug!(
            "Phase {} completed, next {} (session {})",
            finished, next, session_count
        );

        if self.settings.enable_session_end_sound {
            match finished {
                TimerMode::Focus => self.effects.focus_end(),
                TimerMode::ShortBreak | TimerMode::LongBreak => self.effects.break_end(),
            }
        }

        self.emit(TimerEvent::PhaseCompleted {
            finished,
            next,
            session_count,
        });
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Timer event receiver dropped");
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
