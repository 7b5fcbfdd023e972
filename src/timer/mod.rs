//! Timer module for the Pomodoro Timer.
//!
//! This module contains the timer functionality:
//! - `engine`: Pomodoro state machine with mode transitions
//! - `driver`: tokio task that delivers the 1 Hz tick while the clock is enabled

pub mod driver;
pub mod engine;

pub use driver::{TimerCommand, TimerDriver};
pub use engine::{next_phase, TimerEngine, TimerEvent};
