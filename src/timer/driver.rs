//! 1 Hz clock for the timer engine.
//!
//! The driver owns the tokio interval. It exists only while the engine
//! reports `is_clock_enabled()`: a fresh interval is armed one second out
//! whenever the countdown starts, and it is dropped on pause, reset and
//! phase completion.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use super::engine::TimerEngine;
use crate::types::TimerSettings;

/// Tick period.
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Commands accepted by the driver loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start or pause the countdown
    Toggle,
    /// Stop and reload the current phase
    Reset,
    /// Replace the settings snapshot
    UpdateSettings(TimerSettings),
    /// Exit the driver loop
    Shutdown,
}

/// Runs a [`TimerEngine`] against the tokio clock.
pub struct TimerDriver {
    /// Shared reference to the timer engine
    engine: Arc<Mutex<TimerEngine>>,
    /// Command receiver
    commands: mpsc::UnboundedReceiver<TimerCommand>,
}

impl TimerDriver {
    /// Creates a driver and the sender used to control it.
    pub fn new(engine: Arc<Mutex<TimerEngine>>) -> (Self, mpsc::UnboundedSender<TimerCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                engine,
                commands: rx,
            },
            tx,
        )
    }

    /// Returns the shared engine for read access.
    pub fn engine(&self) -> Arc<Mutex<TimerEngine>> {
        Arc::clone(&self.engine)
    }

    /// Runs the loop until `Shutdown` arrives or every sender is dropped.
    ///
    /// This should be spawned as a separate tokio task.
    pub async fn run(mut self) {
        let mut ticker: Option<Interval> = None;

        loop {
            let enabled = self.engine.lock().await.is_clock_enabled();
            match (enabled, ticker.is_some()) {
                (true, false) => {
                    let mut fresh = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
                    fresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    ticker = Some(fresh);
                    debug!("Timer clock armed");
                }
                (false, true) => {
                    ticker = None;
                    debug!("Timer clock cleared");
                }
                _ => {}
            }

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(TimerCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command).await,
                },
                _ = next_tick(&mut ticker) => {
                    self.engine.lock().await.tick();
                }
            }
        }

        debug!("Timer driver stopped");
    }

    async fn apply(&self, command: TimerCommand) {
        let mut engine = self.engine.lock().await;
        match command {
            TimerCommand::Toggle => engine.toggle_active(),
            TimerCommand::Reset => engine.reset(),
            TimerCommand::UpdateSettings(settings) => engine.update_settings(settings),
            TimerCommand::Shutdown => {}
        }
    }
}

/// Waits for the next tick, or forever when the clock is cleared.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
