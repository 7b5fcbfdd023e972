//! Integration tests for the timer engine and its driver.
//!
//! These tests drive full focus/break cycles through the public API with a
//! recording sound-effect mock.

use std::sync::Arc;

use pomodoro_ambient::sound::{Effect, MockSoundEffects};
use pomodoro_ambient::timer::{TimerCommand, TimerDriver, TimerEngine, TimerEvent};
use pomodoro_ambient::types::{TimerMode, TimerSettings};
use tokio::sync::{mpsc, Mutex};
use tokio::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn quick_settings(sessions: u32) -> TimerSettings {
    TimerSettings::default()
        .with_focus_seconds(2)
        .with_short_break_seconds(1)
        .with_long_break_seconds(3)
        .with_sessions_before_long_break(sessions)
}

fn create_engine(
    settings: TimerSettings,
) -> (
    TimerEngine,
    Arc<MockSoundEffects>,
    mpsc::UnboundedReceiver<TimerEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let effects = Arc::new(MockSoundEffects::new());
    (TimerEngine::new(settings, effects.clone(), tx), effects, rx)
}

/// Starts the current phase and ticks until it completes.
fn complete_phase(engine: &mut TimerEngine) {
    engine.toggle_active();
    while engine.state().is_active {
        engine.tick();
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ============================================================================
// Cycle Tests
// ============================================================================

#[test]
fn test_full_cycle_with_four_sessions() {
    let (mut engine, _effects, _rx) = create_engine(quick_settings(4));
    let mut observed = Vec::new();

    for _ in 0..9 {
        complete_phase(&mut engine);
        let state = engine.state();
        observed.push((state.mode, state.session_count));
    }

    assert_eq!(
        observed,
        vec![
            (TimerMode::ShortBreak, 1),
            (TimerMode::Focus, 2),
            (TimerMode::ShortBreak, 2),
            (TimerMode::Focus, 3),
            (TimerMode::ShortBreak, 3),
            (TimerMode::Focus, 4),
            (TimerMode::LongBreak, 4),
            (TimerMode::Focus, 1),
            (TimerMode::ShortBreak, 1),
        ]
    );
}

#[test]
fn test_each_completion_loads_next_phase_inactive() {
    let (mut engine, _effects, _rx) = create_engine(quick_settings(2));

    for expected in [1, 2, 3, 2, 1] {
        complete_phase(&mut engine);
        let state = engine.state();
        assert!(!state.is_active);
        assert_eq!(state.time_left_seconds, expected);
    }
}

#[test]
fn test_session_end_sounds_follow_finished_mode() {
    let (mut engine, effects, _rx) = create_engine(quick_settings(2));

    complete_phase(&mut engine); // focus -> short break
    complete_phase(&mut engine); // short break -> focus
    complete_phase(&mut engine); // focus -> long break
    complete_phase(&mut engine); // long break -> focus

    assert_eq!(effects.count(Effect::FocusEnd), 2);
    assert_eq!(effects.count(Effect::BreakEnd), 2);
    // One tick per elapsed second: 2 + 1 + 2 + 3
    assert_eq!(effects.count(Effect::Tick), 8);
}

#[test]
fn test_phase_completed_events() {
    let (mut engine, _effects, mut rx) = create_engine(quick_settings(1));
    complete_phase(&mut engine);
    complete_phase(&mut engine);

    let completed: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, TimerEvent::PhaseCompleted { .. }))
        .collect();

    assert_eq!(
        completed,
        vec![
            TimerEvent::PhaseCompleted {
                finished: TimerMode::Focus,
                next: TimerMode::LongBreak,
                session_count: 1,
            },
            TimerEvent::PhaseCompleted {
                finished: TimerMode::LongBreak,
                next: TimerMode::Focus,
                session_count: 1,
            },
        ]
    );
}

#[test]
fn test_settings_change_applies_at_next_boundary() {
    let (mut engine, _effects, _rx) = create_engine(TimerSettings::default());
    engine.toggle_active();
    for _ in 0..10 {
        engine.tick();
    }

    engine.update_settings(TimerSettings::default().with_focus_seconds(900));
    assert_eq!(engine.state().time_left_seconds, 1490);

    engine.reset();
    assert_eq!(engine.state().time_left_seconds, 900);
}

// ============================================================================
// Driver Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_driver_runs_a_phase_to_completion() {
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let effects = Arc::new(MockSoundEffects::new());
    let engine = Arc::new(Mutex::new(TimerEngine::new(
        quick_settings(4),
        effects.clone(),
        event_tx,
    )));
    let (driver, commands) = TimerDriver::new(Arc::clone(&engine));
    let task = tokio::spawn(driver.run());

    commands.send(TimerCommand::Toggle).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    {
        let engine = engine.lock().await;
        assert_eq!(engine.state().mode, TimerMode::ShortBreak);
        assert!(!engine.state().is_active);
    }

    let ticks = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, TimerEvent::Tick { .. }))
        .count();
    assert_eq!(ticks, 2);
    assert_eq!(effects.count(Effect::FocusEnd), 1);

    commands.send(TimerCommand::Shutdown).unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_driver_restarts_after_completion() {
    let (event_tx, _events) = mpsc::unbounded_channel();
    let engine = Arc::new(Mutex::new(TimerEngine::new(
        quick_settings(4),
        Arc::new(MockSoundEffects::new()),
        event_tx,
    )));
    let (driver, commands) = TimerDriver::new(Arc::clone(&engine));
    let task = tokio::spawn(driver.run());

    commands.send(TimerCommand::Toggle).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    commands.send(TimerCommand::Toggle).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let state = engine.lock().await.state().clone();
    assert_eq!(state.mode, TimerMode::Focus);
    assert_eq!(state.session_count, 2);

    drop(commands);
    task.await.unwrap();
}
