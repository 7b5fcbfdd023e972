//! Procedural sound effects.
//!
//! Each effect is rendered sample by sample into its own buffer and played on
//! a detached sink, so it stops by itself and needs no cleanup. Calls are
//! independent: overlapping effects simply layer in the mixer.

use std::f32::consts::TAU;
use std::fmt;

use rand::Rng;
use rodio::buffer::SamplesBuffer;
use tracing::{debug, warn};

use super::context::{acquire, AudioContext};
use super::error::SoundError;
use super::SoundEffects;

/// Level at which exponential envelopes are considered silent.
const SILENCE: f32 = 0.001;

// Tick: filtered noise burst plus a low sine click.
const TICK_NOISE_SECONDS: f32 = 0.02;
const TICK_NOISE_GAIN: f32 = 0.8;
const TICK_BANDPASS_HZ: f32 = 1800.0;
const TICK_BANDPASS_Q: f32 = 1.2;
const TICK_CLICK_SECONDS: f32 = 0.03;
const TICK_CLICK_HZ: f32 = 220.0;
const TICK_CLICK_GAIN: f32 = 0.35;

// Chimes: two detuned squares, low-passed, with a tremolo LFO.
const CHIME_SECONDS: f32 = 1.2;
const CHIME_ATTACK_SECONDS: f32 = 0.02;
const CHIME_PEAK: f32 = 0.25;
const CHIME_LOWPASS_HZ: f32 = 2400.0;
const CHIME_LOWPASS_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;
const CHIME_LFO_HZ: f32 = 6.0;
const CHIME_LFO_DEPTH: f32 = 0.3;
const FOCUS_END_HZ: [f32; 2] = [880.0, 960.0];
const BREAK_END_HZ: [f32; 2] = [660.0, 720.0];

/// The effects the timer can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Mechanical click played every second
    Tick,
    /// Chime played when a focus phase completes
    FocusEnd,
    /// Chime played when a break completes
    BreakEnd,
}

impl Effect {
    /// Returns the string representation of the effect.
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Tick => "tick",
            Effect::FocusEnd => "focus-end",
            Effect::BreakEnd => "break-end",
        }
    }

    /// Returns the rendered length in seconds.
    pub fn seconds(&self) -> f32 {
        match self {
            Effect::Tick => TICK_CLICK_SECONDS.max(TICK_NOISE_SECONDS),
            Effect::FocusEnd | Effect::BreakEnd => CHIME_SECONDS,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second-order IIR filter (RBJ cookbook coefficients).
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    fn new(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Band-pass with 0 dB peak gain at `frequency`.
    fn band_pass(sample_rate: f32, frequency: f32, q: f32) -> Self {
        let (cos_w0, alpha) = Self::prewarp(sample_rate, frequency, q);
        Self::new(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
    }

    fn low_pass(sample_rate: f32, frequency: f32, q: f32) -> Self {
        let (cos_w0, alpha) = Self::prewarp(sample_rate, frequency, q);
        let b1 = 1.0 - cos_w0;
        Self::new(b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
    }

    fn prewarp(sample_rate: f32, frequency: f32, q: f32) -> (f32, f32) {
        // Keep the centre below Nyquist for low device rates.
        let frequency = frequency.min(sample_rate * 0.45);
        let w0 = TAU * frequency / sample_rate;
        (w0.cos(), w0.sin() / (2.0 * q))
    }

    fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// Exponential ramp from `start` to [`SILENCE`] over `duration`; zero after.
fn exp_decay(start: f32, t: f32, duration: f32) -> f32 {
    if t >= duration {
        0.0
    } else {
        start * (SILENCE / start).powf(t / duration)
    }
}

fn sample_count(seconds: f32, sample_rate: u32) -> usize {
    (seconds * sample_rate as f32).round() as usize
}

/// Renders an effect with the thread-local RNG.
pub fn render(effect: Effect, sample_rate: u32) -> Vec<f32> {
    render_with(effect, sample_rate, &mut rand::rng())
}

/// Renders an effect into mono samples in [-1, 1].
pub fn render_with(effect: Effect, sample_rate: u32, rng: &mut impl Rng) -> Vec<f32> {
    match effect {
        Effect::Tick => render_tick(sample_rate, rng),
        Effect::FocusEnd => render_chime(sample_rate, FOCUS_END_HZ),
        Effect::BreakEnd => render_chime(sample_rate, BREAK_END_HZ),
    }
}

fn render_tick(sample_rate: u32, rng: &mut impl Rng) -> Vec<f32> {
    let rate = sample_rate as f32;
    let mut band_pass = Biquad::band_pass(rate, TICK_BANDPASS_HZ, TICK_BANDPASS_Q);

    (0..sample_count(Effect::Tick.seconds(), sample_rate))
        .map(|i| {
            let t = i as f32 / rate;

            let burst = if t < TICK_NOISE_SECONDS {
                let white: f32 = rng.random_range(-1.0..=1.0);
                band_pass.process(white) * exp_decay(TICK_NOISE_GAIN, t, TICK_NOISE_SECONDS)
            } else {
                0.0
            };
            let click = (TAU * TICK_CLICK_HZ * t).sin()
                * exp_decay(TICK_CLICK_GAIN, t, TICK_CLICK_SECONDS);

            (burst + click).clamp(-1.0, 1.0)
        })
        .collect()
}

fn render_chime(sample_rate: u32, frequencies: [f32; 2]) -> Vec<f32> {
    let rate = sample_rate as f32;
    let mut low_pass = Biquad::low_pass(rate, CHIME_LOWPASS_HZ, CHIME_LOWPASS_Q);

    (0..sample_count(CHIME_SECONDS, sample_rate))
        .map(|i| {
            let t = i as f32 / rate;

            let square = |hz: f32| -> f32 {
                if (hz * t).fract() < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            };
            let mixed = 0.5 * (square(frequencies[0]) + square(frequencies[1]));
            let filtered = low_pass.process(mixed);

            let envelope = if t < CHIME_ATTACK_SECONDS {
                CHIME_PEAK * t / CHIME_ATTACK_SECONDS
            } else {
                exp_decay(
                    CHIME_PEAK,
                    t - CHIME_ATTACK_SECONDS,
                    CHIME_SECONDS - CHIME_ATTACK_SECONDS,
                )
            };
            let tremolo =
                1.0 - CHIME_LFO_DEPTH * (0.5 + 0.5 * (TAU * CHIME_LFO_HZ * t).sin());

            (filtered * envelope * tremolo).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Plays an effect on the shared audio context. Errors are logged.
pub fn play_effect(effect: Effect) {
    play_effect_on(acquire(), effect);
}

/// Plays an effect on a specific context. Errors are logged.
pub fn play_effect_on(context: &AudioContext, effect: Effect) {
    match try_play(context, effect) {
        Ok(()) => debug!("Playing {} effect", effect),
        // A suspended device would otherwise log once per tick.
        Err(e) if e.is_device_error() => debug!("Skipping {} effect: {}", effect, e),
        Err(e) => warn!("Failed to play {} effect: {}", effect, e),
    }
}

fn try_play(context: &AudioContext, effect: Effect) -> Result<(), SoundError> {
    let sink = context.new_sink()?;
    let sample_rate = context.sample_rate();
    sink.append(SamplesBuffer::new(1, sample_rate, render(effect, sample_rate)));
    sink.detach();
    Ok(())
}

/// Sound effects backed by the procedural renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneSynthesizer;

impl SoundEffects for ToneSynthesizer {
    fn tick(&self) {
        play_effect(Effect::Tick);
    }

    fn focus_end(&self) {
        play_effect(Effect::FocusEnd);
    }

    fn break_end(&self) {
        play_effect(Effect::BreakEnd);
    }
}
