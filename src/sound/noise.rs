//! Procedural noise synthesis.
//!
//! Noise is rendered once into a two-second mono buffer and looped forever.
//! All three algorithms are stationary, so the loop point at the end of the
//! buffer needs no crossfade.
//!
//! | Kind  | Algorithm                                                  |
//! |-------|------------------------------------------------------------|
//! | White | independent uniform samples in [-1, 1]                     |
//! | Pink  | Paul Kellet's 6-pole filter over white noise, scaled ×0.11 |
//! | Brown | leaky integrator `(last + 0.02·w) / 1.02`, scaled ×3.5     |

use rand::Rng;
use rodio::buffer::SamplesBuffer;
use rodio::{Sink, Source};
use tracing::debug;

use super::context::{acquire, AudioContext};
use super::error::SoundError;
use crate::types::NoiseKind;

/// Length of the looped noise buffer in seconds.
pub const NOISE_BUFFER_SECONDS: u32 = 2;

/// Gain applied to synthesized noise, which is loud at full scale.
pub const DEFAULT_NOISE_GAIN: f32 = 0.3;

/// Pink filter pole feedback weights (b0..b5).
const PINK_FEEDBACK: [f32; 6] = [0.99886, 0.99332, 0.96900, 0.86650, 0.55000, -0.7616];

/// Pink filter input weights (b0..b5).
const PINK_INPUT: [f32; 6] = [
    0.055_517_9,
    0.075_075_9,
    0.153_852_0,
    0.310_485_6,
    0.532_952_2,
    -0.016_898_0,
];

/// Direct white-noise weight in the pink sum.
const PINK_DIRECT: f32 = 0.5362;

/// Weight of the one-sample-lagged white term (b6).
const PINK_LAG: f32 = 0.115_926;

/// Output scale compensating the pink filter gain.
const PINK_SCALE: f32 = 0.11;

/// Input weight of the brown integrator.
const BROWN_STEP: f32 = 0.02;

/// Leak divisor of the brown integrator.
const BROWN_LEAK: f32 = 1.02;

/// Output scale compensating the brown integrator gain.
const BROWN_SCALE: f32 = 3.5;

/// Fills a buffer of `len` samples with noise of the given kind.
pub fn noise_buffer(kind: NoiseKind, len: usize, rng: &mut impl Rng) -> Vec<f32> {
    let mut white = move || rng.random_range(-1.0f32..=1.0);

    match kind {
        NoiseKind::White => (0..len).map(|_| white()).collect(),
        NoiseKind::Pink => {
            let mut poles = [0.0f32; 6];
            let mut lagged = 0.0f32;
            (0..len)
                .map(|_| {
                    let w = white();
                    for ((pole, feedback), input) in
                        poles.iter_mut().zip(PINK_FEEDBACK).zip(PINK_INPUT)
                    {
                        *pole = feedback * *pole + w * input;
                    }
                    let sum: f32 = poles.iter().sum::<f32>() + lagged + w * PINK_DIRECT;
                    lagged = w * PINK_LAG;
                    sum * PINK_SCALE
                })
                .collect()
        }
        NoiseKind::Brown => {
            let mut last = 0.0f32;
            (0..len)
                .map(|_| {
                    last = (last + BROWN_STEP * white()) / BROWN_LEAK;
                    last * BROWN_SCALE
                })
                .collect()
        }
    }
}

/// A looping noise source with its own gain, created paused.
///
/// Dropping the source stops it.
pub struct LoopableSource {
    sink: Sink,
    kind: NoiseKind,
    started: bool,
}

impl LoopableSource {
    /// Starts (or resumes) playback.
    pub fn start(&mut self) {
        self.sink.play();
        self.started = true;
    }

    /// Pauses playback without releasing the buffer.
    pub fn pause(&mut self) {
        self.sink.pause();
    }

    /// Stops playback and releases the queued buffer. Safe before `start`.
    pub fn stop(&mut self) {
        self.sink.stop();
    }

    /// Returns true once `start` has been called.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns the current gain.
    pub fn gain(&self) -> f32 {
        self.sink.volume()
    }

    /// Sets the gain.
    pub fn set_gain(&self, gain: f32) {
        self.sink.set_volume(gain);
    }

    /// Returns the noise kind.
    pub fn kind(&self) -> NoiseKind {
        self.kind
    }
}

impl std::fmt::Debug for LoopableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopableSource")
            .field("kind", &self.kind)
            .field("started", &self.started)
            .field("gain", &self.gain())
            .finish()
    }
}

/// Synthesizes a looping noise source on the shared audio context.
///
/// The source is returned paused at [`DEFAULT_NOISE_GAIN`]; the caller
/// starts it.
///
/// # Errors
///
/// Returns an error if the audio context is suspended or refuses a sink.
pub fn synthesize(kind: NoiseKind) -> Result<LoopableSource, SoundError> {
    synthesize_on(acquire(), kind)
}

/// Synthesizes a looping noise source on a specific context.
///
/// # Errors
///
/// Returns an error if the context is suspended or refuses a sink.
pub fn synthesize_on(context: &AudioContext, kind: NoiseKind) -> Result<LoopableSource, SoundError> {
    let sink = context.new_sink()?;
    sink.pause();
    sink.set_volume(DEFAULT_NOISE_GAIN);

    let sample_rate = context.sample_rate();
    let len = (NOISE_BUFFER_SECONDS * sample_rate) as usize;
    let samples = noise_buffer(kind, len, &mut rand::rng());
    sink.append(SamplesBuffer::new(1, sample_rate, samples).repeat_infinite());

    debug!("Synthesized {} noise ({} samples)", kind, len);
    Ok(LoopableSource {
        sink,
        kind,
        started: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const LEN: usize = 2 * 44_100;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    fn mean_square_step(samples: &[f32]) -> f32 {
        let sum: f32 = samples.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
        sum / (samples.len() - 1) as f32
    }

    #[test]
    fn test_buffer_length() {
        for kind in [NoiseKind::White, NoiseKind::Pink, NoiseKind::Brown] {
            assert_eq!(noise_buffer(kind, LEN, &mut rng()).len(), LEN);
        }
    }

    #[test]
    fn test_white_noise_is_bounded() {
        let samples = noise_buffer(NoiseKind::White, LEN, &mut rng());
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_white_noise_is_roughly_centered() {
        let samples = noise_buffer(NoiseKind::White, LEN, &mut rng());
        let mean: f32 = samples.iter().sum::<f32>() / LEN as f32;
        assert!(mean.abs() < 0.02, "mean was {}", mean);
    }

    #[test]
    fn test_brown_noise_is_smoother_than_white() {
        let white = noise_buffer(NoiseKind::White, LEN, &mut rng());
        let brown = noise_buffer(NoiseKind::Brown, LEN, &mut rng());
        assert!(mean_square_step(&brown) < mean_square_step(&white));
    }

    #[test]
    fn test_pink_noise_sits_between_white_and_brown() {
        let white = noise_buffer(NoiseKind::White, LEN, &mut rng());
        let pink = noise_buffer(NoiseKind::Pink, LEN, &mut rng());
        let brown = noise_buffer(NoiseKind::Brown, LEN, &mut rng());
        let pink_step = mean_square_step(&pink);
        assert!(pink_step < mean_square_step(&white));
        assert!(pink_step > mean_square_step(&brown));
    }

    #[test]
    fn test_colored_noise_stays_in_range() {
        for kind in [NoiseKind::Pink, NoiseKind::Brown] {
            let samples = noise_buffer(kind, LEN, &mut rng());
            assert!(samples.iter().all(|s| s.is_finite() && s.abs() < 1.5));
        }
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let a = noise_buffer(NoiseKind::Pink, 1024, &mut rng());
        let b = noise_buffer(NoiseKind::Pink, 1024, &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_brown_sample_follows_integrator() {
        let mut expected_rng = rng();
        let w: f32 = expected_rng.random_range(-1.0f32..=1.0);
        let samples = noise_buffer(NoiseKind::Brown, 1, &mut rng());
        let expected = (BROWN_STEP * w) / BROWN_LEAK * BROWN_SCALE;
        assert!((samples[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_synthesize_on_suspended_context_fails() {
        let context = AudioContext::suspended();
        let err = synthesize_on(&context, NoiseKind::Brown).unwrap_err();
        assert!(err.is_device_error());
    }
}
