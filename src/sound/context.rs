//! Process-wide audio context.
//!
//! The context is created lazily by the first call to [`acquire`] and lives
//! for the rest of the process. The rodio `OutputStream` is owned by a
//! dedicated device thread; the context only keeps the stream handle used to
//! create sinks.
//!
//! If the output device cannot be opened the context is *suspended*: sinks
//! cannot be created and every sound request degrades to silence. Each
//! `acquire()` on a suspended context posts a non-blocking resume request,
//! which makes the device thread retry opening the output.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use rodio::buffer::SamplesBuffer;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn, Level};

use super::error::SoundError;

/// Sample rate used when the device does not report one.
pub const FALLBACK_SAMPLE_RATE: u32 = 44_100;

static CONTEXT: OnceLock<AudioContext> = OnceLock::new();

/// Returns the process-wide audio context, creating it on first use.
///
/// A suspended context is returned as well; callers must tolerate sounds
/// being dropped until the device comes back.
pub fn acquire() -> &'static AudioContext {
    let context = CONTEXT.get_or_init(AudioContext::start);
    context.resume_if_suspended();
    context
}

/// Whether the context currently has a live output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Suspended,
}

#[derive(Debug, PartialEq, Eq)]
enum DeviceCommand {
    Resume,
}

/// Which attempt at opening the output device is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenAttempt {
    First,
    Retry,
}

impl OpenAttempt {
    /// Level for a failed attempt. Only the first failure is a warning;
    /// retries happen on every `acquire()` while suspended.
    fn failure_level(self) -> Level {
        match self {
            OpenAttempt::First => Level::WARN,
            OpenAttempt::Retry => Level::DEBUG,
        }
    }
}

/// State shared between the context and its device thread.
struct Shared {
    handle: RwLock<Option<OutputStreamHandle>>,
    sample_rate: AtomicU32,
}

/// The shared audio processing context.
pub struct AudioContext {
    shared: Arc<Shared>,
    commands: Option<Sender<DeviceCommand>>,
    has_unlocked: AtomicBool,
}

impl AudioContext {
    /// Spawns the device thread and waits for its first open attempt.
    fn start() -> Self {
        let shared = Arc::new(Shared {
            handle: RwLock::new(None),
            sample_rate: AtomicU32::new(FALLBACK_SAMPLE_RATE),
        });

        // One pending resume request is enough; extra requests are dropped.
        let (command_tx, command_rx) = bounded(1);
        let (ready_tx, ready_rx) = bounded(1);

        let thread_shared = Arc::clone(&shared);
        let spawned = thread::Builder::new()
            .name("audio-device".to_string())
            .spawn(move || device_loop(thread_shared, command_rx, ready_tx));

        let commands = match spawned {
            Ok(_) => {
                let _ = ready_rx.recv();
                Some(command_tx)
            }
            Err(e) => {
                warn!("Failed to spawn audio device thread, sound disabled: {}", e);
                None
            }
        };

        Self {
            shared,
            commands,
            has_unlocked: AtomicBool::new(false),
        }
    }

    /// Creates a context with no device thread. It stays suspended forever.
    #[cfg(test)]
    pub(crate) fn suspended() -> Self {
        Self::detached(None)
    }

    /// Creates a suspended context whose resume requests go to `commands`.
    #[cfg(test)]
    fn with_commands(commands: Sender<DeviceCommand>) -> Self {
        Self::detached(Some(commands))
    }

    #[cfg(test)]
    fn detached(commands: Option<Sender<DeviceCommand>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                handle: RwLock::new(None),
                sample_rate: AtomicU32::new(FALLBACK_SAMPLE_RATE),
            }),
            commands,
            has_unlocked: AtomicBool::new(false),
        }
    }

    /// Returns whether the output stream is live.
    pub fn state(&self) -> ContextState {
        let handle = self.shared.handle.read().unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            ContextState::Running
        } else {
            ContextState::Suspended
        }
    }

    /// Returns the output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.shared.sample_rate.load(Ordering::Relaxed)
    }

    fn resume_if_suspended(&self) {
        if self.state() == ContextState::Suspended {
            self.request_resume();
        }
    }

    /// Asks the device thread to reopen the output. Never blocks.
    pub fn request_resume(&self) {
        let Some(commands) = &self.commands else {
            return;
        };
        match commands.try_send(DeviceCommand::Resume) {
            Ok(()) => debug!("Audio context resume requested"),
            Err(TrySendError::Full(_)) => debug!("Audio context resume already pending"),
            Err(TrySendError::Disconnected(_)) => warn!("Audio device thread is gone"),
        }
    }

    /// Creates a new sink on the live output stream.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::Suspended` while no device is open, or
    /// `SoundError::Sink` if the stream refuses the sink.
    pub fn new_sink(&self) -> Result<Sink, SoundError> {
        let guard = self.shared.handle.read().unwrap_or_else(PoisonError::into_inner);
        let handle = guard.as_ref().ok_or(SoundError::Suspended)?;
        Ok(Sink::try_new(handle)?)
    }

    /// Plays an empty buffer once to satisfy platforms that gate audio
    /// behind a first user gesture.
    ///
    /// Returns false if the context was already unlocked.
    pub fn unlock(&self) -> bool {
        if self.has_unlocked.swap(true, Ordering::SeqCst) {
            return false;
        }

        match self.new_sink() {
            Ok(sink) => {
                sink.append(SamplesBuffer::new(1, self.sample_rate(), Vec::<f32>::new()));
                sink.detach();
                debug!("Audio context unlocked");
            }
            Err(e) => debug!("Unlock skipped: {}", e),
        }
        true
    }

    /// Returns true once `unlock` has been called.
    pub fn has_unlocked(&self) -> bool {
        self.has_unlocked.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioContext")
            .field("state", &self.state())
            .field("sample_rate", &self.sample_rate())
            .field("has_unlocked", &self.has_unlocked())
            .finish_non_exhaustive()
    }
}

/// Owns the output stream for the lifetime of the process.
fn device_loop(shared: Arc<Shared>, commands: Receiver<DeviceCommand>, ready: Sender<()>) {
    let mut stream = open_output(&shared, OpenAttempt::First);
    let _ = ready.send(());

    for command in commands.iter() {
        match command {
            DeviceCommand::Resume => {
                if stream.is_none() {
                    stream = open_output(&shared, OpenAttempt::Retry);
                }
            }
        }
    }
}

fn open_output(shared: &Shared, attempt: OpenAttempt) -> Option<OutputStream> {
    let host = rodio::cpal::default_host();
    let Some(device) = host.default_output_device() else {
        debug!("No default audio output device");
        return None;
    };

    if let Ok(config) = device.default_output_config() {
        shared
            .sample_rate
            .store(config.sample_rate().0, Ordering::Relaxed);
    }

    match OutputStream::try_from_device(&device) {
        Ok((stream, handle)) => {
            *shared.handle.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);
            debug!("Audio output stream initialized");
            Some(stream)
        }
        Err(e) => {
            if attempt.failure_level() == Level::WARN {
                warn!("Audio not available, sound disabled: {}", e);
            } else {
                debug!("Audio still not available: {}", e);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspended_context_state() {
        let context = AudioContext::suspended();
        assert_eq!(context.state(), ContextState::Suspended);
        assert_eq!(context.sample_rate(), FALLBACK_SAMPLE_RATE);
    }

    #[test]
    fn test_suspended_context_refuses_sinks() {
        let context = AudioContext::suspended();
        let err = context.new_sink().err().unwrap();
        assert!(err.is_device_error());
    }

    #[test]
    fn test_resume_request_without_device_thread_is_noop() {
        let context = AudioContext::suspended();
        context.request_resume();
        context.request_resume();
        assert_eq!(context.state(), ContextState::Suspended);
    }

    #[test]
    fn test_repeated_resume_requests_coalesce() {
        let (tx, rx) = bounded(1);
        let context = AudioContext::with_commands(tx);

        context.request_resume();
        context.request_resume();

        assert_eq!(rx.try_recv(), Ok(DeviceCommand::Resume));
        assert_eq!(rx.try_recv(), Err(crossbeam_channel::TryRecvError::Empty));
    }

    #[test]
    fn test_suspended_context_posts_resume() {
        let (tx, rx) = bounded(1);
        let context = AudioContext::with_commands(tx);

        context.resume_if_suspended();
        context.resume_if_suspended();

        assert_eq!(rx.len(), 1);
        assert_eq!(rx.try_recv(), Ok(DeviceCommand::Resume));
    }

    #[test]
    fn test_resume_after_device_thread_exit_does_not_panic() {
        let (tx, rx) = bounded(1);
        let context = AudioContext::with_commands(tx);
        drop(rx);

        context.request_resume();
        context.resume_if_suspended();
        assert_eq!(context.state(), ContextState::Suspended);
    }

    #[test]
    fn test_only_first_open_failure_warns() {
        assert_eq!(OpenAttempt::First.failure_level(), Level::WARN);
        assert_eq!(OpenAttempt::Retry.failure_level(), Level::DEBUG);
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let context = AudioContext::suspended();
        assert!(!context.has_unlocked());
        assert!(context.unlock());
        assert!(context.has_unlocked());
        assert!(!context.unlock());
    }

    #[test]
    fn test_acquire_returns_same_context() {
        // Works with or without audio hardware.
        let first = acquire();
        let second = acquire();
        assert!(std::ptr::eq(first, second));
        assert!(first.sample_rate() > 0);
    }

    #[test]
    fn test_debug_impl() {
        let debug_str = format!("{:?}", AudioContext::suspended());
        assert!(debug_str.contains("AudioContext"));
        assert!(debug_str.contains("Suspended"));
    }
}
