//! Audio output backends for the playback controller.
//!
//! The controller never talks to rodio directly: it fetches, decodes and
//! synthesizes through [`AudioBackend`], and drives the resulting
//! [`SourceHandle`]. `RodioBackend` is the real implementation;
//! `MockAudioBackend` records every handle for tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rodio::{Decoder, Sink};
use tracing::debug;

use super::context::acquire;
use super::error::SoundError;
use super::noise::{synthesize, LoopableSource};
use crate::types::NoiseKind;

/// Exclusive ownership of one audio-producing resource.
///
/// Handles are created paused. `release` must be safe to call on a handle
/// that was never started, and more than once.
pub trait SourceHandle: Send {
    /// Starts or resumes output.
    fn start(&mut self);

    /// Pauses output, keeping the decoder position.
    fn pause(&mut self);

    /// Stops output and frees the underlying resource.
    fn release(&mut self);
}

/// Creates playback sources.
pub trait AudioBackend: Send + Sync + 'static {
    /// Reads a file into memory. May block; called from a loader thread.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::FileNotFound` if the file does not exist.
    fn fetch(&self, path: &Path) -> Result<Arc<[u8]>, SoundError>;

    /// Decodes buffered file data into a paused, endlessly looping source.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::Decode` for unsupported data, or a device
    /// error if no output is available.
    fn open_file(&self, data: Arc<[u8]>, volume: f32) -> Result<Box<dyn SourceHandle>, SoundError>;

    /// Synthesizes a paused, looping noise source.
    ///
    /// # Errors
    ///
    /// Returns a device error if no output is available.
    fn open_noise(&self, kind: NoiseKind) -> Result<Box<dyn SourceHandle>, SoundError>;
}

// ============================================================================
// RodioBackend
// ============================================================================

/// Backend playing through the shared rodio audio context.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioBackend;

/// A decoded file playing on its own sink.
struct FileHandle {
    sink: Sink,
}

impl SourceHandle for FileHandle {
    fn start(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn release(&mut self) {
        self.sink.stop();
    }
}

impl SourceHandle for LoopableSource {
    fn start(&mut self) {
        LoopableSource::start(self);
    }

    fn pause(&mut self) {
        LoopableSource::pause(self);
    }

    fn release(&mut self) {
        self.stop();
    }
}

impl AudioBackend for RodioBackend {
    fn fetch(&self, path: &Path) -> Result<Arc<[u8]>, SoundError> {
        let bytes = std::fs::read(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SoundError::FileNotFound(path.to_path_buf()),
            _ => SoundError::FileRead {
                path: path.to_path_buf(),
                source,
            },
        })?;
        debug!("Fetched {} ({} bytes)", path.display(), bytes.len());
        Ok(bytes.into())
    }

    fn open_file(&self, data: Arc<[u8]>, volume: f32) -> Result<Box<dyn SourceHandle>, SoundError> {
        let decoder =
            Decoder::new_looped(Cursor::new(data)).map_err(|e| SoundError::Decode(e.to_string()))?;

        let sink = acquire().new_sink()?;
        sink.pause();
        sink.set_volume(volume);
        sink.append(decoder);

        Ok(Box::new(FileHandle { sink }))
    }

    fn open_noise(&self, kind: NoiseKind) -> Result<Box<dyn SourceHandle>, SoundError> {
        Ok(Box::new(synthesize(kind)?))
    }
}

// ============================================================================
// MockAudioBackend
// ============================================================================

/// What a mock handle was created from.
#[derive(Debug, Clone, PartialEq)]
pub enum MockSource {
    File { len: usize, volume: f32 },
    Noise(NoiseKind),
}

/// Lifecycle record of one mock handle.
#[derive(Debug, Clone, PartialEq)]
pub struct MockHandleRecord {
    pub source: MockSource,
    pub playing: bool,
    pub released: bool,
    pub start_count: usize,
}

/// Mock backend for testing.
#[derive(Debug, Default)]
pub struct MockAudioBackend {
    files: Mutex<HashMap<PathBuf, Arc<[u8]>>>,
    handles: Arc<Mutex<Vec<MockHandleRecord>>>,
    fetch_count: AtomicUsize,
    fail_decode: AtomicBool,
    device_unavailable: AtomicBool,
}

struct MockHandle {
    index: usize,
    handles: Arc<Mutex<Vec<MockHandleRecord>>>,
}

impl MockHandle {
    fn update(&self, f: impl FnOnce(&mut MockHandleRecord)) {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut handles[self.index]);
    }
}

impl SourceHandle for MockHandle {
    fn start(&mut self) {
        self.update(|record| {
            record.playing = true;
            record.start_count += 1;
        });
    }

    fn pause(&mut self) {
        self.update(|record| record.playing = false);
    }

    fn release(&mut self) {
        self.update(|record| {
            record.playing = false;
            record.released = true;
        });
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        // Mirrors rodio: dropping a sink stops it.
        self.release();
    }
}

impl MockAudioBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers file contents served by `fetch`.
    pub fn add_file(&self, path: impl Into<PathBuf>, data: &[u8]) {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.into(), Arc::from(data));
    }

    /// Makes every `open_file` fail with a decode error.
    pub fn set_fail_decode(&self, fail: bool) {
        self.fail_decode.store(fail, Ordering::SeqCst);
    }

    /// Makes every open fail as if no output device existed.
    pub fn set_device_unavailable(&self, unavailable: bool) {
        self.device_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `fetch` calls so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Every handle ever created, in creation order.
    #[must_use]
    pub fn records(&self) -> Vec<MockHandleRecord> {
        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of handles not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.records().iter().filter(|r| !r.released).count()
    }

    /// Number of handles currently producing sound.
    #[must_use]
    pub fn playing_count(&self) -> usize {
        self.records().iter().filter(|r| r.playing).count()
    }

    fn create_handle(&self, source: MockSource) -> Box<dyn SourceHandle> {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.push(MockHandleRecord {
            source,
            playing: false,
            released: false,
            start_count: 0,
        });
        Box::new(MockHandle {
            index: handles.len() - 1,
            handles: Arc::clone(&self.handles),
        })
    }

    fn check_device(&self) -> Result<(), SoundError> {
        if self.device_unavailable.load(Ordering::SeqCst) {
            return Err(SoundError::DeviceNotAvailable("mock device".to_string()));
        }
        Ok(())
    }
}

impl AudioBackend for MockAudioBackend {
    fn fetch(&self, path: &Path) -> Result<Arc<[u8]>, SoundError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| SoundError::FileNotFound(path.to_path_buf()))
    }

    fn open_file(&self, data: Arc<[u8]>, volume: f32) -> Result<Box<dyn SourceHandle>, SoundError> {
        if self.fail_decode.load(Ordering::SeqCst) {
            return Err(SoundError::Decode("mock decode failure".to_string()));
        }
        self.check_device()?;
        Ok(self.create_handle(MockSource::File {
            len: data.len(),
            volume,
        }))
    }

    fn open_noise(&self, kind: NoiseKind) -> Result<Box<dyn SourceHandle>, SoundError> {
        self.check_device()?;
        Ok(self.create_handle(MockSource::Noise(kind)))
    }
}
