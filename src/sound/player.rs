//! Playback controller for ambient tracks.
//!
//! The controller owns at most one live source at a time. Starting a new
//! source always releases the previous one first, so two tracks never play
//! over each other.
//!
//! File-backed tracks load on a background thread. The controller only
//! reports `is_playing` once the loader has handed back a started source;
//! the host calls [`PlaybackController::poll`] from its event loop to pick up
//! finished loads. Bytes of the most recently loaded files are kept so that
//! switching back to one of them starts immediately.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use super::backend::{AudioBackend, RodioBackend, SourceHandle};
use super::error::{PlaybackError, SoundError};
use crate::types::{NoiseKind, PlaybackStatus, SourceDescriptor, Track, TrackKind};

/// Volume for file-backed tracks.
pub const FILE_VOLUME: f32 = 0.7;

/// Number of loaded files whose bytes stay in memory.
pub const MAX_BUFFERED_TRACKS: usize = 2;

/// Result of a background load, tagged with the request it answers.
struct LoadCompletion {
    generation: u64,
    track: Track,
    result: Result<(Arc<[u8]>, Box<dyn SourceHandle>), SoundError>,
}

/// Plays one track at a time.
pub struct PlaybackController<B: AudioBackend = RodioBackend> {
    backend: Arc<B>,
    active_track: Option<Track>,
    is_playing: bool,
    active_source: Option<Box<dyn SourceHandle>>,
    /// Fetched file bytes by track id, most recent last.
    buffered: VecDeque<(String, Arc<[u8]>)>,
    /// Bumped whenever the active source is released; stale loads compare
    /// their generation against `pending`.
    generation: u64,
    pending: Option<u64>,
    completion_tx: Sender<LoadCompletion>,
    completion_rx: Receiver<LoadCompletion>,
}

impl PlaybackController<RodioBackend> {
    /// Creates a controller playing through rodio.
    #[must_use]
    pub fn with_rodio() -> Self {
        Self::new(Arc::new(RodioBackend))
    }
}

impl<B: AudioBackend> PlaybackController<B> {
    /// Creates a controller on the given backend.
    pub fn new(backend: Arc<B>) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self {
            backend,
            active_track: None,
            is_playing: false,
            active_source: None,
            buffered: VecDeque::with_capacity(MAX_BUFFERED_TRACKS),
            generation: 0,
            pending: None,
            completion_tx,
            completion_rx,
        }
    }

    /// Plays, pauses or switches to `track`.
    ///
    /// - Same track while playing: pause. Synthesized sources are released,
    ///   since they cannot be paused cheaply.
    /// - Same file track while paused: resume in place.
    /// - Anything else: release the current source and start `track`.
    ///
    /// An uncached file track returns immediately with `is_playing` still
    /// false; [`poll`](Self::poll) reports when it actually starts.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::LoadFailed` if a cached file cannot be decoded
    /// or the loader thread cannot be spawned.
    pub fn play(&mut self, track: &Track) -> Result<(), PlaybackError> {
        let same_track = self
            .active_track
            .as_ref()
            .is_some_and(|active| active.id == track.id);

        if same_track && self.is_playing {
            match track.kind() {
                TrackKind::File => {
                    if let Some(source) = self.active_source.as_mut() {
                        source.pause();
                    }
                }
                TrackKind::Synth => self.release_source(),
            }
            self.is_playing = false;
            debug!("Paused track '{}'", track.id);
            return Ok(());
        }

        if same_track && track.kind() == TrackKind::File {
            if let Some(source) = self.active_source.as_mut() {
                source.start();
                self.is_playing = true;
                debug!("Resumed track '{}'", track.id);
                return Ok(());
            }
            if self.pending.is_some() {
                debug!("Track '{}' is still loading", track.id);
                return Ok(());
            }
        }

        self.stop_all();
        self.active_track = Some(track.clone());

        match &track.source {
            SourceDescriptor::File(path) => self.start_file(track, path.clone()),
            SourceDescriptor::Synth(kind) => {
                self.start_synth(track, *kind);
                Ok(())
            }
        }
    }

    /// Releases whatever source is active. Safe to call at any time.
    ///
    /// A file load still in flight is abandoned; its source is released
    /// when it arrives.
    pub fn stop_all(&mut self) {
        self.release_source();
        self.is_playing = false;
    }

    /// Picks up finished background loads.
    ///
    /// Returns the outcome for the track currently requested, if its load
    /// finished: `Ok(track)` once it is playing, or the load error.
    pub fn poll(&mut self) -> Option<Result<Track, PlaybackError>> {
        let mut outcome = None;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if let Some(result) = self.handle_completion(completion) {
                outcome = Some(result);
            }
        }
        outcome
    }

    /// Waits up to `timeout` for the pending load to finish.
    ///
    /// Returns `None` if nothing is loading or the timeout elapsed.
    pub fn wait_for_load(&mut self, timeout: Duration) -> Option<Result<Track, PlaybackError>> {
        let deadline = Instant::now() + timeout;
        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completion_rx.recv_timeout(remaining) {
                Ok(completion) => {
                    if let Some(result) = self.handle_completion(completion) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                // The controller holds a sender, so this cannot happen.
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    /// Returns the observable playback state.
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            active_track: self.active_track.clone(),
            is_playing: self.is_playing,
        }
    }

    /// Returns the track currently loaded, if any.
    pub fn active_track(&self) -> Option<&Track> {
        self.active_track.as_ref()
    }

    /// Returns true while audio is actually being produced.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Returns true while a file load is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns cached bytes for `id`, marking them most recently used.
    fn buffered_bytes(&mut self, id: &str) -> Option<Arc<[u8]>> {
        let index = self.buffered.iter().position(|(cached, _)| cached == id)?;
        let entry = self.buffered.remove(index)?;
        let data = Arc::clone(&entry.1);
        self.buffered.push_back(entry);
        Some(data)
    }

    fn remember_bytes(&mut self, id: &str, data: Arc<[u8]>) {
        self.buffered.retain(|(cached, _)| cached != id);
        while self.buffered.len() >= MAX_BUFFERED_TRACKS {
            if let Some((evicted, _)) = self.buffered.pop_front() {
                debug!("Evicted buffered track '{}'", evicted);
            }
        }
        self.buffered.push_back((id.to_string(), data));
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.active_source.take() {
            source.release();
            debug!("Released active source");
        }
        self.generation += 1;
        self.pending = None;
    }

    fn start_synth(&mut self, track: &Track, kind: NoiseKind) {
        match self.backend.open_noise(kind) {
            Ok(mut source) => {
                source.start();
                self.active_source = Some(source);
                self.is_playing = true;
                debug!("Started {} noise for '{}'", kind, track.id);
            }
            Err(e) => {
                // Synthesis failures are silent to the user.
                warn!("Could not synthesize '{}': {}", track.title, e);
                self.is_playing = false;
            }
        }
    }

    fn start_file(&mut self, track: &Track, path: PathBuf) -> Result<(), PlaybackError> {
        if let Some(data) = self.buffered_bytes(&track.id) {
            return match self.backend.open_file(data, FILE_VOLUME) {
                Ok(mut source) => {
                    source.start();
                    self.active_source = Some(source);
                    self.is_playing = true;
                    debug!("Started buffered track '{}'", track.id);
                    Ok(())
                }
                Err(e) => {
                    warn!("Failed to start '{}': {}", track.title, e);
                    self.is_playing = false;
                    Err(PlaybackError::load_failed(&track.title, e))
                }
            };
        }

        let generation = self.generation;
        let backend = Arc::clone(&self.backend);
        let completion_tx = self.completion_tx.clone();
        let loading = track.clone();

        thread::Builder::new()
            .name(format!("track-loader-{}", track.id))
            .spawn(move || {
                let result = backend.fetch(&path).and_then(|data| {
                    let source = backend.open_file(Arc::clone(&data), FILE_VOLUME)?;
                    Ok((data, source))
                });
                // The controller may already be gone; dropping the result
                // releases the source.
                let _ = completion_tx.send(LoadCompletion {
                    generation,
                    track: loading,
                    result,
                });
            })
            .map_err(|source| PlaybackError::LoaderUnavailable {
                title: track.title.clone(),
                source,
            })?;

        self.pending = Some(generation);
        debug!("Loading track '{}'", track.id);
        Ok(())
    }

    fn handle_completion(&mut self, completion: LoadCompletion) -> Option<Result<Track, PlaybackError>> {
        let LoadCompletion {
            generation,
            track,
            result,
        } = completion;

        if self.pending != Some(generation) {
            if let Ok((_, mut source)) = result {
                source.release();
            }
            debug!("Discarded stale load of '{}'", track.id);
            return None;
        }
        self.pending = None;

        match result {
            Ok((data, mut source)) => {
                self.remember_bytes(&track.id, data);
                source.start();
                self.active_source = Some(source);
                self.is_playing = true;
                debug!("Started track '{}'", track.id);
                Some(Ok(track))
            }
            Err(e) => {
                warn!("Failed to load '{}': {}", track.title, e);
                self.is_playing = false;
                Some(Err(PlaybackError::load_failed(&track.title, e)))
            }
        }
    }
}

impl<B: AudioBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl<B: AudioBackend> std::fmt::Debug for PlaybackController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("active_track", &self.active_track.as_ref().map(|t| &t.id))
            .field("is_playing", &self.is_playing)
            .field("is_loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}
