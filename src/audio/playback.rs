//! Audio playback state machine
//!
//! Each [`AudioPlayer`] tracks playback of one source: whether it is
//! playing, the position/duration/progress triple and the playback rate.
//! Transport is delegated to an attached [`PlaybackDriver`]; every operation
//! is a no-op while no driver is attached.
//!
//! State changes go through [`transition`], a pure reducer, and are
//! published through a [`StateStore`] for rendering layers.

use super::driver::{PitchCorrectionQuality, PlaybackDriver, PlaybackStatus, StatusListener};
use super::pool::{AudioPlayerPool, PoolShared};
use crate::models::{AudioDescriptor, AudioKind};
use crate::state::StateStore;
use anyhow::Result;
use log::{debug, error, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Rates cycled by [`AudioPlayer::change_playback_rate`] unless configured
pub const DEFAULT_PLAYBACK_RATES: [f64; 3] = [1.0, 1.5, 2.0];

/// Published state of one player (times in seconds)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPlayerState {
    pub is_playing: bool,
    pub duration: f64,
    pub position: f64,
    /// Fraction 0.0 - 1.0, always `position / duration` (0 when no duration)
    pub progress: f64,
    pub current_playback_rate: f64,
    pub playback_rates: Vec<f64>,
}

impl AudioPlayerState {
    pub fn initial(playback_rates: Vec<f64>, duration: f64) -> Self {
        let playback_rates = if playback_rates.is_empty() {
            DEFAULT_PLAYBACK_RATES.to_vec()
        } else {
            playback_rates
        };
        Self {
            is_playing: false,
            duration,
            position: 0.0,
            progress: 0.0,
            current_playback_rate: playback_rates[0],
            playback_rates,
        }
    }

    /// Rate following the current one, wrapping around
    pub fn next_playback_rate(&self) -> f64 {
        if self.playback_rates.is_empty() {
            return self.current_playback_rate;
        }
        let current = self
            .playback_rates
            .iter()
            .position(|&rate| rate == self.current_playback_rate)
            .unwrap_or(0);
        let next = (current + 1) % self.playback_rates.len();
        self.playback_rates[next]
    }
}

impl Default for AudioPlayerState {
    fn default() -> Self {
        Self::initial(DEFAULT_PLAYBACK_RATES.to_vec(), 0.0)
    }
}

/// A single write to player state
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    SetPlaying(bool),
    SetDuration(f64),
    /// Drives `position`; `progress` is derived
    SetPosition(f64),
    /// Drives `progress`; `position` is derived
    SetProgress(f64),
    SetPlaybackRate(f64),
    Reset { playback_rates: Vec<f64> },
}

fn progress_of(position: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        position / duration
    } else {
        0.0
    }
}

/// Apply one event to the state
pub fn transition(state: &AudioPlayerState, event: PlayerEvent) -> AudioPlayerState {
    let mut next = state.clone();
    match event {
        PlayerEvent::SetPlaying(is_playing) => next.is_playing = is_playing,
        PlayerEvent::SetDuration(duration) => {
            next.duration = duration;
            next.progress = progress_of(next.position, duration);
        }
        PlayerEvent::SetPosition(position) => {
            next.position = position;
            next.progress = progress_of(position, next.duration);
        }
        PlayerEvent::SetProgress(progress) => {
            next.position = progress * next.duration;
            next.progress = if next.duration > 0.0 { progress } else { 0.0 };
        }
        PlayerEvent::SetPlaybackRate(rate) => next.current_playback_rate = rate,
        PlayerEvent::Reset { playback_rates } => {
            next = AudioPlayerState::initial(playback_rates, 0.0);
        }
    }
    next
}

/// Attached driver tagged with the generation it was attached under
struct DriverHandle {
    generation: u64,
    driver: Box<dyn PlaybackDriver>,
}

struct PlayerInner {
    id: String,
    kind: AudioKind,
    playback_rates: Vec<f64>,
    state: StateStore<AudioPlayerState>,
    driver: Mutex<Option<DriverHandle>>,
    /// Generation of the attached driver, 0 while detached
    attached_generation: AtomicU64,
    next_generation: AtomicU64,
    pool: Mutex<Weak<PoolShared>>,
}

/// Playback state machine for one audio source.
///
/// Cheap to clone; clones share the same state and driver.
#[derive(Clone)]
pub struct AudioPlayer {
    inner: Arc<PlayerInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AudioPlayer {
    /// Create a detached player for `descriptor`
    pub fn new(descriptor: &AudioDescriptor, playback_rates: Vec<f64>) -> Self {
        let initial = AudioPlayerState::initial(playback_rates, descriptor.duration);
        Self {
            inner: Arc::new(PlayerInner {
                id: descriptor.id.clone(),
                kind: descriptor.kind,
                playback_rates: initial.playback_rates.clone(),
                state: StateStore::new(initial),
                driver: Mutex::new(None),
                attached_generation: AtomicU64::new(0),
                next_generation: AtomicU64::new(0),
                pool: Mutex::new(Weak::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> AudioKind {
        self.inner.kind
    }

    /// Observable state for rendering
    pub fn state(&self) -> &StateStore<AudioPlayerState> {
        &self.inner.state
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state.select(|s| s.is_playing)
    }

    pub fn duration(&self) -> f64 {
        self.inner.state.select(|s| s.duration)
    }

    pub fn position(&self) -> f64 {
        self.inner.state.select(|s| s.position)
    }

    pub fn progress(&self) -> f64 {
        self.inner.state.select(|s| s.progress)
    }

    pub fn current_playback_rate(&self) -> f64 {
        self.inner.state.select(|s| s.current_playback_rate)
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached_generation.load(Ordering::SeqCst) != 0
    }

    pub fn set_duration(&self, duration: f64) {
        self.dispatch(PlayerEvent::SetDuration(duration));
    }

    pub fn set_position(&self, position: f64) {
        self.dispatch(PlayerEvent::SetPosition(position));
    }

    pub fn set_progress(&self, progress: f64) {
        self.dispatch(PlayerEvent::SetProgress(progress));
    }

    fn dispatch(&self, event: PlayerEvent) {
        self.inner.state.update(|state| transition(state, event));
    }

    /// Dispatch on behalf of the driver attached under `generation`.
    ///
    /// The generation is checked under the state write lock, so a write
    /// cannot land after [`on_remove`](Self::on_remove) reset the state.
    fn dispatch_from(&self, generation: u64, event: PlayerEvent) -> bool {
        self.inner.state.update_if(|state| {
            let current = self.inner.attached_generation.load(Ordering::SeqCst);
            (current == generation).then(|| transition(state, event))
        })
    }

    pub(crate) fn set_pool(&self, pool: Weak<PoolShared>) {
        *lock(&self.inner.pool) = pool;
    }

    fn pool(&self) -> Option<AudioPlayerPool> {
        AudioPlayerPool::upgrade(&lock(&self.inner.pool))
    }

    /// Run `f` against the attached driver, `None` when detached
    fn with_driver<R>(
        &self,
        f: impl FnOnce(&mut dyn PlaybackDriver) -> Result<R>,
    ) -> Option<Result<R>> {
        let mut slot = lock(&self.inner.driver);
        slot.as_mut().map(|handle| f(handle.driver.as_mut()))
    }

    /// Attach a driver, replacing any previous one.
    ///
    /// Status updates from earlier drivers are ignored from here on.
    pub fn attach_driver(&self, mut driver: Box<dyn PlaybackDriver>) {
        self.release_driver();

        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .attached_generation
            .store(generation, Ordering::SeqCst);

        let weak = Arc::downgrade(&self.inner);
        let listener: StatusListener = Arc::new(move |status| {
            if let Some(inner) = weak.upgrade() {
                AudioPlayer { inner }.handle_status(generation, status);
            }
        });
        driver.set_status_listener(listener);

        *lock(&self.inner.driver) = Some(DriverHandle { generation, driver });
        debug!("Attached driver generation {} to {}", generation, self.id());
    }

    fn release_driver(&self) {
        self.inner.attached_generation.store(0, Ordering::SeqCst);
        let handle = lock(&self.inner.driver).take();
        if let Some(mut handle) = handle {
            if let Err(e) = handle.driver.release() {
                warn!(
                    "Failed to release driver generation {} for {}: {}",
                    handle.generation,
                    self.id(),
                    e
                );
            }
        }
    }

    /// Start playback, silencing other pooled players first
    pub fn play(&self) -> Result<()> {
        if self.is_playing() {
            return Ok(());
        }
        if !self.is_attached() {
            debug!("Play ignored for {}: no driver attached", self.id());
            return Ok(());
        }

        if let Some(pool) = self.pool() {
            pool.request_play(self.id())?;
        }

        if let Some(result) = self.with_driver(|driver| driver.play()) {
            if let Err(e) = result {
                // The pool already points at us; release it
                if let Some(pool) = self.pool() {
                    pool.notify_paused();
                }
                return Err(e);
            }
            self.dispatch(PlayerEvent::SetPlaying(true));
        }
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        if !self.is_playing() {
            return Ok(());
        }
        let Some(result) = self.with_driver(|driver| driver.pause()) else {
            return Ok(());
        };
        result?;

        self.dispatch(PlayerEvent::SetPlaying(false));
        if let Some(pool) = self.pool() {
            pool.notify_paused();
        }
        Ok(())
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        if self.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Seek to `position` seconds; state follows once the driver accepted it
    pub fn seek(&self, position: f64) -> Result<()> {
        let Some(result) = self.with_driver(|driver| {
            if position == 0.0 && driver.replays_on_zero_seek() {
                driver.replay_from_start()
            } else {
                driver.seek(position)
            }
        }) else {
            return Ok(());
        };
        result?;

        self.dispatch(PlayerEvent::SetPosition(position));
        Ok(())
    }

    /// Rewind to the start and pause
    pub fn stop(&self) -> Result<()> {
        self.seek(0.0)?;
        if self.is_playing() {
            return self.pause();
        }

        // A replay restarts transport even if we were already paused
        if let Some(result) = self.with_driver(|driver| {
            if driver.replays_on_zero_seek() {
                driver.pause()
            } else {
                Ok(())
            }
        }) {
            result?;
        }
        Ok(())
    }

    /// Advance to the next configured playback rate
    pub fn change_playback_rate(&self) -> Result<()> {
        let next = self.inner.state.select(|s| s.next_playback_rate());
        self.dispatch(PlayerEvent::SetPlaybackRate(next));

        match self.with_driver(|driver| driver.set_rate(next, true, PitchCorrectionQuality::High)) {
            Some(result) => result,
            None => Ok(()),
        }
    }

    /// Detach the driver and reset to initial state.
    ///
    /// Status updates still in flight from the detached driver are dropped.
    pub fn on_remove(&self) {
        self.release_driver();
        self.dispatch(PlayerEvent::Reset {
            playback_rates: self.inner.playback_rates.clone(),
        });
    }

    fn handle_status(&self, generation: u64, status: PlaybackStatus) {
        if self.inner.attached_generation.load(Ordering::SeqCst) != generation {
            debug!(
                "Dropping stale status from driver generation {} for {}",
                generation,
                self.id()
            );
            return;
        }

        if status.is_preview {
            self.handle_preview_status(generation, &status);
            return;
        }

        if !status.is_loaded {
            if let Some(e) = &status.error {
                error!("Playback error for {}: {}", self.id(), e);
            }
            return;
        }

        let is_voice_recording = self.kind() == AudioKind::VoiceRecording;

        // Recorded clips know their real length better than the decoder
        if !is_voice_recording {
            self.dispatch_from(generation, PlayerEvent::SetDuration(status.duration));
        }

        if status.is_playing {
            let duration = if is_voice_recording {
                self.duration()
            } else {
                status.duration
            };
            if status.position <= duration {
                self.dispatch_from(generation, PlayerEvent::SetPosition(status.position));
            }
        }

        if status.did_just_finish && !status.is_looping {
            self.stop_after_finish();
        }
    }

    fn handle_preview_status(&self, generation: u64, status: &PlaybackStatus) {
        let progress = progress_of(status.position, status.duration);
        if progress >= 1.0 {
            self.stop_after_finish();
        } else {
            self.dispatch_from(generation, PlayerEvent::SetProgress(progress));
        }
    }

    fn stop_after_finish(&self) {
        if let Err(e) = self.stop() {
            error!("Failed to stop {} after playback finished: {}", self.id(), e);
        }
    }
}

impl PartialEq for AudioPlayer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AudioPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPlayer")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("attached", &self.is_attached())
            .field("state", &self.inner.state.get_latest())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::driver::testing::{entries, new_log, ScriptedDriver};
    use super::*;

    fn descriptor(kind: AudioKind, duration: f64) -> AudioDescriptor {
        AudioDescriptor::for_requester("msg", "file:///clip.aac", None, kind)
            .with_duration(duration)
    }

    fn loaded(position: f64, duration: f64) -> PlaybackStatus {
        PlaybackStatus {
            is_loaded: true,
            is_playing: true,
            position,
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn test_position_and_progress_stay_consistent() {
        let state = AudioPlayerState::default();
        let state = transition(&state, PlayerEvent::SetDuration(10.0));
        let state = transition(&state, PlayerEvent::SetPosition(5.0));
        assert_eq!(state.progress, 0.5);

        let state = transition(&state, PlayerEvent::SetProgress(0.25));
        assert_eq!(state.position, 2.5);
        assert_eq!(state.progress, 0.25);

        let state = transition(&state, PlayerEvent::SetDuration(5.0));
        assert_eq!(state.progress, 0.5);
    }

    #[test]
    fn test_progress_is_zero_without_duration() {
        let state = transition(&AudioPlayerState::default(), PlayerEvent::SetPosition(3.0));
        assert_eq!(state.progress, 0.0);
        assert!(!state.progress.is_nan());

        let state = transition(&state, PlayerEvent::SetProgress(0.7));
        assert_eq!(state.position, 0.0);
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn test_playback_rate_cycles() {
        let mut state = AudioPlayerState::default();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let next = state.next_playback_rate();
            state = transition(&state, PlayerEvent::SetPlaybackRate(next));
            seen.push(state.current_playback_rate);
        }
        assert_eq!(seen, vec![1.5, 2.0, 1.0, 1.5]);
    }

    #[test]
    fn test_unknown_current_rate_restarts_cycle() {
        let mut state = AudioPlayerState::initial(vec![0.5, 1.0], 0.0);
        state.current_playback_rate = 3.0;
        assert_eq!(state.next_playback_rate(), 1.0);
    }

    #[test]
    fn test_empty_rate_list_keeps_current_rate() {
        let mut state = AudioPlayerState::default();
        state.playback_rates.clear();
        assert_eq!(state.next_playback_rate(), 1.0);

        let state = transition(&state, PlayerEvent::SetPlaybackRate(state.next_playback_rate()));
        assert_eq!(state.current_playback_rate, 1.0);
    }

    #[test]
    fn test_operations_without_driver_are_noops() {
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
        player.toggle_play_pause().unwrap();
        assert!(!player.is_playing());

        player.seek(4.0).unwrap();
        assert_eq!(player.position(), 0.0);

        player.change_playback_rate().unwrap();
        assert_eq!(player.current_playback_rate(), 1.5);
    }

    #[test]
    fn test_toggle_drives_transport() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
        player.attach_driver(Box::new(ScriptedDriver::new("a", &log)));

        player.toggle_play_pause().unwrap();
        assert!(player.is_playing());
        player.toggle_play_pause().unwrap();
        assert!(!player.is_playing());

        assert_eq!(entries(&log), vec!["a:play", "a:pause"]);
    }

    #[test]
    fn test_seek_updates_position_after_driver() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
        player.attach_driver(Box::new(ScriptedDriver::new("a", &log)));

        player.seek(2.5).unwrap();
        assert_eq!(player.position(), 2.5);
        assert_eq!(player.progress(), 0.25);
        player.seek(0.0).unwrap();
        assert_eq!(entries(&log), vec!["a:seek 2.5", "a:seek 0"]);
    }

    #[test]
    fn test_zero_seek_replays_when_driver_requires_it() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
        player.attach_driver(Box::new(
            ScriptedDriver::new("a", &log).replaying_on_zero_seek(),
        ));

        player.seek(3.0).unwrap();
        player.stop().unwrap();
        assert_eq!(entries(&log), vec!["a:seek 3", "a:replay", "a:pause"]);
        assert_eq!(player.position(), 0.0);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_stop_lands_paused_at_start() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
        player.attach_driver(Box::new(ScriptedDriver::new("a", &log)));

        player.play().unwrap();
        player.seek(7.0).unwrap();
        player.stop().unwrap();

        assert!(!player.is_playing());
        assert_eq!(player.position(), 0.0);
        assert_eq!(player.progress(), 0.0);
    }

    #[test]
    fn test_rate_change_uses_pitch_correction() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![1.0, 2.0]);
        player.attach_driver(Box::new(ScriptedDriver::new("a", &log)));

        player.change_playback_rate().unwrap();
        assert_eq!(player.current_playback_rate(), 2.0);
        assert_eq!(entries(&log), vec!["a:rate 2 true High"]);
    }

    #[test]
    fn test_status_updates_position_and_duration() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 0.0), vec![]);
        let driver = ScriptedDriver::new("a", &log);
        let emitter = driver.emitter();
        player.attach_driver(Box::new(driver));

        emitter.emit(loaded(3.0, 12.0));
        assert_eq!(player.duration(), 12.0);
        assert_eq!(player.position(), 3.0);
        assert_eq!(player.progress(), 0.25);

        // Past the end is ignored
        emitter.emit(loaded(13.0, 12.0));
        assert_eq!(player.position(), 3.0);
    }

    #[test]
    fn test_voice_recording_keeps_own_duration() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::VoiceRecording, 4.0), vec![]);
        let driver = ScriptedDriver::new("a", &log);
        let emitter = driver.emitter();
        player.attach_driver(Box::new(driver));

        emitter.emit(loaded(2.0, 4.3));
        assert_eq!(player.duration(), 4.0);
        assert_eq!(player.progress(), 0.5);

        emitter.emit(loaded(4.2, 4.3));
        assert_eq!(player.position(), 2.0);
    }

    #[test]
    fn test_unloaded_status_is_ignored() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 5.0), vec![]);
        let driver = ScriptedDriver::new("a", &log);
        let emitter = driver.emitter();
        player.attach_driver(Box::new(driver));

        emitter.emit(PlaybackStatus {
            error: Some("decoder crashed".into()),
            position: 1.0,
            ..Default::default()
        });
        assert_eq!(player.duration(), 5.0);
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn test_finish_stops_playback() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 5.0), vec![]);
        let driver = ScriptedDriver::new("a", &log);
        let emitter = driver.emitter();
        player.attach_driver(Box::new(driver));
        player.play().unwrap();

        emitter.emit(PlaybackStatus {
            did_just_finish: true,
            ..loaded(5.0, 5.0)
        });
        assert!(!player.is_playing());
        assert_eq!(player.position(), 0.0);
        assert_eq!(entries(&log), vec!["a:play", "a:seek 0", "a:pause"]);
    }

    #[test]
    fn test_looping_finish_keeps_playing() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 5.0), vec![]);
        let driver = ScriptedDriver::new("a", &log);
        let emitter = driver.emitter();
        player.attach_driver(Box::new(driver));
        player.play().unwrap();

        emitter.emit(PlaybackStatus {
            did_just_finish: true,
            is_looping: true,
            ..loaded(5.0, 5.0)
        });
        assert!(player.is_playing());
    }

    #[test]
    fn test_remove_resets_and_drops_stale_callbacks() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![1.5, 3.0]);
        let driver = ScriptedDriver::new("a", &log);
        let emitter = driver.emitter();
        player.attach_driver(Box::new(driver));
        player.play().unwrap();
        player.change_playback_rate().unwrap();

        player.on_remove();
        let reset = AudioPlayerState::initial(vec![1.5, 3.0], 0.0);
        assert_eq!(player.state().get_latest(), reset);
        assert!(!player.is_attached());

        emitter.emit(loaded(4.0, 10.0));
        assert_eq!(player.state().get_latest(), reset);
        assert_eq!(entries(&log).last().map(String::as_str), Some("a:release"));
    }

    #[test]
    fn test_old_driver_ignored_after_reattach() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 0.0), vec![]);
        let first = ScriptedDriver::new("a", &log);
        let stale = first.emitter();
        player.attach_driver(Box::new(first));
        player.on_remove();

        let second = ScriptedDriver::new("b", &log);
        let fresh = second.emitter();
        player.attach_driver(Box::new(second));

        stale.emit(loaded(1.0, 8.0));
        assert_eq!(player.duration(), 0.0);

        fresh.emit(loaded(2.0, 8.0));
        assert_eq!(player.duration(), 8.0);
        assert_eq!(player.position(), 2.0);
    }

    #[test]
    fn test_driver_writes_recheck_generation_when_applied() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
        player.attach_driver(Box::new(ScriptedDriver::new("a", &log)));

        assert!(player.dispatch_from(1, PlayerEvent::SetPosition(2.0)));
        assert_eq!(player.position(), 2.0);

        player.on_remove();
        assert!(!player.dispatch_from(1, PlayerEvent::SetPosition(4.0)));
        assert_eq!(
            player.state().get_latest(),
            AudioPlayerState::initial(DEFAULT_PLAYBACK_RATES.to_vec(), 0.0)
        );
    }

    #[test]
    fn test_remove_racing_status_thread_ends_reset() {
        let reset = AudioPlayerState::initial(DEFAULT_PLAYBACK_RATES.to_vec(), 0.0);
        for _ in 0..50 {
            let log = new_log();
            let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
            let driver = ScriptedDriver::new("a", &log);
            let emitter = driver.emitter();
            player.attach_driver(Box::new(driver));

            let barrier = Arc::new(std::sync::Barrier::new(2));
            let worker = {
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    for i in 0..100 {
                        emitter.emit(loaded(i as f64 * 0.05, 10.0));
                    }
                })
            };
            barrier.wait();
            player.on_remove();
            worker.join().unwrap();

            assert_eq!(player.state().get_latest(), reset);
        }
    }

    #[test]
    fn test_preview_status_drives_progress() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::VoiceRecording, 8.0), vec![]);
        let driver = ScriptedDriver::new("a", &log);
        let emitter = driver.emitter();
        player.attach_driver(Box::new(driver));

        // Preview reports arrive even before the clip counts as loaded
        emitter.emit(PlaybackStatus {
            is_preview: true,
            position: 2.0,
            duration: 8.0,
            ..Default::default()
        });
        assert_eq!(player.progress(), 0.25);
        assert_eq!(player.position(), 2.0);
        assert_eq!(player.duration(), 8.0);
    }

    #[test]
    fn test_preview_reaching_end_stops() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::VoiceRecording, 8.0), vec![]);
        let driver = ScriptedDriver::new("a", &log);
        let emitter = driver.emitter();
        player.attach_driver(Box::new(driver));
        player.play().unwrap();

        emitter.emit(PlaybackStatus {
            is_preview: true,
            position: 8.0,
            duration: 8.0,
            ..Default::default()
        });
        assert!(!player.is_playing());
        assert_eq!(player.progress(), 0.0);
        assert_eq!(entries(&log), vec!["a:play", "a:seek 0", "a:pause"]);
    }

    #[test]
    fn test_failed_play_leaves_state_paused() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
        player.attach_driver(Box::new(ScriptedDriver::new("a", &log).failing_play()));

        assert!(player.play().is_err());
        assert!(!player.is_playing());
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_state_is_observable() {
        let log = new_log();
        let player = AudioPlayer::new(&descriptor(AudioKind::Audio, 10.0), vec![]);
        player.attach_driver(Box::new(ScriptedDriver::new("a", &log)));
        let mut receiver = player.state().subscribe();

        player.play().unwrap();
        receiver.changed().await.unwrap();
        assert!(receiver.borrow().is_playing);
    }
}
