//! Audio player pool
//!
//! Owns every [`AudioPlayer`] keyed by its logical id and arbitrates which
//! one is audible. Unless concurrent playback is allowed, starting a player
//! pauses every other playing player before the new one becomes active.
//!
//! The pool is constructed explicitly and handed to whoever needs it;
//! players keep only a weak reference back to it.

use super::driver::DriverFactory;
use super::playback::AudioPlayer;
use crate::models::AudioDescriptor;
use crate::settings::AudioSettings;
use crate::state::StateStore;
use anyhow::Result;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Published state of the pool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioPlayerPoolState {
    /// Player currently allowed to be audible
    pub active_audio_player: Option<AudioPlayer>,
}

pub(crate) struct PoolShared {
    players: Mutex<HashMap<String, AudioPlayer>>,
    state: StateStore<AudioPlayerPoolState>,
    allow_concurrent_audio_playback: bool,
    playback_rates: Vec<f64>,
    driver_factory: Option<Arc<dyn DriverFactory>>,
}

/// Registry and playback arbitration for audio players.
///
/// Cheap to clone; clones refer to the same pool.
#[derive(Clone)]
pub struct AudioPlayerPool {
    shared: Arc<PoolShared>,
}

impl AudioPlayerPool {
    pub fn new(settings: &AudioSettings) -> Self {
        Self::build(settings, None)
    }

    /// Create a driver for each new player through `factory`.
    ///
    /// The factory must not call back into the pool.
    pub fn with_driver_factory(settings: &AudioSettings, factory: Arc<dyn DriverFactory>) -> Self {
        Self::build(settings, Some(factory))
    }

    fn build(settings: &AudioSettings, driver_factory: Option<Arc<dyn DriverFactory>>) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                players: Mutex::new(HashMap::new()),
                state: StateStore::default(),
                allow_concurrent_audio_playback: settings.allow_concurrent_audio_playback,
                playback_rates: settings.playback_rates.clone(),
                driver_factory,
            }),
        }
    }

    pub(crate) fn upgrade(weak: &Weak<PoolShared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    fn players(&self) -> MutexGuard<'_, HashMap<String, AudioPlayer>> {
        self.shared
            .players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Observable pool state
    pub fn state(&self) -> &StateStore<AudioPlayerPoolState> {
        &self.shared.state
    }

    pub fn allows_concurrent_playback(&self) -> bool {
        self.shared.allow_concurrent_audio_playback
    }

    pub fn active_player(&self) -> Option<AudioPlayer> {
        self.shared
            .state
            .select(|state| state.active_audio_player.clone())
    }

    pub fn player(&self, id: &str) -> Option<AudioPlayer> {
        self.players().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.players().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players().is_empty()
    }

    /// Return the player for `descriptor.id`, creating it on first use
    pub fn get_or_add_player(&self, descriptor: &AudioDescriptor) -> AudioPlayer {
        let mut players = self.players();
        if let Some(player) = players.get(&descriptor.id) {
            return player.clone();
        }

        let player = AudioPlayer::new(descriptor, self.shared.playback_rates.clone());
        player.set_pool(Arc::downgrade(&self.shared));

        if let Some(factory) = &self.shared.driver_factory {
            match factory.create(descriptor) {
                Ok(driver) => player.attach_driver(driver),
                Err(e) => warn!(
                    "Failed to create playback driver for {}: {}",
                    descriptor.id, e
                ),
            }
        }

        debug!("Added audio player {}", descriptor.id);
        players.insert(descriptor.id.clone(), player.clone());
        player
    }

    /// Make `id` the active player.
    ///
    /// Without concurrent playback every other playing player is paused
    /// first; the active pointer only moves once those pauses succeeded.
    pub fn request_play(&self, id: &str) -> Result<()> {
        let Some(requested) = self.player(id) else {
            debug!("Play requested for unknown audio player {}", id);
            return Ok(());
        };

        if !self.shared.allow_concurrent_audio_playback {
            let mut playing: Vec<AudioPlayer> = self
                .players()
                .values()
                .filter(|player| player.id() != id && player.is_playing())
                .cloned()
                .collect();
            // The active player goes first
            let active = self.active_player();
            playing.sort_by_key(|player| Some(player) != active.as_ref());

            for player in playing {
                debug!("Pausing {} before playing {}", player.id(), id);
                player.pause()?;
            }
        }

        self.shared.state.next(AudioPlayerPoolState {
            active_audio_player: Some(requested),
        });
        Ok(())
    }

    /// Clear the active player
    pub fn notify_paused(&self) {
        self.shared.state.next(AudioPlayerPoolState::default());
    }

    /// Detach and forget the player for `id`
    pub fn remove_player(&self, id: &str) {
        let Some(player) = self.players().remove(id) else {
            return;
        };
        self.retire(&player);
        debug!("Removed audio player {}", id);
    }

    /// Remove every player
    pub fn clear(&self) {
        let players: Vec<AudioPlayer> = self.players().drain().map(|(_, p)| p).collect();
        for player in &players {
            self.retire(player);
        }
        self.shared.state.next(AudioPlayerPoolState::default());
    }

    fn retire(&self, player: &AudioPlayer) {
        player.on_remove();
        player.set_pool(Weak::new());
        if self.active_player().as_ref() == Some(player) {
            self.notify_paused();
        }
    }
}
