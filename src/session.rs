//! Live game state per owner.
//!
//! The game engine is an external collaborator; this registry is the
//! narrow surface persistence needs from it: read a live game to save it,
//! replace it after a load.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::logging::debug;
use crate::model::{LiveGame, SaveRecord};

/// Anything that can hand out a snapshot of an owner's live game.
pub trait LiveSource: Send + Sync {
    /// A deep copy of the owner's current game, if one is running.
    fn live_game(&self, owner_id: &str) -> Option<LiveGame>;
}

/// In-memory live games keyed by owner.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    games: RwLock<HashMap<String, LiveGame>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the owner's live game.
    pub fn set(&self, owner_id: &str, game: LiveGame) {
        let mut games = self.games.write().unwrap_or_else(PoisonError::into_inner);
        games.insert(owner_id.to_string(), game);
    }

    /// Current live game for an owner.
    pub fn get(&self, owner_id: &str) -> Option<LiveGame> {
        let games = self.games.read().unwrap_or_else(PoisonError::into_inner);
        games.get(owner_id).cloned()
    }

    /// Replace the owner's live game with the contents of a loaded record.
    ///
    /// Only call this with a record that was fully read and parsed.
    pub fn apply_record(&self, record: &SaveRecord) -> LiveGame {
        let game = record.to_live_game();
        self.set(&record.owner_id, game.clone());
        debug!(owner = %record.owner_id, save_id = %record.save_id, "live state restored from save");
        game
    }

    /// Drop an owner's live game.
    pub fn remove(&self, owner_id: &str) -> Option<LiveGame> {
        let mut games = self.games.write().unwrap_or_else(PoisonError::into_inner);
        games.remove(owner_id)
    }
}

impl LiveSource for SessionRegistry {
    fn live_game(&self, owner_id: &str) -> Option<LiveGame> {
        self.get(owner_id)
    }
}
