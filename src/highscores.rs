//! High score records
//!
//! One best value per game, or one per variant for parameterized games
//! (Tap Frenzy keys its records by session duration). Saving is a monotone
//! max in the game's ranking direction, never a blind overwrite.
//!
//! Persisted layout: one storage key per game id holding either a JSON number
//! or an object mapping variant key to number.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::persistence::{self, MemoryStorage, Storage};

/// Prefix for every key this crate writes
pub const STORAGE_PREFIX: &str = "arcade.";

/// Stable identifier of each mini-game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    Reaction,
    Memory,
    TapFrenzy,
    Snake,
    Targets,
    Economy,
}

impl GameId {
    pub const ALL: [GameId; 6] = [
        GameId::Reaction,
        GameId::Memory,
        GameId::TapFrenzy,
        GameId::Snake,
        GameId::Targets,
        GameId::Economy,
    ];

    /// Stable string id (also the catalogue id)
    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::Reaction => "reaction",
            GameId::Memory => "memory",
            GameId::TapFrenzy => "clicker",
            GameId::Snake => "snake",
            GameId::Targets => "fps",
            GameId::Economy => "cookie",
        }
    }

    pub fn from_id(s: &str) -> Option<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        GameId::ALL.into_iter().find(|g| g.as_str() == wanted)
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameId::Reaction => "Lightning Reflexes",
            GameId::Memory => "Mind Maze",
            GameId::TapFrenzy => "Tap Frenzy",
            GameId::Snake => "Snake",
            GameId::Targets => "Defend the Window",
            GameId::Economy => "Cookie Clicker",
        }
    }

    /// Which direction counts as an improvement
    pub fn ranking(&self) -> Ranking {
        match self {
            GameId::Reaction => Ranking::LowerIsBetter,
            _ => Ranking::HigherIsBetter,
        }
    }

    /// Storage key of the best-score record
    pub fn score_key(&self) -> String {
        format!("{}{}", STORAGE_PREFIX, self.as_str())
    }

    /// Storage key of a whole-engine save
    pub fn state_key(&self) -> String {
        format!("{}{}.save", STORAGE_PREFIX, self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ranking {
    HigherIsBetter,
    LowerIsBetter,
}

impl Ranking {
    /// Strict improvement test
    pub fn beats(&self, candidate: u64, current: u64) -> bool {
        match self {
            Ranking::HigherIsBetter => candidate > current,
            Ranking::LowerIsBetter => candidate < current,
        }
    }
}

/// Composite record key: game plus optional variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreKey {
    pub game: GameId,
    pub variant: Option<String>,
}

impl ScoreKey {
    pub fn new(game: GameId) -> Self {
        Self {
            game,
            variant: None,
        }
    }

    pub fn with_variant(game: GameId, variant: impl ToString) -> Self {
        Self {
            game,
            variant: Some(variant.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredScore {
    Single(u64),
    Variants(BTreeMap<String, u64>),
}

/// Best-score records over a storage backend
pub struct ScoreStore {
    storage: Box<dyn Storage>,
}

impl ScoreStore {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Non-durable store, used by tests and when no backend is available
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Best value for `key`, or `None` when no record exists yet
    pub fn load(&self, key: &ScoreKey) -> Option<u64> {
        let stored: StoredScore = persistence::read_json(self.storage.as_ref(), &key.game.score_key())?;
        match (stored, &key.variant) {
            (StoredScore::Single(value), None) => Some(value),
            (StoredScore::Variants(map), Some(variant)) => map.get(variant).copied(),
            _ => {
                log::warn!(
                    "Score record for `{}` has an unexpected shape, ignoring",
                    key.game.as_str()
                );
                None
            }
        }
    }

    /// Whether `value` would replace the current record
    pub fn is_new_best(&self, key: &ScoreKey, value: u64) -> bool {
        match self.load(key) {
            None => true,
            Some(current) => key.game.ranking().beats(value, current),
        }
    }

    /// Persist `value` if it beats the current record (or none exists).
    /// Returns whether it was a new best. Write failures are logged only.
    pub fn save(&mut self, key: &ScoreKey, value: u64) -> bool {
        if !self.is_new_best(key, value) {
            return false;
        }

        let storage_key = key.game.score_key();
        let stored = match &key.variant {
            None => StoredScore::Single(value),
            Some(variant) => {
                let mut map = match persistence::read_json(self.storage.as_ref(), &storage_key) {
                    Some(StoredScore::Variants(map)) => map,
                    _ => BTreeMap::new(),
                };
                map.insert(variant.clone(), value);
                StoredScore::Variants(map)
            }
        };

        match persistence::write_json(self.storage.as_mut(), &storage_key, &stored) {
            Ok(()) => log::info!(
                "New best for {}{}: {}",
                key.game.as_str(),
                key.variant
                    .as_deref()
                    .map(|v| format!(" ({})", v))
                    .unwrap_or_default(),
                value
            ),
            Err(e) => log::warn!("Failed to save score for {}: {}", key.game.as_str(), e),
        }
        true
    }

    /// Load a whole-engine save; malformed or outdated saves read as `None`
    pub fn load_state<T: DeserializeOwned>(&self, game: GameId) -> Option<T> {
        persistence::read_versioned(self.storage.as_ref(), &game.state_key())
    }

    pub fn save_state<T: Serialize>(&mut self, game: GameId, state: &T) {
        if let Err(e) = persistence::write_versioned(self.storage.as_mut(), &game.state_key(), state) {
            log::warn!("Failed to save {} state: {}", game.as_str(), e);
        }
    }

    /// Drop the record and any save for `game`
    pub fn clear(&mut self, game: GameId) {
        for key in [game.score_key(), game.state_key()] {
            if let Err(e) = self.storage.remove(&key) {
                log::warn!("Failed to clear `{}`: {}", key, e);
            }
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn Storage {
        self.storage.as_mut()
    }
}
