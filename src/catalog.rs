//! Game catalogue port
//!
//! The catalogue and its play counters live in a remote record store. The
//! engines never touch it; the selection layer bumps `play_count` once per
//! session start and the leaderboard lists the most played games.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::highscores::GameId;

/// Size of the "most played" leaderboard
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("game `{0}` not found")]
    NotFound(String),
    #[error("invalid sort key `{0}`")]
    InvalidSort(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub game_url: Option<String>,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub featured: bool,
}

impl GameRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: category.into(),
            thumbnail: None,
            game_url: None,
            play_count: 0,
            featured: false,
        }
    }

    fn apply(&mut self, patch: &GameRecordPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(play_count) = patch.play_count {
            self.play_count = play_count;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
    }
}

/// Partial update; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    PlayCount,
    Title,
    Category,
}

/// Field plus direction, written `field` or `-field` (descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        let s = s.trim();
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "play_count" => SortField::PlayCount,
            "title" => SortField::Title,
            "category" => SortField::Category,
            _ => return Err(CatalogError::InvalidSort(s.to_string())),
        };
        Ok(Self { field, descending })
    }

    pub fn most_played() -> Self {
        Self {
            field: SortField::PlayCount,
            descending: true,
        }
    }

    fn compare(&self, a: &GameRecord, b: &GameRecord) -> Ordering {
        let ord = match self.field {
            SortField::PlayCount => a.play_count.cmp(&b.play_count),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Category => a.category.cmp(&b.category),
        };
        if self.descending { ord.reverse() } else { ord }
    }
}

/// Remote list-and-update record store
pub trait GameCatalog {
    fn list(&self, sort: SortKey, limit: usize) -> Result<Vec<GameRecord>, CatalogError>;

    fn filter(&self, predicate: &dyn Fn(&GameRecord) -> bool) -> Result<Vec<GameRecord>, CatalogError>;

    fn update(&mut self, id: &str, patch: &GameRecordPatch) -> Result<GameRecord, CatalogError>;

    fn get(&self, id: &str) -> Result<GameRecord, CatalogError> {
        self.filter(&|r: &GameRecord| r.id == id)?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }
}

/// Catalogue held in memory, for tests and offline play
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: Vec<GameRecord>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<GameRecord>) -> Self {
        Self { records }
    }

    /// One record per built-in game
    pub fn builtin() -> Self {
        let category = |game: GameId| match game {
            GameId::Reaction | GameId::TapFrenzy => "reflex",
            GameId::Memory => "puzzle",
            GameId::Snake | GameId::Targets => "arcade",
            GameId::Economy => "idle",
        };
        Self::new(
            GameId::ALL
                .into_iter()
                .map(|g| GameRecord::new(g.as_str(), g.title(), category(g)))
                .collect(),
        )
    }
}

impl GameCatalog for InMemoryCatalog {
    fn list(&self, sort: SortKey, limit: usize) -> Result<Vec<GameRecord>, CatalogError> {
        let mut out = self.records.clone();
        // Stable, so ties keep catalogue order
        out.sort_by(|a, b| sort.compare(a, b));
        out.truncate(limit);
        Ok(out)
    }

    fn filter(&self, predicate: &dyn Fn(&GameRecord) -> bool) -> Result<Vec<GameRecord>, CatalogError> {
        Ok(self.records.iter().filter(|r| predicate(r)).cloned().collect())
    }

    fn update(&mut self, id: &str, patch: &GameRecordPatch) -> Result<GameRecord, CatalogError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        record.apply(patch);
        Ok(record.clone())
    }
}

/// Count one play session for `id`
pub fn record_play(catalog: &mut dyn GameCatalog, id: &str) -> Result<u64, CatalogError> {
    let current = catalog.get(id)?;
    let patch = GameRecordPatch {
        play_count: Some(current.play_count + 1),
        ..Default::default()
    };
    let updated = catalog.update(id, &patch)?;
    log::debug!("Play count for {} is now {}", id, updated.play_count);
    Ok(updated.play_count)
}

/// Leaderboard: most played games first
pub fn top_played(catalog: &dyn GameCatalog) -> Result<Vec<GameRecord>, CatalogError> {
    catalog.list(SortKey::most_played(), LEADERBOARD_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InMemoryCatalog {
        let mut records = Vec::new();
        for (i, title) in ["Snake", "Asteroids", "Mind Maze", "Tetris"].iter().enumerate() {
            let mut r = GameRecord::new(format!("g{}", i), *title, if i % 2 == 0 { "arcade" } else { "puzzle" });
            r.play_count = [5, 40, 12, 40][i];
            records.push(r);
        }
        InMemoryCatalog::new(records)
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse("-play_count").unwrap(), SortKey::most_played());
        let title = SortKey::parse("title").unwrap();
        assert_eq!(title.field, SortField::Title);
        assert!(!title.descending);
        assert!(matches!(SortKey::parse("-rating"), Err(CatalogError::InvalidSort(_))));
    }

    #[test]
    fn test_list_sorted_and_limited() {
        let catalog = sample();
        let ids: Vec<_> = catalog
            .list(SortKey::most_played(), 3)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["g1", "g3", "g2"]);

        let titles: Vec<_> = catalog
            .list(SortKey::parse("title").unwrap(), 10)
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["Asteroids", "Mind Maze", "Snake", "Tetris"]);
    }

    #[test]
    fn test_filter_by_category() {
        let catalog = sample();
        let arcade = catalog.filter(&|r: &GameRecord| r.category == "arcade").unwrap();
        assert_eq!(arcade.len(), 2);
    }

    #[test]
    fn test_record_play_increments_once() {
        let mut catalog = sample();
        assert_eq!(record_play(&mut catalog, "g0").unwrap(), 6);
        assert_eq!(catalog.get("g0").unwrap().play_count, 6);
        assert!(matches!(record_play(&mut catalog, "nope"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_patch_leaves_other_fields() {
        let mut catalog = sample();
        let patch = GameRecordPatch {
            featured: Some(true),
            ..Default::default()
        };
        let updated = catalog.update("g2", &patch).unwrap();
        assert!(updated.featured);
        assert_eq!(updated.title, "Mind Maze");
        assert_eq!(updated.play_count, 12);
    }

    #[test]
    fn test_builtin_covers_every_game() {
        let catalog = InMemoryCatalog::builtin();
        for game in GameId::ALL {
            assert_eq!(catalog.get(game.as_str()).unwrap().title, game.title());
        }
        assert_eq!(top_played(&catalog).unwrap().len(), GameId::ALL.len());
    }
}
