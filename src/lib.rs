//! Arcade Engines - simulation cores for a bundle of casual mini-games
//!
//! Core modules:
//! - `sim`: Timer-driven engines (reaction, sequence memory, tap frenzy, snake,
//!   target gallery, idle economy) and the shared tick clock
//! - `highscores`: Per-game best-score records
//! - `persistence`: Key/value storage backends with corruption recovery
//! - `arcade`: Selection layer that runs exactly one engine at a time
//! - `catalog`: Game catalogue port (list/filter/update, play counts)
//! - `platform`: Browser/native clock and entropy
//! - `tuning`: Data-driven game balance

pub mod arcade;
pub mod audio;
pub mod catalog;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use arcade::{ActiveGame, Arcade, GameInput, GameSnapshot};
pub use highscores::{GameId, Ranking, ScoreKey, ScoreStore};
pub use settings::Settings;
pub use tuning::Tuning;

/// Fixed constants shared across engines
pub mod consts {
    /// Cap on the combo multiplier in the target gallery
    pub const COMBO_CAP: u32 = 5;

    /// Fixed-point scale for economy amounts (1 unit = 1000 milli)
    pub const MILLI_PER_UNIT: u64 = 1000;

    /// Growth factor of upgrade prices per owned unit
    pub const COST_GROWTH: f64 = 1.15;

    /// Sequence alphabet size
    pub const SYMBOL_COUNT: usize = 4;
}
