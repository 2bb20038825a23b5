//! Game simulation engines
//!
//! Every engine is a self-contained state machine driven by exactly two event
//! sources: player input and its own [`TickClock`]. Engines must stay free of
//! rendering and platform dependencies:
//! - Time arrives as host-supplied milliseconds
//! - Ticks are discrete steps, never wall-clock deltas
//! - Randomness comes from a per-session seeded RNG

pub mod clock;
pub mod economy;
pub mod reaction;
pub mod sequence;
pub mod snake;
pub mod tap;
pub mod targets;

use serde::Serialize;

use crate::audio::SoundEffect;
use crate::highscores::{GameId, Ranking, ScoreKey, ScoreStore};

pub use clock::{Fired, TickClock, TimerId};
pub use economy::{EconomyEngine, EconomyInput, EconomySnapshot, EconomyState, Milli, UpgradeKind, upgrade_cost};
pub use reaction::{ReactionEngine, ReactionInput, ReactionOutcome, ReactionPhase, ReactionSnapshot};
pub use sequence::{SequenceEngine, SequenceInput, SequencePhase, SequenceSnapshot, Symbol};
pub use snake::{Cell, Direction, EndCause, SnakeEngine, SnakeInput, SnakePhase, SnakeSnapshot};
pub use tap::{TapDuration, TapEngine, TapInput, TapPhase, TapSnapshot};
pub use targets::{Target, TargetEngine, TargetId, TargetInput, TargetPhase, TargetSize, TargetSnapshot};

/// Side effects an engine reports to its host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    /// Fire-and-forget sound cue
    Sound(SoundEffect),
    /// A terminal transition improved the stored record
    NewBest { key: ScoreKey, value: u64 },
    /// A session reached its terminal state
    SessionOver { game: GameId, score: u64 },
}

/// Operation set shared by every engine
pub trait Engine {
    type Input;
    type Snapshot;

    fn game_id(&self) -> GameId;

    /// Apply one player input at `now_ms`. Timers due at or before `now_ms`
    /// are processed first. Inputs the current state does not accept are
    /// ignored.
    fn handle_input(&mut self, input: Self::Input, now_ms: u64, scores: &mut ScoreStore);

    /// Process every timer due at or before `now_ms`
    fn advance(&mut self, now_ms: u64, scores: &mut ScoreStore);

    /// Read-only view for presentation
    fn snapshot(&self) -> Self::Snapshot;

    /// Cancel every pending timer; no callback fires afterwards
    fn teardown(&mut self, scores: &mut ScoreStore);

    /// Take the events produced since the last call
    fn drain_events(&mut self) -> Vec<GameEvent>;
}

/// Persist a terminal score and report it. Returns whether the stored record
/// changed. A first-ever zero in a higher-is-better game is stored without the
/// `NewBest` fanfare.
pub(crate) fn commit_score(
    scores: &mut ScoreStore,
    key: ScoreKey,
    value: u64,
    events: &mut Vec<GameEvent>,
) -> bool {
    events.push(GameEvent::SessionOver {
        game: key.game,
        score: value,
    });
    let previous = scores.load(&key);
    if !scores.save(&key, value) {
        return false;
    }
    let empty_first = previous.is_none() && value == 0 && key.game.ranking() == Ranking::HigherIsBetter;
    if !empty_first {
        events.push(GameEvent::Sound(SoundEffect::HighScore));
        events.push(GameEvent::NewBest { key, value });
    }
    true
}
