//! Tap Frenzy: count taps against a shrinking budget
//!
//! The budget is tracked in tenths of a second. Every tick removes one unit,
//! every tap removes a fixed penalty on top, so tapping makes the clock run out
//! faster. Reaching zero is the only way a session ends.

use serde::{Deserialize, Serialize};

use super::clock::TickClock;
use super::{Engine, GameEvent, commit_score};
use crate::audio::SoundEffect;
use crate::highscores::{GameId, ScoreKey, ScoreStore};
use crate::tuning::TapTuning;

/// Selectable session length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TapDuration {
    #[default]
    Ten,
    Fifty,
    Hundred,
}

impl TapDuration {
    pub const ALL: [TapDuration; 3] = [TapDuration::Ten, TapDuration::Fifty, TapDuration::Hundred];

    pub fn secs(self) -> u32 {
        match self {
            TapDuration::Ten => 10,
            TapDuration::Fifty => 50,
            TapDuration::Hundred => 100,
        }
    }

    pub fn from_secs(secs: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.secs() == secs)
    }

    /// Starting budget in tenths of a second
    pub fn budget_tenths(self) -> u32 {
        self.secs() * 10
    }

    /// Variant key of the duration's record
    pub fn variant_key(self) -> String {
        self.secs().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapPhase {
    Idle,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapInput {
    SelectDuration(TapDuration),
    Start,
    Tap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TapTimer {
    Tick,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapSnapshot {
    pub phase: TapPhase,
    pub duration: TapDuration,
    /// Remaining budget in tenths of a second
    pub budget: u32,
    pub count: u64,
    pub best: Option<u64>,
    /// Set when the finished session beat the previous record
    pub new_best: bool,
}

pub struct TapEngine {
    tuning: TapTuning,
    clock: TickClock<TapTimer>,
    phase: TapPhase,
    duration: TapDuration,
    budget: u32,
    count: u64,
    ticks: u64,
    best: Option<u64>,
    new_best: bool,
    events: Vec<GameEvent>,
}

impl TapEngine {
    pub fn new(tuning: TapTuning, duration: TapDuration, now_ms: u64, scores: &ScoreStore) -> Self {
        Self {
            tuning,
            clock: TickClock::new(now_ms),
            phase: TapPhase::Idle,
            duration,
            budget: duration.budget_tenths(),
            count: 0,
            ticks: 0,
            best: scores.load(&Self::score_key(duration)),
            new_best: false,
            events: Vec::new(),
        }
    }

    fn score_key(duration: TapDuration) -> ScoreKey {
        ScoreKey::with_variant(GameId::TapFrenzy, duration.variant_key())
    }

    pub fn phase(&self) -> TapPhase {
        self.phase
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Ticks processed in the current session
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn select(&mut self, duration: TapDuration, scores: &ScoreStore) {
        self.duration = duration;
        self.phase = TapPhase::Idle;
        self.budget = duration.budget_tenths();
        self.count = 0;
        self.new_best = false;
        self.best = scores.load(&Self::score_key(duration));
    }

    fn start(&mut self) {
        self.clock.cancel_all();
        self.phase = TapPhase::Playing;
        self.budget = self.duration.budget_tenths();
        self.count = 0;
        self.ticks = 0;
        self.new_best = false;
        self.clock.every(self.tuning.tick_ms, TapTimer::Tick);
        log::debug!("Tap Frenzy started ({}s)", self.duration.secs());
    }

    fn finish(&mut self, scores: &mut ScoreStore) {
        self.clock.cancel_all();
        self.phase = TapPhase::Finished;
        self.new_best = self.count > self.best.unwrap_or(0);
        log::info!(
            "Tap Frenzy finished: {} taps in {}s",
            self.count,
            self.duration.secs()
        );
        if commit_score(scores, Self::score_key(self.duration), self.count, &mut self.events) {
            self.best = Some(self.count);
        }
        self.events.push(GameEvent::Sound(SoundEffect::GameOver));
    }

    fn run_timers(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        while let Some(fired) = self.clock.pop_due(now_ms) {
            let TapTimer::Tick = fired.event;
            if self.phase != TapPhase::Playing {
                continue;
            }
            self.ticks += 1;
            self.budget = self.budget.saturating_sub(1);
            if self.budget == 0 {
                self.finish(scores);
            }
        }
    }
}

impl Engine for TapEngine {
    type Input = TapInput;
    type Snapshot = TapSnapshot;

    fn game_id(&self) -> GameId {
        GameId::TapFrenzy
    }

    fn handle_input(&mut self, input: TapInput, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms, scores);

        match (input, self.phase) {
            (TapInput::SelectDuration(duration), TapPhase::Idle | TapPhase::Finished) => {
                self.select(duration, scores)
            }
            (TapInput::Start, TapPhase::Idle | TapPhase::Finished) => self.start(),
            (TapInput::Tap, TapPhase::Playing) => {
                self.count += 1;
                self.budget = self.budget.saturating_sub(self.tuning.tap_penalty);
                self.events.push(GameEvent::Sound(SoundEffect::Tap));
                if self.budget == 0 {
                    self.finish(scores);
                }
            }
            (input, phase) => log::debug!("Ignoring {:?} during {:?}", input, phase),
        }
    }

    fn advance(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms, scores);
    }

    fn snapshot(&self) -> TapSnapshot {
        TapSnapshot {
            phase: self.phase,
            duration: self.duration,
            budget: self.budget,
            count: self.count,
            best: self.best,
            new_best: self.new_best,
        }
    }

    fn teardown(&mut self, _scores: &mut ScoreStore) {
        self.clock.cancel_all();
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(duration: TapDuration) -> ScoreKey {
        ScoreKey::with_variant(GameId::TapFrenzy, duration.variant_key())
    }

    #[test]
    fn test_zero_taps_finishes_at_tick_100() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = TapEngine::new(TapTuning::default(), TapDuration::Ten, 0, &scores);
        engine.handle_input(TapInput::Start, 0, &mut scores);
        assert_eq!(engine.budget(), 100);

        engine.advance(9_900, &mut scores);
        assert_eq!(engine.phase(), TapPhase::Playing);
        assert_eq!(engine.ticks(), 99);
        assert_eq!(engine.budget(), 1);

        engine.advance(10_000, &mut scores);
        assert_eq!(engine.phase(), TapPhase::Finished);
        assert_eq!(engine.ticks(), 100);
        assert_eq!(engine.count(), 0);
        assert_eq!(scores.load(&key(TapDuration::Ten)), Some(0));
        // A zero count does not beat an empty record, and is not celebrated
        assert!(!engine.snapshot().new_best);
        let events = engine.drain_events();
        assert!(!events.iter().any(|e| matches!(e, GameEvent::NewBest { .. })));
        assert!(!events.contains(&GameEvent::Sound(SoundEffect::HighScore)));

        // No further ticks once finished
        engine.advance(20_000, &mut scores);
        assert_eq!(engine.ticks(), 100);
    }

    #[test]
    fn test_taps_drain_budget_faster() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = TapEngine::new(TapTuning::default(), TapDuration::Ten, 0, &scores);
        engine.handle_input(TapInput::Start, 0, &mut scores);

        // 10 ticks then 5 taps: 100 - 10 - 5 * 2
        engine.advance(1_000, &mut scores);
        for _ in 0..5 {
            engine.handle_input(TapInput::Tap, 1_000, &mut scores);
        }
        assert_eq!(engine.budget(), 80);
        assert_eq!(engine.count(), 5);
    }

    #[test]
    fn test_tap_can_end_the_session() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = TapEngine::new(TapTuning::default(), TapDuration::Ten, 0, &scores);
        engine.handle_input(TapInput::Start, 0, &mut scores);
        for _ in 0..50 {
            engine.handle_input(TapInput::Tap, 0, &mut scores);
        }
        let snap = engine.snapshot();
        assert_eq!(snap.phase, TapPhase::Finished);
        assert_eq!(snap.budget, 0);
        assert_eq!(snap.count, 50);
        assert!(snap.new_best);
        assert_eq!(scores.load(&key(TapDuration::Ten)), Some(50));

        // Taps after the end are ignored
        engine.handle_input(TapInput::Tap, 0, &mut scores);
        assert_eq!(engine.count(), 50);
    }

    #[test]
    fn test_tie_is_not_a_new_best() {
        let mut scores = ScoreStore::in_memory();
        scores.save(&key(TapDuration::Ten), 50);
        let mut engine = TapEngine::new(TapTuning::default(), TapDuration::Ten, 0, &scores);
        engine.handle_input(TapInput::Start, 0, &mut scores);
        for _ in 0..50 {
            engine.handle_input(TapInput::Tap, 0, &mut scores);
        }
        assert_eq!(engine.phase(), TapPhase::Finished);
        assert!(!engine.snapshot().new_best);
        assert!(!engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::NewBest { .. })));
    }

    #[test]
    fn test_records_are_per_duration() {
        let mut scores = ScoreStore::in_memory();
        scores.save(&key(TapDuration::Fifty), 120);
        let mut engine = TapEngine::new(TapTuning::default(), TapDuration::Ten, 0, &scores);
        assert_eq!(engine.snapshot().best, None);

        engine.handle_input(TapInput::SelectDuration(TapDuration::Fifty), 0, &mut scores);
        let snap = engine.snapshot();
        assert_eq!(snap.duration, TapDuration::Fifty);
        assert_eq!(snap.budget, 500);
        assert_eq!(snap.best, Some(120));

        // Duration is locked while playing
        engine.handle_input(TapInput::Start, 0, &mut scores);
        engine.handle_input(TapInput::SelectDuration(TapDuration::Ten), 0, &mut scores);
        assert_eq!(engine.snapshot().duration, TapDuration::Fifty);
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(TapDuration::from_secs(50), Some(TapDuration::Fifty));
        assert_eq!(TapDuration::from_secs(30), None);
        assert_eq!(TapDuration::Hundred.budget_tenths(), 1000);
    }
}
