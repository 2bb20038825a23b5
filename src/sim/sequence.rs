//! Mind Maze: sequence memory
//!
//! The engine plays back a growing symbol sequence, then checks the player's
//! replay position by position. Score is the number of fully completed
//! rounds before the first mismatch.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::TickClock;
use super::{Engine, GameEvent, commit_score};
use crate::audio::SoundEffect;
use crate::consts::SYMBOL_COUNT;
use crate::highscores::{GameId, ScoreKey, ScoreStore};
use crate::tuning::SequenceTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Symbol {
    pub const ALL: [Symbol; SYMBOL_COUNT] = [Symbol::Red, Symbol::Blue, Symbol::Green, Symbol::Yellow];

    pub fn index(self) -> u8 {
        match self {
            Symbol::Red => 0,
            Symbol::Blue => 1,
            Symbol::Green => 2,
            Symbol::Yellow => 3,
        }
    }

    fn random(rng: &mut Pcg32) -> Self {
        Self::ALL[rng.random_range(0..SYMBOL_COUNT)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencePhase {
    Idle,
    /// Playing the sequence back; input ignored
    Showing,
    /// Waiting for the player's replay
    Playing,
    /// Short pause after a completed round
    RoundWon,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceInput {
    Start,
    Press(Symbol),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShowStep {
    Light(usize),
    Dark(usize),
    Done,
    NextRound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceSnapshot {
    pub phase: SequencePhase,
    pub length: usize,
    /// Symbols correctly entered this round
    pub progress: usize,
    /// Symbol currently lit during `Showing`
    pub lit: Option<Symbol>,
    pub score: u64,
    pub best: Option<u64>,
}

pub struct SequenceEngine {
    tuning: SequenceTuning,
    rng: Pcg32,
    clock: TickClock<ShowStep>,
    phase: SequencePhase,
    sequence: Vec<Symbol>,
    entered: Vec<Symbol>,
    lit: Option<Symbol>,
    score: u64,
    best: Option<u64>,
    events: Vec<GameEvent>,
}

impl SequenceEngine {
    pub fn new(tuning: SequenceTuning, seed: u64, now_ms: u64, scores: &ScoreStore) -> Self {
        Self {
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            clock: TickClock::new(now_ms),
            phase: SequencePhase::Idle,
            sequence: Vec::new(),
            entered: Vec::new(),
            lit: None,
            score: 0,
            best: scores.load(&Self::score_key()),
            events: Vec::new(),
        }
    }

    fn score_key() -> ScoreKey {
        ScoreKey::new(GameId::Memory)
    }

    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    /// The stored sequence
    pub fn sequence(&self) -> &[Symbol] {
        &self.sequence
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Time at which the current showing hands control to the player
    fn showing_length_ms(&self) -> u64 {
        self.sequence.len() as u64 * (self.tuning.lit_ms + self.tuning.gap_ms)
    }

    fn start(&mut self) {
        self.clock.cancel_all();
        self.sequence = vec![Symbol::random(&mut self.rng)];
        self.entered.clear();
        self.score = 0;
        self.begin_showing();
    }

    fn begin_showing(&mut self) {
        self.phase = SequencePhase::Showing;
        self.lit = None;
        self.clock.after(self.tuning.lead_in_ms, ShowStep::Light(0));
        log::debug!(
            "Showing {} symbols ({}ms)",
            self.sequence.len(),
            self.tuning.lead_in_ms + self.showing_length_ms()
        );
    }

    fn on_step(&mut self, step: ShowStep) {
        match step {
            ShowStep::Light(i) => {
                let Some(&symbol) = self.sequence.get(i) else {
                    return;
                };
                self.lit = Some(symbol);
                self.events.push(GameEvent::Sound(SoundEffect::Tone(symbol.index())));
                self.clock.after(self.tuning.lit_ms, ShowStep::Dark(i));
            }
            ShowStep::Dark(i) => {
                self.lit = None;
                let next = if i + 1 < self.sequence.len() {
                    ShowStep::Light(i + 1)
                } else {
                    ShowStep::Done
                };
                self.clock.after(self.tuning.gap_ms, next);
            }
            ShowStep::Done => {
                self.entered.clear();
                self.phase = SequencePhase::Playing;
            }
            ShowStep::NextRound => self.begin_showing(),
        }
    }

    fn run_timers(&mut self, now_ms: u64) {
        while let Some(fired) = self.clock.pop_due(now_ms) {
            self.on_step(fired.event);
        }
    }

    fn press(&mut self, symbol: Symbol, scores: &mut ScoreStore) {
        self.entered.push(symbol);
        self.events.push(GameEvent::Sound(SoundEffect::Tone(symbol.index())));

        let position = self.entered.len() - 1;
        if self.sequence.get(position) != Some(&symbol) {
            self.phase = SequencePhase::Lost;
            self.clock.cancel_all();
            self.events.push(GameEvent::Sound(SoundEffect::Mistake));
            log::info!("Sequence lost after {} rounds", self.score);
            if commit_score(scores, Self::score_key(), self.score, &mut self.events) {
                self.best = Some(self.score);
            }
            return;
        }

        if self.entered.len() == self.sequence.len() {
            self.score += 1;
            self.entered.clear();
            let next = Symbol::random(&mut self.rng);
            self.sequence.push(next);
            self.phase = SequencePhase::RoundWon;
            self.events.push(GameEvent::Sound(SoundEffect::RoundClear));
            self.clock.after(self.tuning.round_pause_ms, ShowStep::NextRound);
        }
    }
}

impl Engine for SequenceEngine {
    type Input = SequenceInput;
    type Snapshot = SequenceSnapshot;

    fn game_id(&self) -> GameId {
        GameId::Memory
    }

    fn handle_input(&mut self, input: SequenceInput, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms);

        match (input, self.phase) {
            (SequenceInput::Start, SequencePhase::Idle | SequencePhase::Lost) => self.start(),
            (SequenceInput::Press(symbol), SequencePhase::Playing) => self.press(symbol, scores),
            (input, phase) => log::debug!("Ignoring {:?} during {:?}", input, phase),
        }
    }

    fn advance(&mut self, now_ms: u64, _scores: &mut ScoreStore) {
        self.run_timers(now_ms);
    }

    fn snapshot(&self) -> SequenceSnapshot {
        SequenceSnapshot {
            phase: self.phase,
            length: self.sequence.len(),
            progress: self.entered.len(),
            lit: self.lit,
            score: self.score,
            best: self.best,
        }
    }

    fn teardown(&mut self, _scores: &mut ScoreStore) {
        self.clock.cancel_all();
        self.lit = None;
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
