//! Lightning Reflexes: reaction-time measurement
//!
//! `Waiting → Ready → Go → Result`. Entering `Ready` arms a randomly delayed
//! stimulus; the scored quantity is real elapsed time between the stimulus
//! and the next click, lower is better.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::{TickClock, TimerId};
use super::{Engine, GameEvent, commit_score};
use crate::audio::SoundEffect;
use crate::highscores::{GameId, ScoreKey, ScoreStore};
use crate::tuning::ReactionTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionPhase {
    /// Idle, click to arm
    Waiting,
    /// Stimulus pending; clicking now is too early
    Ready,
    /// Stimulus shown, timing the response
    Go,
    /// Response measured
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionOutcome {
    /// Clicked during `Ready`
    TooEarly,
    /// Response time in milliseconds
    Time(u64),
}

/// Feedback band for a measured time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionRating {
    Inhuman,
    Awesome,
    Good,
    KeepPracticing,
}

impl ReactionRating {
    pub fn for_time(ms: u64) -> Self {
        match ms {
            0..150 => ReactionRating::Inhuman,
            150..200 => ReactionRating::Awesome,
            200..300 => ReactionRating::Good,
            _ => ReactionRating::KeepPracticing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionInput {
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReactionTimer {
    Stimulus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionSnapshot {
    pub phase: ReactionPhase,
    pub last: Option<ReactionOutcome>,
    pub rating: Option<ReactionRating>,
    pub best: Option<u64>,
}

pub struct ReactionEngine {
    tuning: ReactionTuning,
    rng: Pcg32,
    clock: TickClock<ReactionTimer>,
    phase: ReactionPhase,
    go_at: Option<u64>,
    stimulus: Option<TimerId>,
    last: Option<ReactionOutcome>,
    best: Option<u64>,
    events: Vec<GameEvent>,
}

impl ReactionEngine {
    pub fn new(tuning: ReactionTuning, seed: u64, now_ms: u64, scores: &ScoreStore) -> Self {
        Self {
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            clock: TickClock::new(now_ms),
            phase: ReactionPhase::Waiting,
            go_at: None,
            stimulus: None,
            last: None,
            best: scores.load(&Self::score_key()),
            events: Vec::new(),
        }
    }

    fn score_key() -> ScoreKey {
        ScoreKey::new(GameId::Reaction)
    }

    pub fn phase(&self) -> ReactionPhase {
        self.phase
    }

    pub fn best(&self) -> Option<u64> {
        self.best
    }

    /// Enter `Ready` with a fresh random delay
    fn arm(&mut self) {
        let min = self.tuning.min_delay_ms;
        let max = self.tuning.max_delay_ms.max(min.saturating_add(1));
        let delay = if min < max { self.rng.random_range(min..max) } else { min };
        self.stimulus = Some(self.clock.after(delay, ReactionTimer::Stimulus));
        self.go_at = None;
        self.phase = ReactionPhase::Ready;
        log::debug!("Reaction armed, stimulus in {}ms", delay);
    }

    fn run_timers(&mut self, now_ms: u64) {
        while let Some(fired) = self.clock.pop_due(now_ms) {
            match fired.event {
                ReactionTimer::Stimulus if self.phase == ReactionPhase::Ready => {
                    self.stimulus = None;
                    self.go_at = Some(fired.at_ms);
                    self.phase = ReactionPhase::Go;
                    self.events.push(GameEvent::Sound(SoundEffect::Stimulus));
                }
                ReactionTimer::Stimulus => {}
            }
        }
    }
}

impl Engine for ReactionEngine {
    type Input = ReactionInput;
    type Snapshot = ReactionSnapshot;

    fn game_id(&self) -> GameId {
        GameId::Reaction
    }

    fn handle_input(&mut self, input: ReactionInput, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms);

        let ReactionInput::Click = input;
        match self.phase {
            ReactionPhase::Waiting => self.arm(),
            ReactionPhase::Ready => {
                if let Some(id) = self.stimulus.take() {
                    self.clock.cancel(id);
                }
                self.phase = ReactionPhase::Waiting;
                self.last = Some(ReactionOutcome::TooEarly);
                self.events.push(GameEvent::Sound(SoundEffect::TooEarly));
            }
            ReactionPhase::Go => {
                let elapsed = now_ms.saturating_sub(self.go_at.unwrap_or(now_ms));
                self.phase = ReactionPhase::Result;
                self.last = Some(ReactionOutcome::Time(elapsed));
                log::info!("Reaction time: {}ms", elapsed);
                if commit_score(scores, Self::score_key(), elapsed, &mut self.events) {
                    self.best = Some(elapsed);
                }
            }
            ReactionPhase::Result => {
                self.last = None;
                self.arm();
            }
        }
    }

    fn advance(&mut self, now_ms: u64, _scores: &mut ScoreStore) {
        self.run_timers(now_ms);
    }

    fn snapshot(&self) -> ReactionSnapshot {
        let rating = match self.last {
            Some(ReactionOutcome::Time(ms)) => Some(ReactionRating::for_time(ms)),
            _ => None,
        };
        ReactionSnapshot {
            phase: self.phase,
            last: self.last,
            rating,
            best: self.best,
        }
    }

    fn teardown(&mut self, _scores: &mut ScoreStore) {
        self.clock.cancel_all();
        self.stimulus = None;
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
