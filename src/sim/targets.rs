//! Defend the Window: target shooting gallery
//!
//! Targets spawn at random positions on a fixed interval and live until hit
//! or until their own deadline. Live targets sit in an arena keyed by id;
//! expiry is checked by one periodic sweep (and before every input) rather
//! than a timer per target, so teardown only has to cancel three timers.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::TickClock;
use super::{Engine, GameEvent, commit_score};
use crate::audio::SoundEffect;
use crate::consts::COMBO_CAP;
use crate::highscores::{GameId, ScoreKey, ScoreStore};
use crate::tuning::TargetTuning;

/// Spawn area in normalized field coordinates
const SPAWN_MIN: Vec2 = Vec2::new(0.15, 0.20);
const SPAWN_MAX: Vec2 = Vec2::new(0.85, 0.80);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSize {
    Small,
    Medium,
    Large,
}

impl TargetSize {
    /// Diameter in pixels
    pub fn pixels(self) -> f32 {
        match self {
            TargetSize::Small => 40.0,
            TargetSize::Medium => 55.0,
            TargetSize::Large => 70.0,
        }
    }

    /// Base points; smaller is worth more
    pub fn value(self) -> u64 {
        match self {
            TargetSize::Small => 30,
            TargetSize::Medium => 20,
            TargetSize::Large => 10,
        }
    }

    pub fn lifetime_ms(self) -> u64 {
        match self {
            TargetSize::Small => 1500,
            TargetSize::Medium => 2000,
            TargetSize::Large => 2500,
        }
    }

    /// 30% small, the rest split evenly
    fn roll(rng: &mut Pcg32) -> Self {
        if rng.random::<f32>() > 0.7 {
            TargetSize::Small
        } else if rng.random::<f32>() > 0.5 {
            TargetSize::Medium
        } else {
            TargetSize::Large
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    pub id: TargetId,
    /// Center, normalized to the field
    pub pos: Vec2,
    pub size: TargetSize,
    pub value: u64,
    pub spawned_at: u64,
    pub expires_at: u64,
}

impl Target {
    /// Whether a normalized point lies on this target
    fn covers(&self, point: Vec2, field_px: f32) -> bool {
        let radius = self.size.pixels() * 0.5 / field_px.max(1.0);
        self.pos.distance_squared(point) <= radius * radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPhase {
    Idle,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TargetInput {
    Start,
    Hit(TargetId),
    /// Click that landed on no target
    Miss,
    /// Raw click at a normalized point, resolved to a hit or a miss
    Shoot(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetTimer {
    Countdown,
    Spawn,
    Sweep,
}

/// Last successful hit, for score pop-ups
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitFeedback {
    pub id: TargetId,
    pub pos: Vec2,
    pub points: u64,
    pub multiplier: u32,
    pub at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSnapshot {
    pub phase: TargetPhase,
    pub time_left: u32,
    pub score: u64,
    pub combo: u32,
    pub multiplier: u32,
    pub targets: Vec<Target>,
    pub last_hit: Option<HitFeedback>,
    pub best: Option<u64>,
}

pub struct TargetEngine {
    tuning: TargetTuning,
    rng: Pcg32,
    clock: TickClock<TargetTimer>,
    phase: TargetPhase,
    time_left: u32,
    score: u64,
    combo: u32,
    arena: BTreeMap<TargetId, Target>,
    next_id: u64,
    last_hit: Option<HitFeedback>,
    best: Option<u64>,
    events: Vec<GameEvent>,
}

impl TargetEngine {
    pub fn new(tuning: TargetTuning, seed: u64, now_ms: u64, scores: &ScoreStore) -> Self {
        Self {
            time_left: tuning.round_secs,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            clock: TickClock::new(now_ms),
            phase: TargetPhase::Idle,
            score: 0,
            combo: 0,
            arena: BTreeMap::new(),
            next_id: 1,
            last_hit: None,
            best: scores.load(&Self::score_key()),
            events: Vec::new(),
        }
    }

    fn score_key() -> ScoreKey {
        ScoreKey::new(GameId::Targets)
    }

    pub fn phase(&self) -> TargetPhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn multiplier(&self) -> u32 {
        self.combo.min(COMBO_CAP)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.arena.values()
    }

    fn start(&mut self, now_ms: u64) {
        self.clock.cancel_all();
        self.phase = TargetPhase::Playing;
        self.time_left = self.tuning.round_secs;
        self.score = 0;
        self.combo = 0;
        self.arena.clear();
        self.last_hit = None;

        self.clock.every(1000, TargetTimer::Countdown);
        self.clock.every(self.tuning.spawn_interval_ms, TargetTimer::Spawn);
        self.clock.every(self.tuning.sweep_interval_ms, TargetTimer::Sweep);
        self.spawn(now_ms);
        log::debug!("Target round started ({}s)", self.tuning.round_secs);
    }

    fn insert(&mut self, size: TargetSize, pos: Vec2, now_ms: u64) -> TargetId {
        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.arena.insert(
            id,
            Target {
                id,
                pos,
                size,
                value: size.value(),
                spawned_at: now_ms,
                expires_at: now_ms + size.lifetime_ms(),
            },
        );
        id
    }

    fn spawn(&mut self, now_ms: u64) -> TargetId {
        let size = TargetSize::roll(&mut self.rng);
        let pos = Vec2::new(
            self.rng.random_range(SPAWN_MIN.x..SPAWN_MAX.x),
            self.rng.random_range(SPAWN_MIN.y..SPAWN_MAX.y),
        );
        self.insert(size, pos, now_ms)
    }

    /// Remove every target whose deadline has passed; each one breaks the combo
    fn sweep(&mut self, now_ms: u64) {
        let before = self.arena.len();
        self.arena.retain(|_, t| t.expires_at > now_ms);
        let expired = before - self.arena.len();
        if expired > 0 {
            log::trace!("{} target(s) expired, combo reset", expired);
            self.combo = 0;
        }
    }

    fn hit(&mut self, id: TargetId, now_ms: u64) {
        let Some(target) = self.arena.remove(&id) else {
            log::debug!("Hit on unknown target {:?}", id);
            return;
        };
        self.combo += 1;
        let multiplier = self.multiplier();
        let points = target.value * u64::from(multiplier);
        self.score += points;
        self.last_hit = Some(HitFeedback {
            id,
            pos: target.pos,
            points,
            multiplier,
            at_ms: now_ms,
        });
        self.events.push(GameEvent::Sound(SoundEffect::Shoot));
    }

    fn miss(&mut self) {
        self.combo = 0;
    }

    /// Newest live target under `point`
    fn target_at(&self, point: Vec2) -> Option<TargetId> {
        self.arena
            .values()
            .rev()
            .find(|t| t.covers(point, self.tuning.field_px))
            .map(|t| t.id)
    }

    fn finish(&mut self, scores: &mut ScoreStore) {
        self.clock.cancel_all();
        self.phase = TargetPhase::Finished;
        self.arena.clear();
        self.events.push(GameEvent::Sound(SoundEffect::GameOver));
        log::info!("Target round over, score {}", self.score);
        if commit_score(scores, Self::score_key(), self.score, &mut self.events) {
            self.best = Some(self.score);
        }
    }

    fn run_timers(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        while let Some(fired) = self.clock.pop_due(now_ms) {
            if self.phase != TargetPhase::Playing {
                continue;
            }
            match fired.event {
                TargetTimer::Countdown => {
                    self.time_left = self.time_left.saturating_sub(1);
                    if self.time_left == 0 {
                        self.finish(scores);
                    }
                }
                TargetTimer::Spawn => {
                    self.spawn(fired.at_ms);
                }
                TargetTimer::Sweep => self.sweep(fired.at_ms),
            }
        }
        if self.phase == TargetPhase::Playing {
            self.sweep(now_ms);
        }
    }

    #[cfg(test)]
    pub(crate) fn spawn_at(&mut self, size: TargetSize, pos: Vec2, now_ms: u64) -> TargetId {
        self.insert(size, pos, now_ms)
    }
}

impl Engine for TargetEngine {
    type Input = TargetInput;
    type Snapshot = TargetSnapshot;

    fn game_id(&self) -> GameId {
        GameId::Targets
    }

    fn handle_input(&mut self, input: TargetInput, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms, scores);

        match (input, self.phase) {
            (TargetInput::Start, TargetPhase::Idle | TargetPhase::Finished) => self.start(now_ms),
            (TargetInput::Hit(id), TargetPhase::Playing) => self.hit(id, now_ms),
            (TargetInput::Miss, TargetPhase::Playing) => self.miss(),
            (TargetInput::Shoot(point), TargetPhase::Playing) => match self.target_at(point) {
                Some(id) => self.hit(id, now_ms),
                None => self.miss(),
            },
            (input, phase) => log::debug!("Ignoring {:?} during {:?}", input, phase),
        }
    }

    fn advance(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms, scores);
    }

    fn snapshot(&self) -> TargetSnapshot {
        TargetSnapshot {
            phase: self.phase,
            time_left: self.time_left,
            score: self.score,
            combo: self.combo,
            multiplier: self.multiplier(),
            targets: self.arena.values().cloned().collect(),
            last_hit: self.last_hit,
            best: self.best,
        }
    }

    fn teardown(&mut self, _scores: &mut ScoreStore) {
        self.clock.cancel_all();
        self.arena.clear();
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(scores: &mut ScoreStore) -> TargetEngine {
        let mut engine = TargetEngine::new(TargetTuning::default(), 21, 0, scores);
        engine.handle_input(TargetInput::Start, 0, scores);
        engine
    }

    #[test]
    fn test_start_spawns_immediately() {
        let mut scores = ScoreStore::in_memory();
        let engine = started(&mut scores);
        assert_eq!(engine.phase(), TargetPhase::Playing);
        assert_eq!(engine.targets().count(), 1);
        let target = engine.targets().next().unwrap();
        assert!((0.15..0.85).contains(&target.pos.x));
        assert!((0.20..0.80).contains(&target.pos.y));
        assert_eq!(target.expires_at, target.size.lifetime_ms());
    }

    #[test]
    fn test_combo_scoring_1_2_3() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        let ids: Vec<_> = (0..3)
            .map(|i| engine.spawn_at(TargetSize::Large, Vec2::new(0.3 + 0.1 * i as f32, 0.5), 0))
            .collect();
        for (i, id) in ids.into_iter().enumerate() {
            engine.handle_input(TargetInput::Hit(id), 100, &mut scores);
            assert_eq!(engine.combo(), i as u32 + 1);
        }
        assert_eq!(engine.score(), 10 + 10 * 2 + 10 * 3);
    }

    #[test]
    fn test_multiplier_caps_at_five() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        for _ in 0..7 {
            let id = engine.spawn_at(TargetSize::Small, Vec2::splat(0.5), 0);
            engine.handle_input(TargetInput::Hit(id), 10, &mut scores);
        }
        assert_eq!(engine.combo(), 7);
        assert_eq!(engine.multiplier(), 5);
        // 30 * (1 + 2 + 3 + 4 + 5 + 5 + 5)
        assert_eq!(engine.score(), 30 * 25);
    }

    #[test]
    fn test_no_double_credit() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        let id = engine.spawn_at(TargetSize::Medium, Vec2::splat(0.5), 0);
        engine.handle_input(TargetInput::Hit(id), 10, &mut scores);
        engine.handle_input(TargetInput::Hit(id), 20, &mut scores);
        assert_eq!(engine.score(), 20);
        assert_eq!(engine.combo(), 1);
    }

    #[test]
    fn test_miss_resets_combo_not_score() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        let id = engine.spawn_at(TargetSize::Large, Vec2::splat(0.5), 0);
        engine.handle_input(TargetInput::Hit(id), 10, &mut scores);
        engine.handle_input(TargetInput::Miss, 20, &mut scores);
        assert_eq!(engine.combo(), 0);
        assert_eq!(engine.score(), 10);
    }

    #[test]
    fn test_expiry_resets_combo() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        let a = engine.spawn_at(TargetSize::Large, Vec2::splat(0.5), 0);
        engine.handle_input(TargetInput::Hit(a), 10, &mut scores);
        assert_eq!(engine.combo(), 1);

        // The target spawned at 800ms has expired by 3300ms at the latest
        engine.advance(3400, &mut scores);
        assert_eq!(engine.combo(), 0);
        assert!(engine.targets().all(|t| t.expires_at > 3400));
    }

    #[test]
    fn test_expired_target_cannot_be_hit() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        let id = engine.spawn_at(TargetSize::Small, Vec2::splat(0.5), 0);
        engine.handle_input(TargetInput::Hit(id), 1500, &mut scores);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn test_shoot_resolves_to_hit_or_miss() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = TargetEngine::new(TargetTuning::default(), 21, 0, &scores);
        engine.handle_input(TargetInput::Start, 0, &mut scores);
        // Drop the random spawn so the field holds only our target
        engine.arena.clear();
        let id = engine.spawn_at(TargetSize::Large, Vec2::new(0.5, 0.5), 0);

        // Large radius is 35px on a 400px field
        engine.handle_input(TargetInput::Shoot(Vec2::new(0.55, 0.5)), 10, &mut scores);
        assert_eq!(engine.score(), 10);
        assert_eq!(engine.snapshot().last_hit.map(|h| h.id), Some(id));

        engine.handle_input(TargetInput::Shoot(Vec2::new(0.1, 0.1)), 20, &mut scores);
        assert_eq!(engine.combo(), 0);
        assert_eq!(engine.score(), 10);
    }

    #[test]
    fn test_round_ends_after_countdown() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        let id = engine.spawn_at(TargetSize::Large, Vec2::splat(0.5), 0);
        engine.handle_input(TargetInput::Hit(id), 10, &mut scores);

        engine.advance(29_999, &mut scores);
        assert_eq!(engine.snapshot().time_left, 1);
        engine.advance(30_000, &mut scores);
        let snap = engine.snapshot();
        assert_eq!(snap.phase, TargetPhase::Finished);
        assert_eq!(snap.time_left, 0);
        assert!(snap.targets.is_empty());
        assert_eq!(scores.load(&ScoreKey::new(GameId::Targets)), Some(10));

        // Spawning stopped
        engine.advance(40_000, &mut scores);
        assert_eq!(engine.targets().count(), 0);
    }

    #[test]
    fn test_size_roll_distribution() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut small = 0;
        for _ in 0..10_000 {
            if TargetSize::roll(&mut rng) == TargetSize::Small {
                small += 1;
            }
        }
        assert!((2_500..3_500).contains(&small), "small count {}", small);
    }
}
