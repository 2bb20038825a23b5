//! Grid snake
//!
//! Discrete movement on a square grid. Direction input is buffered between
//! ticks and committed at the next tick; a reversal relative to the committed
//! direction is rejected when queued, so no sequence of inputs can turn the
//! head back into the neck.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::TickClock;
use super::{Engine, GameEvent, commit_score};
use crate::audio::SoundEffect;
use crate::highscores::{GameId, ScoreKey, ScoreStore};
use crate::tuning::SnakeTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    fn in_bounds(self, size: i32) -> bool {
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Grid step; y grows downwards
    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnakePhase {
    Idle,
    Playing,
    GameOver,
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCause {
    Wall,
    Body,
    /// No free cell left for food
    BoardFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnakeInput {
    Start,
    Turn(Direction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnakeTimer {
    Step,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnakeSnapshot {
    pub phase: SnakePhase,
    pub grid_size: i32,
    /// Head first
    pub body: Vec<Cell>,
    pub food: Cell,
    pub direction: Direction,
    pub score: u64,
    pub best: Option<u64>,
    pub end_cause: Option<EndCause>,
}

const INITIAL_BODY: [Cell; 3] = [Cell::new(5, 10), Cell::new(4, 10), Cell::new(3, 10)];
const INITIAL_FOOD: Cell = Cell::new(15, 10);

pub struct SnakeEngine {
    tuning: SnakeTuning,
    rng: Pcg32,
    clock: TickClock<SnakeTimer>,
    phase: SnakePhase,
    body: VecDeque<Cell>,
    direction: Direction,
    pending: Direction,
    food: Cell,
    score: u64,
    best: Option<u64>,
    end_cause: Option<EndCause>,
    events: Vec<GameEvent>,
}

impl SnakeEngine {
    pub fn new(tuning: SnakeTuning, seed: u64, now_ms: u64, scores: &ScoreStore) -> Self {
        let mut engine = Self {
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            clock: TickClock::new(now_ms),
            phase: SnakePhase::Idle,
            body: VecDeque::new(),
            direction: Direction::Right,
            pending: Direction::Right,
            food: INITIAL_FOOD,
            score: 0,
            best: scores.load(&Self::score_key()),
            end_cause: None,
            events: Vec::new(),
        };
        engine.reset();
        engine
    }

    fn score_key() -> ScoreKey {
        ScoreKey::new(GameId::Snake)
    }

    pub fn phase(&self) -> SnakePhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn head(&self) -> Option<Cell> {
        self.body.front().copied()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    fn reset(&mut self) {
        self.body = INITIAL_BODY.into_iter().collect();
        self.direction = Direction::Right;
        self.pending = Direction::Right;
        self.score = 0;
        self.end_cause = None;
        self.food = if INITIAL_FOOD.in_bounds(self.tuning.grid_size) && !self.body.contains(&INITIAL_FOOD) {
            INITIAL_FOOD
        } else {
            self.spawn_food().unwrap_or(INITIAL_FOOD)
        };
    }

    fn start(&mut self) {
        self.clock.cancel_all();
        self.reset();
        self.phase = SnakePhase::Playing;
        self.clock.every(self.tuning.tick_ms, SnakeTimer::Step);
        log::debug!("Snake started on a {0}x{0} grid", self.tuning.grid_size);
    }

    /// Queue a turn; reversals against the committed direction are dropped
    fn queue_turn(&mut self, direction: Direction) {
        if direction == self.direction.opposite() {
            log::trace!("Rejected reversal {:?} while heading {:?}", direction, self.direction);
            return;
        }
        self.pending = direction;
    }

    /// Random free cell: bounded rejection sampling, then a uniform pick
    /// among the remaining free cells. `None` when the body fills the board.
    fn spawn_food(&mut self) -> Option<Cell> {
        let size = self.tuning.grid_size;
        if size <= 0 {
            return None;
        }
        for _ in 0..self.tuning.spawn_attempts {
            let cell = Cell::new(self.rng.random_range(0..size), self.rng.random_range(0..size));
            if !self.body.contains(&cell) {
                return Some(cell);
            }
        }

        let free: Vec<Cell> = (0..size)
            .flat_map(|y| (0..size).map(move |x| Cell::new(x, y)))
            .filter(|c| !self.body.contains(c))
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[self.rng.random_range(0..free.len())])
    }

    fn step(&mut self, scores: &mut ScoreStore) {
        self.direction = self.pending;
        let Some(head) = self.head() else {
            return;
        };
        let next = head.step(self.direction);

        if !next.in_bounds(self.tuning.grid_size) {
            self.end(EndCause::Wall, scores);
            return;
        }
        // The tail cell still counts: it has not moved yet this tick
        if self.body.contains(&next) {
            self.end(EndCause::Body, scores);
            return;
        }

        self.body.push_front(next);
        if next == self.food {
            self.score += self.tuning.food_points;
            self.events.push(GameEvent::Sound(SoundEffect::Eat));
            match self.spawn_food() {
                Some(food) => self.food = food,
                None => self.end(EndCause::BoardFull, scores),
            }
        } else {
            self.body.pop_back();
        }
    }

    fn end(&mut self, cause: EndCause, scores: &mut ScoreStore) {
        self.clock.cancel_all();
        self.phase = SnakePhase::GameOver;
        self.end_cause = Some(cause);
        self.events.push(GameEvent::Sound(SoundEffect::GameOver));
        log::info!("Snake over ({:?}), score {}", cause, self.score);
        if commit_score(scores, Self::score_key(), self.score, &mut self.events) {
            self.best = Some(self.score);
        }
    }

    fn run_timers(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        while let Some(fired) = self.clock.pop_due(now_ms) {
            let SnakeTimer::Step = fired.event;
            if self.phase == SnakePhase::Playing {
                self.step(scores);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn place_food(&mut self, cell: Cell) {
        self.food = cell;
    }

    #[cfg(test)]
    pub(crate) fn set_body(&mut self, body: &[Cell], direction: Direction) {
        self.body = body.iter().copied().collect();
        self.direction = direction;
        self.pending = direction;
    }
}

impl Engine for SnakeEngine {
    type Input = SnakeInput;
    type Snapshot = SnakeSnapshot;

    fn game_id(&self) -> GameId {
        GameId::Snake
    }

    fn handle_input(&mut self, input: SnakeInput, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms, scores);

        match (input, self.phase) {
            (SnakeInput::Start, SnakePhase::Idle | SnakePhase::GameOver) => self.start(),
            (SnakeInput::Turn(direction), SnakePhase::Playing) => self.queue_turn(direction),
            (input, phase) => log::debug!("Ignoring {:?} during {:?}", input, phase),
        }
    }

    fn advance(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms, scores);
    }

    fn snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            phase: self.phase,
            grid_size: self.tuning.grid_size,
            body: self.body.iter().copied().collect(),
            food: self.food,
            direction: self.direction,
            score: self.score,
            best: self.best,
            end_cause: self.end_cause,
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
    use proptest::prelude::*;

    fn started(scores: &mut ScoreStore) -> SnakeEngine {
        let mut engine = SnakeEngine::new(SnakeTuning::default(), 9, 0, scores);
        engine.handle_input(SnakeInput::Start, 0, scores);
        engine
    }

    #[test]
    fn test_initial_layout() {
        let scores = ScoreStore::in_memory();
        let engine = SnakeEngine::new(SnakeTuning::default(), 1, 0, &scores);
        let snap = engine.snapshot();
        assert_eq!(snap.phase, SnakePhase::Idle);
        assert_eq!(snap.body, INITIAL_BODY.to_vec());
        assert_eq!(snap.direction, Direction::Right);
        assert!(!snap.body.contains(&snap.food));
    }

    #[test]
    fn test_moves_one_cell_per_tick() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        engine.place_food(Cell::new(0, 0));
        engine.advance(100, &mut scores);
        assert_eq!(engine.head(), Some(Cell::new(6, 10)));
        assert_eq!(engine.len(), 3);
        engine.advance(300, &mut scores);
        assert_eq!(engine.head(), Some(Cell::new(8, 10)));
    }

    #[test]
    fn test_turn_is_buffered_until_tick() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        engine.place_food(Cell::new(0, 0));
        engine.handle_input(SnakeInput::Turn(Direction::Up), 50, &mut scores);
        assert_eq!(engine.direction(), Direction::Right);
        engine.advance(100, &mut scores);
        assert_eq!(engine.direction(), Direction::Up);
        assert_eq!(engine.head(), Some(Cell::new(5, 9)));
    }

    #[test]
    fn test_reversal_rejected_even_after_other_turns() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        engine.place_food(Cell::new(0, 0));
        // Up then Left between ticks: Left is a reversal of committed Right
        engine.handle_input(SnakeInput::Turn(Direction::Up), 10, &mut scores);
        engine.handle_input(SnakeInput::Turn(Direction::Left), 20, &mut scores);
        engine.advance(100, &mut scores);
        assert_eq!(engine.direction(), Direction::Up);
        assert_eq!(engine.phase(), SnakePhase::Playing);
    }

    #[test]
    fn test_eating_grows_and_scores() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        engine.place_food(Cell::new(6, 10));
        engine.advance(100, &mut scores);
        assert_eq!(engine.len(), 4);
        assert_eq!(engine.score(), 10);
        assert!(!engine.snapshot().body.contains(&engine.food()));
        assert!(engine.drain_events().contains(&GameEvent::Sound(SoundEffect::Eat)));
    }

    #[test]
    fn test_length_after_k_meals() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        let mut now = 0;
        for k in 1..=8 {
            let head = engine.head().unwrap();
            engine.place_food(head.step(Direction::Right));
            now += 100;
            engine.advance(now, &mut scores);
            assert_eq!(engine.len(), 3 + k);
        }
        assert_eq!(engine.score(), 80);
        assert_eq!(engine.phase(), SnakePhase::Playing);
    }

    #[test]
    fn test_wall_ends_game_and_commits_best() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        engine.place_food(Cell::new(6, 10));
        engine.advance(100, &mut scores);
        engine.place_food(Cell::new(0, 0));
        // Head at x=6, wall after x=19
        engine.advance(100 + 13 * 100, &mut scores);
        assert_eq!(engine.phase(), SnakePhase::Playing);
        engine.advance(100 + 14 * 100, &mut scores);
        let snap = engine.snapshot();
        assert_eq!(snap.phase, SnakePhase::GameOver);
        assert_eq!(snap.end_cause, Some(EndCause::Wall));
        assert_eq!(scores.load(&ScoreKey::new(GameId::Snake)), Some(10));

        // Restart resets the board
        engine.handle_input(SnakeInput::Start, 2000, &mut scores);
        assert_eq!(engine.len(), 3);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn test_body_collision() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = started(&mut scores);
        engine.place_food(Cell::new(0, 0));
        // Hook shape: moving up into (5,5) which is occupied
        let body = [
            Cell::new(5, 6),
            Cell::new(6, 6),
            Cell::new(6, 5),
            Cell::new(5, 5),
            Cell::new(4, 5),
        ];
        engine.set_body(&body, Direction::Left);
        engine.handle_input(SnakeInput::Turn(Direction::Up), 50, &mut scores);
        engine.advance(100, &mut scores);
        assert_eq!(engine.phase(), SnakePhase::GameOver);
        assert_eq!(engine.snapshot().end_cause, Some(EndCause::Body));
    }

    #[test]
    fn test_full_board_stops_instead_of_looping() {
        let mut scores = ScoreStore::in_memory();
        let tuning = SnakeTuning {
            grid_size: 2,
            ..Default::default()
        };
        let mut engine = SnakeEngine::new(tuning, 4, 0, &scores);
        engine.handle_input(SnakeInput::Start, 0, &mut scores);
        engine.set_body(&[Cell::new(0, 1), Cell::new(0, 0), Cell::new(1, 0)], Direction::Right);
        engine.place_food(Cell::new(1, 1));
        engine.advance(100, &mut scores);
        let snap = engine.snapshot();
        assert_eq!(snap.phase, SnakePhase::GameOver);
        assert_eq!(snap.end_cause, Some(EndCause::BoardFull));
        assert_eq!(snap.body.len(), 4);
    }

    #[test]
    fn test_empty_grid_ends_without_panicking() {
        let mut scores = ScoreStore::in_memory();
        let tuning = SnakeTuning {
            grid_size: 0,
            ..Default::default()
        };
        let mut engine = SnakeEngine::new(tuning, 2, 0, &scores);
        engine.handle_input(SnakeInput::Start, 0, &mut scores);
        engine.advance(100, &mut scores);
        assert_eq!(engine.phase(), SnakePhase::GameOver);
        assert_eq!(engine.snapshot().end_cause, Some(EndCause::Wall));
    }

    #[test]
    fn test_turn_ignored_before_start() {
        let mut scores = ScoreStore::in_memory();
        let mut engine = SnakeEngine::new(SnakeTuning::default(), 1, 0, &scores);
        engine.handle_input(SnakeInput::Turn(Direction::Up), 0, &mut scores);
        engine.advance(1000, &mut scores);
        assert_eq!(engine.phase(), SnakePhase::Idle);
        assert_eq!(engine.head(), Some(Cell::new(5, 10)));
    }

    proptest! {
        #[test]
        fn prop_reversal_never_applied(turns in proptest::collection::vec(0usize..4, 1..40)) {
            let mut scores = ScoreStore::in_memory();
            let mut engine = started(&mut scores);
            let mut now = 0;
            for t in turns {
                // Keep the snake near the middle so it never hits a wall
                engine.set_body(&[Cell::new(10, 10), Cell::new(9, 10)], Direction::Right);
                engine.place_food(Cell::new(0, 0));
                let committed = engine.direction();
                engine.handle_input(SnakeInput::Turn(Direction::ALL[t]), now, &mut scores);
                now += 100;
                engine.advance(now, &mut scores);
                prop_assert_ne!(engine.direction(), committed.opposite());
                prop_assert_eq!(engine.phase(), SnakePhase::Playing);
            }
        }
    }
}
