//! Game selection layer
//!
//! Holds at most one running engine. Switching games tears the previous
//! session down (cancelling every pending timer) before the next one is
//! built, so a stale callback can never touch a superseded session. Only the
//! `ScoreStore` outlives a session.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioSink, NullAudio};
use crate::catalog::{self, GameCatalog};
use crate::highscores::{GameId, ScoreStore};
use crate::settings::Settings;
use crate::sim::{
    EconomyEngine, EconomyInput, EconomySnapshot, Engine, GameEvent, ReactionEngine, ReactionInput,
    ReactionSnapshot, SequenceEngine, SequenceInput, SequenceSnapshot, SnakeEngine, SnakeInput,
    SnakeSnapshot, TapEngine, TapInput, TapSnapshot, TargetEngine, TargetInput, TargetSnapshot,
};
use crate::tuning::Tuning;

/// The running engine
pub enum ActiveGame {
    Reaction(ReactionEngine),
    Memory(SequenceEngine),
    TapFrenzy(TapEngine),
    Snake(SnakeEngine),
    Targets(TargetEngine),
    Economy(EconomyEngine),
}

/// Run `$body` against whichever engine is active
macro_rules! with_engine {
    ($game:expr, $engine:ident => $body:expr) => {
        match $game {
            ActiveGame::Reaction($engine) => $body,
            ActiveGame::Memory($engine) => $body,
            ActiveGame::TapFrenzy($engine) => $body,
            ActiveGame::Snake($engine) => $body,
            ActiveGame::Targets($engine) => $body,
            ActiveGame::Economy($engine) => $body,
        }
    };
}

impl ActiveGame {
    pub fn game_id(&self) -> GameId {
        with_engine!(self, e => e.game_id())
    }

    fn advance(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        with_engine!(self, e => e.advance(now_ms, scores))
    }

    fn teardown(&mut self, scores: &mut ScoreStore) {
        with_engine!(self, e => e.teardown(scores))
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        with_engine!(self, e => e.drain_events())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        match self {
            ActiveGame::Reaction(e) => GameSnapshot::Reaction(e.snapshot()),
            ActiveGame::Memory(e) => GameSnapshot::Memory(e.snapshot()),
            ActiveGame::TapFrenzy(e) => GameSnapshot::TapFrenzy(e.snapshot()),
            ActiveGame::Snake(e) => GameSnapshot::Snake(e.snapshot()),
            ActiveGame::Targets(e) => GameSnapshot::Targets(e.snapshot()),
            ActiveGame::Economy(e) => GameSnapshot::Economy(e.snapshot()),
        }
    }
}

/// Input addressed to one game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", content = "input", rename_all = "snake_case")]
pub enum GameInput {
    Reaction(ReactionInput),
    Memory(SequenceInput),
    TapFrenzy(TapInput),
    Snake(SnakeInput),
    Targets(TargetInput),
    Economy(EconomyInput),
}

impl GameInput {
    pub fn game_id(&self) -> GameId {
        match self {
            GameInput::Reaction(_) => GameId::Reaction,
            GameInput::Memory(_) => GameId::Memory,
            GameInput::TapFrenzy(_) => GameId::TapFrenzy,
            GameInput::Snake(_) => GameId::Snake,
            GameInput::Targets(_) => GameId::Targets,
            GameInput::Economy(_) => GameId::Economy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "game", content = "state", rename_all = "snake_case")]
pub enum GameSnapshot {
    Reaction(ReactionSnapshot),
    Memory(SequenceSnapshot),
    TapFrenzy(TapSnapshot),
    Snake(SnakeSnapshot),
    Targets(TargetSnapshot),
    Economy(EconomySnapshot),
}

pub struct Arcade {
    scores: ScoreStore,
    tuning: Tuning,
    settings: Settings,
    audio: Box<dyn AudioSink>,
    catalog: Option<Box<dyn GameCatalog>>,
    rng: Pcg32,
    active: Option<ActiveGame>,
    started_at: Option<u64>,
    focused: bool,
    events: Vec<GameEvent>,
}

impl Arcade {
    /// Settings are read from the score store's backend
    pub fn new(scores: ScoreStore, tuning: Tuning, seed: u64) -> Self {
        let settings = Settings::load(scores.storage());
        Self {
            scores,
            tuning: tuning.validated(),
            settings,
            audio: Box::new(NullAudio),
            catalog: None,
            rng: Pcg32::seed_from_u64(seed),
            active: None,
            started_at: None,
            focused: true,
            events: Vec::new(),
        }
    }

    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self.audio.set_volume(self.settings.effective_volume());
        self
    }

    pub fn with_catalog(mut self, catalog: impl GameCatalog + 'static) -> Self {
        self.catalog = Some(Box::new(catalog));
        self
    }

    pub fn scores(&self) -> &ScoreStore {
        &self.scores
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.audio.set_volume(self.settings.effective_volume());
        self.settings.save(self.scores.storage_mut());
    }

    /// Page focus; cues are dropped while unfocused if `mute_on_blur` is set
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn silenced(&self) -> bool {
        self.settings.muted || (!self.focused && self.settings.mute_on_blur)
    }

    pub fn catalog(&self) -> Option<&dyn GameCatalog> {
        self.catalog.as_deref()
    }

    pub fn active_game(&self) -> Option<GameId> {
        self.active.as_ref().map(ActiveGame::game_id)
    }

    /// When the running session was created
    pub fn session_started_at(&self) -> Option<u64> {
        self.started_at
    }

    /// Start a fresh session of `game`, ending the current one first
    pub fn select(&mut self, game: GameId, now_ms: u64) {
        self.leave();

        let seed: u64 = self.rng.random();
        let scores = &self.scores;
        let engine = match game {
            GameId::Reaction => {
                ActiveGame::Reaction(ReactionEngine::new(self.tuning.reaction.clone(), seed, now_ms, scores))
            }
            GameId::Memory => {
                ActiveGame::Memory(SequenceEngine::new(self.tuning.sequence.clone(), seed, now_ms, scores))
            }
            GameId::TapFrenzy => ActiveGame::TapFrenzy(TapEngine::new(
                self.tuning.tap.clone(),
                self.settings.tap_duration,
                now_ms,
                scores,
            )),
            GameId::Snake => ActiveGame::Snake(SnakeEngine::new(self.tuning.snake.clone(), seed, now_ms, scores)),
            GameId::Targets => {
                ActiveGame::Targets(TargetEngine::new(self.tuning.targets.clone(), seed, now_ms, scores))
            }
            GameId::Economy => ActiveGame::Economy(EconomyEngine::new(self.tuning.economy.clone(), now_ms, scores)),
        };
        self.active = Some(engine);
        self.started_at = Some(now_ms);
        log::info!("Selected {}", game.title());

        if let Some(catalog) = self.catalog.as_deref_mut()
            && let Err(e) = catalog::record_play(catalog, game.as_str())
        {
            log::warn!("Failed to record play for {}: {}", game.as_str(), e);
        }
    }

    /// End the current session, if any
    pub fn leave(&mut self) {
        self.started_at = None;
        if let Some(mut game) = self.active.take() {
            game.teardown(&mut self.scores);
            self.pump(&mut game);
            log::debug!("Left {}", game.game_id().as_str());
        }
    }

    /// Erase the stored best and saved state of `game`. A running session of
    /// that game is ended first so its teardown cannot write them back.
    pub fn reset_progress(&mut self, game: GameId) {
        if self.active_game() == Some(game) {
            self.leave();
        }
        self.scores.clear(game);
        log::info!("Progress reset for {}", game.title());
    }

    /// Route one input to the active engine. Input for another game is ignored.
    pub fn input(&mut self, input: GameInput, now_ms: u64) {
        let Some(mut game) = self.active.take() else {
            log::debug!("No active game, ignoring {:?}", input);
            return;
        };

        let scores = &mut self.scores;
        match (&mut game, input) {
            (ActiveGame::Reaction(e), GameInput::Reaction(i)) => e.handle_input(i, now_ms, scores),
            (ActiveGame::Memory(e), GameInput::Memory(i)) => e.handle_input(i, now_ms, scores),
            (ActiveGame::TapFrenzy(e), GameInput::TapFrenzy(i)) => {
                e.handle_input(i, now_ms, scores);
                if let TapInput::SelectDuration(duration) = i {
                    self.settings.tap_duration = e.snapshot().duration;
                    log::debug!("Tap Frenzy duration set to {}s", duration.secs());
                    self.settings.save(scores.storage_mut());
                }
            }
            (ActiveGame::Snake(e), GameInput::Snake(i)) => e.handle_input(i, now_ms, scores),
            (ActiveGame::Targets(e), GameInput::Targets(i)) => e.handle_input(i, now_ms, scores),
            (ActiveGame::Economy(e), GameInput::Economy(i)) => e.handle_input(i, now_ms, scores),
            (game, input) => log::debug!(
                "Input for {} ignored while {} is active",
                input.game_id().as_str(),
                game.game_id().as_str()
            ),
        }

        self.pump(&mut game);
        self.active = Some(game);
    }

    /// Process timers due at or before `now_ms`
    pub fn advance(&mut self, now_ms: u64) {
        if let Some(mut game) = self.active.take() {
            game.advance(now_ms, &mut self.scores);
            self.pump(&mut game);
            self.active = Some(game);
        }
    }

    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.active.as_ref().map(ActiveGame::snapshot)
    }

    /// Events since the last call (sound cues included, already played)
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn pump(&mut self, game: &mut ActiveGame) {
        for event in game.drain_events() {
            if let GameEvent::Sound(effect) = event
                && !self.silenced()
            {
                self.audio.play(effect);
            }
            self.events.push(event);
        }
    }
}

impl Drop for Arcade {
    fn drop(&mut self) {
        self.leave();
    }
}
