//! Browser bindings
//!
//! The page owns rendering and routing; it drives one `WebArcade` with
//! JSON-encoded inputs and polls JSON snapshots each animation frame.

use wasm_bindgen::prelude::*;

use crate::arcade::{Arcade, GameInput};
use crate::audio::WebAudio;
use crate::highscores::{GameId, ScoreKey, ScoreStore};
use crate::persistence::{LocalStorage, MemoryStorage};
use crate::platform::{Clock, SystemClock, entropy_seed};
use crate::settings::Settings;
use crate::tuning::Tuning;

#[wasm_bindgen]
pub struct WebArcade {
    arcade: Arcade,
    clock: SystemClock,
}

#[wasm_bindgen]
impl WebArcade {
    /// `tuning_json` may override any subset of the default balance
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> WebArcade {
        let scores = match LocalStorage::open() {
            Ok(storage) => ScoreStore::new(storage),
            Err(e) => {
                log::warn!("{} - scores will not persist", e);
                ScoreStore::new(MemoryStorage::new())
            }
        };

        let tuning = match tuning_json.as_deref().map(Tuning::from_json) {
            Some(Ok(tuning)) => tuning,
            Some(Err(e)) => {
                log::warn!("Ignoring invalid tuning: {}", e);
                Tuning::default()
            }
            None => Tuning::default(),
        };

        let seed = entropy_seed();
        log::info!("Arcade initialized with seed: {}", seed);

        WebArcade {
            arcade: Arcade::new(scores, tuning, seed).with_audio(WebAudio::new()),
            clock: SystemClock::new(),
        }
    }

    /// Start a session by catalogue id; returns false for unknown ids
    pub fn select(&mut self, id: &str) -> bool {
        match GameId::from_id(id) {
            Some(game) => {
                self.arcade.select(game, self.clock.now_ms());
                true
            }
            None => {
                log::warn!("Unknown game id `{}`", id);
                false
            }
        }
    }

    pub fn leave(&mut self) {
        self.arcade.leave();
    }

    /// Apply a JSON input such as `{"game":"snake","input":{"Turn":"Up"}}`
    pub fn input(&mut self, json: &str) -> Result<(), JsValue> {
        let input: GameInput =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("bad input: {}", e)))?;
        self.arcade.input(input, self.clock.now_ms());
        Ok(())
    }

    /// Call once per animation frame
    pub fn tick(&mut self) {
        self.arcade.advance(self.clock.now_ms());
    }

    /// Current snapshot as JSON, or `null` when no game is active
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.arcade.snapshot()).unwrap_or_else(|_| "null".to_string())
    }

    /// Events since the last call, as a JSON array
    pub fn events(&mut self) -> String {
        serde_json::to_string(&self.arcade.drain_events()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Stored best for a game (and variant), if any
    pub fn best(&self, id: &str, variant: Option<String>) -> Option<f64> {
        let game = GameId::from_id(id)?;
        let key = match variant {
            Some(variant) => ScoreKey::with_variant(game, variant),
            None => ScoreKey::new(game),
        };
        self.arcade.scores().load(&key).map(|v| v as f64)
    }

    /// Forget the stored best and saved progress of a game
    pub fn reset_progress(&mut self, id: &str) -> bool {
        match GameId::from_id(id) {
            Some(game) => {
                self.arcade.reset_progress(game);
                true
            }
            None => false,
        }
    }

    /// Forward page visibility changes
    pub fn set_focused(&mut self, focused: bool) {
        self.arcade.set_focused(focused);
    }

    /// Start time of the running session, in the page clock's milliseconds
    pub fn started_at(&self) -> Option<f64> {
        self.arcade.session_started_at().map(|t| t as f64)
    }

    pub fn set_muted(&mut self, muted: bool) {
        let settings = Settings {
            muted,
            ..self.arcade.settings().clone()
        };
        self.arcade.set_settings(settings);
    }
}
