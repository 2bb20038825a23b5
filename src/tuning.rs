//! Data-driven game balance
//!
//! Defaults reproduce the shipped feel of every game. A JSON document may
//! override any subset of fields; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub reaction: ReactionTuning,
    pub sequence: SequenceTuning,
    pub tap: TapTuning,
    pub snake: SnakeTuning,
    pub targets: TargetTuning,
    pub economy: EconomyTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON override
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    /// Clamp every field into a range the engines can run with
    pub fn validated(self) -> Self {
        let original = self.clone();
        let validated = Self {
            reaction: self.reaction.validated(),
            sequence: self.sequence,
            tap: self.tap.validated(),
            snake: self.snake.validated(),
            targets: self.targets.validated(),
            economy: self.economy.validated(),
        };
        if validated != original {
            log::warn!("Tuning adjusted to playable values");
        }
        validated
    }
}

/// Longest stimulus delay accepted
pub const MAX_DELAY_MS: u64 = 60_000;

/// The initial body sits on row 10
pub const MIN_GRID_SIZE: i32 = 11;

pub const MAX_GRID_SIZE: i32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionTuning {
    /// Stimulus delay lower bound (inclusive)
    pub min_delay_ms: u64,
    /// Stimulus delay upper bound (exclusive)
    pub max_delay_ms: u64,
}

impl Default for ReactionTuning {
    fn default() -> Self {
        Self {
            min_delay_ms: 2000,
            max_delay_ms: 5000,
        }
    }
}

impl ReactionTuning {
    fn validated(self) -> Self {
        let min_delay_ms = self.min_delay_ms.min(MAX_DELAY_MS);
        Self {
            min_delay_ms,
            max_delay_ms: self.max_delay_ms.clamp(min_delay_ms + 1, MAX_DELAY_MS + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceTuning {
    /// Pause before the first symbol lights up
    pub lead_in_ms: u64,
    /// How long each symbol stays lit
    pub lit_ms: u64,
    /// Dark gap after each symbol
    pub gap_ms: u64,
    /// Pause after a completed round before the next showing
    pub round_pause_ms: u64,
}

impl Default for SequenceTuning {
    fn default() -> Self {
        Self {
            lead_in_ms: 500,
            lit_ms: 400,
            gap_ms: 200,
            round_pause_ms: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapTuning {
    /// Countdown tick (one budget unit = one tenth of a second)
    pub tick_ms: u64,
    /// Extra budget units removed per tap
    pub tap_penalty: u32,
}

impl Default for TapTuning {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            tap_penalty: 2,
        }
    }
}

impl TapTuning {
    fn validated(self) -> Self {
        Self {
            tick_ms: self.tick_ms.max(1),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeTuning {
    /// Cells per side of the square grid
    pub grid_size: i32,
    pub tick_ms: u64,
    pub food_points: u64,
    /// Random probes before falling back to scanning free cells
    pub spawn_attempts: u32,
}

impl Default for SnakeTuning {
    fn default() -> Self {
        Self {
            grid_size: 20,
            tick_ms: 100,
            food_points: 10,
            spawn_attempts: 64,
        }
    }
}

impl SnakeTuning {
    fn validated(self) -> Self {
        Self {
            grid_size: self.grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            tick_ms: self.tick_ms.max(1),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetTuning {
    /// Round length in countdown seconds
    pub round_secs: u32,
    pub spawn_interval_ms: u64,
    /// Period of the expiry sweep
    pub sweep_interval_ms: u64,
    /// Width of the play field in pixels, used to scale target radii
    pub field_px: f32,
}

impl Default for TargetTuning {
    fn default() -> Self {
        Self {
            round_secs: 30,
            spawn_interval_ms: 800,
            sweep_interval_ms: 50,
            field_px: 400.0,
        }
    }
}

impl TargetTuning {
    fn validated(self) -> Self {
        Self {
            spawn_interval_ms: self.spawn_interval_ms.max(1),
            sweep_interval_ms: self.sweep_interval_ms.max(1),
            field_px: if self.field_px.is_finite() && self.field_px >= 1.0 {
                self.field_px
            } else {
                Self::default().field_px
            },
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    /// Passive accrual tick
    pub tick_ms: u64,
    /// Autosave every this many accrual ticks
    pub autosave_ticks: u32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            autosave_ticks: 10,
        }
    }
}

impl EconomyTuning {
    fn validated(self) -> Self {
        Self {
            tick_ms: self.tick_ms.max(1),
            autosave_ticks: self.autosave_ticks.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{"snake":{"tick_ms":80},"targets":{"round_secs":10}}"#).unwrap();
        assert_eq!(tuning.snake.tick_ms, 80);
        assert_eq!(tuning.snake.grid_size, 20);
        assert_eq!(tuning.targets.round_secs, 10);
        assert_eq!(tuning.targets.spawn_interval_ms, 800);
        assert_eq!(tuning.reaction, ReactionTuning::default());
    }

    #[test]
    fn test_empty_override_is_default() {
        assert_eq!(Tuning::from_json("{}").unwrap(), Tuning::default());
    }

    #[test]
    fn test_defaults_are_already_valid() {
        assert_eq!(Tuning::default().validated(), Tuning::default());
    }

    #[test]
    fn test_degenerate_values_are_clamped() {
        let tuning = Tuning::from_json(
            r#"{
                "reaction": {"min_delay_ms": 18446744073709551615, "max_delay_ms": 0},
                "snake": {"grid_size": -3, "tick_ms": 0},
                "targets": {"field_px": 0.0, "spawn_interval_ms": 0},
                "economy": {"tick_ms": 0, "autosave_ticks": 0}
            }"#,
        )
        .unwrap();
        assert_eq!(tuning.reaction.min_delay_ms, MAX_DELAY_MS);
        assert_eq!(tuning.reaction.max_delay_ms, MAX_DELAY_MS + 1);
        assert_eq!(tuning.snake.grid_size, MIN_GRID_SIZE);
        assert_eq!(tuning.snake.tick_ms, 1);
        assert_eq!(tuning.targets.field_px, 400.0);
        assert_eq!(tuning.targets.spawn_interval_ms, 1);
        assert_eq!(tuning.economy.tick_ms, 1);
        assert_eq!(tuning.economy.autosave_ticks, 1);

        let huge = Tuning::from_json(r#"{"snake":{"grid_size":100000}}"#).unwrap();
        assert_eq!(huge.snake.grid_size, MAX_GRID_SIZE);
    }
}
