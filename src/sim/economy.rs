//! Cookie Clicker: idle economy
//!
//! Open-ended; load and save are the lifecycle. Amounts are fixed-point
//! milli-units so fractional passive income survives persistence exactly.
//! Upgrade prices follow `ceil(base * 1.15^owned)`, evaluated exactly as a
//! rational (`23^n / 20^n`) while it fits in 128 bits.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::clock::TickClock;
use super::{Engine, GameEvent};
use crate::audio::SoundEffect;
use crate::consts::{COST_GROWTH, MILLI_PER_UNIT};
use crate::highscores::{GameId, ScoreStore};
use crate::tuning::EconomyTuning;

/// Fixed-point amount in thousandths of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milli(pub u64);

impl Milli {
    pub const ZERO: Milli = Milli(0);

    pub const fn from_units(units: u64) -> Self {
        Milli(units.saturating_mul(MILLI_PER_UNIT))
    }

    /// Whole units, rounded down
    pub fn units(self) -> u64 {
        self.0 / MILLI_PER_UNIT
    }

    pub fn saturating_add(self, other: Milli) -> Self {
        Milli(self.0.saturating_add(other.0))
    }

    pub fn checked_sub(self, other: Milli) -> Option<Self> {
        self.0.checked_sub(other.0).map(Milli)
    }
}

impl fmt::Display for Milli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.units(), self.0 % MILLI_PER_UNIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    Cursor,
    Grandma,
    Farm,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 3] = [UpgradeKind::Cursor, UpgradeKind::Grandma, UpgradeKind::Farm];

    pub fn base_cost(self) -> u64 {
        match self {
            UpgradeKind::Cursor => 15,
            UpgradeKind::Grandma => 100,
            UpgradeKind::Farm => 500,
        }
    }

    /// Passive income added per unit bought
    pub fn per_second_bonus(self) -> Milli {
        match self {
            UpgradeKind::Cursor => Milli(100),
            UpgradeKind::Grandma => Milli::from_units(1),
            UpgradeKind::Farm => Milli::from_units(5),
        }
    }

    /// Click yield added per unit bought
    pub fn per_click_bonus(self) -> u64 {
        match self {
            UpgradeKind::Cursor => 1,
            UpgradeKind::Grandma | UpgradeKind::Farm => 0,
        }
    }
}

/// Price in whole units of the next unit when `owned` are already held
pub fn upgrade_cost(base: u64, owned: u32) -> u64 {
    let mut num: u128 = u128::from(base);
    let mut den: u128 = 1;
    for _ in 0..owned {
        match (num.checked_mul(23), den.checked_mul(20)) {
            (Some(n), Some(d)) => {
                num = n;
                den = d;
            }
            _ => {
                let cost = (base as f64 * COST_GROWTH.powi(owned as i32)).ceil();
                // Float-to-int casts saturate
                return cost as u64;
            }
        }
    }
    let cost = num.div_ceil(den);
    u64::try_from(cost).unwrap_or(u64::MAX)
}

/// Persisted economy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyState {
    pub resource: Milli,
    /// Whole units per click
    pub per_action_yield: u64,
    pub per_second_yield: Milli,
    pub upgrades: BTreeMap<UpgradeKind, u32>,
    #[serde(default)]
    pub total_clicks: u64,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self {
            resource: Milli::ZERO,
            per_action_yield: 1,
            per_second_yield: Milli::ZERO,
            upgrades: BTreeMap::new(),
            total_clicks: 0,
        }
    }
}

impl EconomyState {
    pub fn owned(&self, kind: UpgradeKind) -> u32 {
        self.upgrades.get(&kind).copied().unwrap_or(0)
    }

    pub fn cost_of(&self, kind: UpgradeKind) -> u64 {
        upgrade_cost(kind.base_cost(), self.owned(kind))
    }

    /// Shape check for loaded saves
    pub fn is_valid(&self) -> bool {
        self.per_action_yield >= 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyInput {
    Click,
    Buy(UpgradeKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EconomyTimer {
    Accrue,
    Autosave,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeOffer {
    pub kind: UpgradeKind,
    pub owned: u32,
    pub cost: u64,
    pub affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomySnapshot {
    pub resource: Milli,
    pub per_click: u64,
    pub per_second: Milli,
    pub total_clicks: u64,
    pub offers: Vec<UpgradeOffer>,
}

pub struct EconomyEngine {
    tuning: EconomyTuning,
    clock: TickClock<EconomyTimer>,
    state: EconomyState,
    /// Sub-milli remainder of passive accrual
    carry: u64,
    events: Vec<GameEvent>,
}

impl EconomyEngine {
    /// Resume the saved economy, or start fresh when none is usable
    pub fn new(tuning: EconomyTuning, now_ms: u64, scores: &ScoreStore) -> Self {
        let state = match scores.load_state::<EconomyState>(GameId::Economy) {
            Some(state) if state.is_valid() => {
                log::info!("Resumed economy with {} cookies", state.resource);
                state
            }
            Some(_) => {
                log::warn!("Economy save failed validation, starting fresh");
                EconomyState::default()
            }
            None => EconomyState::default(),
        };

        let mut clock = TickClock::new(now_ms);
        clock.every(tuning.tick_ms, EconomyTimer::Accrue);
        clock.every(
            tuning.tick_ms.saturating_mul(u64::from(tuning.autosave_ticks.max(1))),
            EconomyTimer::Autosave,
        );

        Self {
            tuning,
            clock,
            state,
            carry: 0,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &EconomyState {
        &self.state
    }

    fn accrue(&mut self) {
        let scaled = u128::from(self.state.per_second_yield.0) * u128::from(self.tuning.tick_ms)
            + u128::from(self.carry);
        let per_sec_ms = u128::from(1000u64);
        let gained = u64::try_from(scaled / per_sec_ms).unwrap_or(u64::MAX);
        self.carry = (scaled % per_sec_ms) as u64;
        self.state.resource = self.state.resource.saturating_add(Milli(gained));
    }

    fn click(&mut self) {
        self.state.total_clicks += 1;
        self.state.resource = self
            .state
            .resource
            .saturating_add(Milli::from_units(self.state.per_action_yield));
        self.events.push(GameEvent::Sound(SoundEffect::Click));
    }

    /// Returns whether the purchase went through; state is untouched otherwise
    fn buy(&mut self, kind: UpgradeKind) -> bool {
        let cost = Milli::from_units(self.state.cost_of(kind));
        let Some(remaining) = self.state.resource.checked_sub(cost) else {
            log::debug!("Cannot afford {:?} ({} < {})", kind, self.state.resource, cost);
            return false;
        };
        self.state.resource = remaining;
        *self.state.upgrades.entry(kind).or_insert(0) += 1;
        self.state.per_action_yield += kind.per_click_bonus();
        self.state.per_second_yield = self.state.per_second_yield.saturating_add(kind.per_second_bonus());
        self.events.push(GameEvent::Sound(SoundEffect::Purchase));
        log::info!("Bought {:?} #{}", kind, self.state.owned(kind));
        true
    }

    fn save(&self, scores: &mut ScoreStore) {
        scores.save_state(GameId::Economy, &self.state);
    }

    fn run_timers(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        while let Some(fired) = self.clock.pop_due(now_ms) {
            match fired.event {
                EconomyTimer::Accrue => self.accrue(),
                EconomyTimer::Autosave => self.save(scores),
            }
        }
    }
}

impl Engine for EconomyEngine {
    type Input = EconomyInput;
    type Snapshot = EconomySnapshot;

    fn game_id(&self) -> GameId {
        GameId::Economy
    }

    fn handle_input(&mut self, input: EconomyInput, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms, scores);

        let changed = match input {
            EconomyInput::Click => {
                self.click();
                true
            }
            EconomyInput::Buy(kind) => self.buy(kind),
        };
        if changed {
            self.save(scores);
        }
    }

    fn advance(&mut self, now_ms: u64, scores: &mut ScoreStore) {
        self.run_timers(now_ms, scores);
    }

    fn snapshot(&self) -> EconomySnapshot {
        let offers = UpgradeKind::ALL
            .into_iter()
            .map(|kind| {
                let cost = self.state.cost_of(kind);
                UpgradeOffer {
                    kind,
                    owned: self.state.owned(kind),
                    cost,
                    affordable: self.state.resource >= Milli::from_units(cost),
                }
            })
            .collect();
        EconomySnapshot {
            resource: self.state.resource,
            per_click: self.state.per_action_yield,
            per_second: self.state.per_second_yield,
            total_clicks: self.state.total_clicks,
            offers,
        }
    }

    fn teardown(&mut self, scores: &mut ScoreStore) {
        self.clock.cancel_all();
        self.save(scores);
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
