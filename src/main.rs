//! Arcade Engines entry point
//!
//! Native: headless demo that autoplays every game against a manual clock and
//! logs the results. Web: installs logging; the page then drives `WebArcade`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
    }
    log::info!("Arcade engines loaded");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Arcade engines (native demo) starting...");

    let scores = demo::open_scores();
    let seed = arcade_engines::platform::entropy_seed();
    log::info!("Demo seed: {}", seed);

    let mut arcade = arcade_engines::Arcade::new(scores, arcade_engines::Tuning::default(), seed)
        .with_audio(arcade_engines::audio::LogAudio)
        .with_catalog(arcade_engines::catalog::InMemoryCatalog::builtin());
    let clock = arcade_engines::platform::ManualClock::new(0);

    demo::reaction(&mut arcade, &clock);
    demo::memory(&mut arcade, &clock);
    demo::tap(&mut arcade, &clock);
    demo::snake(&mut arcade, &clock);
    demo::targets(&mut arcade, &clock);
    demo::economy(&mut arcade, &clock);
    arcade.leave();

    demo::report(&arcade);
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use arcade_engines::catalog;
    use arcade_engines::persistence::{FileStorage, MemoryStorage};
    use arcade_engines::platform::{Clock, ManualClock};
    use arcade_engines::sim::{
        Direction, EconomyInput, GameEvent, ReactionInput, ReactionPhase, SequenceInput, SequencePhase, SnakeInput,
        SnakePhase, Symbol, TapInput, TapPhase, TargetInput, TargetPhase,
    };
    use arcade_engines::{Arcade, GameId, GameInput, GameSnapshot, ScoreKey, ScoreStore};

    /// Upper bound on simulated time per game
    const TIME_LIMIT_MS: u64 = 120_000;

    /// File storage when `ARCADE_DATA_DIR` is set, memory otherwise
    pub fn open_scores() -> ScoreStore {
        match std::env::var("ARCADE_DATA_DIR") {
            Ok(dir) => match FileStorage::open(&dir) {
                Ok(storage) => return ScoreStore::new(storage),
                Err(e) => log::warn!("Cannot use {}: {} - falling back to memory", dir, e),
            },
            Err(_) => log::info!("ARCADE_DATA_DIR not set, scores kept in memory"),
        }
        ScoreStore::new(MemoryStorage::new())
    }

    /// Step the clock until `done` holds or the time limit passes
    fn run_until(
        arcade: &mut Arcade,
        clock: &ManualClock,
        step_ms: u64,
        mut done: impl FnMut(&GameSnapshot) -> bool,
    ) -> Option<GameSnapshot> {
        let deadline = clock.now_ms() + TIME_LIMIT_MS;
        while clock.now_ms() < deadline {
            arcade.advance(clock.advance(step_ms));
            let snap = arcade.snapshot()?;
            if done(&snap) {
                return Some(snap);
            }
        }
        log::warn!("Demo gave up after {}ms", TIME_LIMIT_MS);
        None
    }

    fn log_outcome(arcade: &mut Arcade) {
        for event in arcade.drain_events() {
            match event {
                GameEvent::SessionOver { game, score } => log::info!("{} finished: {}", game.title(), score),
                GameEvent::NewBest { key, value } => log::info!("New best for {}: {}", key.game.title(), value),
                GameEvent::Sound(_) => {}
            }
        }
    }

    pub fn reaction(arcade: &mut Arcade, clock: &ManualClock) {
        arcade.select(GameId::Reaction, clock.now_ms());
        for _ in 0..3 {
            arcade.input(GameInput::Reaction(ReactionInput::Click), clock.now_ms());
            run_until(arcade, clock, 10, |s| matches!(s, GameSnapshot::Reaction(r) if r.phase == ReactionPhase::Go));
            // A steady human: 230ms
            clock.advance(230);
            arcade.input(GameInput::Reaction(ReactionInput::Click), clock.now_ms());
            if let Some(GameSnapshot::Reaction(snap)) = arcade.snapshot() {
                log::info!("Reaction: {:?} ({:?})", snap.last, snap.rating);
            }
        }
        log_outcome(arcade);
    }

    /// Watches the showing and replays it, fumbling on round six
    pub fn memory(arcade: &mut Arcade, clock: &ManualClock) {
        arcade.select(GameId::Memory, clock.now_ms());
        arcade.input(GameInput::Memory(SequenceInput::Start), clock.now_ms());

        let mut seen: Vec<Symbol> = Vec::new();
        let mut last_lit = None;
        let mut round = 0;
        let deadline = clock.now_ms() + TIME_LIMIT_MS;
        while clock.now_ms() < deadline {
            arcade.advance(clock.advance(50));
            let Some(GameSnapshot::Memory(snap)) = arcade.snapshot() else {
                break;
            };
            match snap.phase {
                SequencePhase::Showing => {
                    if let Some(symbol) = snap.lit
                        && last_lit != snap.lit
                    {
                        seen.push(symbol);
                    }
                    last_lit = snap.lit;
                }
                SequencePhase::Playing => {
                    round += 1;
                    let mut answer = std::mem::take(&mut seen);
                    if round == 6
                        && let Some(last) = answer.last_mut()
                    {
                        *last = Symbol::ALL[(usize::from(last.index()) + 1) % Symbol::ALL.len()];
                    }
                    for symbol in answer {
                        arcade.input(GameInput::Memory(SequenceInput::Press(symbol)), clock.now_ms());
                    }
                    last_lit = None;
                }
                SequencePhase::Lost | SequencePhase::Idle => break,
                SequencePhase::RoundWon => {}
            }
        }
        log_outcome(arcade);
    }

    pub fn tap(arcade: &mut Arcade, clock: &ManualClock) {
        arcade.select(GameId::TapFrenzy, clock.now_ms());
        arcade.input(GameInput::TapFrenzy(TapInput::Start), clock.now_ms());
        let deadline = clock.now_ms() + TIME_LIMIT_MS;
        let mut finished = false;
        while !finished && clock.now_ms() < deadline {
            arcade.input(GameInput::TapFrenzy(TapInput::Tap), clock.advance(150));
            finished = matches!(arcade.snapshot(), Some(GameSnapshot::TapFrenzy(s)) if s.phase == TapPhase::Finished);
        }
        log_outcome(arcade);
    }

    /// Greedy bot: head for the food, never reverse, dodge walls and body
    pub fn snake(arcade: &mut Arcade, clock: &ManualClock) {
        arcade.select(GameId::Snake, clock.now_ms());
        arcade.input(GameInput::Snake(SnakeInput::Start), clock.now_ms());

        let deadline = clock.now_ms() + TIME_LIMIT_MS;
        while clock.now_ms() < deadline {
            let Some(GameSnapshot::Snake(snap)) = arcade.snapshot() else {
                break;
            };
            if snap.phase != SnakePhase::Playing {
                break;
            }
            let Some(head) = snap.body.first().copied() else {
                break;
            };
            let safe = |d: Direction| {
                let next = head.step(d);
                d != snap.direction.opposite()
                    && (0..snap.grid_size).contains(&next.x)
                    && (0..snap.grid_size).contains(&next.y)
                    && !snap.body[..snap.body.len() - 1].contains(&next)
            };
            let distance = |d: Direction| {
                let next = head.step(d);
                (next.x - snap.food.x).abs() + (next.y - snap.food.y).abs()
            };
            if let Some(turn) = Direction::ALL.into_iter().filter(|d| safe(*d)).min_by_key(|d| distance(*d)) {
                arcade.input(GameInput::Snake(SnakeInput::Turn(turn)), clock.now_ms());
            }
            arcade.advance(clock.advance(100));
        }
        log_outcome(arcade);
    }

    /// Shoots the newest target every quarter second
    pub fn targets(arcade: &mut Arcade, clock: &ManualClock) {
        arcade.select(GameId::Targets, clock.now_ms());
        arcade.input(GameInput::Targets(TargetInput::Start), clock.now_ms());
        loop {
            let now = clock.advance(250);
            arcade.advance(now);
            let Some(GameSnapshot::Targets(snap)) = arcade.snapshot() else {
                break;
            };
            if snap.phase != TargetPhase::Playing {
                break;
            }
            if let Some(target) = snap.targets.last() {
                arcade.input(GameInput::Targets(TargetInput::Shoot(target.pos)), now);
            }
        }
        log_outcome(arcade);
    }

    pub fn economy(arcade: &mut Arcade, clock: &ManualClock) {
        arcade.select(GameId::Economy, clock.now_ms());
        for _ in 0..300 {
            arcade.input(GameInput::Economy(EconomyInput::Click), clock.advance(50));
            if let Some(GameSnapshot::Economy(snap)) = arcade.snapshot() {
                for offer in snap.offers.iter().rev().filter(|o| o.affordable).take(1) {
                    arcade.input(GameInput::Economy(EconomyInput::Buy(offer.kind)), clock.now_ms());
                }
            }
        }
        arcade.advance(clock.advance(10_000));
        if let Some(GameSnapshot::Economy(snap)) = arcade.snapshot() {
            log::info!(
                "Economy: {} cookies, {}/click, {}/s",
                snap.resource,
                snap.per_click,
                snap.per_second
            );
        }
    }

    pub fn report(arcade: &Arcade) {
        for game in GameId::ALL {
            let best = match game {
                GameId::TapFrenzy => arcade
                    .scores()
                    .load(&ScoreKey::with_variant(game, arcade.settings().tap_duration.variant_key())),
                _ => arcade.scores().load(&ScoreKey::new(game)),
            };
            match best {
                Some(best) => log::info!("Best {:<20} {}", game.title(), best),
                None => log::info!("Best {:<20} -", game.title()),
            }
        }
        if let Some(catalog) = arcade.catalog() {
            match catalog::top_played(catalog) {
                Ok(top) => {
                    for (rank, record) in top.iter().enumerate() {
                        log::info!("#{} {} ({} plays)", rank + 1, record.title, record.play_count);
                    }
                }
                Err(e) => log::warn!("Leaderboard unavailable: {}", e),
            }
        }
    }
}
