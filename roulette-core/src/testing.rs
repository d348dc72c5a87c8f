//! Testing utilities for the duel engine.
//!
//! - `ScriptedRandom` replays queued rolls so outcomes are deterministic
//! - `TestHarness` builds an engine parked on a chosen turn with a fixed magazine
//! - Assertion helpers for seat state

use crate::catalog::{BossKind, EventKind, ItemKind, Pact, Talent};
use crate::chamber::Magazine;
use crate::config::{ConfigError, EngineConfig, Timings};
use crate::dice::{RandomSource, RngSource};
use crate::engine::Engine;
use crate::events::EngineEvent;
use crate::model::{Boss, BossPhase, GameState, SeatId, Shell};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Chance returned once the script runs out: high enough that no
/// probabilistic effect fires unless a test asks for it.
const FALLBACK_CHANCE: f64 = 0.999;

/// A [`RandomSource`] that replays queued values.
///
/// `chance()` pops from the chance queue, `below()` from the pick queue.
/// Picks are clamped into range. When the pick queue is empty, a seeded
/// generator takes over so reloads and dice still work.
pub struct ScriptedRandom {
    chances: VecDeque<f64>,
    picks: VecDeque<usize>,
    fallback: RngSource<ChaCha8Rng>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self {
            chances: VecDeque::new(),
            picks: VecDeque::new(),
            fallback: RngSource::seeded(0),
        }
    }

    pub fn push_chance(&mut self, value: f64) {
        self.chances.push_back(value);
    }

    pub fn push_pick(&mut self, value: usize) {
        self.picks.push_back(value);
    }
}

impl Default for ScriptedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ScriptedRandom {
    fn chance(&mut self) -> f64 {
        self.chances.pop_front().unwrap_or(FALLBACK_CHANCE)
    }

    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        match self.picks.pop_front() {
            Some(pick) => pick.min(n - 1),
            None => self.fallback.below(n),
        }
    }
}

/// Test harness for running duel scenarios.
///
/// Construction starts a session and then clears it back to a neutral
/// table: no queued continuations, empty inventories, the normal event.
pub struct TestHarness {
    pub engine: Engine<ScriptedRandom>,
}

impl TestHarness {
    /// Two human seats.
    pub fn pvp() -> Self {
        Self::from_config(EngineConfig::pvp()).expect("stock pvp config is valid")
    }

    /// Player against the computer, with no boss passives in play.
    pub fn pve() -> Self {
        let mut harness =
            Self::from_config(EngineConfig::pve()).expect("stock pve config is valid");
        harness.engine.state.modifiers.boss = None;
        let opponent = &mut harness.engine.state.seats.opponent;
        opponent.hp = opponent.max_hp;
        harness
    }

    /// Start from any config; the engine's own validation applies.
    pub fn from_config(config: EngineConfig) -> Result<Self, ConfigError> {
        let config = config.with_timings(Timings::default());
        let mut engine = Engine::new(config, ScriptedRandom::new())?;
        engine.scheduler.cancel_all();
        engine.input = None;
        engine.intro_pending = false;
        for seat in SeatId::BOTH {
            engine.state.seat_mut(seat).inventory.clear();
        }
        engine.state.modifiers.event = EventKind::Normal;
        engine.drain_events();
        Ok(Self { engine })
    }

    /// Seat the given boss (no loadout).
    pub fn with_boss(mut self, kind: BossKind) -> Self {
        let style = self
            .engine
            .tables
            .boss(kind)
            .map(|b| b.style)
            .unwrap_or_default();
        self.engine.state.modifiers.boss = Some(Boss {
            kind,
            style,
            phase: BossPhase::Normal,
        });
        self
    }

    pub fn with_pact(mut self, pact: Pact) -> Self {
        self.engine.state.modifiers.pact = Some(pact);
        self
    }

    pub fn with_talent(mut self, talent: Talent) -> Self {
        self.engine.state.modifiers.talent = Some(talent);
        self
    }

    pub fn with_event(mut self, event: EventKind) -> Self {
        self.engine.state.modifiers.event = event;
        self
    }

    pub fn with_twisted(mut self) -> Self {
        self.engine.state.session.twisted = true;
        self
    }

    /// Both seats at 1 HP and 1 life, Russian Roulette active.
    pub fn with_russian_roulette(mut self) -> Self {
        self.engine.state.session.russian_roulette = true;
        for seat in SeatId::BOTH {
            let seat = self.engine.state.seat_mut(seat);
            seat.hp = 1;
            seat.lives = 1;
        }
        self
    }

    /// Load exactly these shells. The last one fires first.
    pub fn with_magazine(mut self, shells: &[Shell]) -> Self {
        self.engine.state.magazine = Magazine::from_shells(shells.to_vec());
        self
    }

    pub fn with_hp(mut self, seat: SeatId, hp: i32) -> Self {
        self.engine.state.seat_mut(seat).hp = hp;
        self
    }

    pub fn with_max_hp(mut self, seat: SeatId, max_hp: i32) -> Self {
        let seat = self.engine.state.seat_mut(seat);
        seat.max_hp = max_hp;
        seat.hp = seat.hp.min(max_hp);
        self
    }

    pub fn with_lives(mut self, seat: SeatId, lives: u32) -> Self {
        self.engine.state.seat_mut(seat).lives = lives;
        self
    }

    pub fn with_items(mut self, seat: SeatId, items: &[ItemKind]) -> Self {
        for item in items {
            self.engine.state.seat_mut(seat).inventory.add(*item);
        }
        self
    }

    /// Arm a seat's safety for the current round.
    pub fn with_safety(mut self, seat: SeatId) -> Self {
        self.engine.state.round.safety_armed[seat] = true;
        self
    }

    /// Make it `seat`'s turn and hand it control.
    pub fn with_turn(mut self, seat: SeatId) -> Self {
        self.engine.scheduler.cancel_all();
        self.engine.state.round.current_turn = seat;
        self.engine.hand_off_control();
        self
    }

    /// Queue a value for the next `chance()` call.
    pub fn push_chance(&mut self, value: f64) -> &mut Self {
        self.engine.rng.push_chance(value);
        self
    }

    /// Queue a value for the next `below()` call.
    pub fn push_pick(&mut self, value: usize) -> &mut Self {
        self.engine.rng.push_pick(value);
        self
    }

    pub fn push_picks(&mut self, values: &[usize]) -> &mut Self {
        for value in values {
            self.engine.rng.push_pick(*value);
        }
        self
    }

    /// Direct access for scenario setup.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.engine.state
    }

    /// Events emitted since the last drain.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        self.engine.drain_events()
    }

    pub fn hp(&self, seat: SeatId) -> i32 {
        self.engine.state().seat(seat).hp
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert a seat's HP.
#[track_caller]
pub fn assert_hp(harness: &TestHarness, seat: SeatId, expected: i32) {
    let actual = harness.hp(seat);
    assert_eq!(actual, expected, "Expected {seat:?} at {expected} HP, got {actual}");
}

/// Assert some event in `events` matches `predicate`.
#[track_caller]
pub fn assert_emitted(events: &[EngineEvent], predicate: impl Fn(&EngineEvent) -> bool) {
    assert!(
        events.iter().any(predicate),
        "No matching event among {events:#?}"
    );
}
