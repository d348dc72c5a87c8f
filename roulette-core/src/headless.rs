//! Headless driver for running whole sessions without a UI.
//!
//! Every human seat is played by a fixed policy, and continuations run as
//! soon as they are due. Useful for:
//! - Simulations over many seeds
//! - End-to-end tests of the full round/turn loop
//!
//! # Example
//!
//! ```ignore
//! use roulette_core::{EngineConfig, HeadlessConfig, HeadlessMatch, RngSource};
//!
//! let mut game = HeadlessMatch::new(
//!     HeadlessConfig::default().with_max_levels(3),
//!     EngineConfig::pve(),
//!     RngSource::seeded(7),
//! )?;
//! let report = game.run()?;
//! println!("{:?} after {} shots", report.outcome, report.shots);
//! ```

use crate::ai::{self, AiAction};
use crate::catalog::{BossStyle, Reward};
use crate::config::{ConfigError, EngineConfig};
use crate::dice::{RandomSource, SicBoBet};
use crate::engine::{ActionError, Awaiting, Engine};
use crate::events::EngineEvent;
use crate::model::{Outcome, SeatId};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from a headless run.
#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Action rejected: {0}")]
    Action(#[from] ActionError),

    #[error("No progress after {steps} steps")]
    Stalled { steps: usize },
}

/// How the human seats play.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Decision style used for human seats.
    pub style: BossStyle,
    /// Bet placed whenever the Gambler wagers.
    pub bet: SicBoBet,
    /// Reward taken after every PvE victory.
    pub reward: Reward,
    /// Stop after this many bosses (PvE).
    pub max_levels: u32,
    /// Upper bound on driver steps.
    pub max_steps: usize,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            style: BossStyle::Standard,
            bet: SicBoBet::Big,
            reward: Reward::Heal,
            max_levels: 1,
            max_steps: 10_000,
        }
    }
}

impl HeadlessConfig {
    pub fn with_style(mut self, style: BossStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_bet(mut self, bet: SicBoBet) -> Self {
        self.bet = bet;
        self
    }

    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_max_levels(mut self, levels: u32) -> Self {
        self.max_levels = levels.max(1);
        self
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub outcome: Outcome,
    pub levels_cleared: u32,
    pub shots: u32,
    pub steps: usize,
    pub events: Vec<EngineEvent>,
}

/// A session played start to finish by policies.
pub struct HeadlessMatch<R: RandomSource> {
    config: HeadlessConfig,
    engine: Engine<R>,
    events: Vec<EngineEvent>,
    levels_cleared: u32,
}

impl<R: RandomSource> HeadlessMatch<R> {
    pub fn new(config: HeadlessConfig, engine_config: EngineConfig, rng: R) -> Result<Self, HeadlessError> {
        let engine = Engine::new(engine_config, rng)?;
        Ok(Self {
            config,
            engine,
            events: Vec::new(),
            levels_cleared: 0,
        })
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    /// Play until the session ends or the level limit is reached.
    pub fn run(&mut self) -> Result<MatchReport, HeadlessError> {
        let mut steps = 0;
        while steps < self.config.max_steps {
            steps += 1;
            let done = self.step(steps)?;
            self.events.extend(self.engine.drain_events());
            if let Some(outcome) = done {
                return Ok(self.report(outcome, steps));
            }
        }
        Err(HeadlessError::Stalled { steps })
    }

    fn step(&mut self, steps: usize) -> Result<Option<Outcome>, HeadlessError> {
        match self.engine.awaiting() {
            Awaiting::Scheduled => {
                self.engine.run_next();
            }
            Awaiting::Input(seat) => self.act(seat)?,
            Awaiting::MirrorSelection(seat) => {
                let held = self.engine.state().seat(seat.other()).inventory.held();
                match held.first() {
                    Some(item) => self.engine.steal_with_mirror(seat, *item)?,
                    None => self.engine.cancel_mirror(seat)?,
                }
            }
            Awaiting::SicBoBet => {
                let roll = self.engine.bet_sic_bo(self.config.bet)?;
                debug!(%roll, "Headless wager");
            }
            Awaiting::RewardChoice => {
                self.levels_cleared += 1;
                if self.levels_cleared >= self.config.max_levels {
                    info!(levels = self.levels_cleared, "Level limit reached");
                    self.engine.abandon();
                    return Ok(Some(Outcome::Victory));
                }
                self.engine.choose_reward(self.config.reward)?;
            }
            Awaiting::Finished => {
                return Ok(Some(self.engine.state().session.outcome.unwrap_or(Outcome::Draw)));
            }
            Awaiting::Idle => return Err(HeadlessError::Stalled { steps }),
        }
        Ok(None)
    }

    fn act(&mut self, seat: SeatId) -> Result<(), HeadlessError> {
        let mut view = self.engine.ai_view(seat);
        view.style = self.config.style;
        match ai::choose_action(&view) {
            AiAction::UseItem(item) if !view.russian_roulette => {
                self.engine.use_item(seat, item)?;
            }
            AiAction::UseItem(_) => {
                self.engine
                    .fire(seat, ai::default_target(view.live_probability))?;
            }
            AiAction::Fire(target) => self.engine.fire(seat, target)?,
        }
        Ok(())
    }

    fn report(&mut self, outcome: Outcome, steps: usize) -> MatchReport {
        let events = std::mem::take(&mut self.events);
        let shots = events
            .iter()
            .filter(|e| matches!(e, EngineEvent::ShotFired { .. }))
            .count() as u32;
        MatchReport {
            outcome,
            levels_cleared: self.levels_cleared,
            shots,
            steps,
            events,
        }
    }
}
