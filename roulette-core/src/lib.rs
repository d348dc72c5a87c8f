//! Turn-based duel engine built around a magazine of live and blank shells.
//!
//! This crate provides:
//! - The round/turn state machine for two seats (player vs. boss, or hot-seat)
//! - Item, talent, pact, event and boss-passive rules
//! - A logical scheduler for continuations, so nothing depends on wall-clock time
//! - Serializable snapshots for save/resume
//!
//! # Quick Start
//!
//! ```ignore
//! use roulette_core::{Awaiting, Engine, EngineConfig, Pact, SeatId, Target};
//!
//! let mut engine = Engine::with_thread_rng(EngineConfig::pve().with_pact(Pact::Power))?;
//! loop {
//!     match engine.awaiting() {
//!         Awaiting::Scheduled => { engine.run_next(); }
//!         Awaiting::Input(SeatId::Player) => engine.fire(SeatId::Player, Target::Enemy)?,
//!         Awaiting::Finished => break,
//!         _ => { /* selections, rewards */ }
//!     }
//!     for event in engine.drain_events() {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod ai;
pub mod catalog;
pub mod chamber;
mod combat;
pub mod config;
mod death;
pub mod dice;
pub mod engine;
pub mod events;
pub mod headless;
mod items;
pub mod model;
pub mod persist;
pub mod round;
pub mod status;
pub mod testing;
mod turn;

// Primary public API
pub use ai::{AiAction, AiView};
pub use catalog::{BossKind, BossStyle, EventKind, ItemKind, Pact, Reward, Talent, Tier};
pub use chamber::Magazine;
pub use combat::{settle_shell, DUD_CHANCE, VOLATILE_CHANCE};
pub use config::{ConfigError, EngineConfig, RuleTables, Timings};
pub use dice::{RandomSource, RngSource, SicBoBet, SicBoRoll};
pub use engine::{ActionError, Awaiting, Engine, Interaction};
pub use events::{EngineEvent, ItemEffect, Milestone, NullifiedBy, ShellOutcome, StatusChange};
pub use headless::{HeadlessConfig, HeadlessError, HeadlessMatch, MatchReport};
pub use model::{GameState, Knowledge, Mode, Outcome, SeatId, Shell, Target, Verdict};
pub use persist::{PersistError, Snapshot, SnapshotMetadata};
pub use round::RoundEntry;
pub use testing::{ScriptedRandom, TestHarness};
