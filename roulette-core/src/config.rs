//! Engine configuration: session setup, rule tables and continuation timings.

use crate::catalog::{
    BossArchetype, BossKind, EventKind, ItemKind, Pact, Talent, Tier, BOSS_ARCHETYPES,
    EVENT_WEIGHTS, ITEM_TIERS, STARTER_ITEM_COUNT,
};
use crate::model::Mode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in static game data or session setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Item {0} has no loot weight")]
    MissingItemWeight(ItemKind),

    #[error("Item {0} is listed more than once")]
    DuplicateItem(ItemKind),

    #[error("Event table is empty")]
    EmptyEventTable,

    #[error("Event {0:?} has zero weight")]
    ZeroEventWeight(EventKind),

    #[error("No boss archetypes defined")]
    NoBosses,

    #[error("Boss {0:?} is not in the archetype table")]
    UnknownBoss(BossKind),

    #[error("Expected at most {expected} starter items, got {found}")]
    TooManyStarterItems { expected: usize, found: usize },

    #[error("Starter item {0} is not available in this mode")]
    StarterItemUnavailable(ItemKind),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Loot rarity of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemWeight {
    pub item: ItemKind,
    pub tier: Tier,
}

/// Selection weight of one table event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWeight {
    pub event: EventKind,
    pub weight: u32,
}

/// Static data the engine is driven by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTables {
    #[serde(default)]
    pub items: Vec<ItemWeight>,
    #[serde(default)]
    pub events: Vec<EventWeight>,
    #[serde(default)]
    pub bosses: Vec<BossArchetype>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            items: ITEM_TIERS
                .iter()
                .map(|&(item, tier)| ItemWeight { item, tier })
                .collect(),
            events: EVENT_WEIGHTS
                .iter()
                .map(|&(event, weight)| EventWeight { event, weight })
                .collect(),
            bosses: BOSS_ARCHETYPES.clone(),
        }
    }
}

impl RuleTables {
    /// Parse tables from TOML and validate them.
    ///
    /// ```toml
    /// [[items]]
    /// item = "saw"
    /// tier = "rare"
    ///
    /// [[events]]
    /// event = "normal"
    /// weight = 4
    ///
    /// [[bosses]]
    /// kind = "butcher"
    /// style = "aggressive"
    /// loadout = [{ item = "saw", count = 2 }]
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let tables: RuleTables = toml::from_str(source)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Every item must carry exactly one weight, the event table must be
    /// usable, and at least one boss must exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for item in ItemKind::ALL {
            match self.items.iter().filter(|w| w.item == item).count() {
                0 => return Err(ConfigError::MissingItemWeight(item)),
                1 => {}
                _ => return Err(ConfigError::DuplicateItem(item)),
            }
        }
        if self.events.is_empty() {
            return Err(ConfigError::EmptyEventTable);
        }
        if let Some(zero) = self.events.iter().find(|e| e.weight == 0) {
            return Err(ConfigError::ZeroEventWeight(zero.event));
        }
        if self.bosses.is_empty() {
            return Err(ConfigError::NoBosses);
        }
        Ok(())
    }

    pub fn item_weight(&self, item: ItemKind) -> Option<u32> {
        self.items
            .iter()
            .find(|w| w.item == item)
            .map(|w| w.tier.weight())
    }

    /// Items that can drop in `mode`, minus anything banned this session.
    pub fn loot_pool(&self, mode: Mode, banned: &[ItemKind]) -> Vec<ItemKind> {
        ItemKind::ALL
            .iter()
            .copied()
            .filter(|item| mode == Mode::Pvp || !item.is_pvp_only())
            .filter(|item| !banned.contains(item))
            .collect()
    }

    pub fn boss(&self, kind: BossKind) -> Option<&BossArchetype> {
        self.bosses.iter().find(|b| b.kind == kind)
    }
}

/// Logical delays of the engine's continuations, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Opponent "thinking" before each AI action.
    pub ai_think_ms: u64,
    /// Pause before a new round once the magazine runs dry after a shot.
    pub new_round_ms: u64,
    /// Pause before a new round once a Beer empties the magazine.
    pub beer_reload_ms: u64,
    /// Enrage splash before play continues.
    pub enrage_ms: u64,
    /// Session intro before the first turn of a session.
    pub intro_ms: u64,
    /// Reload pause before the first turn of any later round.
    pub reload_ms: u64,
    /// Pause before a shooter who kept the turn acts again.
    pub keep_turn_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            ai_think_ms: 1500,
            new_round_ms: 2000,
            beer_reload_ms: 1500,
            enrage_ms: 2600,
            intro_ms: 2500,
            reload_ms: 1000,
            keep_turn_ms: 1000,
        }
    }
}

impl Timings {
    /// Every continuation fires on the next tick.
    pub fn instant() -> Self {
        Self {
            ai_think_ms: 0,
            new_round_ms: 0,
            beer_reload_ms: 0,
            enrage_ms: 0,
            intro_ms: 0,
            reload_ms: 0,
            keep_turn_ms: 0,
        }
    }
}

/// Configuration for starting a new session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Versus a boss, or two local seats.
    pub mode: Mode,

    /// Player talent. Ignored in versus mode.
    pub talent: Option<Talent>,

    /// Player pact. Ignored in versus mode.
    pub pact: Option<Pact>,

    /// Harder rules: +1 live damage, no duds, reshuffle on blanks.
    pub twisted: bool,

    /// Up to two items the player starts with.
    pub starter_items: Vec<ItemKind>,

    /// Fixed first boss instead of a random one.
    pub boss: Option<BossKind>,

    pub timings: Timings,

    pub tables: RuleTables,
}

impl EngineConfig {
    /// A session against the AI.
    pub fn pve() -> Self {
        Self {
            mode: Mode::Pve,
            talent: None,
            pact: None,
            twisted: false,
            starter_items: Vec::new(),
            boss: None,
            timings: Timings::default(),
            tables: RuleTables::default(),
        }
    }

    /// Two local seats sharing one table.
    pub fn pvp() -> Self {
        Self {
            mode: Mode::Pvp,
            ..Self::pve()
        }
    }

    pub fn with_talent(mut self, talent: Talent) -> Self {
        self.talent = Some(talent);
        self
    }

    pub fn with_pact(mut self, pact: Pact) -> Self {
        self.pact = Some(pact);
        self
    }

    pub fn with_twisted(mut self, twisted: bool) -> Self {
        self.twisted = twisted;
        self
    }

    pub fn with_starter_items(mut self, items: impl IntoIterator<Item = ItemKind>) -> Self {
        self.starter_items = items.into_iter().collect();
        self
    }

    /// Face a specific boss first.
    pub fn with_boss(mut self, boss: BossKind) -> Self {
        self.boss = Some(boss);
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_tables(mut self, tables: RuleTables) -> Self {
        self.tables = tables;
        self
    }

    /// Check the tables and the session setup against each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tables.validate()?;
        if self.starter_items.len() > STARTER_ITEM_COUNT {
            return Err(ConfigError::TooManyStarterItems {
                expected: STARTER_ITEM_COUNT,
                found: self.starter_items.len(),
            });
        }
        for (i, item) in self.starter_items.iter().enumerate() {
            if self.starter_items[..i].contains(item) {
                return Err(ConfigError::DuplicateItem(*item));
            }
        }
        if self.mode == Mode::Pve {
            if let Some(item) = self.starter_items.iter().find(|i| i.is_pvp_only()) {
                return Err(ConfigError::StarterItemUnavailable(*item));
            }
            if let Some(boss) = self.boss {
                if self.tables.boss(boss).is_none() {
                    return Err(ConfigError::UnknownBoss(boss));
                }
            }
        }
        Ok(())
    }

    /// Talent in effect: versus mode has none.
    pub fn effective_talent(&self) -> Option<Talent> {
        match self.mode {
            Mode::Pve => self.talent,
            Mode::Pvp => None,
        }
    }

    /// Pact in effect: versus mode has none.
    pub fn effective_pact(&self) -> Option<Pact> {
        match self.mode {
            Mode::Pve => self.pact,
            Mode::Pvp => None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::pve()
    }
}
