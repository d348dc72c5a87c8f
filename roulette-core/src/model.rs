//! Core game state: seats, inventories, round flags and the session record.
//!
//! Everything here is plain data. The engine owns one [`GameState`] and is
//! the only thing that mutates it.

use crate::catalog::{
    BossKind, BossStyle, EventKind, ItemKind, Pact, Talent, MAX_ITEMS, STARTING_LIVES,
};
use crate::chamber::Magazine;
use crate::events::Milestone;
use crate::status::StatusEffects;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};
use uuid::Uuid;

/// One of the two seats at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatId {
    /// The local player.
    Player,
    /// The boss, or the second local player in versus mode.
    Opponent,
}

impl SeatId {
    pub const BOTH: [SeatId; 2] = [SeatId::Player, SeatId::Opponent];

    pub fn other(self) -> SeatId {
        match self {
            SeatId::Player => SeatId::Opponent,
            SeatId::Opponent => SeatId::Player,
        }
    }
}

/// A value held per seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatPair<T> {
    pub player: T,
    pub opponent: T,
}

impl<T> SeatPair<T> {
    pub fn new(player: T, opponent: T) -> Self {
        Self { player, opponent }
    }
}

impl<T: Clone> SeatPair<T> {
    pub fn splat(value: T) -> Self {
        Self {
            player: value.clone(),
            opponent: value,
        }
    }
}

impl<T> Index<SeatId> for SeatPair<T> {
    type Output = T;

    fn index(&self, seat: SeatId) -> &T {
        match seat {
            SeatId::Player => &self.player,
            SeatId::Opponent => &self.opponent,
        }
    }
}

impl<T> IndexMut<SeatId> for SeatPair<T> {
    fn index_mut(&mut self, seat: SeatId) -> &mut T {
        match seat {
            SeatId::Player => &mut self.player,
            SeatId::Opponent => &mut self.opponent,
        }
    }
}

/// A chambered round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shell {
    Live,
    Blank,
}

impl Shell {
    pub fn flipped(self) -> Shell {
        match self {
            Shell::Live => Shell::Blank,
            Shell::Blank => Shell::Live,
        }
    }

    pub fn is_live(self) -> bool {
        self == Shell::Live
    }
}

/// What a seat has learned about one chambered shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Knowledge {
    #[default]
    Unknown,
    KnownLive,
    KnownBlank,
}

impl Knowledge {
    pub fn of(shell: Shell) -> Knowledge {
        match shell {
            Shell::Live => Knowledge::KnownLive,
            Shell::Blank => Knowledge::KnownBlank,
        }
    }

    pub fn inverted(self) -> Knowledge {
        match self {
            Knowledge::Unknown => Knowledge::Unknown,
            Knowledge::KnownLive => Knowledge::KnownBlank,
            Knowledge::KnownBlank => Knowledge::KnownLive,
        }
    }

    pub fn shell(self) -> Option<Shell> {
        match self {
            Knowledge::Unknown => None,
            Knowledge::KnownLive => Some(Shell::Live),
            Knowledge::KnownBlank => Some(Shell::Blank),
        }
    }
}

/// One entry on the round's history track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEntry {
    Live,
    Blank,
    /// The magazine was reshuffled or a shell was inverted.
    Shuffled,
}

impl From<Shell> for HistoryEntry {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Live => HistoryEntry::Live,
            Shell::Blank => HistoryEntry::Blank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Player against a boss.
    Pve,
    /// Two local seats.
    Pvp,
}

/// Who a shot is aimed at, from the shooter's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Shooter,
    Enemy,
}

/// Item counts for one seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    counts: [u8; ItemKind::COUNT],
}

impl Inventory {
    pub fn count(&self, item: ItemKind) -> u8 {
        self.counts[item.index()]
    }

    pub fn has(&self, item: ItemKind) -> bool {
        self.count(item) > 0
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| u32::from(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn is_full(&self) -> bool {
        self.total() >= MAX_ITEMS
    }

    /// Add one unit unless the seat already holds [`MAX_ITEMS`].
    /// Returns `false` when the item was turned away.
    pub fn add(&mut self, item: ItemKind) -> bool {
        if self.is_full() {
            return false;
        }
        let slot = &mut self.counts[item.index()];
        *slot = slot.saturating_add(1);
        true
    }

    /// Remove one unit. Returns `false` if none were held.
    pub fn remove(&mut self, item: ItemKind) -> bool {
        let slot = &mut self.counts[item.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn clear(&mut self) {
        self.counts = [0; ItemKind::COUNT];
    }

    /// Kinds with at least one unit, in catalog order.
    pub fn held(&self) -> Vec<ItemKind> {
        ItemKind::ALL
            .iter()
            .copied()
            .filter(|item| self.has(*item))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u8)> + '_ {
        ItemKind::ALL
            .iter()
            .map(|&item| (item, self.count(item)))
            .filter(|(_, count)| *count > 0)
    }
}

/// One side of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub hp: i32,
    pub max_hp: i32,
    pub lives: u32,
    pub inventory: Inventory,
    pub status: StatusEffects,
}

impl Seat {
    pub fn new(max_hp: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            lives: STARTING_LIVES,
            inventory: Inventory::default(),
            status: StatusEffects::default(),
        }
    }

    pub fn is_down(&self) -> bool {
        self.hp <= 0
    }

    /// Heal up to max HP. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        (self.hp - before).max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossPhase {
    #[default]
    Normal,
    Enraged,
}

/// The current PvE opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boss {
    pub kind: BossKind,
    pub style: BossStyle,
    pub phase: BossPhase,
}

impl Boss {
    pub fn is_enraged(&self) -> bool {
        self.phase == BossPhase::Enraged
    }
}

/// Modifiers in force for the session and the current round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub talent: Option<Talent>,
    pub pact: Option<Pact>,
    pub event: EventKind,
    pub boss: Option<Boss>,
}

impl Modifiers {
    pub fn has_talent(&self, talent: Talent) -> bool {
        self.talent == Some(talent)
    }

    pub fn has_pact(&self, pact: Pact) -> bool {
        self.pact == Some(pact)
    }

    pub fn boss_is(&self, kind: BossKind) -> bool {
        self.boss.map(|b| b.kind) == Some(kind)
    }

    pub fn boss_style(&self) -> BossStyle {
        self.boss.map(|b| b.style).unwrap_or_default()
    }
}

/// How a duel ended, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
    Draw,
}

/// Closing remark on a finished duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Won at full HP.
    Perfect,
    /// Won at 1 HP.
    Clutch,
    /// Won with more live than blank shells on the track.
    Brutal,
    Lucky,
    /// Lost with a pact signed.
    Greedy,
    Sad,
}

/// Session-wide record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub mode: Mode,
    /// PvE level, starting at 1.
    pub level: u32,
    pub twisted: bool,
    /// Sudden-death sub-mode, scoped to the current round.
    pub russian_roulette: bool,
    /// Items removed from the loot pool for this session.
    pub banned_items: Vec<ItemKind>,
    pub magnifiers_used: u32,
    pub beers_drunk: u32,
    pub milestones: BTreeSet<Milestone>,
    pub outcome: Option<Outcome>,
    pub verdict: Option<Verdict>,
    pub abandoned: bool,
}

impl Session {
    pub fn new(mode: Mode, twisted: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            level: 1,
            twisted,
            russian_roulette: false,
            banned_items: Vec::new(),
            magnifiers_used: 0,
            beers_drunk: 0,
            milestones: BTreeSet::new(),
            outcome: None,
            verdict: None,
            abandoned: false,
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some() || self.abandoned
    }
}

/// Flags and counters that live for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub current_turn: SeatId,
    /// Set by the Saw; back to 1 after every shot.
    pub damage_multiplier: i32,
    /// Seat whose next turn start is skipped.
    pub cuffed: Option<SeatId>,
    pub items_used_this_turn: u32,
    pub damage_dealt_this_turn: bool,
    pub feint_armed: bool,
    pub safety_armed: SeatPair<bool>,
    pub visor_armed: bool,
    pub next_shot_delayed: bool,
    pub devil_deal_armed: bool,
    pub consecutive_live_shots: i32,
    pub false_alarm_buff: i32,
    pub tactician_block_armed: bool,
    pub history: Vec<HistoryEntry>,
}

impl RoundState {
    pub fn new(current_turn: SeatId) -> Self {
        Self {
            current_turn,
            damage_multiplier: 1,
            cuffed: None,
            items_used_this_turn: 0,
            damage_dealt_this_turn: false,
            feint_armed: false,
            safety_armed: SeatPair::default(),
            visor_armed: false,
            next_shot_delayed: false,
            devil_deal_armed: false,
            consecutive_live_shots: 0,
            false_alarm_buff: 0,
            tactician_block_armed: false,
            history: Vec::new(),
        }
    }

    pub fn live_entries(&self) -> usize {
        self.history
            .iter()
            .filter(|h| **h == HistoryEntry::Live)
            .count()
    }

    pub fn blank_entries(&self) -> usize {
        self.history
            .iter()
            .filter(|h| **h == HistoryEntry::Blank)
            .count()
    }
}

/// Everything the engine persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub session: Session,
    pub modifiers: Modifiers,
    pub seats: SeatPair<Seat>,
    pub round: RoundState,
    pub magazine: Magazine,
}

impl GameState {
    pub fn seat(&self, seat: SeatId) -> &Seat {
        &self.seats[seat]
    }

    pub fn seat_mut(&mut self, seat: SeatId) -> &mut Seat {
        &mut self.seats[seat]
    }

    pub fn is_pve(&self) -> bool {
        self.session.mode == Mode::Pve
    }

    /// Whether `seat` is driven by the built-in opponent policy.
    pub fn is_ai(&self, seat: SeatId) -> bool {
        self.is_pve() && seat == SeatId::Opponent
    }
}
