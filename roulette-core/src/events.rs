//! Structured notifications for the presentation layer.
//!
//! The engine never formats text. Every observable step is pushed as an
//! [`EngineEvent`] and drained by the caller in order.

use crate::catalog::{BossKind, EventKind, ItemKind, Reward};
use crate::dice::{SicBoBet, SicBoRoll};
use crate::model::{Boss, Outcome, SeatId, Shell, Target, Verdict};
use serde::{Deserialize, Serialize};

/// How a fired shell resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellOutcome {
    Live,
    Blank,
    /// A live shell that failed to fire.
    Dud,
    /// A blank that went off anyway.
    Volatile,
}

impl ShellOutcome {
    pub fn is_live(self) -> bool {
        matches!(self, ShellOutcome::Live | ShellOutcome::Volatile)
    }
}

/// Why an item use did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullifiedBy {
    Feint,
    Tactician,
    Jam,
}

/// Result of an item that took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    /// Magnifier. `shown` is `None` when the reading is hidden from the player.
    Inspected { shown: Option<Shell> },
    /// Beer ejected the next shell.
    Ejected { shell: Shell },
    DamageBoosted { multiplier: i32 },
    Healed { amount: i32 },
    Cuffed { seat: SeatId },
    Inverted,
    Jammed { seat: SeatId },
    /// Mirror is waiting for the user to pick an item.
    MirrorSelecting,
    /// Mirror had nothing to take and went back to the user.
    MirrorRefunded,
    /// Mirror took an item, or wasted itself when `item` is `None`.
    Stole { from: SeatId, item: Option<ItemKind> },
    Preloaded,
    FeintArmed,
    SafetyArmed,
    VisorArmed,
    ShotDelayed,
    DeathChipArmed,
    Adrenaline { cuffed: SeatId },
    /// Phone. `position` counts from the next shell (1 = next); `None` if
    /// nothing unknown was left.
    Phoned { position: Option<usize>, shell: Option<Shell> },
    /// Hourglass; `moved` is false when one shell or fewer remained.
    Cycled { moved: bool },
}

/// Status changes worth showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChange {
    ShieldGained { shield: u32 },
    ShieldBroke,
    PoisonQueued { damage: i32, turns: u32 },
    PoisonTick { damage: i32 },
    AdrenalineCrash,
    DoctorHealed,
    GamblerStole { item: ItemKind },
    SafetySaved,
    DeathChipTriggered { damage: i32 },
    AcutePenalty,
    SacrificePaid,
    SacrificeWaived,
    /// Handcuffs or the strict pact skipped this seat's turn.
    TurnSkipped,
    StrictSkipArmed,
    DevilDealWon,
    DevilDealLost,
    AlarmCharged { buff: i32 },
    SelfDestruct,
    GreedLoot,
    ButcherPadding,
}

/// Achievement-worthy moments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    SelfShotBlank,
    SelfShotLive,
    SelfShotBlankAtOneHp,
    FirstSmoke,
    ThreeMagnifiers,
    ThreeBeers,
    MirrorSteal,
    FirstPreload,
    FirstSaw,
    FirstCuffs,
    FirstInverter,
    FirstJammer,
    HoardSixItems,
    Overkill,
    SafetySave,
    WonAtOneHp,
    WonWithFullHp,
    TwistedWin,
    ButcherSlain,
    GamblerSlain,
    DoctorSlain,
    TacticianSlain,
    PactWin,
    FogWin,
    SacrificeWin,
    ReachedLevelThree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EngineEvent {
    RoundStarted {
        event: EventKind,
        boss: Option<Boss>,
        live: usize,
        total: usize,
        all_live: bool,
        resurrection: bool,
        russian_roulette: bool,
        intro: bool,
    },
    ItemsBanned {
        items: Vec<ItemKind>,
    },
    ItemsLooted {
        seat: SeatId,
        items: Vec<ItemKind>,
    },
    InventoryFull {
        seat: SeatId,
    },
    TurnOrderRolled {
        player: u8,
        opponent: u8,
    },
    TurnStarted {
        seat: SeatId,
        devil_deal: bool,
    },
    ShotFired {
        shooter: SeatId,
        target: Target,
        victim: SeatId,
        outcome: ShellOutcome,
        damage: i32,
    },
    ItemUsed {
        seat: SeatId,
        item: ItemKind,
        effect: ItemEffect,
        doubled: bool,
    },
    ItemNullified {
        seat: SeatId,
        item: ItemKind,
        by: NullifiedBy,
    },
    Status {
        seat: SeatId,
        change: StatusChange,
    },
    MagazineShuffled,
    EchoReturned,
    Enraged {
        boss: BossKind,
        gained: Option<ItemKind>,
    },
    Resurrected {
        seat: SeatId,
        lives: u32,
    },
    SicBoStarted,
    SicBoResolved {
        bet: SicBoBet,
        roll: SicBoRoll,
        /// `None` on a triple.
        player_won: Option<bool>,
    },
    MilestoneReached {
        milestone: Milestone,
    },
    DuelEnded {
        outcome: Outcome,
        verdict: Option<Verdict>,
    },
    RewardOffered {
        rewards: Vec<Reward>,
    },
    RewardChosen {
        reward: Reward,
        level: u32,
    },
    SnapshotDiscarded {
        reason: String,
    },
}
