//! Static game data: items, talents, pacts, table events and boss archetypes.
//!
//! These are the default tables the engine runs on. Everything here can be
//! overridden through [`crate::config::RuleTables`]; the engine itself only
//! hard-codes the constants below.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard cap on the number of items a seat may hold after looting.
pub const MAX_ITEMS: u32 = 8;

/// Number of starter items a PvE player picks before the first round.
pub const STARTER_ITEM_COUNT: usize = 2;

/// Lives each seat starts a session with.
pub const STARTING_LIVES: u32 = 2;

/// Player max HP before pact adjustments.
pub const PLAYER_BASE_HP: i32 = 4;

/// Max HP of both seats in a versus match.
pub const PVP_HP: i32 = 4;

/// Boss max HP is `BOSS_BASE_HP + level`.
pub const BOSS_BASE_HP: i32 = 3;

/// Shells in a normal magazine.
pub const MAGAZINE_SIZE: usize = 6;

// ============================================================================
// Items
// ============================================================================

/// Every consumable item in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Magnifier,
    Beer,
    Saw,
    Smoke,
    Cuffs,
    Inverter,
    Jammer,
    Mirror,
    Preload,
    Feint,
    Safety,
    Hourglass,
    Visor,
    DelayShell,
    DeathChip,
    Adrenaline,
    Phone,
}

impl ItemKind {
    pub const COUNT: usize = 17;

    pub const ALL: [ItemKind; ItemKind::COUNT] = [
        ItemKind::Magnifier,
        ItemKind::Beer,
        ItemKind::Saw,
        ItemKind::Smoke,
        ItemKind::Cuffs,
        ItemKind::Inverter,
        ItemKind::Jammer,
        ItemKind::Mirror,
        ItemKind::Preload,
        ItemKind::Feint,
        ItemKind::Safety,
        ItemKind::Hourglass,
        ItemKind::Visor,
        ItemKind::DelayShell,
        ItemKind::DeathChip,
        ItemKind::Adrenaline,
        ItemKind::Phone,
    ];

    /// Position of this item in [`ItemKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable identifier used in data files and saves.
    pub fn id(self) -> &'static str {
        match self {
            ItemKind::Magnifier => "magnifier",
            ItemKind::Beer => "beer",
            ItemKind::Saw => "saw",
            ItemKind::Smoke => "smoke",
            ItemKind::Cuffs => "cuffs",
            ItemKind::Inverter => "inverter",
            ItemKind::Jammer => "jammer",
            ItemKind::Mirror => "mirror",
            ItemKind::Preload => "preload",
            ItemKind::Feint => "feint",
            ItemKind::Safety => "safety",
            ItemKind::Hourglass => "hourglass",
            ItemKind::Visor => "visor",
            ItemKind::DelayShell => "delay_shell",
            ItemKind::DeathChip => "death_chip",
            ItemKind::Adrenaline => "adrenaline",
            ItemKind::Phone => "phone",
        }
    }

    pub fn from_id(id: &str) -> Option<ItemKind> {
        ItemKind::ALL.iter().copied().find(|item| item.id() == id)
    }

    /// Items that only make sense between two human seats.
    pub fn is_pvp_only(self) -> bool {
        matches!(self, ItemKind::Feint | ItemKind::Visor)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Loot rarity. The tier decides the weight of an item in the loot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Tier {
    pub fn weight(self) -> u32 {
        match self {
            Tier::Common => 4,
            Tier::Uncommon => 3,
            Tier::Rare => 2,
            Tier::Legendary => 1,
        }
    }
}

// ============================================================================
// Talents and pacts
// ============================================================================

/// Player-only passive chosen at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Talent {
    /// 30% chance to see the first shell of every reload.
    Eye,
    /// One extra item per loot.
    Pack,
    /// Self-shot blanks keep the turn even during Blood Debt.
    Luck,
    /// Live self-shots deal one less damage (minimum 1).
    Pain,
    /// Self-shot blanks charge the next live shot.
    Alarm,
    /// Opponent cannot read the history track.
    Poker,
    /// The player's magnifier readings lie half the time.
    Mis,
    /// Two random items are removed from the loot pool.
    Ban,
    /// +1 damage on a turn with no item used.
    Quick,
    /// Self-shot blanks hurt the opponent.
    Boom,
}

impl Talent {
    pub const ALL: [Talent; 10] = [
        Talent::Eye,
        Talent::Pack,
        Talent::Luck,
        Talent::Pain,
        Talent::Alarm,
        Talent::Poker,
        Talent::Mis,
        Talent::Ban,
        Talent::Quick,
        Talent::Boom,
    ];
}

/// Player-only dark pact: a downside paired with an upside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pact {
    Greed,
    Power,
    Flesh,
    Half,
    Eerie,
    Echo,
    Eye,
    Acute,
    Strict,
}

impl Pact {
    pub const ALL: [Pact; 9] = [
        Pact::Greed,
        Pact::Power,
        Pact::Flesh,
        Pact::Half,
        Pact::Eerie,
        Pact::Echo,
        Pact::Eye,
        Pact::Acute,
        Pact::Strict,
    ];

    /// Player max HP once this pact is signed.
    pub fn adjust_max_hp(self, base: i32) -> i32 {
        match self {
            Pact::Greed => (base - 1).max(1),
            Pact::Flesh => (base - 2).max(1),
            Pact::Half => 3,
            _ => base,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Round-scoped table modifier, rerolled on every reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Normal,
    Overheat,
    Blood,
    Shuffle,
    Vision,
    Fog,
    Fair,
    Volatile,
    Sacrifice,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Normal,
        EventKind::Overheat,
        EventKind::Blood,
        EventKind::Shuffle,
        EventKind::Vision,
        EventKind::Fog,
        EventKind::Fair,
        EventKind::Volatile,
        EventKind::Sacrifice,
    ];

    /// Whether the history track is hidden from the presentation layer.
    pub fn hides_history(self) -> bool {
        self == EventKind::Fog
    }
}

// ============================================================================
// Bosses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossKind {
    Butcher,
    Gambler,
    Doctor,
    Tactician,
}

/// Decision policy tag of a boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BossStyle {
    Aggressive,
    Defensive,
    #[default]
    Chaotic,
    Standard,
}

/// One stack of a boss's starting loadout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutEntry {
    pub item: ItemKind,
    pub count: u8,
}

/// Static description of a boss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossArchetype {
    pub kind: BossKind,
    pub style: BossStyle,
    #[serde(default)]
    pub loadout: Vec<LoadoutEntry>,
}

/// Level-up rewards offered after a PvE victory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reward {
    /// Heal to full.
    Heal,
    /// +1 max HP and heal to full.
    HpUp,
    /// Loot four items.
    Supplies,
    /// One Jammer and one Mirror.
    Tech,
}

impl Reward {
    pub const ALL: [Reward; 4] = [Reward::Heal, Reward::HpUp, Reward::Supplies, Reward::Tech];
}

fn loadout(entries: &[(ItemKind, u8)]) -> Vec<LoadoutEntry> {
    entries
        .iter()
        .map(|&(item, count)| LoadoutEntry { item, count })
        .collect()
}

lazy_static::lazy_static! {
    /// Default rarity of every item.
    pub static ref ITEM_TIERS: Vec<(ItemKind, Tier)> = vec![
        (ItemKind::Magnifier, Tier::Common),
        (ItemKind::Beer, Tier::Common),
        (ItemKind::Smoke, Tier::Common),
        (ItemKind::Inverter, Tier::Uncommon),
        (ItemKind::Safety, Tier::Uncommon),
        (ItemKind::Hourglass, Tier::Uncommon),
        (ItemKind::Phone, Tier::Uncommon),
        (ItemKind::Feint, Tier::Uncommon),
        (ItemKind::Saw, Tier::Rare),
        (ItemKind::Jammer, Tier::Rare),
        (ItemKind::Preload, Tier::Rare),
        (ItemKind::Visor, Tier::Rare),
        (ItemKind::DelayShell, Tier::Rare),
        (ItemKind::Cuffs, Tier::Legendary),
        (ItemKind::Mirror, Tier::Legendary),
        (ItemKind::Adrenaline, Tier::Legendary),
        (ItemKind::DeathChip, Tier::Legendary),
    ];

    /// Default event table. Calm rounds are the most common.
    pub static ref EVENT_WEIGHTS: Vec<(EventKind, u32)> = vec![
        (EventKind::Normal, 4),
        (EventKind::Overheat, 2),
        (EventKind::Blood, 2),
        (EventKind::Shuffle, 2),
        (EventKind::Vision, 2),
        (EventKind::Fog, 2),
        (EventKind::Fair, 2),
        (EventKind::Volatile, 2),
        (EventKind::Sacrifice, 2),
    ];

    /// The four PvE bosses.
    pub static ref BOSS_ARCHETYPES: Vec<BossArchetype> = vec![
        BossArchetype {
            kind: BossKind::Butcher,
            style: BossStyle::Aggressive,
            loadout: loadout(&[(ItemKind::Saw, 2), (ItemKind::Beer, 1), (ItemKind::Mirror, 1)]),
        },
        BossArchetype {
            kind: BossKind::Gambler,
            style: BossStyle::Chaotic,
            loadout: loadout(&[
                (ItemKind::Inverter, 2),
                (ItemKind::Magnifier, 1),
                (ItemKind::Jammer, 1),
            ]),
        },
        BossArchetype {
            kind: BossKind::Doctor,
            style: BossStyle::Defensive,
            loadout: loadout(&[(ItemKind::Smoke, 2), (ItemKind::Cuffs, 1), (ItemKind::Mirror, 1)]),
        },
        BossArchetype {
            kind: BossKind::Tactician,
            style: BossStyle::Standard,
            loadout: loadout(&[(ItemKind::Jammer, 2), (ItemKind::Mirror, 1)]),
        },
    ];
}
