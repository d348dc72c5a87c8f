//! Per-seat transient effects.

use serde::{Deserialize, Serialize};

/// Damage waiting to land on a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDamage {
    pub damage: i32,
    pub turns_remaining: u32,
}

/// Flags and queues attached to one seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    /// The next item this seat uses does nothing.
    pub jammed: bool,
    /// Each point absorbs one damaging live hit.
    pub shield: u32,
    pub poison_queue: Vec<PendingDamage>,
    /// Dying with this armed deals 2 damage to the other seat.
    pub death_chip_armed: bool,
    /// Lose 1 HP at this seat's next turn start.
    pub adrenaline_debt: bool,
}

impl StatusEffects {
    /// Drop everything at a round boundary.
    pub fn clear_round(&mut self) {
        *self = Self::default();
    }

    /// Consume the jam flag if set.
    pub fn take_jam(&mut self) -> bool {
        std::mem::take(&mut self.jammed)
    }

    /// Spend one shield point if any remain.
    pub fn consume_shield(&mut self) -> bool {
        if self.shield == 0 {
            return false;
        }
        self.shield -= 1;
        true
    }

    pub fn queue_poison(&mut self, damage: i32, turns: u32) {
        self.poison_queue.push(PendingDamage {
            damage,
            turns_remaining: turns,
        });
    }

    /// Count every pending entry down by one turn and return the damage of
    /// the entries that came due. `None` when the queue was empty.
    pub fn tick_poison(&mut self) -> Option<i32> {
        if self.poison_queue.is_empty() {
            return None;
        }
        let mut due = 0;
        self.poison_queue.retain_mut(|entry| {
            entry.turns_remaining = entry.turns_remaining.saturating_sub(1);
            if entry.turns_remaining == 0 {
                due += entry.damage;
                false
            } else {
                true
            }
        });
        Some(due)
    }

    pub fn take_adrenaline_debt(&mut self) -> bool {
        std::mem::take(&mut self.adrenaline_debt)
    }

    pub fn take_death_chip(&mut self) -> bool {
        std::mem::take(&mut self.death_chip_armed)
    }
}
