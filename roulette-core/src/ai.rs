//! Decision policies for the computer-controlled seat.
//!
//! Policies are pure: they read an [`AiView`] and return one [`AiAction`].
//! The engine checks availability again before acting on the choice.

use crate::catalog::{BossStyle, ItemKind};
use crate::model::{Inventory, Shell, Target};
use serde::{Deserialize, Serialize};

/// One move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiAction {
    Fire(Target),
    UseItem(ItemKind),
}

/// Everything a seat is allowed to know when it decides.
#[derive(Debug, Clone, PartialEq)]
pub struct AiView {
    pub style: BossStyle,
    pub hp: i32,
    pub max_hp: i32,
    pub foe_hp: i32,
    pub inventory: Inventory,
    pub foe_item_count: u32,
    /// Chance the next shell is live, from this seat's knowledge.
    pub live_probability: f64,
    /// The next shell, if this seat has seen it.
    pub next_known: Option<Shell>,
    pub damage_multiplier: i32,
    pub foe_cuffed: bool,
    pub russian_roulette: bool,
}

impl AiView {
    fn has(&self, item: ItemKind) -> bool {
        self.inventory.has(item)
    }

    fn can_saw(&self) -> bool {
        self.has(ItemKind::Saw) && self.damage_multiplier == 1
    }

    fn can_cuff(&self) -> bool {
        self.has(ItemKind::Cuffs) && !self.foe_cuffed
    }

    fn hurt(&self) -> bool {
        self.hp < self.max_hp
    }
}

/// Pick the next move for the seat described by `view`.
pub fn choose_action(view: &AiView) -> AiAction {
    if view.russian_roulette {
        return AiAction::Fire(Target::Shooter);
    }
    match view.style {
        BossStyle::Aggressive => aggressive(view),
        BossStyle::Defensive => defensive(view),
        BossStyle::Chaotic | BossStyle::Standard => chaotic(view),
    }
}

/// Fire at the enemy on a likely live, at self on a likely blank.
pub fn default_target(live_probability: f64) -> Target {
    if live_probability >= 1.0 {
        Target::Enemy
    } else if live_probability <= 0.0 {
        Target::Shooter
    } else if live_probability > 0.5 {
        Target::Enemy
    } else {
        Target::Shooter
    }
}

fn aggressive(view: &AiView) -> AiAction {
    let p = view.live_probability;

    if view.foe_hp <= 1 && p > 0.0 {
        if view.can_saw() {
            return AiAction::UseItem(ItemKind::Saw);
        }
        return AiAction::Fire(Target::Enemy);
    }
    if view.hp <= 1 && view.hurt() && view.has(ItemKind::Smoke) {
        return AiAction::UseItem(ItemKind::Smoke);
    }
    if p > 0.5 && view.can_saw() {
        return AiAction::UseItem(ItemKind::Saw);
    }
    if p > 0.6 && view.can_cuff() {
        return AiAction::UseItem(ItemKind::Cuffs);
    }

    if p >= 0.4 {
        AiAction::Fire(Target::Enemy)
    } else {
        AiAction::Fire(Target::Shooter)
    }
}

fn defensive(view: &AiView) -> AiAction {
    let p = view.live_probability;

    if view.hurt() && view.has(ItemKind::Smoke) {
        return AiAction::UseItem(ItemKind::Smoke);
    }
    if p < 0.3 && p > 0.0 && view.has(ItemKind::Beer) {
        return AiAction::UseItem(ItemKind::Beer);
    }
    if view.next_known.is_none() && view.has(ItemKind::Magnifier) {
        return AiAction::UseItem(ItemKind::Magnifier);
    }
    if view.hp > 2 && view.can_cuff() {
        return AiAction::UseItem(ItemKind::Cuffs);
    }

    if p > 0.55 {
        AiAction::Fire(Target::Enemy)
    } else {
        AiAction::Fire(Target::Shooter)
    }
}

fn chaotic(view: &AiView) -> AiAction {
    let p = view.live_probability;

    if p < 0.3 && p > 0.0 && view.has(ItemKind::Inverter) {
        return AiAction::UseItem(ItemKind::Inverter);
    }
    if view.next_known.is_none() && view.has(ItemKind::Magnifier) {
        return AiAction::UseItem(ItemKind::Magnifier);
    }
    if view.foe_item_count > 0 && view.has(ItemKind::Mirror) {
        return AiAction::UseItem(ItemKind::Mirror);
    }

    AiAction::Fire(default_target(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(style: BossStyle, p: f64) -> AiView {
        AiView {
            style,
            hp: 3,
            max_hp: 3,
            foe_hp: 4,
            inventory: Inventory::default(),
            foe_item_count: 0,
            live_probability: p,
            next_known: None,
            damage_multiplier: 1,
            foe_cuffed: false,
            russian_roulette: false,
        }
    }

    fn with_items(mut view: AiView, items: &[ItemKind]) -> AiView {
        for item in items {
            view.inventory.add(*item);
        }
        view
    }

    #[test]
    fn test_default_target_thresholds() {
        assert_eq!(default_target(1.0), Target::Enemy);
        assert_eq!(default_target(0.0), Target::Shooter);
        assert_eq!(default_target(0.51), Target::Enemy);
        assert_eq!(default_target(0.5), Target::Shooter);
    }

    #[test]
    fn test_roulette_always_self() {
        let mut v = view(BossStyle::Aggressive, 1.0);
        v.russian_roulette = true;
        assert_eq!(choose_action(&v), AiAction::Fire(Target::Shooter));
    }

    #[test]
    fn test_aggressive_goes_for_the_kill() {
        let mut v = with_items(view(BossStyle::Aggressive, 0.2), &[ItemKind::Saw]);
        v.foe_hp = 1;
        assert_eq!(choose_action(&v), AiAction::UseItem(ItemKind::Saw));
        v.damage_multiplier = 2;
        assert_eq!(choose_action(&v), AiAction::Fire(Target::Enemy));
    }

    #[test]
    fn test_aggressive_fires_on_moderate_odds() {
        assert_eq!(
            choose_action(&view(BossStyle::Aggressive, 0.4)),
            AiAction::Fire(Target::Enemy)
        );
        assert_eq!(
            choose_action(&view(BossStyle::Aggressive, 0.39)),
            AiAction::Fire(Target::Shooter)
        );
    }

    #[test]
    fn test_aggressive_cuffs_only_once() {
        let mut v = with_items(view(BossStyle::Aggressive, 0.7), &[ItemKind::Cuffs]);
        assert_eq!(choose_action(&v), AiAction::UseItem(ItemKind::Cuffs));
        v.foe_cuffed = true;
        assert_eq!(choose_action(&v), AiAction::Fire(Target::Enemy));
    }

    #[test]
    fn test_defensive_heals_first() {
        let mut v = with_items(view(BossStyle::Defensive, 0.9), &[ItemKind::Smoke, ItemKind::Cuffs]);
        v.hp = 2;
        assert_eq!(choose_action(&v), AiAction::UseItem(ItemKind::Smoke));
        v.hp = 3;
        assert_eq!(choose_action(&v), AiAction::UseItem(ItemKind::Cuffs));
    }

    #[test]
    fn test_defensive_needs_high_confidence() {
        assert_eq!(
            choose_action(&view(BossStyle::Defensive, 0.55)),
            AiAction::Fire(Target::Shooter)
        );
        assert_eq!(
            choose_action(&view(BossStyle::Defensive, 0.56)),
            AiAction::Fire(Target::Enemy)
        );
    }

    #[test]
    fn test_chaotic_item_priority() {
        let v = with_items(
            view(BossStyle::Chaotic, 0.2),
            &[ItemKind::Inverter, ItemKind::Magnifier, ItemKind::Mirror],
        );
        assert_eq!(choose_action(&v), AiAction::UseItem(ItemKind::Inverter));

        let mut v = with_items(view(BossStyle::Chaotic, 0.6), &[ItemKind::Magnifier, ItemKind::Mirror]);
        v.foe_item_count = 2;
        assert_eq!(choose_action(&v), AiAction::UseItem(ItemKind::Magnifier));
        v.next_known = Some(Shell::Live);
        assert_eq!(choose_action(&v), AiAction::UseItem(ItemKind::Mirror));
        v.foe_item_count = 0;
        assert_eq!(choose_action(&v), AiAction::Fire(Target::Enemy));
    }
}
