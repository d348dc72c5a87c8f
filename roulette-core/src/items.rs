//! Item use: pre-effect costs and interceptions, then the per-item effect.

use crate::catalog::{BossKind, EventKind, ItemKind, Pact, Talent};
use crate::dice::RandomSource;
use crate::engine::{Engine, Interaction, Task};
use crate::events::{EngineEvent, ItemEffect, Milestone, NullifiedBy, StatusChange};
use crate::model::{HistoryEntry, SeatId, Shell};
use tracing::{debug, info};

/// Chance the eye pact doubles an item.
const EYE_DOUBLE_CHANCE: f64 = 0.5;
/// Chance a magnifier reading is inverted by the mis talent or the Tactician.
const FAKE_READING_CHANCE: f64 = 0.5;

impl<R: RandomSource> Engine<R> {
    /// Consume one `item` from `seat` and apply it. The caller has checked
    /// the count.
    pub(crate) fn resolve_item(&mut self, seat: SeatId, item: ItemKind) {
        if self.state.modifiers.event == EventKind::Sacrifice {
            let user = self.state.seat_mut(seat);
            if user.hp > 1 {
                user.hp -= 1;
                self.status(seat, StatusChange::SacrificePaid);
            } else {
                self.status(seat, StatusChange::SacrificeWaived);
            }
        }

        self.state.seat_mut(seat).inventory.remove(item);

        let doubled = seat == SeatId::Player
            && self.state.modifiers.has_pact(Pact::Eye)
            && self.rng.roll(EYE_DOUBLE_CHANCE);

        if std::mem::take(&mut self.state.round.feint_armed) {
            self.nullify(seat, item, NullifiedBy::Feint);
            return;
        }

        self.state.round.items_used_this_turn += 1;
        if seat == SeatId::Player {
            self.item_milestones(item);
        }

        if seat == SeatId::Player
            && self.state.is_pve()
            && self.state.modifiers.boss_is(BossKind::Tactician)
            && std::mem::take(&mut self.state.round.tactician_block_armed)
        {
            self.nullify(seat, item, NullifiedBy::Tactician);
            return;
        }

        if self.state.seat_mut(seat).status.take_jam() {
            self.nullify(seat, item, NullifiedBy::Jam);
            return;
        }

        let effect = self.apply_item(seat, item, doubled);
        info!(?seat, %item, ?effect, doubled, "Item used");
        self.emit(EngineEvent::ItemUsed {
            seat,
            item,
            effect,
            doubled,
        });
        self.after_item(seat);
    }

    fn nullify(&mut self, seat: SeatId, item: ItemKind, by: NullifiedBy) {
        debug!(?seat, %item, ?by, "Item nullified");
        self.emit(EngineEvent::ItemNullified { seat, item, by });
        self.after_item(seat);
    }

    /// Return control after an item, or reload if the magazine ran dry.
    pub(crate) fn after_item(&mut self, seat: SeatId) {
        if self.interaction != Interaction::None || self.state.session.is_over() {
            return;
        }
        if self.state.magazine.is_empty() {
            self.schedule(self.timings.beer_reload_ms, Task::StartRound);
            return;
        }
        if self.state.is_ai(seat) {
            self.schedule(self.timings.ai_think_ms, Task::AiAct);
        } else {
            self.input = Some(seat);
        }
    }

    fn apply_item(&mut self, seat: SeatId, item: ItemKind, doubled: bool) -> ItemEffect {
        let other = seat.other();
        match item {
            ItemKind::Magnifier => self.use_magnifier(seat),
            ItemKind::Beer => {
                let Some(shell) = self.state.magazine.draw() else {
                    return ItemEffect::Cycled { moved: false };
                };
                self.state.round.history.push(HistoryEntry::from(shell));
                if seat == SeatId::Player {
                    self.state.session.beers_drunk += 1;
                    if self.state.session.beers_drunk >= 3 {
                        self.milestone(Milestone::ThreeBeers);
                    }
                }
                ItemEffect::Ejected { shell }
            }
            ItemKind::Saw => {
                let multiplier = if doubled { 4 } else { 2 };
                self.state.round.damage_multiplier = multiplier;
                ItemEffect::DamageBoosted { multiplier }
            }
            ItemKind::Smoke => {
                let amount = self.state.seat_mut(seat).heal(if doubled { 2 } else { 1 });
                ItemEffect::Healed { amount }
            }
            ItemKind::Cuffs => {
                self.state.round.cuffed = Some(other);
                ItemEffect::Cuffed { seat: other }
            }
            ItemKind::Inverter => {
                self.state.magazine.invert_next();
                self.state.round.history.push(HistoryEntry::Shuffled);
                ItemEffect::Inverted
            }
            ItemKind::Jammer => {
                self.state.seat_mut(other).status.jammed = true;
                ItemEffect::Jammed { seat: other }
            }
            ItemKind::Mirror => self.use_mirror(seat),
            ItemKind::Preload => {
                self.state.magazine.push_next(Shell::Live);
                ItemEffect::Preloaded
            }
            ItemKind::Feint => {
                self.state.round.feint_armed = true;
                ItemEffect::FeintArmed
            }
            ItemKind::Safety => {
                self.state.round.safety_armed[seat] = true;
                ItemEffect::SafetyArmed
            }
            ItemKind::Hourglass => ItemEffect::Cycled {
                moved: self.state.magazine.cycle_next_to_far(),
            },
            ItemKind::Visor => {
                self.state.round.visor_armed = true;
                ItemEffect::VisorArmed
            }
            ItemKind::DelayShell => {
                self.state.round.next_shot_delayed = true;
                ItemEffect::ShotDelayed
            }
            ItemKind::DeathChip => {
                self.state.seat_mut(seat).status.death_chip_armed = true;
                ItemEffect::DeathChipArmed
            }
            ItemKind::Adrenaline => {
                let round = &mut self.state.round;
                round.items_used_this_turn = round.items_used_this_turn.saturating_sub(1);
                round.cuffed = Some(other);
                self.state.seat_mut(seat).status.adrenaline_debt = true;
                ItemEffect::Adrenaline { cuffed: other }
            }
            ItemKind::Phone => self.use_phone(seat),
        }
    }

    /// Move one `item` between seats. Nothing moves when the taker is full
    /// or the giver holds none.
    pub(crate) fn transfer_item(&mut self, from: SeatId, to: SeatId, item: ItemKind) -> bool {
        if self.state.seat(to).inventory.is_full() {
            return false;
        }
        self.state.seat_mut(from).inventory.remove(item)
            && self.state.seat_mut(to).inventory.add(item)
    }

    fn use_magnifier(&mut self, seat: SeatId) -> ItemEffect {
        let Some(shell) = self.state.magazine.next() else {
            return ItemEffect::Inspected { shown: None };
        };
        let mis = seat == SeatId::Player && self.state.modifiers.has_talent(Talent::Mis);
        let jammed_scope = seat == SeatId::Player
            && self.state.is_pve()
            && self.state.modifiers.boss_is(BossKind::Tactician);
        let mut fake = mis && self.rng.roll(FAKE_READING_CHANCE);
        if jammed_scope && self.rng.roll(FAKE_READING_CHANCE) {
            fake = true;
        }
        let shown = if fake { shell.flipped() } else { shell };
        self.state.magazine.mark_next(seat, shown);

        if seat == SeatId::Player {
            self.state.session.magnifiers_used += 1;
            if self.state.session.magnifiers_used >= 3 {
                self.milestone(Milestone::ThreeMagnifiers);
            }
        }

        let hidden = self.state.is_ai(seat);
        ItemEffect::Inspected {
            shown: (!hidden).then_some(shown),
        }
    }

    fn use_mirror(&mut self, seat: SeatId) -> ItemEffect {
        let other = seat.other();
        if self.state.is_ai(seat) {
            let held = self.state.seat(other).inventory.held();
            if held.is_empty() {
                return ItemEffect::Stole {
                    from: other,
                    item: None,
                };
            }
            let item = held[self.rng.below(held.len())];
            let taken = self.transfer_item(other, seat, item);
            return ItemEffect::Stole {
                from: other,
                item: taken.then_some(item),
            };
        }

        if self.state.seat(other).inventory.is_empty() {
            let round = &mut self.state.round;
            round.items_used_this_turn = round.items_used_this_turn.saturating_sub(1);
            self.state.seat_mut(seat).inventory.add(ItemKind::Mirror);
            return ItemEffect::MirrorRefunded;
        }
        self.interaction = Interaction::MirrorSelection { seat };
        ItemEffect::MirrorSelecting
    }

    /// Take the chosen item once a human seat has picked it.
    pub(crate) fn complete_mirror(&mut self, seat: SeatId, item: ItemKind) {
        let other = seat.other();
        self.transfer_item(other, seat, item);
        if seat == SeatId::Player {
            self.milestone(Milestone::MirrorSteal);
        }
        self.emit(EngineEvent::ItemUsed {
            seat,
            item: ItemKind::Mirror,
            effect: ItemEffect::Stole {
                from: other,
                item: Some(item),
            },
            doubled: false,
        });
        self.after_item(seat);
    }

    /// Give the Mirror back after a cancelled selection.
    pub(crate) fn refund_mirror(&mut self, seat: SeatId) {
        let round = &mut self.state.round;
        round.items_used_this_turn = round.items_used_this_turn.saturating_sub(1);
        self.state.seat_mut(seat).inventory.add(ItemKind::Mirror);
        self.emit(EngineEvent::ItemUsed {
            seat,
            item: ItemKind::Mirror,
            effect: ItemEffect::MirrorRefunded,
            doubled: false,
        });
        self.after_item(seat);
    }

    fn use_phone(&mut self, seat: SeatId) -> ItemEffect {
        let unknown = self.state.magazine.unknown_indices(seat);
        if unknown.is_empty() {
            return ItemEffect::Phoned {
                position: None,
                shell: None,
            };
        }
        let index = unknown[self.rng.below(unknown.len())];
        let shell = self.state.magazine.reveal_at(seat, index);
        let position = self.state.magazine.len() - index;
        let hidden = self.state.is_ai(seat);
        ItemEffect::Phoned {
            position: Some(position),
            shell: if hidden { None } else { shell },
        }
    }

    fn item_milestones(&mut self, item: ItemKind) {
        let milestone = match item {
            ItemKind::Smoke => Some(Milestone::FirstSmoke),
            ItemKind::Preload => Some(Milestone::FirstPreload),
            ItemKind::Saw => Some(Milestone::FirstSaw),
            ItemKind::Cuffs => Some(Milestone::FirstCuffs),
            ItemKind::Inverter => Some(Milestone::FirstInverter),
            ItemKind::Jammer => Some(Milestone::FirstJammer),
            _ => None,
        };
        if let Some(milestone) = milestone {
            self.milestone(milestone);
        }
        if self.state.seats.player.inventory.total() >= 6 {
            self.milestone(Milestone::HoardSixItems);
        }
    }
}
