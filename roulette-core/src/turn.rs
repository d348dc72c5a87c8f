//! Turn handover and turn-start effects.

use crate::catalog::{BossKind, Pact};
use crate::death::DeathCheck;
use crate::dice::RandomSource;
use crate::engine::Engine;
use crate::events::{EngineEvent, StatusChange};
use crate::model::SeatId;
use tracing::debug;

const GAMBLER_STEAL_CHANCE: f64 = 0.6;
const DOCTOR_HEAL_CHANCE: f64 = 0.3;
const DEVIL_DEAL_CHANCE: f64 = 0.3;

impl<R: RandomSource> Engine<R> {
    /// Pass the turn to `next`, honoring cuffs and the acute pact.
    pub(crate) fn switch_turn(&mut self, next: SeatId) {
        let rr = self.state.session.russian_roulette;
        let round = &self.state.round;
        if round.current_turn == SeatId::Player
            && self.state.modifiers.has_pact(Pact::Acute)
            && !round.damage_dealt_this_turn
            && !rr
        {
            self.state.seats.player.hp -= 1;
            self.status(SeatId::Player, StatusChange::AcutePenalty);
            if self.resolve_deaths() != DeathCheck::Alive {
                return;
            }
        }

        let mut next = next;
        if !rr && self.state.round.cuffed == Some(next) {
            self.state.round.cuffed = None;
            self.status(next, StatusChange::TurnSkipped);
            debug!(seat = ?next, "Turn skipped");
            next = next.other();
        }

        self.state.round.current_turn = next;
        self.handle_turn_start();
    }

    /// Everything that happens as a seat's turn begins, then hand control over.
    pub(crate) fn handle_turn_start(&mut self) {
        let seat = self.state.round.current_turn;
        let rr = self.state.session.russian_roulette;
        let pve = self.state.is_pve();
        self.state.round.items_used_this_turn = 0;
        self.state.round.damage_dealt_this_turn = false;

        if pve && seat == SeatId::Opponent && self.state.modifiers.boss_is(BossKind::Gambler) {
            let held = self.state.seats.player.inventory.held();
            let room = !self.state.seats.opponent.inventory.is_full();
            if room && !held.is_empty() && self.rng.roll(GAMBLER_STEAL_CHANCE) {
                let item = held[self.rng.below(held.len())];
                if self.transfer_item(SeatId::Player, SeatId::Opponent, item) {
                    self.status(SeatId::Opponent, StatusChange::GamblerStole { item });
                }
            }
        }

        if self.state.seat_mut(seat).status.take_adrenaline_debt() {
            self.state.seat_mut(seat).hp -= 1;
            self.status(seat, StatusChange::AdrenalineCrash);
            if self.resolve_deaths() != DeathCheck::Alive {
                return;
            }
        }

        if let Some(damage) = self.state.seat_mut(seat).status.tick_poison() {
            if damage > 0 {
                self.state.seat_mut(seat).hp -= damage;
                self.status(seat, StatusChange::PoisonTick { damage });
            }
            if self.resolve_deaths() != DeathCheck::Alive {
                return;
            }
        }

        if pve && seat == SeatId::Opponent && self.state.modifiers.boss_is(BossKind::Doctor) && !rr {
            let opponent = &self.state.seats.opponent;
            if opponent.hp < opponent.max_hp && self.rng.roll(DOCTOR_HEAL_CHANCE) {
                self.state.seats.opponent.heal(1);
                self.status(SeatId::Opponent, StatusChange::DoctorHealed);
            }
        }

        self.state.round.devil_deal_armed =
            seat == SeatId::Player && !rr && self.rng.roll(DEVIL_DEAL_CHANCE);

        self.emit(EngineEvent::TurnStarted {
            seat,
            devil_deal: self.state.round.devil_deal_armed,
        });
        self.hand_off_control();
    }
}
