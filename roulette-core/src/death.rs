//! Lethal checks, resurrection, the Sic Bo wager and session endings.

use crate::catalog::{BossKind, EventKind, ItemKind, Reward};
use crate::dice::{RandomSource, SicBoBet, SicBoRoll};
use crate::engine::{Engine, Interaction};
use crate::events::{EngineEvent, Milestone, StatusChange};
use crate::model::{Outcome, SeatId, Verdict};
use crate::round::RoundEntry;
use tracing::info;

/// Damage a death chip deals to the other seat.
const DEATH_CHIP_DAMAGE: i32 = 2;
/// Items granted by the Supplies reward.
const SUPPLIES_LOOT: u32 = 4;

/// Result of a lethal check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeathCheck {
    /// Nobody died; carry on.
    Alive,
    /// A seat came back and a new round is under way.
    Resurrected,
    /// The Gambler's fate hangs on a wager.
    SicBo,
    SessionOver,
}

impl<R: RandomSource> Engine<R> {
    /// Run after anything that can lower HP. Callers stop their own flow
    /// unless this returns [`DeathCheck::Alive`].
    pub(crate) fn resolve_deaths(&mut self) -> DeathCheck {
        let rr = self.state.session.russian_roulette;

        if !rr {
            for seat in SeatId::BOTH {
                if self.state.seat(seat).is_down() && self.state.round.safety_armed[seat] {
                    self.state.round.safety_armed[seat] = false;
                    self.state.seat_mut(seat).hp = 1;
                    self.status(seat, StatusChange::SafetySaved);
                    if seat == SeatId::Player {
                        self.milestone(Milestone::SafetySave);
                    }
                    return DeathCheck::Alive;
                }
            }
        }

        let mut chips = Vec::new();
        for seat in SeatId::BOTH {
            let dying = self.state.seat_mut(seat);
            if dying.is_down() && dying.status.take_death_chip() {
                chips.push(seat);
            }
        }
        for seat in chips {
            self.state.seat_mut(seat.other()).hp -= DEATH_CHIP_DAMAGE;
            self.status(
                seat,
                StatusChange::DeathChipTriggered {
                    damage: DEATH_CHIP_DAMAGE,
                },
            );
        }

        for seat in SeatId::BOTH {
            let dying = self.state.seat(seat);
            if !dying.is_down() || dying.lives <= 1 {
                continue;
            }
            if seat == SeatId::Opponent
                && self.state.is_pve()
                && self.state.modifiers.boss_is(BossKind::Gambler)
            {
                self.scheduler.cancel_all();
                self.input = None;
                self.interaction = Interaction::SicBo;
                info!("Gambler wagers for another life");
                self.emit(EngineEvent::SicBoStarted);
                return DeathCheck::SicBo;
            }

            let dying = self.state.seat_mut(seat);
            dying.lives -= 1;
            dying.hp = dying.max_hp;
            let lives = dying.lives;
            info!(?seat, lives, "Resurrected");
            self.emit(EngineEvent::Resurrected { seat, lives });
            self.start_round(RoundEntry::Resurrection { seat });
            return DeathCheck::Resurrected;
        }

        let player_down = self.state.seats.player.is_down();
        let opponent_down = self.state.seats.opponent.is_down();
        let outcome = match (player_down, opponent_down) {
            (false, false) => return DeathCheck::Alive,
            (true, true) => Outcome::Draw,
            (true, false) => Outcome::Defeat,
            (false, true) => Outcome::Victory,
        };
        self.finish_session(outcome);
        DeathCheck::SessionOver
    }

    /// Close out a duel. A PvE victory moves on to reward selection instead
    /// of ending the session.
    pub(crate) fn finish_session(&mut self, outcome: Outcome) {
        self.scheduler.cancel_all();
        self.input = None;
        for seat in SeatId::BOTH {
            let seat = self.state.seat_mut(seat);
            if seat.is_down() {
                seat.lives = 0;
            }
        }

        let verdict = self.verdict(outcome);
        if outcome == Outcome::Victory {
            self.victory_milestones();
        }
        info!(?outcome, ?verdict, level = self.state.session.level, "Duel ended");
        self.emit(EngineEvent::DuelEnded { outcome, verdict });

        if outcome == Outcome::Victory && self.state.is_pve() {
            self.interaction = Interaction::RewardSelection;
            self.emit(EngineEvent::RewardOffered {
                rewards: Reward::ALL.to_vec(),
            });
            return;
        }
        self.state.session.outcome = Some(outcome);
        self.state.session.verdict = verdict;
    }

    fn verdict(&self, outcome: Outcome) -> Option<Verdict> {
        let player = &self.state.seats.player;
        let round = &self.state.round;
        match outcome {
            Outcome::Victory if player.hp == player.max_hp => Some(Verdict::Perfect),
            Outcome::Victory if player.hp == 1 => Some(Verdict::Clutch),
            Outcome::Victory if round.live_entries() > round.blank_entries() => {
                Some(Verdict::Brutal)
            }
            Outcome::Victory => Some(Verdict::Lucky),
            Outcome::Defeat if self.state.modifiers.pact.is_some() => Some(Verdict::Greedy),
            Outcome::Defeat => Some(Verdict::Sad),
            Outcome::Draw => None,
        }
    }

    fn victory_milestones(&mut self) {
        let player = &self.state.seats.player;
        let mut reached = Vec::new();
        if player.hp == 1 {
            reached.push(Milestone::WonAtOneHp);
        }
        if player.hp == player.max_hp {
            reached.push(Milestone::WonWithFullHp);
        }
        if self.state.session.twisted {
            reached.push(Milestone::TwistedWin);
        }
        if self.state.is_pve() {
            match self.state.modifiers.boss.map(|b| b.kind) {
                Some(BossKind::Butcher) => reached.push(Milestone::ButcherSlain),
                Some(BossKind::Gambler) => reached.push(Milestone::GamblerSlain),
                Some(BossKind::Doctor) => reached.push(Milestone::DoctorSlain),
                Some(BossKind::Tactician) => reached.push(Milestone::TacticianSlain),
                None => {}
            }
        }
        if self.state.modifiers.pact.is_some() {
            reached.push(Milestone::PactWin);
        }
        match self.state.modifiers.event {
            EventKind::Fog => reached.push(Milestone::FogWin),
            EventKind::Sacrifice => reached.push(Milestone::SacrificeWin),
            _ => {}
        }
        if self.state.session.level >= 3 {
            reached.push(Milestone::ReachedLevelThree);
        }
        for milestone in reached {
            self.milestone(milestone);
        }
    }

    /// Settle the Gambler's wager.
    pub(crate) fn resolve_sic_bo(&mut self, bet: SicBoBet) -> SicBoRoll {
        let roll = SicBoRoll::roll_with_rng(&mut self.rng);

        if roll.is_triple() {
            info!(%roll, "Sic Bo triple");
            self.emit(EngineEvent::SicBoResolved {
                bet,
                roll,
                player_won: None,
            });
            let player = &mut self.state.seats.player;
            player.lives = player.lives.saturating_sub(1);
            player.hp = 0;
            let opponent = &mut self.state.seats.opponent;
            opponent.lives = opponent.lives.saturating_sub(1);
            opponent.hp = opponent.max_hp;

            if self.state.seats.player.lives == 0 {
                self.finish_session(Outcome::Defeat);
            } else {
                let player = &mut self.state.seats.player;
                player.hp = player.max_hp;
                self.emit(EngineEvent::Resurrected {
                    seat: SeatId::Player,
                    lives: self.state.seats.player.lives,
                });
                self.start_round(RoundEntry::Resurrection {
                    seat: SeatId::Player,
                });
            }
            return roll;
        }

        let player_won = roll.outcome() == bet;
        info!(%bet, %roll, player_won, "Sic Bo resolved");
        self.emit(EngineEvent::SicBoResolved {
            bet,
            roll,
            player_won: Some(player_won),
        });

        let opponent = &mut self.state.seats.opponent;
        opponent.lives = opponent.lives.saturating_sub(1);
        if player_won {
            opponent.inventory.clear();
            opponent.hp = (opponent.max_hp / 2).max(1);
        } else {
            opponent.hp = opponent.max_hp;
            let player = &mut self.state.seats.player;
            player.inventory.clear();
            player.hp = (player.max_hp / 2).max(1);
        }
        self.start_round(RoundEntry::SicBo);
        roll
    }

    /// Apply the chosen reward and bring in the next boss.
    pub(crate) fn apply_reward(&mut self, reward: Reward) {
        match reward {
            Reward::Heal => {
                let player = &mut self.state.seats.player;
                player.hp = player.max_hp;
            }
            Reward::HpUp => {
                let player = &mut self.state.seats.player;
                player.max_hp += 1;
                player.hp = player.max_hp;
            }
            Reward::Supplies => {
                self.loot_items(SeatId::Player, SUPPLIES_LOOT);
            }
            Reward::Tech => {
                for item in [ItemKind::Jammer, ItemKind::Mirror] {
                    if !self.state.seats.player.inventory.add(item) {
                        self.emit(EngineEvent::InventoryFull {
                            seat: SeatId::Player,
                        });
                        break;
                    }
                }
            }
        }

        self.state.session.level += 1;
        let level = self.state.session.level;
        info!(?reward, level, "Reward chosen");
        self.emit(EngineEvent::RewardChosen { reward, level });
        if level >= 3 {
            self.milestone(Milestone::ReachedLevelThree);
        }

        self.roll_boss(None);
        self.start_round(RoundEntry::Fresh);
    }

    /// The player walks away from the table.
    pub(crate) fn give_up_session(&mut self) {
        self.interaction = Interaction::None;
        let player = &mut self.state.seats.player;
        player.lives = 0;
        player.hp = 0;
        self.finish_session(Outcome::Defeat);
    }
}
