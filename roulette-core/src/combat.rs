//! Shot resolution: draw, settle, damage pipeline, side effects and turn
//! retention.

use crate::catalog::{BossKind, EventKind, ItemKind, Pact, Talent};
use crate::death::DeathCheck;
use crate::dice::RandomSource;
use crate::engine::{Engine, Task};
use crate::events::{EngineEvent, Milestone, ShellOutcome, StatusChange};
use crate::model::{BossPhase, HistoryEntry, Mode, SeatId, Shell, Target};
use crate::round::RoundEntry;
use tracing::{debug, info};

/// Chance a live shell fails to fire.
pub const DUD_CHANCE: f64 = 0.03;
/// Chance a blank goes off during the Volatile event.
pub const VOLATILE_CHANCE: f64 = 0.30;
/// Chance the echo pact returns a live shell to the magazine.
const ECHO_CHANCE: f64 = 0.25;
/// Russian Roulette hits are always lethal.
const LETHAL_DAMAGE: i32 = 999;
/// The Butcher never takes more than this from one shot.
const BUTCHER_DAMAGE_CAP: i32 = 2;
/// Turns before a delayed or venom shot lands.
const POISON_TURNS: u32 = 2;

/// Decide how a drawn shell actually behaves.
pub fn settle_shell<R: RandomSource + ?Sized>(
    shell: Shell,
    twisted: bool,
    russian_roulette: bool,
    event: EventKind,
    rng: &mut R,
) -> ShellOutcome {
    match shell {
        Shell::Live if !twisted && !russian_roulette && rng.roll(DUD_CHANCE) => ShellOutcome::Dud,
        Shell::Live => ShellOutcome::Live,
        Shell::Blank
            if event == EventKind::Volatile
                && !russian_roulette
                && rng.roll(VOLATILE_CHANCE) =>
        {
            ShellOutcome::Volatile
        }
        Shell::Blank => ShellOutcome::Blank,
    }
}

impl<R: RandomSource> Engine<R> {
    /// Resolve a shot by `shooter`. The caller has checked the magazine.
    pub(crate) fn resolve_fire(&mut self, shooter: SeatId, target: Target) {
        let Some(shell) = self.state.magazine.draw() else {
            return;
        };
        let visor = std::mem::take(&mut self.state.round.visor_armed);

        let outcome = settle_shell(
            shell,
            self.state.session.twisted,
            self.state.session.russian_roulette,
            self.state.modifiers.event,
            &mut self.rng,
        );
        let victim = match target {
            Target::Shooter => shooter,
            Target::Enemy => shooter.other(),
        };

        if outcome.is_live() {
            self.resolve_live(shooter, target, victim, outcome, visor);
        } else {
            self.resolve_blank(shooter, target, victim, outcome, visor);
        }
    }

    fn record_history(&mut self, entry: HistoryEntry, visor: bool) {
        let shown = match entry {
            HistoryEntry::Live if visor && self.state.session.mode == Mode::Pvp => {
                HistoryEntry::Blank
            }
            HistoryEntry::Blank if visor && self.state.session.mode == Mode::Pvp => {
                HistoryEntry::Live
            }
            other => other,
        };
        self.state.round.history.push(shown);
    }

    /// Damage of a live shot before delay, shield and caps.
    fn live_damage(&mut self, shooter: SeatId, target: Target) -> i32 {
        if self.state.session.russian_roulette {
            return LETHAL_DAMAGE;
        }
        let modifiers = &self.state.modifiers;
        let players_shot = shooter == SeatId::Player;
        let self_shot = target == Target::Shooter;

        let mut base = 1;
        if self.state.session.twisted {
            base += 1;
        }
        if modifiers.has_pact(Pact::Power) {
            base += 1;
        }
        if modifiers.has_pact(Pact::Half) {
            base += 1;
        }
        if let Some(boss) = modifiers.boss {
            if boss.kind == BossKind::Butcher && shooter == SeatId::Opponent {
                base += if boss.is_enraged() { 2 } else { 1 };
            }
        }
        if players_shot && self.state.round.false_alarm_buff > 0 {
            base += std::mem::take(&mut self.state.round.false_alarm_buff);
        }
        if players_shot
            && self.state.modifiers.has_talent(Talent::Quick)
            && self.state.round.items_used_this_turn == 0
        {
            base += 1;
        }

        let mut damage = base * self.state.round.damage_multiplier;

        if self.state.modifiers.event == EventKind::Overheat {
            damage += self.state.round.consecutive_live_shots;
            self.state.round.consecutive_live_shots += 1;
        }
        if self_shot && players_shot && self.state.modifiers.has_talent(Talent::Pain) {
            damage = (damage - 1).max(1);
        }
        if self_shot && std::mem::take(&mut self.state.round.devil_deal_armed) {
            damage *= 2;
            self.status(shooter, StatusChange::DevilDealLost);
        }
        if self_shot && self.state.modifiers.event == EventKind::Blood {
            damage *= 2;
        }
        damage
    }

    fn resolve_live(
        &mut self,
        shooter: SeatId,
        target: Target,
        victim: SeatId,
        outcome: ShellOutcome,
        visor: bool,
    ) {
        let rr = self.state.session.russian_roulette;
        let pve = self.state.is_pve();
        let mut damage = self.live_damage(shooter, target);

        if std::mem::take(&mut self.state.round.next_shot_delayed) {
            self.state
                .seat_mut(victim)
                .status
                .queue_poison(damage, POISON_TURNS);
            self.status(
                victim,
                StatusChange::PoisonQueued {
                    damage,
                    turns: POISON_TURNS,
                },
            );
            damage = 0;
        }

        if pve
            && self.state.modifiers.boss_is(BossKind::Doctor)
            && shooter == SeatId::Opponent
            && target == Target::Enemy
        {
            self.state
                .seats
                .player
                .status
                .queue_poison(1, POISON_TURNS);
            self.status(
                SeatId::Player,
                StatusChange::PoisonQueued {
                    damage: 1,
                    turns: POISON_TURNS,
                },
            );
        }

        if self.state.modifiers.has_pact(Pact::Echo) && !rr && self.rng.roll(ECHO_CHANCE) {
            self.state.magazine.push_far(Shell::Live);
            self.emit(EngineEvent::EchoReturned);
        }

        if damage > 0 && self.state.seat_mut(victim).status.consume_shield() {
            damage = 0;
            self.status(victim, StatusChange::ShieldBroke);
        }

        if pve
            && victim == SeatId::Opponent
            && self.state.modifiers.boss_is(BossKind::Butcher)
            && damage > BUTCHER_DAMAGE_CAP
        {
            damage = BUTCHER_DAMAGE_CAP;
            self.status(SeatId::Opponent, StatusChange::ButcherPadding);
        }

        if damage > 0 {
            self.state.seat_mut(victim).hp -= damage;
            if target == Target::Enemy {
                self.state.round.damage_dealt_this_turn = true;
            }
        }
        self.record_history(HistoryEntry::Live, visor);

        info!(?shooter, ?target, ?outcome, damage, "Live shot");
        self.emit(EngineEvent::ShotFired {
            shooter,
            target,
            victim,
            outcome,
            damage,
        });

        if shooter == SeatId::Player {
            if victim == SeatId::Player {
                self.milestone(Milestone::SelfShotLive);
            }
            if damage >= 3 && target == Target::Enemy && self.state.seat(victim).is_down() {
                self.milestone(Milestone::Overkill);
            }
        }

        self.state.round.damage_multiplier = 1;

        if self.should_enrage(victim) {
            self.trigger_enrage();
            self.schedule(self.timings.enrage_ms, Task::AfterEnrage { shooter });
            return;
        }

        if self.resolve_deaths() != DeathCheck::Alive {
            return;
        }
        if rr {
            return;
        }
        self.advance_after_shot(shooter);
    }

    fn resolve_blank(
        &mut self,
        shooter: SeatId,
        target: Target,
        victim: SeatId,
        outcome: ShellOutcome,
        visor: bool,
    ) {
        let rr = self.state.session.russian_roulette;
        let players_shot = shooter == SeatId::Player;
        let self_shot = target == Target::Shooter;

        self.state.round.consecutive_live_shots = 0;
        self.state.round.damage_multiplier = 1;
        self.record_history(HistoryEntry::Blank, visor);

        if self_shot && std::mem::take(&mut self.state.round.devil_deal_armed) {
            self.loot_items(shooter, 2);
            self.status(shooter, StatusChange::DevilDealWon);
        }

        debug!(?shooter, ?target, ?outcome, "Blank shot");
        self.emit(EngineEvent::ShotFired {
            shooter,
            target,
            victim,
            outcome,
            damage: 0,
        });

        if outcome == ShellOutcome::Dud {
            self.advance_after_shot(shooter);
            return;
        }

        let mut strict_skip = false;
        if !rr {
            let pact = self.state.modifiers.pact;
            if players_shot && self_shot && pact == Some(Pact::Flesh) {
                let status = &mut self.state.seats.player.status;
                status.shield += 1;
                let shield = status.shield;
                self.status(SeatId::Player, StatusChange::ShieldGained { shield });
            }
            if players_shot && !self_shot && pact == Some(Pact::Strict) {
                strict_skip = true;
                self.status(shooter, StatusChange::StrictSkipArmed);
            }
            if players_shot && pact == Some(Pact::Greed) {
                self.loot_items(shooter, 1);
                self.status(shooter, StatusChange::GreedLoot);
            }
            if self.state.session.twisted || pact == Some(Pact::Power) {
                self.state.magazine.reshuffle(&mut self.rng);
                self.state.round.history.push(HistoryEntry::Shuffled);
                self.emit(EngineEvent::MagazineShuffled);
            }

            if self_shot && players_shot {
                self.milestone(Milestone::SelfShotBlank);
                if self.state.seats.player.hp == 1 {
                    self.milestone(Milestone::SelfShotBlankAtOneHp);
                }
                if self.state.modifiers.has_talent(Talent::Alarm) {
                    self.state.round.false_alarm_buff += 1;
                    let buff = self.state.round.false_alarm_buff;
                    self.status(shooter, StatusChange::AlarmCharged { buff });
                }
                if self.state.modifiers.has_talent(Talent::Boom) {
                    self.state.seat_mut(shooter.other()).hp -= 1;
                    self.state.round.damage_dealt_this_turn = true;
                    self.status(shooter.other(), StatusChange::SelfDestruct);
                    if self.resolve_deaths() != DeathCheck::Alive {
                        return;
                    }
                }
            }
        }

        if self_shot && self.keeps_turn(shooter) {
            if self.state.magazine.is_empty() {
                self.schedule(self.timings.new_round_ms, Task::StartRound);
            } else {
                self.schedule(self.timings.keep_turn_ms, Task::ResumeTurn);
            }
            return;
        }

        if strict_skip {
            self.state.round.cuffed = Some(shooter);
        }
        self.advance_after_shot(shooter);
    }

    /// Whether a self-shot blank lets the shooter go again.
    fn keeps_turn(&self, shooter: SeatId) -> bool {
        let modifiers = &self.state.modifiers;
        let lucky = shooter == SeatId::Player && modifiers.has_talent(Talent::Luck);
        !self.state.session.russian_roulette
            && !(modifiers.event == EventKind::Blood && !lucky)
            && modifiers.event != EventKind::Fair
    }

    /// New round if the magazine ran dry, otherwise the other seat's turn.
    pub(crate) fn advance_after_shot(&mut self, shooter: SeatId) {
        if self.state.magazine.is_empty() {
            self.schedule(self.timings.new_round_ms, Task::StartRound);
        } else {
            self.switch_turn(shooter.other());
        }
    }

    fn should_enrage(&self, victim: SeatId) -> bool {
        let opponent = &self.state.seats.opponent;
        self.state.is_pve()
            && victim == SeatId::Opponent
            && !self.state.session.russian_roulette
            && self.state.modifiers.boss.is_some_and(|b| !b.is_enraged())
            && opponent.hp * 2 < opponent.max_hp
    }

    /// One-time phase change of a boss below half HP.
    fn trigger_enrage(&mut self) {
        let Some(boss) = self.state.modifiers.boss.as_mut() else {
            return;
        };
        boss.phase = BossPhase::Enraged;
        let kind = boss.kind;

        let gained = match kind {
            BossKind::Butcher => self
                .state
                .seats
                .opponent
                .inventory
                .add(ItemKind::Saw)
                .then_some(ItemKind::Saw),
            BossKind::Doctor => {
                self.state.seats.opponent.heal(2);
                None
            }
            BossKind::Tactician => {
                self.state.round.cuffed = Some(SeatId::Player);
                self.state
                    .seats
                    .opponent
                    .inventory
                    .add(ItemKind::Cuffs)
                    .then_some(ItemKind::Cuffs)
            }
            BossKind::Gambler => {
                let held = self.state.seats.player.inventory.held();
                if held.is_empty() || self.state.seats.opponent.inventory.is_full() {
                    None
                } else {
                    let item = held[self.rng.below(held.len())];
                    self.transfer_item(SeatId::Player, SeatId::Opponent, item)
                        .then_some(item)
                }
            }
        };

        info!(boss = ?kind, ?gained, "Boss enraged");
        self.emit(EngineEvent::Enraged { boss: kind, gained });
    }

    /// Pick up where the enraging shot left off.
    pub(crate) fn finish_enrage(&mut self, shooter: SeatId) {
        if self.resolve_deaths() != DeathCheck::Alive {
            return;
        }
        if self.state.magazine.is_empty() {
            self.start_round(RoundEntry::Fresh);
        } else {
            self.switch_turn(shooter.other());
        }
    }
}
