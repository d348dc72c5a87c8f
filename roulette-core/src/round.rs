//! Round boundaries: reset, event draw, reload, loot and turn order.

use crate::catalog::{BossKind, EventKind, ItemKind, Talent, PLAYER_BASE_HP};
use crate::chamber::{Magazine, ReloadContext};
use crate::dice::{roll_2d6, weighted_index, RandomSource};
use crate::engine::{Engine, Task};
use crate::events::EngineEvent;
use crate::model::{Mode, RoundState, SeatId};
use tracing::{debug, info};

/// Chance that a 1 HP / 1 life standoff turns into Russian Roulette.
const RUSSIAN_ROULETTE_CHANCE: f64 = 0.10;

/// How a round is being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEntry {
    /// A normal round: new event, loot and a dice roll for first turn.
    Fresh,
    /// `seat` just came back from the dead and opens the round.
    Resurrection { seat: SeatId },
    /// The Gambler survived a Sic Bo wager; HP stays as the wager left it.
    SicBo,
}

impl RoundEntry {
    fn is_fresh(self) -> bool {
        self == RoundEntry::Fresh
    }
}

impl<R: RandomSource> Engine<R> {
    /// Reset round state, reload and queue the first turn.
    pub(crate) fn start_round(&mut self, entry: RoundEntry) {
        self.scheduler.cancel_all();
        self.input = None;

        let current = self.state.round.current_turn;
        self.state.round = RoundState::new(current);
        for seat in SeatId::BOTH {
            self.state.seat_mut(seat).status.clear_round();
        }

        let seats = &self.state.seats;
        let standoff = SeatId::BOTH.iter().all(|s| seats[*s].lives == 1 && seats[*s].hp == 1);
        self.state.session.russian_roulette =
            entry.is_fresh() && standoff && self.rng.roll(RUSSIAN_ROULETTE_CHANCE);
        let rr = self.state.session.russian_roulette;

        self.reset_hp(entry, rr);

        self.state.round.tactician_block_armed =
            self.state.is_pve() && self.state.modifiers.boss_is(BossKind::Tactician);

        if entry.is_fresh() {
            self.state.modifiers.event = self.pick_event();
        }

        let ctx = ReloadContext {
            russian_roulette: rr,
            gambler: self.state.is_pve() && self.state.modifiers.boss_is(BossKind::Gambler),
            event: self.state.modifiers.event,
            pact: self.state.modifiers.pact,
            talent: self.state.modifiers.talent,
        };
        let (magazine, report) = Magazine::reload(&ctx, &mut self.rng);
        self.state.magazine = magazine;

        if entry.is_fresh() && !rr {
            let mut amount = if self.state.session.level == 1 { 2 } else { 3 };
            if self.state.modifiers.has_talent(Talent::Pack) {
                amount += 1;
            }
            self.loot_items(SeatId::Player, amount);
            self.loot_items(SeatId::Opponent, amount + 1);
        }

        let intro = self.intro_pending && entry.is_fresh();
        self.intro_pending = false;

        info!(
            event = ?self.state.modifiers.event,
            live = report.live,
            total = report.total,
            all_live = report.all_live,
            russian_roulette = rr,
            ?entry,
            "Round started"
        );
        self.emit(EngineEvent::RoundStarted {
            event: self.state.modifiers.event,
            boss: self.state.modifiers.boss,
            live: report.live,
            total: report.total,
            all_live: report.all_live,
            resurrection: !entry.is_fresh(),
            russian_roulette: rr,
            intro,
        });

        let delay = if intro {
            self.timings.intro_ms
        } else {
            self.timings.reload_ms
        };
        self.schedule(delay, Task::BeginFirstTurn(entry));
    }

    fn reset_hp(&mut self, entry: RoundEntry, rr: bool) {
        match self.state.session.mode {
            Mode::Pvp => {
                for seat in SeatId::BOTH {
                    let seat = self.state.seat_mut(seat);
                    seat.hp = seat.max_hp;
                }
            }
            Mode::Pve => {
                let player = self.state.seat_mut(SeatId::Player);
                player.hp = if player.hp <= 0 {
                    PLAYER_BASE_HP.min(player.max_hp)
                } else {
                    player.hp.min(player.max_hp)
                };
                if entry != RoundEntry::SicBo {
                    let opponent = self.state.seat_mut(SeatId::Opponent);
                    opponent.hp = opponent.max_hp;
                }
            }
        }
        if rr {
            for seat in SeatId::BOTH {
                self.state.seat_mut(seat).hp = 1;
            }
        }
    }

    /// Weighted draw from the event table.
    pub(crate) fn pick_event(&mut self) -> EventKind {
        let weights: Vec<u32> = self.tables.events.iter().map(|e| e.weight).collect();
        weighted_index(&weights, &mut self.rng)
            .and_then(|i| self.tables.events.get(i))
            .map(|e| e.event)
            .unwrap_or_default()
    }

    /// Draw up to `count` items for `seat`, stopping at the inventory cap.
    pub(crate) fn loot_items(&mut self, seat: SeatId, count: u32) -> Vec<ItemKind> {
        let pool = self
            .tables
            .loot_pool(self.state.session.mode, &self.state.session.banned_items);
        let weights: Vec<u32> = pool
            .iter()
            .map(|item| {
                let weight = self.tables.item_weight(*item);
                debug_assert!(weight.is_some(), "{item} has no loot weight");
                weight.unwrap_or(0)
            })
            .collect();

        let mut gained = Vec::new();
        for _ in 0..count {
            if self.state.seat(seat).inventory.is_full() {
                self.emit(EngineEvent::InventoryFull { seat });
                break;
            }
            let Some(item) = weighted_index(&weights, &mut self.rng).map(|i| pool[i]) else {
                break;
            };
            self.state.seat_mut(seat).inventory.add(item);
            gained.push(item);
        }

        if !gained.is_empty() {
            debug!(?seat, items = ?gained, "Looted");
            self.emit(EngineEvent::ItemsLooted {
                seat,
                items: gained.clone(),
            });
        }
        gained
    }

    /// Decide who opens the round, then start that turn.
    pub(crate) fn begin_first_turn(&mut self, entry: RoundEntry) {
        self.state.round.damage_multiplier = 1;
        self.state.round.cuffed = None;

        self.state.round.current_turn = match entry {
            RoundEntry::Resurrection { seat } => seat,
            RoundEntry::SicBo => SeatId::Opponent,
            RoundEntry::Fresh => loop {
                let player = roll_2d6(&mut self.rng);
                let opponent = roll_2d6(&mut self.rng);
                self.emit(EngineEvent::TurnOrderRolled { player, opponent });
                if player > opponent {
                    break SeatId::Player;
                }
                if opponent > player {
                    break SeatId::Opponent;
                }
            },
        };
        debug!(seat = ?self.state.round.current_turn, "First turn");
        self.handle_turn_start();
    }
}

#[cfg(test)]
mod tests {
    use super::RoundEntry;
    use crate::catalog::{EventKind, Talent, MAX_ITEMS};
    use crate::config::{EngineConfig, EventWeight};
    use crate::dice::RngSource;
    use crate::engine::{Awaiting, Engine};
    use crate::events::EngineEvent;
    use crate::model::SeatId;
    use crate::testing::TestHarness;

    #[test]
    fn test_loot_stops_at_cap() {
        let mut e = Engine::new(EngineConfig::pvp(), RngSource::seeded(4)).unwrap();
        e.state.seats.player.inventory.clear();
        let gained = e.loot_items(SeatId::Player, 20);
        assert_eq!(gained.len(), MAX_ITEMS as usize);
        assert_eq!(e.state.seats.player.inventory.total(), MAX_ITEMS);
        assert!(e.loot_items(SeatId::Player, 3).is_empty());
    }

    #[test]
    fn test_opponent_loots_one_more() {
        let e = Engine::new(EngineConfig::pvp(), RngSource::seeded(8)).unwrap();
        let state = e.state();
        assert_eq!(state.seats.player.inventory.total(), 2);
        assert_eq!(state.seats.opponent.inventory.total(), 3);
    }

    #[test]
    fn test_pve_pool_never_drops_pvp_items() {
        let mut e = Engine::new(EngineConfig::pve(), RngSource::seeded(12)).unwrap();
        for _ in 0..200 {
            e.state.seats.player.inventory.clear();
            for item in e.loot_items(SeatId::Player, 8) {
                assert!(!item.is_pvp_only());
            }
        }
    }

    #[test]
    fn test_event_pick_follows_weights() {
        let mut h = TestHarness::pvp();
        let entry = |event, weight| EventWeight { event, weight };
        h.engine.tables.events = vec![
            entry(EventKind::Normal, 1),
            entry(EventKind::Fog, 0),
            entry(EventKind::Blood, 3),
        ];
        h.push_chance(0.1);
        assert_eq!(h.engine.pick_event(), EventKind::Normal);
        h.push_chance(0.5);
        assert_eq!(h.engine.pick_event(), EventKind::Blood);
        h.push_chance(0.26);
        assert_eq!(h.engine.pick_event(), EventKind::Blood);
    }

    #[test]
    fn test_loot_amount_by_level_and_pack() {
        let mut h = TestHarness::pve().with_talent(Talent::Pack);
        h.engine.start_round(RoundEntry::Fresh);
        assert_eq!(h.engine.state().seats.player.inventory.total(), 3);
        assert_eq!(h.engine.state().seats.opponent.inventory.total(), 4);

        let mut h = TestHarness::pve();
        h.engine.state.session.level = 2;
        h.engine.start_round(RoundEntry::Fresh);
        assert_eq!(h.engine.state().seats.player.inventory.total(), 3);
        assert_eq!(h.engine.state().seats.opponent.inventory.total(), 4);
    }

    #[test]
    fn test_resumed_rounds_skip_loot() {
        let mut h = TestHarness::pve();
        h.engine.start_round(RoundEntry::SicBo);
        assert!(h.engine.state().seats.player.inventory.is_empty());
        assert!(h.engine.state().seats.opponent.inventory.is_empty());
    }

    #[test]
    fn test_tied_turn_order_is_rerolled() {
        let mut h = TestHarness::pvp();
        // 3+4 vs 4+3, then 1+1 vs 6+6.
        h.push_picks(&[2, 3, 3, 2, 0, 0, 5, 5]);
        h.engine.begin_first_turn(RoundEntry::Fresh);

        assert_eq!(h.engine.state().round.current_turn, SeatId::Opponent);
        assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Opponent));
        let rolls: Vec<_> = h
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::TurnOrderRolled { player, opponent } => Some((player, opponent)),
                _ => None,
            })
            .collect();
        assert_eq!(rolls, vec![(7, 7), (2, 12)]);
    }
}
