//! End-to-end rule scenarios driven through the public engine API.
//!
//! Run with: `cargo test -p roulette-core --test scenarios`

use roulette_core::model::HistoryEntry;
use roulette_core::testing::{assert_emitted, assert_hp, TestHarness};
use roulette_core::{
    ActionError, Awaiting, BossKind, EngineEvent, EventKind, ItemKind, Outcome, Pact, SeatId,
    Shell, ShellOutcome, StatusChange, Talent, Target,
};

use Shell::{Blank as B, Live as L};

// =============================================================================
// SCENARIO A: Plain live shot at the enemy
// =============================================================================

#[test]
fn test_live_shot_at_enemy_switches_turn() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B, B, B, B, B, L])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    assert_hp(&h, SeatId::Opponent, 3);
    assert_hp(&h, SeatId::Player, 4);
    assert_eq!(h.engine.state().magazine.len(), 5);
    assert_eq!(h.engine.state().round.current_turn, SeatId::Opponent);
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Opponent));

    let events = h.drain();
    assert_emitted(&events, |e| {
        matches!(
            e,
            EngineEvent::ShotFired {
                shooter: SeatId::Player,
                victim: SeatId::Opponent,
                outcome: ShellOutcome::Live,
                damage: 1,
                ..
            }
        )
    });
}

// =============================================================================
// SCENARIO B: Half pact adds one damage
// =============================================================================

#[test]
fn test_half_pact_live_shot_deals_two() {
    let mut h = TestHarness::pve()
        .with_pact(Pact::Half)
        .with_magazine(&[B, L])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    assert_hp(&h, SeatId::Opponent, 2);
}

// =============================================================================
// SCENARIO C: Pain talent floors self damage at one
// =============================================================================

#[test]
fn test_pain_talent_reduces_self_damage_but_never_to_zero() {
    let mut h = TestHarness::pve()
        .with_talent(Talent::Pain)
        .with_magazine(&[B, L])
        .with_items(SeatId::Player, &[ItemKind::Saw])
        .with_turn(SeatId::Player);

    h.engine.use_item(SeatId::Player, ItemKind::Saw).unwrap();
    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_hp(&h, SeatId::Player, 3);

    let mut h = TestHarness::pve()
        .with_talent(Talent::Pain)
        .with_magazine(&[B, L])
        .with_turn(SeatId::Player);
    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_hp(&h, SeatId::Player, 3);
}

// =============================================================================
// SCENARIO D: Russian Roulette shots
// =============================================================================

#[test]
fn test_roulette_blank_passes_the_turn() {
    let mut h = TestHarness::pvp()
        .with_russian_roulette()
        .with_magazine(&[L, B, B, B, B, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();

    assert_eq!(h.engine.state().round.current_turn, SeatId::Opponent);
    assert_eq!(h.engine.state().magazine.len(), 5);
    assert_hp(&h, SeatId::Player, 1);
}

#[test]
fn test_roulette_live_is_lethal() {
    let mut h = TestHarness::pvp()
        .with_russian_roulette()
        .with_magazine(&[B, L])
        .with_safety(SeatId::Player)
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();

    let state = h.engine.state();
    assert!(state.seats.player.hp <= 0);
    assert_eq!(state.session.outcome, Some(Outcome::Defeat));
}

#[test]
fn test_roulette_forbids_items_and_enemy_shots() {
    let mut h = TestHarness::pvp()
        .with_russian_roulette()
        .with_magazine(&[L, B, B, B, B, B])
        .with_items(SeatId::Player, &[ItemKind::Magnifier])
        .with_turn(SeatId::Player);
    let before = h.engine.state().clone();

    assert_eq!(
        h.engine.fire(SeatId::Player, Target::Enemy),
        Err(ActionError::EnemyTargetForbidden)
    );
    assert_eq!(
        h.engine.use_item(SeatId::Player, ItemKind::Magnifier),
        Err(ActionError::RussianRoulette)
    );
    assert_eq!(h.engine.state(), &before);
}

// =============================================================================
// SCENARIO E: Entering Russian Roulette
// =============================================================================

#[test]
fn test_standoff_enters_russian_roulette() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B])
        .with_hp(SeatId::Player, 1)
        .with_hp(SeatId::Opponent, 1)
        .with_lives(SeatId::Player, 1)
        .with_lives(SeatId::Opponent, 1)
        .with_turn(SeatId::Player);

    // Blank at the enemy empties the magazine; the next round is queued.
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_eq!(h.engine.awaiting(), Awaiting::Scheduled);

    h.push_chance(0.05);
    h.engine.run_next();

    let state = h.engine.state();
    assert!(state.session.russian_roulette);
    assert_eq!(state.seats.player.hp, 1);
    assert_eq!(state.seats.opponent.hp, 1);
    assert_eq!(state.magazine.shells(), &[L, B, B, B, B, B]);
    assert!(state.seats.player.inventory.is_empty());
}

#[test]
fn test_standoff_without_the_roll_stays_normal() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B])
        .with_hp(SeatId::Player, 1)
        .with_hp(SeatId::Opponent, 1)
        .with_lives(SeatId::Player, 1)
        .with_lives(SeatId::Opponent, 1)
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    h.push_chance(0.5);
    h.engine.run_next();

    let state = h.engine.state();
    assert!(!state.session.russian_roulette);
    // PvP resets HP every round.
    assert_eq!(state.seats.player.hp, 4);
}

// =============================================================================
// Saw and safety
// =============================================================================

#[test]
fn test_saw_resets_after_a_blank() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[L, B])
        .with_items(SeatId::Player, &[ItemKind::Saw])
        .with_turn(SeatId::Player);

    h.engine.use_item(SeatId::Player, ItemKind::Saw).unwrap();
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    assert_eq!(h.engine.state().round.damage_multiplier, 1);
    // Opponent now fires the live one without the saw bonus.
    h.engine.fire(SeatId::Opponent, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Player, 3);
}

#[test]
fn test_safety_catches_a_lethal_hit() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B, L])
        .with_items(SeatId::Opponent, &[ItemKind::Saw])
        .with_hp(SeatId::Player, 1)
        .with_safety(SeatId::Player)
        .with_turn(SeatId::Opponent);

    h.engine.use_item(SeatId::Opponent, ItemKind::Saw).unwrap();
    h.engine.fire(SeatId::Opponent, Target::Enemy).unwrap();

    assert_hp(&h, SeatId::Player, 1);
    assert!(!h.engine.state().round.safety_armed[SeatId::Player]);
    assert_eq!(h.engine.state().seats.player.lives, 2);
}

// =============================================================================
// Turn retention
// =============================================================================

#[test]
fn test_self_blank_keeps_the_turn() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[L, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_eq!(h.engine.awaiting(), Awaiting::Scheduled);
    h.engine.run_until_idle(5);
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Player));
}

#[test]
fn test_fair_event_passes_turn_on_self_blank() {
    let mut h = TestHarness::pvp()
        .with_event(EventKind::Fair)
        .with_magazine(&[L, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Opponent));
}

#[test]
fn test_cuffs_skip_one_turn() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B, B, B])
        .with_items(SeatId::Player, &[ItemKind::Cuffs])
        .with_turn(SeatId::Player);

    h.engine.use_item(SeatId::Player, ItemKind::Cuffs).unwrap();
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Player));
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Opponent));
}

// =============================================================================
// Locking
// =============================================================================

#[test]
fn test_actions_rejected_while_continuation_pending() {
    let mut h = TestHarness::pve()
        .with_magazine(&[B, B, L])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    // The AI is thinking.
    assert!(h.engine.is_locked());
    let before = h.engine.state().clone();
    assert_eq!(
        h.engine.fire(SeatId::Player, Target::Enemy),
        Err(ActionError::Locked)
    );
    assert_eq!(h.engine.state(), &before);
}

// =============================================================================
// Damage modifiers
// =============================================================================

#[test]
fn test_overheat_stacks_until_a_blank() {
    let mut h = TestHarness::pvp()
        .with_event(EventKind::Overheat)
        .with_magazine(&[L, B, L, L])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Opponent, 3);
    h.engine.fire(SeatId::Opponent, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Player, 2);
    assert_eq!(h.engine.state().round.consecutive_live_shots, 2);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_eq!(h.engine.state().round.consecutive_live_shots, 0);
    h.engine.fire(SeatId::Opponent, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Player, 1);
}

#[test]
fn test_blood_doubles_self_damage_and_ends_the_turn() {
    let mut h = TestHarness::pvp()
        .with_event(EventKind::Blood)
        .with_magazine(&[B, L])
        .with_turn(SeatId::Player);
    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_hp(&h, SeatId::Player, 2);

    let mut h = TestHarness::pvp()
        .with_event(EventKind::Blood)
        .with_magazine(&[L, B])
        .with_turn(SeatId::Player);
    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Opponent));
}

#[test]
fn test_luck_keeps_the_turn_through_blood() {
    let mut h = TestHarness::pve()
        .with_talent(Talent::Luck)
        .with_event(EventKind::Blood)
        .with_magazine(&[L, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    h.engine.run_until_idle(5);
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Player));
}

#[test]
fn test_devil_deal_doubles_a_live_self_shot() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B, L])
        .with_turn(SeatId::Player);
    h.state_mut().round.devil_deal_armed = true;

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();

    assert_hp(&h, SeatId::Player, 2);
    assert!(!h.engine.state().round.devil_deal_armed);
    assert_emitted(&h.drain(), |e| {
        matches!(
            e,
            EngineEvent::Status {
                change: StatusChange::DevilDealLost,
                ..
            }
        )
    });
}

#[test]
fn test_devil_deal_pays_two_items_on_a_blank() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[L, B])
        .with_turn(SeatId::Player);
    h.state_mut().round.devil_deal_armed = true;

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();

    assert_eq!(h.engine.state().seats.player.inventory.total(), 2);
    assert_emitted(&h.drain(), |e| {
        matches!(
            e,
            EngineEvent::Status {
                change: StatusChange::DevilDealWon,
                ..
            }
        )
    });
}

#[test]
fn test_devil_deal_pays_on_a_dud() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B, L])
        .with_turn(SeatId::Player);
    h.state_mut().round.devil_deal_armed = true;
    h.push_chance(0.0);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();

    assert_hp(&h, SeatId::Player, 4);
    assert_eq!(h.engine.state().seats.player.inventory.total(), 2);
    // A dud never keeps the turn.
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Opponent));
}

#[test]
fn test_quick_talent_needs_an_itemless_turn() {
    let mut h = TestHarness::pve()
        .with_talent(Talent::Quick)
        .with_magazine(&[B, L])
        .with_turn(SeatId::Player);
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Opponent, 2);

    let mut h = TestHarness::pve()
        .with_talent(Talent::Quick)
        .with_magazine(&[B, L])
        .with_items(SeatId::Player, &[ItemKind::Magnifier])
        .with_turn(SeatId::Player);
    h.engine.use_item(SeatId::Player, ItemKind::Magnifier).unwrap();
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Opponent, 3);
}

#[test]
fn test_twisted_live_shells_hit_harder() {
    let mut h = TestHarness::pve()
        .with_twisted()
        .with_magazine(&[B, L])
        .with_turn(SeatId::Player);
    h.push_chance(0.0);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    // The queued roll would have been a dud; twisted shells never are.
    assert_hp(&h, SeatId::Opponent, 2);
}

// =============================================================================
// Delayed effects
// =============================================================================

#[test]
fn test_delay_shell_turns_a_hit_into_poison() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B, B, B, L])
        .with_items(SeatId::Player, &[ItemKind::DelayShell])
        .with_turn(SeatId::Player);

    h.engine.use_item(SeatId::Player, ItemKind::DelayShell).unwrap();
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Opponent, 4);
    assert_emitted(&h.drain(), |e| {
        matches!(
            e,
            EngineEvent::Status {
                seat: SeatId::Opponent,
                change: StatusChange::PoisonQueued { damage: 1, turns: 2 },
            }
        )
    });

    h.engine.fire(SeatId::Opponent, Target::Enemy).unwrap();
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Opponent, 3);
}

#[test]
fn test_echo_returns_the_live_shell() {
    let mut h = TestHarness::pve()
        .with_pact(Pact::Echo)
        .with_magazine(&[B, L])
        .with_turn(SeatId::Player);
    h.push_chance(0.5);
    h.push_chance(0.0);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    assert_hp(&h, SeatId::Opponent, 3);
    assert_eq!(h.engine.state().magazine.shells(), &[L, B]);
    assert_emitted(&h.drain(), |e| matches!(e, EngineEvent::EchoReturned));
}

// =============================================================================
// Player blank perks
// =============================================================================

#[test]
fn test_flesh_shield_absorbs_the_next_hit() {
    let mut h = TestHarness::pve()
        .with_pact(Pact::Flesh)
        .with_magazine(&[L, L, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_eq!(h.engine.state().seats.player.status.shield, 1);
    h.engine.run_until_idle(5);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_hp(&h, SeatId::Player, 4);
    assert_eq!(h.engine.state().seats.player.status.shield, 0);
    assert_emitted(&h.drain(), |e| {
        matches!(
            e,
            EngineEvent::Status {
                change: StatusChange::ShieldBroke,
                ..
            }
        )
    });
}

#[test]
fn test_strict_pact_skips_the_players_next_turn() {
    let mut h = TestHarness::pvp()
        .with_pact(Pact::Strict)
        .with_magazine(&[L, B, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Opponent));
    h.engine.fire(SeatId::Opponent, Target::Enemy).unwrap();

    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Opponent));
    assert_emitted(&h.drain(), |e| {
        matches!(
            e,
            EngineEvent::Status {
                seat: SeatId::Player,
                change: StatusChange::TurnSkipped,
            }
        )
    });
}

#[test]
fn test_greed_loots_on_every_player_blank() {
    let mut h = TestHarness::pve()
        .with_pact(Pact::Greed)
        .with_magazine(&[L, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    assert_eq!(h.engine.state().seats.player.inventory.total(), 1);
    assert_emitted(&h.drain(), |e| {
        matches!(
            e,
            EngineEvent::Status {
                change: StatusChange::GreedLoot,
                ..
            }
        )
    });
}

#[test]
fn test_alarm_charges_the_next_live_shot() {
    let mut h = TestHarness::pve()
        .with_talent(Talent::Alarm)
        .with_magazine(&[L, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();
    assert_eq!(h.engine.state().round.false_alarm_buff, 1);
    h.engine.run_until_idle(5);
    assert_eq!(h.engine.awaiting(), Awaiting::Input(SeatId::Player));

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Opponent, 2);
    assert_eq!(h.engine.state().round.false_alarm_buff, 0);
}

#[test]
fn test_boom_talent_hurts_the_opponent() {
    let mut h = TestHarness::pve()
        .with_talent(Talent::Boom)
        .with_magazine(&[L, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Shooter).unwrap();

    assert_hp(&h, SeatId::Opponent, 3);
    assert_hp(&h, SeatId::Player, 4);
}

// =============================================================================
// Reshuffles and the history track
// =============================================================================

#[test]
fn test_power_pact_reshuffles_after_a_blank() {
    let mut h = TestHarness::pve()
        .with_pact(Pact::Power)
        .with_magazine(&[L, L, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    let state = h.engine.state();
    assert_eq!(state.round.history, vec![HistoryEntry::Blank, HistoryEntry::Shuffled]);
    assert_eq!(state.magazine.shells(), &[L, L]);
    assert_emitted(&h.drain(), |e| matches!(e, EngineEvent::MagazineShuffled));
}

#[test]
fn test_twisted_reshuffles_after_a_blank() {
    let mut h = TestHarness::pvp()
        .with_twisted()
        .with_magazine(&[L, B, B])
        .with_turn(SeatId::Player);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    assert_eq!(
        h.engine.state().round.history.last(),
        Some(&HistoryEntry::Shuffled)
    );
    assert_eq!(h.engine.state().magazine.live_count(), 1);
}

#[test]
fn test_visor_flips_history_in_pvp_only() {
    let mut h = TestHarness::pvp()
        .with_magazine(&[B, L])
        .with_items(SeatId::Player, &[ItemKind::Visor])
        .with_turn(SeatId::Player);
    h.engine.use_item(SeatId::Player, ItemKind::Visor).unwrap();
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_hp(&h, SeatId::Opponent, 3);
    assert_eq!(h.engine.state().round.history, vec![HistoryEntry::Blank]);

    let mut h = TestHarness::pve()
        .with_magazine(&[B, L])
        .with_items(SeatId::Player, &[ItemKind::Visor])
        .with_turn(SeatId::Player);
    h.engine.use_item(SeatId::Player, ItemKind::Visor).unwrap();
    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();
    assert_eq!(h.engine.state().round.history, vec![HistoryEntry::Live]);
}

// =============================================================================
// Boss turn-start effects
// =============================================================================

#[test]
fn test_gambler_steals_at_turn_start() {
    let mut h = TestHarness::pve()
        .with_boss(BossKind::Gambler)
        .with_magazine(&[L, B])
        .with_items(SeatId::Player, &[ItemKind::Saw])
        .with_turn(SeatId::Player);
    h.push_chance(0.0);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    let state = h.engine.state();
    assert!(state.seats.player.inventory.is_empty());
    assert_eq!(state.seats.opponent.inventory.count(ItemKind::Saw), 1);
    assert_emitted(&h.drain(), |e| {
        matches!(
            e,
            EngineEvent::Status {
                change: StatusChange::GamblerStole { item: ItemKind::Saw },
                ..
            }
        )
    });
}

#[test]
fn test_gambler_cannot_steal_into_a_full_inventory() {
    let mut h = TestHarness::pve()
        .with_boss(BossKind::Gambler)
        .with_magazine(&[L, B])
        .with_items(SeatId::Player, &[ItemKind::Saw])
        .with_items(SeatId::Opponent, &[ItemKind::Beer; 8])
        .with_turn(SeatId::Player);
    h.push_chance(0.0);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    let state = h.engine.state();
    assert_eq!(state.seats.opponent.inventory.total(), 8);
    assert_eq!(state.seats.player.inventory.count(ItemKind::Saw), 1);
    let snapshot = h.engine.snapshot().unwrap();
    assert!(snapshot.validate().is_ok());
}

#[test]
fn test_doctor_heals_at_turn_start() {
    let mut h = TestHarness::pve()
        .with_boss(BossKind::Doctor)
        .with_magazine(&[L, B])
        .with_hp(SeatId::Opponent, 2)
        .with_turn(SeatId::Player);
    h.push_chance(0.0);

    h.engine.fire(SeatId::Player, Target::Enemy).unwrap();

    assert_hp(&h, SeatId::Opponent, 3);
    assert_emitted(&h.drain(), |e| {
        matches!(
            e,
            EngineEvent::Status {
                seat: SeatId::Opponent,
                change: StatusChange::DoctorHealed,
            }
        )
    });
}
