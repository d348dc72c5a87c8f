//! The shell magazine and what each seat knows about it.
//!
//! Shells are stored so that the last element fires next. Each seat keeps
//! its own knowledge track, always the same length as the magazine.

use crate::catalog::{EventKind, Pact, Talent, MAGAZINE_SIZE};
use crate::dice::{shuffle, RandomSource};
use crate::model::{Knowledge, SeatId, SeatPair, Shell};
use serde::{Deserialize, Serialize};

/// Chance that a normal reload is all live.
const ALL_LIVE_CHANCE: f64 = 0.05;
/// Chance the Eye talent reveals the first shell.
const EYE_REVEAL_CHANCE: f64 = 0.3;
/// Chance the Vision event reveals the first shell.
const VISION_REVEAL_CHANCE: f64 = 0.25;

/// Modifiers that shape a reload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReloadContext {
    pub russian_roulette: bool,
    /// The Gambler rigs the last shell of every magazine.
    pub gambler: bool,
    pub event: EventKind,
    pub pact: Option<Pact>,
    pub talent: Option<Talent>,
}

/// What happened during a reload, for notifications and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReloadReport {
    pub live: usize,
    pub total: usize,
    pub all_live: bool,
    pub eerie_flipped: bool,
    pub revealed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magazine {
    shells: Vec<Shell>,
    knowledge: SeatPair<Vec<Knowledge>>,
}

impl Magazine {
    /// A magazine in exactly this order, nothing known.
    pub fn from_shells(shells: Vec<Shell>) -> Self {
        let unknown = vec![Knowledge::Unknown; shells.len()];
        Self {
            shells,
            knowledge: SeatPair::splat(unknown),
        }
    }

    /// Load a fresh magazine for a new round.
    pub fn reload<R: RandomSource + ?Sized>(
        ctx: &ReloadContext,
        rng: &mut R,
    ) -> (Magazine, ReloadReport) {
        if ctx.russian_roulette {
            let mut shells = vec![Shell::Blank; MAGAZINE_SIZE];
            shells[0] = Shell::Live;
            let magazine = Magazine::from_shells(shells);
            let report = ReloadReport {
                live: 1,
                total: MAGAZINE_SIZE,
                ..Default::default()
            };
            return (magazine, report);
        }

        let all_live = rng.roll(ALL_LIVE_CHANCE);
        let live = if all_live {
            MAGAZINE_SIZE
        } else {
            rng.below(MAGAZINE_SIZE - 1) + 1
        };

        let mut shells = vec![Shell::Live; live];
        shells.resize(MAGAZINE_SIZE, Shell::Blank);
        shuffle(&mut shells, rng);

        if ctx.gambler {
            shells[0] = Shell::Live;
        }
        if ctx.event == EventKind::Shuffle {
            shuffle(&mut shells, rng);
        }
        let mut eerie_flipped = false;
        if ctx.pact == Some(Pact::Eerie) {
            let i = rng.below(shells.len());
            shells[i] = shells[i].flipped();
            eerie_flipped = true;
        }

        let mut magazine = Magazine::from_shells(shells);
        let mut revealed = false;
        if ctx.talent == Some(Talent::Eye) && rng.roll(EYE_REVEAL_CHANCE) {
            magazine.reveal_next(SeatId::Player);
            revealed = true;
        }
        if ctx.event == EventKind::Vision && rng.roll(VISION_REVEAL_CHANCE) {
            for seat in SeatId::BOTH {
                magazine.reveal_next(seat);
            }
            revealed = true;
        }

        let report = ReloadReport {
            live: magazine.live_count(),
            total: magazine.len(),
            all_live,
            eerie_flipped,
            revealed,
        };
        (magazine, report)
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    pub fn knowledge(&self, seat: SeatId) -> &[Knowledge] {
        &self.knowledge[seat]
    }

    pub fn live_count(&self) -> usize {
        self.shells.iter().filter(|s| s.is_live()).count()
    }

    /// The shell that fires next.
    pub fn next(&self) -> Option<Shell> {
        self.shells.last().copied()
    }

    /// What `seat` believes about the next shell.
    pub fn next_knowledge(&self, seat: SeatId) -> Knowledge {
        self.knowledge[seat].last().copied().unwrap_or_default()
    }

    /// Pop the next shell and its knowledge entries.
    pub fn draw(&mut self) -> Option<Shell> {
        let shell = self.shells.pop()?;
        for seat in SeatId::BOTH {
            self.knowledge[seat].pop();
        }
        Some(shell)
    }

    /// Record the true state of the next shell for `seat`.
    pub fn reveal_next(&mut self, seat: SeatId) -> Option<Shell> {
        let shell = self.next()?;
        self.mark_next(seat, shell);
        Some(shell)
    }

    /// Record `shown` for the next shell, true or not.
    pub fn mark_next(&mut self, seat: SeatId, shown: Shell) {
        if let Some(slot) = self.knowledge[seat].last_mut() {
            *slot = Knowledge::of(shown);
        }
    }

    pub fn reveal_at(&mut self, seat: SeatId, index: usize) -> Option<Shell> {
        let shell = *self.shells.get(index)?;
        self.knowledge[seat][index] = Knowledge::of(shell);
        Some(shell)
    }

    /// Flip the next shell in place; every seat's knowledge of it flips too.
    pub fn invert_next(&mut self) -> Option<Shell> {
        let slot = self.shells.last_mut()?;
        *slot = slot.flipped();
        let shell = *slot;
        for seat in SeatId::BOTH {
            if let Some(k) = self.knowledge[seat].last_mut() {
                *k = k.inverted();
            }
        }
        Some(shell)
    }

    /// Add a shell at the far end; it fires last.
    pub fn push_far(&mut self, shell: Shell) {
        self.shells.insert(0, shell);
        for seat in SeatId::BOTH {
            self.knowledge[seat].insert(0, Knowledge::Unknown);
        }
    }

    /// Add a shell that fires next.
    pub fn push_next(&mut self, shell: Shell) {
        self.shells.push(shell);
        for seat in SeatId::BOTH {
            self.knowledge[seat].push(Knowledge::Unknown);
        }
    }

    /// Move the next shell, knowledge included, to the far end.
    /// Returns `false` when there is nothing to cycle past.
    pub fn cycle_next_to_far(&mut self) -> bool {
        if self.shells.len() <= 1 {
            return false;
        }
        self.shells.rotate_right(1);
        for seat in SeatId::BOTH {
            self.knowledge[seat].rotate_right(1);
        }
        true
    }

    /// Shuffle what remains and forget everything known about it.
    pub fn reshuffle<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        shuffle(&mut self.shells, rng);
        let unknown = vec![Knowledge::Unknown; self.shells.len()];
        self.knowledge = SeatPair::splat(unknown);
    }

    pub fn unknown_indices(&self, seat: SeatId) -> Vec<usize> {
        self.knowledge[seat]
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == Knowledge::Unknown)
            .map(|(i, _)| i)
            .collect()
    }

    /// Odds that the next shell is live, as `seat` sees it.
    pub fn live_probability(&self, seat: SeatId) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        match self.next_knowledge(seat) {
            Knowledge::KnownLive => 1.0,
            Knowledge::KnownBlank => 0.0,
            Knowledge::Unknown => self.live_count() as f64 / self.len() as f64,
        }
    }

    /// Knowledge tracks match the magazine length.
    pub fn is_consistent(&self) -> bool {
        SeatId::BOTH
            .iter()
            .all(|seat| self.knowledge[*seat].len() == self.shells.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::RngSource;
    use crate::testing::ScriptedRandom;

    fn mag(shells: &[Shell]) -> Magazine {
        Magazine::from_shells(shells.to_vec())
    }

    #[test]
    fn test_reload_shape() {
        let mut rng = RngSource::seeded(1);
        for _ in 0..500 {
            let (m, report) = Magazine::reload(&ReloadContext::default(), &mut rng);
            assert_eq!(m.len(), MAGAZINE_SIZE);
            assert!((1..=MAGAZINE_SIZE).contains(&m.live_count()));
            assert_eq!(report.live, m.live_count());
            assert!(m.is_consistent());
            assert!(m.knowledge(SeatId::Player).iter().all(|k| *k == Knowledge::Unknown));
        }
    }

    #[test]
    fn test_russian_roulette_magazine_is_fixed() {
        let mut rng = RngSource::seeded(2);
        let ctx = ReloadContext {
            russian_roulette: true,
            talent: Some(Talent::Eye),
            event: EventKind::Vision,
            ..Default::default()
        };
        for _ in 0..50 {
            let (m, _) = Magazine::reload(&ctx, &mut rng);
            assert_eq!(
                m.shells(),
                &[Shell::Live, Shell::Blank, Shell::Blank, Shell::Blank, Shell::Blank, Shell::Blank]
            );
            assert!(m.unknown_indices(SeatId::Player).len() == 6);
        }
    }

    #[test]
    fn test_gambler_rigs_last_shell() {
        let mut rng = RngSource::seeded(3);
        let ctx = ReloadContext {
            gambler: true,
            ..Default::default()
        };
        for _ in 0..200 {
            let (m, _) = Magazine::reload(&ctx, &mut rng);
            assert_eq!(m.shells()[0], Shell::Live);
        }
    }

    #[test]
    fn test_draw_keeps_knowledge_aligned() {
        let mut m = mag(&[Shell::Blank, Shell::Live]);
        m.reveal_next(SeatId::Player);
        assert_eq!(m.draw(), Some(Shell::Live));
        assert_eq!(m.len(), 1);
        assert!(m.is_consistent());
        assert_eq!(m.next_knowledge(SeatId::Player), Knowledge::Unknown);
        assert_eq!(m.draw(), Some(Shell::Blank));
        assert_eq!(m.draw(), None);
    }

    #[test]
    fn test_invert_flips_knowledge() {
        let mut m = mag(&[Shell::Blank, Shell::Live]);
        m.reveal_next(SeatId::Opponent);
        assert_eq!(m.invert_next(), Some(Shell::Blank));
        assert_eq!(m.next_knowledge(SeatId::Opponent), Knowledge::KnownBlank);
        assert_eq!(m.next_knowledge(SeatId::Player), Knowledge::Unknown);
    }

    #[test]
    fn test_cycle_moves_next_to_far_end() {
        let mut m = mag(&[Shell::Blank, Shell::Blank, Shell::Live]);
        m.reveal_next(SeatId::Player);
        assert!(m.cycle_next_to_far());
        assert_eq!(m.shells(), &[Shell::Live, Shell::Blank, Shell::Blank]);
        assert_eq!(m.knowledge(SeatId::Player)[0], Knowledge::KnownLive);

        let mut single = mag(&[Shell::Live]);
        assert!(!single.cycle_next_to_far());
    }

    #[test]
    fn test_push_ends() {
        let mut m = mag(&[Shell::Blank]);
        m.push_next(Shell::Live);
        m.push_far(Shell::Live);
        assert_eq!(m.shells(), &[Shell::Live, Shell::Blank, Shell::Live]);
        assert_eq!(m.next(), Some(Shell::Live));
        assert!(m.is_consistent());
    }

    #[test]
    fn test_live_probability_uses_own_view() {
        let mut m = mag(&[Shell::Live, Shell::Blank, Shell::Blank, Shell::Blank]);
        assert!((m.live_probability(SeatId::Player) - 0.25).abs() < 1e-9);
        m.reveal_next(SeatId::Opponent);
        assert_eq!(m.live_probability(SeatId::Opponent), 0.0);
        assert!((m.live_probability(SeatId::Player) - 0.25).abs() < 1e-9);
        assert_eq!(Magazine::default().live_probability(SeatId::Player), 0.0);
    }

    #[test]
    fn test_reshuffle_forgets() {
        let mut rng = RngSource::seeded(9);
        let mut m = mag(&[Shell::Live, Shell::Blank, Shell::Blank]);
        m.reveal_at(SeatId::Player, 0);
        m.reshuffle(&mut rng);
        assert_eq!(m.live_count(), 1);
        assert_eq!(m.unknown_indices(SeatId::Player), vec![0, 1, 2]);
    }

    #[test]
    fn test_eerie_flips_one_shell() {
        let mut rng = ScriptedRandom::new();
        rng.push_chance(0.0);
        let ctx = ReloadContext {
            pact: Some(Pact::Eerie),
            ..Default::default()
        };
        let (m, report) = Magazine::reload(&ctx, &mut rng);
        assert!(report.all_live);
        assert!(report.eerie_flipped);
        assert_eq!(m.live_count(), MAGAZINE_SIZE - 1);
        assert_eq!(report.live, MAGAZINE_SIZE - 1);
    }

    #[test]
    fn test_eye_reveals_first_shell_to_player() {
        let ctx = ReloadContext {
            talent: Some(Talent::Eye),
            ..Default::default()
        };
        let mut rng = ScriptedRandom::new();
        rng.push_chance(0.5);
        rng.push_chance(0.0);
        let (m, report) = Magazine::reload(&ctx, &mut rng);
        assert!(report.revealed);
        assert_eq!(m.next_knowledge(SeatId::Player).shell(), m.next());
        assert_eq!(m.next_knowledge(SeatId::Opponent), Knowledge::Unknown);

        let mut rng = ScriptedRandom::new();
        rng.push_chance(0.5);
        rng.push_chance(0.9);
        let (m, report) = Magazine::reload(&ctx, &mut rng);
        assert!(!report.revealed);
        assert_eq!(m.next_knowledge(SeatId::Player), Knowledge::Unknown);
    }

    #[test]
    fn test_vision_reveals_first_shell_to_both() {
        let ctx = ReloadContext {
            event: EventKind::Vision,
            ..Default::default()
        };
        let mut rng = ScriptedRandom::new();
        rng.push_chance(0.5);
        rng.push_chance(0.0);
        let (m, report) = Magazine::reload(&ctx, &mut rng);
        assert!(report.revealed);
        for seat in SeatId::BOTH {
            assert_eq!(m.next_knowledge(seat).shell(), m.next());
        }
    }
}
