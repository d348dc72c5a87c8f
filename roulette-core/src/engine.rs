//! The duel engine.
//!
//! [`Engine`] owns the whole game state. Actions come in through the public
//! methods and are resolved synchronously up to the next continuation; the
//! continuations (AI thinking, reload pauses, the enrage splash) sit on a
//! logical scheduler that the caller drives with [`Engine::advance`] or
//! [`Engine::run_next`]. Nothing here depends on wall-clock time.

use crate::ai::{self, AiAction, AiView};
use crate::catalog::{
    BossKind, ItemKind, Reward, Talent, BOSS_BASE_HP, PLAYER_BASE_HP, PVP_HP,
};
use crate::chamber::Magazine;
use crate::config::{ConfigError, EngineConfig, RuleTables, Timings};
use crate::dice::{RandomSource, RngSource, SicBoBet, SicBoRoll};
use crate::events::{EngineEvent, Milestone, StatusChange};
use crate::model::{
    Boss, BossPhase, GameState, Mode, Modifiers, RoundState, Seat, SeatId, SeatPair, Session,
    Target,
};
use crate::persist::{PersistError, Snapshot};
use crate::round::RoundEntry;
use rand::rngs::ThreadRng;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why an action was rejected. A rejected action never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Another action is still resolving")]
    Locked,

    #[error("It is not {0:?}'s turn")]
    NotYourTurn(SeatId),

    #[error("Input is disabled")]
    InputDisabled,

    #[error("Items cannot be used during Russian Roulette")]
    RussianRoulette,

    #[error("No {0} left to use")]
    NoSuchItem(ItemKind),

    #[error("The magazine is empty")]
    EmptyMagazine,

    #[error("Nothing to select from")]
    NothingToSelect,

    #[error("That action is not available right now")]
    WrongPhase,

    #[error("Only self-shots are allowed during Russian Roulette")]
    EnemyTargetForbidden,

    #[error("The session is over")]
    SessionOver,
}

/// A modal sub-step that blocks normal play until answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    None,
    /// A seat used a Mirror and must pick an item to take.
    MirrorSelection { seat: SeatId },
    /// The Gambler is being resurrected through a wager.
    SicBo,
    /// A boss fell and the player picks a reward.
    RewardSelection,
}

/// What the engine needs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
    /// A human seat may fire or use an item.
    Input(SeatId),
    /// Continuations are queued; advance the clock.
    Scheduled,
    MirrorSelection(SeatId),
    SicBoBet,
    RewardChoice,
    Finished,
    /// Nothing queued and no input expected.
    Idle,
}

/// Continuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Task {
    StartRound,
    BeginFirstTurn(RoundEntry),
    /// The shooter kept the turn and acts again.
    ResumeTurn,
    AiAct,
    /// Enrage splash finished; continue after the shot that caused it.
    AfterEnrage { shooter: SeatId },
}

#[derive(Debug, Clone)]
struct Scheduled {
    due: u64,
    seq: u64,
    task: Task,
}

/// Logical timer queue. Ties run in scheduling order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scheduler {
    now: u64,
    seq: u64,
    queue: Vec<Scheduled>,
}

impl Scheduler {
    pub(crate) fn schedule(&mut self, delay_ms: u64, task: Task) {
        self.seq += 1;
        self.queue.push(Scheduled {
            due: self.now + delay_ms,
            seq: self.seq,
            task,
        });
    }

    pub(crate) fn cancel_all(&mut self) {
        self.queue.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn now(&self) -> u64 {
        self.now
    }

    fn only_ai_pending(&self) -> bool {
        self.queue.iter().all(|s| s.task == Task::AiAct)
    }

    fn earliest(&self) -> Option<usize> {
        self.queue
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| (s.due, s.seq))
            .map(|(i, _)| i)
    }

    /// Pop the earliest task due at or before `limit`, moving the clock to it.
    fn pop_due(&mut self, limit: u64) -> Option<Task> {
        let i = self.earliest()?;
        if self.queue[i].due > limit {
            return None;
        }
        let entry = self.queue.swap_remove(i);
        self.now = self.now.max(entry.due);
        Some(entry.task)
    }

    fn pop_next(&mut self) -> Option<Task> {
        self.pop_due(u64::MAX)
    }

    fn advance_to(&mut self, time: u64) {
        self.now = self.now.max(time);
    }
}

/// A two-seat duel.
pub struct Engine<R: RandomSource = RngSource<ThreadRng>> {
    pub(crate) state: GameState,
    pub(crate) tables: RuleTables,
    pub(crate) timings: Timings,
    pub(crate) rng: R,
    pub(crate) scheduler: Scheduler,
    pub(crate) events: Vec<EngineEvent>,
    /// Seat allowed to act right now. `None` while something resolves.
    pub(crate) input: Option<SeatId>,
    pub(crate) interaction: Interaction,
    pub(crate) intro_pending: bool,
}

impl Engine<RngSource<ThreadRng>> {
    /// Start a session with thread-local randomness.
    pub fn with_thread_rng(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::new(config, RngSource::thread())
    }
}

impl<R: RandomSource> Engine<R> {
    /// Set up a session and start its first round.
    pub fn new(config: EngineConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let talent = config.effective_talent();
        let pact = config.effective_pact();

        let (player_max, opponent_max) = match config.mode {
            Mode::Pvp => (PVP_HP, PVP_HP),
            Mode::Pve => (
                pact.map_or(PLAYER_BASE_HP, |p| p.adjust_max_hp(PLAYER_BASE_HP)),
                BOSS_BASE_HP + 1,
            ),
        };

        let state = GameState {
            session: Session::new(config.mode, config.twisted),
            modifiers: Modifiers {
                talent,
                pact,
                ..Default::default()
            },
            seats: SeatPair::new(Seat::new(player_max), Seat::new(opponent_max)),
            round: RoundState::new(SeatId::Player),
            magazine: Magazine::default(),
        };

        let mut engine = Self::from_parts(state, config.tables, config.timings, rng);
        engine.intro_pending = true;

        for item in &config.starter_items {
            engine.state.seats.player.inventory.add(*item);
        }
        if talent == Some(Talent::Ban) {
            engine.ban_items();
        }
        if config.mode == Mode::Pve {
            engine.roll_boss(config.boss);
        }

        info!(
            session = %engine.state.session.id,
            mode = ?config.mode,
            ?talent,
            ?pact,
            twisted = config.twisted,
            boss = ?engine.state.modifiers.boss.map(|b| b.kind),
            "Session started"
        );

        engine.start_round(RoundEntry::Fresh);
        Ok(engine)
    }

    fn from_parts(state: GameState, tables: RuleTables, timings: Timings, rng: R) -> Self {
        Self {
            state,
            tables,
            timings,
            rng,
            scheduler: Scheduler::default(),
            events: Vec::new(),
            input: None,
            interaction: Interaction::None,
            intro_pending: false,
        }
    }

    /// Resume a saved session. The tables and timings come from `config`;
    /// session setup fields are ignored.
    pub fn resume(snapshot: Snapshot, config: EngineConfig, rng: R) -> Result<Self, PersistError> {
        snapshot.validate()?;
        config.tables.validate()?;
        Ok(Self::resumed(snapshot, config, rng))
    }

    /// Resume from a load result, or start fresh if the save is unusable.
    ///
    /// A discarded save is reported through a `SnapshotDiscarded` event.
    pub fn resume_or_new(
        saved: Result<Snapshot, PersistError>,
        config: EngineConfig,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.tables.validate()?;
        match saved.and_then(|s| s.validate().map(|()| s)) {
            Ok(snapshot) => Ok(Self::resumed(snapshot, config, rng)),
            Err(err) => Self::fresh_after_discard(err, config, rng),
        }
    }

    fn resumed(snapshot: Snapshot, config: EngineConfig, rng: R) -> Self {
        let mut engine = Self::from_parts(snapshot.state, config.tables, config.timings, rng);
        info!(session = %engine.state.session.id, "Session resumed");
        engine.hand_off_control();
        engine
    }

    fn fresh_after_discard(
        err: PersistError,
        config: EngineConfig,
        rng: R,
    ) -> Result<Self, ConfigError> {
        warn!(error = %err, "Discarding saved session");
        let mut engine = Self::new(config, rng)?;
        engine.emit(EngineEvent::SnapshotDiscarded {
            reason: err.to_string(),
        });
        Ok(engine)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    /// Logical time in milliseconds.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    /// An action is mid-resolution and input is held back.
    pub fn is_locked(&self) -> bool {
        self.input.is_none() && !self.scheduler.is_empty()
    }

    pub fn awaiting(&self) -> Awaiting {
        if self.state.session.is_over() {
            return Awaiting::Finished;
        }
        match self.interaction {
            Interaction::MirrorSelection { seat } => Awaiting::MirrorSelection(seat),
            Interaction::SicBo => Awaiting::SicBoBet,
            Interaction::RewardSelection => Awaiting::RewardChoice,
            Interaction::None => match self.input {
                Some(seat) => Awaiting::Input(seat),
                None if !self.scheduler.is_empty() => Awaiting::Scheduled,
                None => Awaiting::Idle,
            },
        }
    }

    /// Take every notification emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// What `seat` can see when deciding its next move.
    pub fn ai_view(&self, seat: SeatId) -> AiView {
        let me = self.state.seat(seat);
        let foe = self.state.seat(seat.other());
        AiView {
            style: self.state.modifiers.boss_style(),
            hp: me.hp,
            max_hp: me.max_hp,
            foe_hp: foe.hp,
            inventory: me.inventory.clone(),
            foe_item_count: foe.inventory.total(),
            live_probability: self.state.magazine.live_probability(seat),
            next_known: self.state.magazine.next_knowledge(seat).shell(),
            damage_multiplier: self.state.round.damage_multiplier,
            foe_cuffed: self.state.round.cuffed == Some(seat.other()),
            russian_roulette: self.state.session.russian_roulette,
        }
    }

    /// Whether `seat` is denied the shot history track this round.
    ///
    /// Fog hides it from everyone; the Poker talent hides it from the opponent.
    pub fn history_hidden(&self, seat: SeatId) -> bool {
        self.state.modifiers.event.hides_history()
            || (seat == SeatId::Opponent && self.state.modifiers.has_talent(Talent::Poker))
    }

    /// A save of the current state, if saving is allowed right now.
    ///
    /// Saving is refused mid-resolution, during a pending selection, and once
    /// either seat is out of lives.
    pub fn snapshot(&self) -> Option<Snapshot> {
        if self.state.session.is_over() || self.interaction != Interaction::None {
            return None;
        }
        if SeatId::BOTH.iter().any(|s| self.state.seat(*s).lives == 0) {
            return None;
        }
        let settled = self.input.is_some()
            || (!self.scheduler.is_empty() && self.scheduler.only_ai_pending());
        if !settled {
            return None;
        }
        Some(Snapshot::new(self.state.clone()))
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Pull the trigger.
    pub fn fire(&mut self, seat: SeatId, target: Target) -> Result<(), ActionError> {
        self.check_input(seat)?;
        if self.state.session.russian_roulette && target == Target::Enemy {
            return self.reject(ActionError::EnemyTargetForbidden);
        }
        if self.state.magazine.is_empty() {
            return self.reject(ActionError::EmptyMagazine);
        }
        self.input = None;
        self.resolve_fire(seat, target);
        Ok(())
    }

    /// Use one item from `seat`'s inventory.
    pub fn use_item(&mut self, seat: SeatId, item: ItemKind) -> Result<(), ActionError> {
        self.check_input(seat)?;
        if self.state.session.russian_roulette {
            return self.reject(ActionError::RussianRoulette);
        }
        if !self.state.seat(seat).inventory.has(item) {
            return self.reject(ActionError::NoSuchItem(item));
        }
        self.input = None;
        self.resolve_item(seat, item);
        Ok(())
    }

    /// Finish a Mirror by taking one of the other seat's items.
    pub fn steal_with_mirror(&mut self, seat: SeatId, item: ItemKind) -> Result<(), ActionError> {
        if self.interaction != (Interaction::MirrorSelection { seat }) {
            return self.reject(ActionError::WrongPhase);
        }
        if !self.state.seat(seat.other()).inventory.has(item) {
            return self.reject(ActionError::NothingToSelect);
        }
        self.interaction = Interaction::None;
        self.complete_mirror(seat, item);
        Ok(())
    }

    /// Back out of a Mirror selection; the Mirror is refunded.
    pub fn cancel_mirror(&mut self, seat: SeatId) -> Result<(), ActionError> {
        if self.interaction != (Interaction::MirrorSelection { seat }) {
            return self.reject(ActionError::WrongPhase);
        }
        self.interaction = Interaction::None;
        self.refund_mirror(seat);
        Ok(())
    }

    /// Place the Sic Bo wager that decides the Gambler's resurrection.
    pub fn bet_sic_bo(&mut self, bet: SicBoBet) -> Result<SicBoRoll, ActionError> {
        if self.interaction != Interaction::SicBo {
            return self.reject(ActionError::WrongPhase);
        }
        self.interaction = Interaction::None;
        Ok(self.resolve_sic_bo(bet))
    }

    /// Pick a reward after beating a boss; the next boss follows.
    pub fn choose_reward(&mut self, reward: Reward) -> Result<(), ActionError> {
        if self.interaction != Interaction::RewardSelection {
            return self.reject(ActionError::WrongPhase);
        }
        self.interaction = Interaction::None;
        self.apply_reward(reward);
        Ok(())
    }

    /// The player forfeits the session.
    pub fn give_up(&mut self) -> Result<(), ActionError> {
        if self.state.session.is_over() {
            return self.reject(ActionError::SessionOver);
        }
        info!("Player gave up");
        self.give_up_session();
        Ok(())
    }

    /// Leave the table. Pending continuations are dropped and the session
    /// is closed without an outcome.
    pub fn abandon(&mut self) {
        self.scheduler.cancel_all();
        self.input = None;
        self.interaction = Interaction::None;
        self.state.session.abandoned = true;
        info!(session = %self.state.session.id, "Session abandoned");
    }

    // ========================================================================
    // Driving continuations
    // ========================================================================

    /// Move the logical clock forward, running every task that comes due.
    /// Returns the number of tasks run.
    pub fn advance(&mut self, ms: u64) -> usize {
        let limit = self.scheduler.now() + ms;
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(limit) {
            self.run_task(task);
            ran += 1;
        }
        self.scheduler.advance_to(limit);
        ran
    }

    /// Jump straight to the next task and run it.
    pub fn run_next(&mut self) -> bool {
        match self.scheduler.pop_next() {
            Some(task) => {
                self.run_task(task);
                true
            }
            None => false,
        }
    }

    /// Run queued tasks until a decision is needed, up to `max_steps`.
    pub fn run_until_idle(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && self.awaiting() == Awaiting::Scheduled {
            if !self.run_next() {
                break;
            }
            steps += 1;
        }
        steps
    }

    fn run_task(&mut self, task: Task) {
        if self.state.session.is_over() {
            return;
        }
        debug!(?task, now = self.scheduler.now(), "Running task");
        match task {
            Task::StartRound => self.start_round(RoundEntry::Fresh),
            Task::BeginFirstTurn(entry) => self.begin_first_turn(entry),
            Task::ResumeTurn => self.handle_turn_start(),
            Task::AiAct => self.ai_act(),
            Task::AfterEnrage { shooter } => self.finish_enrage(shooter),
        }
    }

    fn ai_act(&mut self) {
        let seat = self.state.round.current_turn;
        if !self.state.is_ai(seat)
            || self.state.magazine.is_empty()
            || self.state.seat(seat).is_down()
        {
            return;
        }
        let action = ai::choose_action(&self.ai_view(seat));
        debug!(?seat, ?action, "AI decided");
        match action {
            AiAction::Fire(target) => self.resolve_fire(seat, target),
            AiAction::UseItem(item)
                if self.state.seat(seat).inventory.has(item)
                    && !self.state.session.russian_roulette =>
            {
                self.resolve_item(seat, item)
            }
            AiAction::UseItem(_) => {
                let target = ai::default_target(self.state.magazine.live_probability(seat));
                self.resolve_fire(seat, target);
            }
        }
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    fn check_input(&self, seat: SeatId) -> Result<(), ActionError> {
        if self.state.session.is_over() {
            return self.reject(ActionError::SessionOver);
        }
        if self.interaction != Interaction::None {
            return self.reject(ActionError::WrongPhase);
        }
        match self.input {
            Some(current) if current == seat => Ok(()),
            Some(_) => self.reject(ActionError::NotYourTurn(seat)),
            None if self.scheduler.is_empty() => self.reject(ActionError::InputDisabled),
            None => self.reject(ActionError::Locked),
        }
    }

    fn reject<T>(&self, err: ActionError) -> Result<T, ActionError> {
        debug!(error = %err, "Rejected action");
        Err(err)
    }

    pub(crate) fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub(crate) fn status(&mut self, seat: SeatId, change: StatusChange) {
        self.emit(EngineEvent::Status { seat, change });
    }

    /// Record a milestone the first time it happens this session.
    pub(crate) fn milestone(&mut self, milestone: Milestone) {
        if self.state.session.milestones.insert(milestone) {
            self.emit(EngineEvent::MilestoneReached { milestone });
        }
    }

    pub(crate) fn schedule(&mut self, delay_ms: u64, task: Task) {
        self.scheduler.schedule(delay_ms, task);
    }

    /// Give the current seat control: input for humans, a think delay for the AI.
    pub(crate) fn hand_off_control(&mut self) {
        let seat = self.state.round.current_turn;
        if self.state.is_ai(seat) {
            self.input = None;
            self.schedule(self.timings.ai_think_ms, Task::AiAct);
        } else {
            self.input = Some(seat);
        }
    }

    /// Put a boss at the table: archetype, loadout, fresh lives and HP.
    pub(crate) fn roll_boss(&mut self, fixed: Option<BossKind>) {
        let archetype = match fixed.and_then(|kind| self.tables.boss(kind)) {
            Some(archetype) => archetype.clone(),
            None => {
                let i = self.rng.below(self.tables.bosses.len());
                match self.tables.bosses.get(i) {
                    Some(archetype) => archetype.clone(),
                    None => return,
                }
            }
        };

        self.state.modifiers.boss = Some(Boss {
            kind: archetype.kind,
            style: archetype.style,
            phase: BossPhase::Normal,
        });

        let level = self.state.session.level as i32;
        let opponent = self.state.seat_mut(SeatId::Opponent);
        opponent.max_hp = BOSS_BASE_HP + level;
        opponent.hp = opponent.max_hp;
        opponent.lives = crate::catalog::STARTING_LIVES;
        opponent.status.clear_round();
        opponent.inventory.clear();
        for entry in &archetype.loadout {
            for _ in 0..entry.count {
                opponent.inventory.add(entry.item);
            }
        }
        info!(boss = ?archetype.kind, style = ?archetype.style, "Boss rolled");
    }

    /// Talent "ban": two random kinds leave the loot pool for the session.
    fn ban_items(&mut self) {
        let mut pool = self.tables.loot_pool(self.state.session.mode, &[]);
        let mut banned = Vec::new();
        for _ in 0..2 {
            if pool.len() > 2 {
                let i = self.rng.below(pool.len());
                banned.push(pool.remove(i));
            }
        }
        info!(?banned, "Items banned");
        self.state.session.banned_items = banned.clone();
        self.emit(EngineEvent::ItemsBanned { items: banned });
    }
}
