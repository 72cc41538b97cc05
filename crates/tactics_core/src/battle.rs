//! Battle orchestration.
//!
//! [`Battle`] owns the grid, the roster, the turn scheduler and the AI
//! engine. It takes commands from the presentation layer and reports back
//! through [`BattleEvent`]s collected in an outbox the caller drains.
//!
//! Movement is paced from outside. When a unit starts walking the battle
//! emits [`BattleEvent::MovementStarted`], updates occupancy right away and
//! then waits for [`Battle::report_movement_complete`]. AI turns and queued
//! casts run synchronously until the battle needs input again.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::{self, AiAction, AiDecisionEngine};
use crate::combat::{self, CombatEffect};
use crate::error::{GameError, Result};
use crate::grid::{Coord, Grid};
use crate::pathfinding::{find_path, find_range, RangeOptions};
use crate::scenario::{BattleConfig, ScenarioData};
use crate::scheduler::{TurnKind, TurnScheduler};
use crate::unit::{Controller, FactionId, HealthChange, Roster, Unit, UnitId};

/// What a range preview is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePurpose {
    /// Cells the unit can walk to.
    Movement,
    /// Cells a basic attack can reach.
    Attack,
    /// Cells an ability can be aimed at.
    Ability {
        /// Ability slot.
        slot: usize,
    },
}

/// Notifications for the presentation layer, in the order things happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    /// A unit's turn began.
    TurnStarted {
        /// Acting unit.
        unit: UnitId,
        /// Unit turns taken so far, this one included.
        turn: u32,
    },
    /// A unit's turn ended.
    TurnEnded {
        /// Unit whose turn ended.
        unit: UnitId,
        /// Timer spent.
        cost: u32,
    },
    /// Show a planned route.
    PathVisualization {
        /// Unit the route is for.
        unit: UnitId,
        /// Cells in walking order, start excluded.
        path: Vec<Coord>,
    },
    /// Highlight a set of cells.
    RangeVisualization {
        /// Unit the range belongs to.
        unit: UnitId,
        /// What the range is for.
        purpose: RangePurpose,
        /// Highlighted cells.
        cells: Vec<Coord>,
    },
    /// Animate a unit along a path, then call
    /// [`Battle::report_movement_complete`].
    MovementStarted {
        /// Walking unit.
        unit: UnitId,
        /// Cell it leaves.
        from: Coord,
        /// Cells in walking order, start excluded.
        path: Vec<Coord>,
    },
    /// Stop animating a unit that died while walking.
    MovementHalted {
        /// Unit that was walking.
        unit: UnitId,
    },
    /// A basic attack was made.
    Attacked {
        /// Attacking unit.
        attacker: UnitId,
        /// Cell attacked.
        cell: Coord,
        /// Unit standing there, if any.
        target: Option<UnitId>,
    },
    /// A cast was queued and resolves later.
    AbilityQueued {
        /// Casting unit.
        caster: UnitId,
        /// Ability slot.
        ability: usize,
        /// Target cell.
        cell: Coord,
        /// Timer the cast needs to charge.
        delay: u32,
    },
    /// A cast took effect.
    AbilityResolved {
        /// Casting unit.
        caster: UnitId,
        /// Ability slot.
        ability: usize,
        /// Target cell.
        cell: Coord,
    },
    /// A unit lost health.
    UnitDamaged {
        /// Damaged unit.
        unit: UnitId,
        /// Health lost.
        amount: u32,
        /// Health left.
        remaining: u32,
    },
    /// A unit gained health.
    UnitHealed {
        /// Healed unit.
        unit: UnitId,
        /// Health gained.
        amount: u32,
        /// Health after healing.
        remaining: u32,
    },
    /// A unit's attack power went up.
    UnitEmpowered {
        /// Buffed unit.
        unit: UnitId,
        /// Attack power gained.
        amount: u32,
        /// New attack power.
        attack_power: u32,
    },
    /// A unit died and left the battle.
    UnitDied {
        /// Dead unit.
        unit: UnitId,
    },
    /// The battle is over.
    BattleEnded {
        /// Last faction standing; `None` for a draw.
        winner: Option<FactionId>,
        /// Unit turns played.
        turns: u32,
    },
}

/// What the battle is doing, or waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Units can be added; the turn cycle has not started.
    Setup,
    /// Between turns.
    Ready,
    /// An AI-driven unit is working through its plan.
    AiActing(UnitId),
    /// Waiting for a command for this player unit.
    AwaitingPlayer(UnitId),
    /// Waiting for this unit's movement to finish.
    AwaitingMovement(UnitId),
    /// The battle is over.
    Finished {
        /// Last faction standing; `None` for a draw.
        winner: Option<FactionId>,
    },
}

/// A command for the player unit whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Walk to a cell. Ends the turn once movement completes.
    Move {
        /// Destination.
        to: Coord,
    },
    /// Basic attack on a cell.
    Attack {
        /// Attacked cell.
        target: Coord,
    },
    /// Cast an ability on a cell.
    Cast {
        /// Ability slot.
        ability: usize,
        /// Target cell; ignored by self-cast abilities.
        target: Coord,
    },
    /// End the turn now.
    EndTurn,
}

#[derive(Debug, Clone)]
struct ActiveTurn {
    unit: UnitId,
    moved: bool,
    acted: bool,
    plan: VecDeque<AiAction>,
}

impl ActiveTurn {
    fn new(unit: UnitId) -> Self {
        Self {
            unit,
            moved: false,
            acted: false,
            plan: VecDeque::new(),
        }
    }
}

/// A battle in progress.
#[derive(Debug, Clone)]
pub struct Battle {
    grid: Grid,
    roster: Roster,
    scheduler: TurnScheduler,
    ai: AiDecisionEngine,
    config: BattleConfig,
    phase: BattlePhase,
    turn: Option<ActiveTurn>,
    turns_taken: u32,
    events: Vec<BattleEvent>,
}

impl Battle {
    /// Create an empty battle on `grid`.
    #[must_use]
    pub fn new(grid: Grid, config: BattleConfig) -> Self {
        Self {
            grid,
            roster: Roster::new(),
            scheduler: TurnScheduler::new(),
            ai: AiDecisionEngine::new(config.seed),
            config,
            phase: BattlePhase::Setup,
            turn: None,
            turns_taken: 0,
            events: Vec::new(),
        }
    }

    /// Build a battle from scenario data.
    ///
    /// Units placed on a blocked or occupied cell are moved to the closest
    /// free cell.
    pub fn from_scenario(scenario: &ScenarioData) -> Result<Self> {
        scenario.validate()?;
        let mut battle = Self::new(scenario.build_grid()?, scenario.config.clone());
        for data in &scenario.units {
            let mut unit = data.to_unit();
            if !battle.grid.is_free(unit.position) {
                let cell = battle.grid.free_cell_near(unit.position).ok_or_else(|| {
                    GameError::InvalidScenario(format!("no free cell left for unit '{}'", data.name))
                })?;
                warn!(name = %data.name, from = %unit.position, to = %cell, "unit placement blocked, relocating");
                unit.position = cell;
            }
            battle.add_unit(unit)?;
        }
        info!(
            scenario = %scenario.name,
            units = battle.roster.len(),
            width = battle.grid.width(),
            height = battle.grid.height(),
            "battle created"
        );
        Ok(battle)
    }

    /// Add a unit at its position and return its id.
    ///
    /// Units added after the turn cycle started join with an empty timer.
    pub fn add_unit(&mut self, unit: Unit) -> Result<UnitId> {
        if self.is_finished() {
            return Err(GameError::BattleOver);
        }
        let id = self.roster.next_id();
        unit.stats.validate(id)?;
        if !unit.is_alive() {
            return Err(GameError::InvalidStat {
                unit: id,
                message: "current_health must be positive".into(),
            });
        }
        let cell = self.grid.cell_at(unit.position)?;
        if !cell.walkable {
            return Err(GameError::CellBlocked(unit.position));
        }
        if cell.occupant.is_some() {
            return Err(GameError::CellOccupied(unit.position));
        }

        let position = unit.position;
        let speed = unit.stats.speed_rating;
        let id = self.roster.insert(unit);
        self.grid.place_unit(id, position)?;
        if self.phase != BattlePhase::Setup {
            self.scheduler.add_unit_turn(id, speed, false)?;
        }
        debug!(unit = %id, %position, speed, "unit added");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Inbound calls
    // ------------------------------------------------------------------

    /// Start the turn cycle with every living unit and run until input is
    /// needed.
    pub fn start_turn_cycle(&mut self) -> Result<()> {
        if self.phase != BattlePhase::Setup {
            return Err(GameError::WrongPhase("turn cycle already started"));
        }
        self.scheduler
            .initialize(self.roster.alive().map(|unit| (unit.id, unit.stats.speed_rating)))?;
        info!(units = self.scheduler.len(), seed = self.config.seed, "turn cycle started");
        self.phase = BattlePhase::Ready;
        self.run()
    }

    /// The walking unit arrived. Player units end their turn here, AI
    /// units carry on with their plan.
    pub fn report_movement_complete(&mut self) -> Result<()> {
        let unit = match self.phase {
            BattlePhase::AwaitingMovement(unit) => unit,
            BattlePhase::Finished { .. } => return Err(GameError::BattleOver),
            _ => return Err(GameError::WrongPhase("no movement in progress")),
        };
        if let Some(turn) = self.turn.as_mut() {
            turn.moved = true;
        }
        debug!(unit = %unit, "movement complete");
        if self.is_ai_driven(unit) {
            self.phase = BattlePhase::AiActing(unit);
        } else {
            self.end_turn()?;
        }
        self.run()
    }

    /// Carry out a command for the current player unit.
    pub fn player_chosen_action(&mut self, action: PlayerAction) -> Result<()> {
        let unit = self.awaiting_player()?;
        match action {
            PlayerAction::Move { to } => self.start_move(unit, to)?,
            PlayerAction::Attack { target } => {
                self.attack(unit, target)?;
                self.check_turn_status(unit)?;
            }
            PlayerAction::Cast { ability, target } => {
                self.begin_cast(unit, ability, target)?;
                self.check_turn_status(unit)?;
            }
            PlayerAction::EndTurn => self.end_turn()?,
        }
        self.run()
    }

    /// An ability was triggered by `caster` on `target_cell`.
    pub fn ability_invoked(&mut self, caster: UnitId, target_cell: Coord, ability: usize) -> Result<()> {
        let unit = self.awaiting_player()?;
        if unit != caster {
            return Err(GameError::NotYourTurn(caster));
        }
        self.begin_cast(caster, ability, target_cell)?;
        self.check_turn_status(caster)?;
        self.run()
    }

    /// Apply a health change from outside the turn flow, such as a
    /// scripted hazard. Positive amounts damage, negative amounts heal.
    pub fn apply_external_health_change(&mut self, unit: UnitId, amount: i32) -> Result<Option<CombatEffect>> {
        if self.is_finished() {
            return Err(GameError::BattleOver);
        }
        self.roster.living(unit)?;
        let effect = combat::apply_health_change(&mut self.roster, unit, amount);
        if let Some(effect) = effect {
            self.apply_effects(&[effect]);
        }
        self.run()?;
        Ok(effect)
    }

    /// Drive the battle to its end, completing every movement at once.
    ///
    /// Fails if a player unit needs a command; set
    /// [`BattleConfig::autoplay_players`] to let the AI play them.
    pub fn play_out(&mut self) -> Result<Option<FactionId>> {
        if self.phase == BattlePhase::Setup {
            self.start_turn_cycle()?;
        }
        loop {
            match self.phase {
                BattlePhase::Finished { winner } => return Ok(winner),
                BattlePhase::AwaitingMovement(_) => self.report_movement_complete()?,
                BattlePhase::AwaitingPlayer(_) => {
                    return Err(GameError::WrongPhase("battle is waiting for player input"));
                }
                _ => self.run()?,
            }
        }
    }

    // ------------------------------------------------------------------
    // Previews
    // ------------------------------------------------------------------

    /// Cells `unit` can walk to this turn. Emits a range visualization.
    pub fn movement_range(&mut self, unit: UnitId) -> Result<Vec<Coord>> {
        let cells = ai::movement_range(&self.grid, self.roster.living(unit)?)?;
        self.show_range(unit, RangePurpose::Movement, &cells);
        Ok(cells)
    }

    /// Cells a basic attack from `unit` can reach. Emits a range visualization.
    pub fn attack_targets(&mut self, unit: UnitId) -> Result<Vec<Coord>> {
        let actor = self.roster.living(unit)?;
        let options = RangeOptions {
            allow_occupied: true,
            ..RangeOptions::default()
        };
        let cells = find_range(&self.grid, actor.position, actor.stats.attack_range as i32, options)?;
        self.show_range(unit, RangePurpose::Attack, &cells);
        Ok(cells)
    }

    /// Cells the ability in `slot` can be aimed at. Emits a range
    /// visualization.
    pub fn ability_targets(&mut self, unit: UnitId, slot: usize) -> Result<Vec<Coord>> {
        let actor = self.roster.living(unit)?;
        let ability = actor.ability(slot)?;
        let range = if ability.is_self_cast() { 0 } else { ability.range };
        let cells = find_range(
            &self.grid,
            actor.position,
            range as i32,
            RangeOptions::targeting(ability.requires_target),
        )?;
        self.show_range(unit, RangePurpose::Ability { slot }, &cells);
        Ok(cells)
    }

    /// Route `unit` would walk to reach `to`. Emits a path visualization.
    pub fn preview_path(&mut self, unit: UnitId, to: Coord) -> Result<Vec<Coord>> {
        let actor = self.roster.living(unit)?;
        let path = find_path(&self.grid, actor.position, to, actor.stats.can_move_diagonally, false)?;
        self.events.push(BattleEvent::PathVisualization {
            unit,
            path: path.clone(),
        });
        Ok(path)
    }

    fn show_range(&mut self, unit: UnitId, purpose: RangePurpose, cells: &[Coord]) {
        self.events.push(BattleEvent::RangeVisualization {
            unit,
            purpose,
            cells: cells.to_vec(),
        });
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The map.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Every unit, dead or alive.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The turn queue.
    #[must_use]
    pub const fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    /// Battle settings.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Unit whose turn it is, if a unit turn is running.
    #[must_use]
    pub fn current_unit(&self) -> Option<UnitId> {
        self.turn.as_ref().map(|turn| turn.unit)
    }

    /// Unit turns started so far.
    #[must_use]
    pub const fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    /// True once the battle has ended.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, BattlePhase::Finished { .. })
    }

    /// Events not yet drained.
    #[must_use]
    pub fn pending_events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Take every pending event.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Turn flow
    // ------------------------------------------------------------------

    /// Process turns until input is needed or the battle ends.
    fn run(&mut self) -> Result<()> {
        loop {
            match self.phase {
                BattlePhase::Ready => self.begin_next_turn()?,
                BattlePhase::AiActing(unit) => self.step_ai(unit)?,
                _ => return Ok(()),
            }
        }
    }

    fn begin_next_turn(&mut self) -> Result<()> {
        if self.check_battle_end() {
            return Ok(());
        }
        let Some(entry) = self.scheduler.normalize().copied() else {
            self.finish(None);
            return Ok(());
        };

        match entry.kind {
            TurnKind::CombatAction { target, ability, .. } => self.resolve_queued_cast(entry.owner, ability, target),
            TurnKind::UnitTurn => {
                if self.turns_taken >= self.config.max_turns {
                    info!(max_turns = self.config.max_turns, "turn limit reached");
                    self.finish(None);
                    return Ok(());
                }
                self.turns_taken += 1;
                let unit = entry.owner;
                let mut turn = ActiveTurn::new(unit);
                self.events.push(BattleEvent::TurnStarted {
                    unit,
                    turn: self.turns_taken,
                });

                if self.is_ai_driven(unit) {
                    let plan = self.ai.decide(&self.grid, &self.roster, unit)?;
                    turn.plan.extend(plan.steps().iter().copied());
                    self.phase = BattlePhase::AiActing(unit);
                } else {
                    self.phase = BattlePhase::AwaitingPlayer(unit);
                }
                debug!(unit = %unit, turn = self.turns_taken, phase = ?self.phase, "turn started");
                self.turn = Some(turn);
                Ok(())
            }
        }
    }

    fn step_ai(&mut self, unit: UnitId) -> Result<()> {
        let Some(step) = self.turn.as_mut().and_then(|turn| turn.plan.pop_front()) else {
            return self.end_turn();
        };
        let outcome = match step {
            AiAction::Move { to } => self.start_move(unit, to),
            AiAction::Attack { cell, .. } => self.attack(unit, cell),
            AiAction::Cast { ability, cell, .. } => self.begin_cast(unit, ability, cell),
        };
        if let Err(err) = outcome {
            warn!(unit = %unit, ?step, %err, "AI step rejected");
        }
        Ok(())
    }

    /// Player turns end on their own once the unit has moved and acted.
    fn check_turn_status(&mut self, unit: UnitId) -> Result<()> {
        if self.phase != BattlePhase::AwaitingPlayer(unit) {
            return Ok(());
        }
        if self.turn.as_ref().is_some_and(|turn| turn.moved && turn.acted) {
            self.end_turn()?;
        }
        Ok(())
    }

    fn end_turn(&mut self) -> Result<()> {
        let turn = self.turn.take().ok_or(GameError::NoActiveTurn)?;
        let cost = self.config.turn_costs.cost(turn.moved, turn.acted);
        self.scheduler.advance(cost)?;
        self.events.push(BattleEvent::TurnEnded { unit: turn.unit, cost });
        self.phase = BattlePhase::Ready;
        Ok(())
    }

    fn awaiting_player(&self) -> Result<UnitId> {
        match self.phase {
            BattlePhase::AwaitingPlayer(unit) => Ok(unit),
            BattlePhase::Finished { .. } => Err(GameError::BattleOver),
            BattlePhase::AwaitingMovement(_) => Err(GameError::WrongPhase("movement in progress")),
            _ => Err(GameError::WrongPhase("not waiting for a player command")),
        }
    }

    fn is_ai_driven(&self, unit: UnitId) -> bool {
        self.config.autoplay_players
            || self
                .roster
                .get(unit)
                .map_or(true, |unit| unit.controller == Controller::Ai)
    }

    fn active_turn(&self, unit: UnitId) -> Result<&ActiveTurn> {
        match self.turn.as_ref() {
            Some(turn) if turn.unit == unit => Ok(turn),
            Some(_) => Err(GameError::NotYourTurn(unit)),
            None => Err(GameError::NoActiveTurn),
        }
    }

    fn mark_acted(&mut self) {
        if let Some(turn) = self.turn.as_mut() {
            turn.acted = true;
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn start_move(&mut self, unit: UnitId, to: Coord) -> Result<()> {
        if self.active_turn(unit)?.moved {
            return Err(GameError::AlreadyMoved(unit));
        }
        let actor = self.roster.living(unit)?;
        let from = actor.position;
        let cell = self.grid.cell_at(to)?;
        if !cell.walkable {
            return Err(GameError::CellBlocked(to));
        }
        if cell.occupant.is_some() {
            return Err(GameError::CellOccupied(to));
        }
        // Range membership, not path cost, decides what is in reach.
        if !ai::movement_range(&self.grid, actor)?.contains(&to) {
            return Err(GameError::NoPath { from, to });
        }
        let path = find_path(&self.grid, from, to, actor.stats.can_move_diagonally, false)?;
        if path.is_empty() {
            return Err(GameError::NoPath { from, to });
        }

        self.grid.move_unit(from, to)?;
        if let Some(actor) = self.roster.get_mut(unit) {
            actor.position = to;
        }
        debug!(unit = %unit, %from, %to, steps = path.len(), "movement started");
        self.events.push(BattleEvent::MovementStarted { unit, from, path });
        self.phase = BattlePhase::AwaitingMovement(unit);
        Ok(())
    }

    fn attack(&mut self, unit: UnitId, cell: Coord) -> Result<()> {
        if self.active_turn(unit)?.acted {
            return Err(GameError::AlreadyActed(unit));
        }
        let actor = self.roster.living(unit)?;
        let range = actor.stats.attack_range;
        let distance = actor.position.manhattan_distance(cell);
        if distance == 0 || distance > range {
            return Err(GameError::OutOfRange {
                target: cell,
                distance,
                range,
            });
        }
        let target = self.grid.cell_at(cell)?.occupant;
        let effects = combat::apply_attack(&self.grid, &mut self.roster, unit, cell)?;
        self.mark_acted();
        self.events.push(BattleEvent::Attacked {
            attacker: unit,
            cell,
            target,
        });
        self.apply_effects(&effects);
        Ok(())
    }

    fn begin_cast(&mut self, unit: UnitId, slot: usize, cell: Coord) -> Result<()> {
        if self.active_turn(unit)?.acted {
            return Err(GameError::AlreadyActed(unit));
        }
        let actor = self.roster.living(unit)?;
        let ability = actor.ability(slot)?.clone();
        let target = if ability.is_self_cast() { actor.position } else { cell };
        self.grid.cell_at(target)?;
        let distance = actor.position.manhattan_distance(target);
        if distance > ability.range {
            return Err(GameError::OutOfRange {
                target,
                distance,
                range: ability.range,
            });
        }
        if !ability.requires_target && target != actor.position && self.grid.occupant(target).is_some() {
            return Err(GameError::CellOccupied(target));
        }
        let speed = actor.stats.speed_rating;

        let cost = combat::pay_ability_cost(&mut self.roster, unit, &ability)?;
        self.mark_acted();
        self.apply_effects(&cost);
        if !self.roster.get(unit).is_some_and(Unit::is_alive) {
            debug!(unit = %unit, ability = %ability.name, "caster died paying for the cast");
            return Ok(());
        }

        if ability.is_instant() {
            let effects = combat::resolve_ability(&self.grid, &mut self.roster, unit, &ability, target)?;
            self.events.push(BattleEvent::AbilityResolved {
                caster: unit,
                ability: slot,
                cell: target,
            });
            self.apply_effects(&effects);
        } else {
            self.scheduler
                .enqueue_combat_action(unit, speed, target, slot, ability.cast_time)?;
            self.events.push(BattleEvent::AbilityQueued {
                caster: unit,
                ability: slot,
                cell: target,
                delay: ability.cast_time,
            });
        }
        Ok(())
    }

    fn resolve_queued_cast(&mut self, caster: UnitId, slot: usize, target: Coord) -> Result<()> {
        self.scheduler.consume_one_shot()?;
        let ability = match self.roster.living(caster).and_then(|unit| unit.ability(slot)) {
            Ok(ability) => ability.clone(),
            Err(err) => {
                warn!(unit = %caster, slot, %err, "queued cast dropped");
                return Ok(());
            }
        };
        let effects = combat::resolve_ability(&self.grid, &mut self.roster, caster, &ability, target)?;
        self.events.push(BattleEvent::AbilityResolved {
            caster,
            ability: slot,
            cell: target,
        });
        self.apply_effects(&effects);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Consequences
    // ------------------------------------------------------------------

    fn apply_effects(&mut self, effects: &[CombatEffect]) {
        for effect in effects {
            match *effect {
                CombatEffect::Health { unit, change } => {
                    let remaining = self.roster.get(unit).map_or(0, |unit| unit.stats.current_health);
                    match change {
                        HealthChange::Damaged(amount) => {
                            self.events.push(BattleEvent::UnitDamaged { unit, amount, remaining });
                        }
                        HealthChange::Killed(amount) => {
                            self.events.push(BattleEvent::UnitDamaged { unit, amount, remaining });
                            self.handle_death(unit);
                        }
                        HealthChange::Healed(amount) => {
                            self.events.push(BattleEvent::UnitHealed { unit, amount, remaining });
                        }
                    }
                }
                CombatEffect::AttackRaised { unit, amount } => {
                    let attack_power = self.roster.get(unit).map_or(0, |unit| unit.stats.attack_power);
                    self.events.push(BattleEvent::UnitEmpowered {
                        unit,
                        amount,
                        attack_power,
                    });
                }
            }
        }
    }

    fn handle_death(&mut self, unit: UnitId) {
        if let Some(position) = self.roster.get(unit).map(|dead| dead.position) {
            if self.grid.occupant(position) == Some(unit) {
                self.grid.clear_cell(position);
            }
        }
        self.scheduler.remove_unit(unit);
        info!(unit = %unit, "unit died");

        if self.turn.as_ref().is_some_and(|turn| turn.unit == unit) {
            if self.phase == BattlePhase::AwaitingMovement(unit) {
                self.events.push(BattleEvent::MovementHalted { unit });
            }
            self.turn = None;
            if !self.is_finished() {
                self.phase = BattlePhase::Ready;
            }
        }
        self.events.push(BattleEvent::UnitDied { unit });
        if self.phase != BattlePhase::Setup {
            self.check_battle_end();
        }
    }

    /// Finish the battle if at most one faction is left standing.
    fn check_battle_end(&mut self) -> bool {
        if self.is_finished() {
            return true;
        }
        let factions = self.roster.living_factions();
        if factions.len() > 1 {
            return false;
        }
        self.finish(factions.into_iter().next());
        true
    }

    fn finish(&mut self, winner: Option<FactionId>) {
        self.phase = BattlePhase::Finished { winner };
        self.turn = None;
        match winner {
            Some(faction) => info!(winner = %faction, turns = self.turns_taken, "battle won"),
            None => info!(turns = self.turns_taken, "battle drawn"),
        }
        self.events.push(BattleEvent::BattleEnded {
            winner,
            turns: self.turns_taken,
        });
    }
}
