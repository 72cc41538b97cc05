//! Speed-driven turn scheduling.
//!
//! Every living unit owns one recurring [`TurnKind::UnitTurn`] entry whose
//! timer charges by the unit's speed rating each scheduler tick and fires at
//! [`READY_THRESHOLD`]. Delayed ability casts add one-shot
//! [`TurnKind::CombatAction`] entries that charge at the caster's speed and
//! fire at their own threshold.
//!
//! The queue is kept in priority order after every mutation: ready entries
//! first, then by descending timer, then by descending speed. The current
//! turn is always the head of the queue.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GameError, Result};
use crate::grid::Coord;
use crate::unit::UnitId;

/// Timer value at which a unit's turn comes up. Also the timer cap applied
/// when a turn ends.
pub const READY_THRESHOLD: u32 = 100;

/// What a scheduled entry does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnKind {
    /// The owner's recurring turn.
    UnitTurn,
    /// A queued ability cast; fires once and is discarded.
    CombatAction {
        /// Cell the ability resolves on.
        target: Coord,
        /// Ability slot on the caster.
        ability: usize,
        /// Timer value at which the cast resolves.
        required: u32,
    },
}

/// One entry of the turn queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEntry {
    /// Unit that acts, or casts, when the entry fires.
    pub owner: UnitId,
    /// Accumulated charge.
    pub timer: u32,
    /// Charge gained per tick, the owner's speed rating.
    pub speed: u32,
    /// Recurring turn or one-shot cast.
    pub kind: TurnKind,
}

impl TurnEntry {
    /// Timer value at which this entry fires.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        match self.kind {
            TurnKind::UnitTurn => READY_THRESHOLD,
            TurnKind::CombatAction { required, .. } => required,
        }
    }

    /// Charged enough to fire.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.timer >= self.threshold()
    }

    /// True for one-shot cast entries.
    #[must_use]
    pub const fn is_combat_action(&self) -> bool {
        matches!(self.kind, TurnKind::CombatAction { .. })
    }
}

/// Ordered queue of pending turns and casts.
///
/// Order is ready entries first, then descending timer, then descending
/// speed, then insertion order. A cast with a low threshold that has
/// charged therefore goes ahead of a unit with a higher timer that is
/// still short of [`READY_THRESHOLD`], so the head is always an entry
/// that can fire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnScheduler {
    entries: Vec<TurnEntry>,
    /// The head entry is the current turn.
    active: bool,
    /// Synchronized ticks run so far.
    ticks: u64,
}

impl TurnScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the queue with one full turn per unit, fastest first.
    ///
    /// Units of equal speed keep the order they were given in. The head
    /// becomes the current turn.
    pub fn initialize<I>(&mut self, units: I) -> Result<()>
    where
        I: IntoIterator<Item = (UnitId, u32)>,
    {
        let mut entries = Vec::new();
        for (owner, speed) in units {
            check_speed(owner, speed)?;
            entries.push(TurnEntry {
                owner,
                timer: READY_THRESHOLD,
                speed,
                kind: TurnKind::UnitTurn,
            });
        }
        entries.sort_by(|a, b| b.speed.cmp(&a.speed));

        self.entries = entries;
        self.ticks = 0;
        self.active = !self.entries.is_empty();
        debug!(units = self.entries.len(), "turn order initialized");
        Ok(())
    }

    /// Add a recurring turn for a unit that joined mid-battle.
    ///
    /// With `start_full` the unit is ready at the next selection, otherwise
    /// it starts charging from zero. The current turn is not disturbed.
    pub fn add_unit_turn(&mut self, owner: UnitId, speed: u32, start_full: bool) -> Result<()> {
        check_speed(owner, speed)?;
        let timer = if start_full { READY_THRESHOLD } else { 0 };
        self.insert(TurnEntry {
            owner,
            timer,
            speed,
            kind: TurnKind::UnitTurn,
        });
        Ok(())
    }

    /// Queue a delayed cast that resolves once it has charged to `delay`.
    ///
    /// The entry starts at timer 0 and charges at the caster's `speed`.
    pub fn enqueue_combat_action(
        &mut self,
        owner: UnitId,
        speed: u32,
        target: Coord,
        ability: usize,
        delay: u32,
    ) -> Result<()> {
        check_speed(owner, speed)?;
        self.insert(TurnEntry {
            owner,
            timer: 0,
            speed,
            kind: TurnKind::CombatAction {
                target,
                ability,
                required: delay,
            },
        });
        debug!(unit = %owner, %target, ability, delay, "combat action queued");
        Ok(())
    }

    fn insert(&mut self, entry: TurnEntry) {
        self.entries.push(entry);
        // The head stays put while it is the current turn.
        let fixed = usize::from(self.active);
        sort_queue(&mut self.entries[fixed..]);
    }

    /// The current turn, if one is selected.
    #[must_use]
    pub fn current(&self) -> Option<&TurnEntry> {
        if self.active {
            self.entries.first()
        } else {
            None
        }
    }

    /// End the current unit turn, spending `consumed` timer.
    ///
    /// The timer is capped at [`READY_THRESHOLD`] before the cost is
    /// subtracted, so overshoot from charging is not carried over. The entry
    /// moves to the back of the queue and the next turn is selected.
    pub fn advance(&mut self, consumed: u32) -> Result<TurnEntry> {
        let head = self.take_current()?;
        if head.is_combat_action() {
            self.entries.insert(0, head);
            self.active = true;
            return Err(GameError::InvalidState(
                "advance called on a combat action; use consume_one_shot".into(),
            ));
        }

        let mut entry = head;
        entry.timer = entry.timer.min(READY_THRESHOLD).saturating_sub(consumed);
        debug!(unit = %entry.owner, consumed, timer = entry.timer, "turn ended");
        self.entries.push(entry);
        self.normalize();
        Ok(entry)
    }

    /// Discard the current combat action entry and select the next turn.
    pub fn consume_one_shot(&mut self) -> Result<TurnEntry> {
        let head = self.take_current()?;
        if !head.is_combat_action() {
            self.entries.insert(0, head);
            self.active = true;
            return Err(GameError::InvalidState(
                "consume_one_shot called on a unit turn; use advance".into(),
            ));
        }
        self.normalize();
        Ok(head)
    }

    fn take_current(&mut self) -> Result<TurnEntry> {
        if !self.active || self.entries.is_empty() {
            return Err(GameError::NoActiveTurn);
        }
        self.active = false;
        Ok(self.entries.remove(0))
    }

    /// Delete every entry owned by `unit`, including its queued casts.
    ///
    /// If the current turn belonged to the unit there is no current turn
    /// until the next [`normalize`](Self::normalize). Returns the number of
    /// entries removed.
    pub fn remove_unit(&mut self, unit: UnitId) -> usize {
        if self.current().is_some_and(|entry| entry.owner == unit) {
            self.active = false;
        }
        let before = self.entries.len();
        self.entries.retain(|entry| entry.owner != unit);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(unit = %unit, removed, "turn entries removed");
        }
        removed
    }

    /// Select a current turn if none is selected.
    ///
    /// If any entry is already ready (not only the head) the queue is
    /// reordered and the first ready entry becomes current. Otherwise every entry charges by its speed, one
    /// synchronized tick at a time, until at least one entry is ready.
    /// Ticking never caps timers, so slow entries may overshoot the
    /// threshold. Returns `None` only for an empty queue.
    pub fn normalize(&mut self) -> Option<&TurnEntry> {
        if self.entries.is_empty() {
            self.active = false;
            return None;
        }
        if !self.active {
            let mut ticks = 0u64;
            while !self.entries.iter().any(TurnEntry::is_ready) {
                for entry in &mut self.entries {
                    entry.timer = entry.timer.saturating_add(entry.speed);
                }
                ticks += 1;
            }
            self.ticks += ticks;
            sort_queue(&mut self.entries);
            self.active = true;
            if let Some(head) = self.entries.first() {
                debug!(unit = %head.owner, timer = head.timer, ticks, cast = head.is_combat_action(), "turn selected");
            }
        }
        self.entries.first()
    }

    /// Queue contents in order; the head is the current turn when one is selected.
    #[must_use]
    pub fn entries(&self) -> &[TurnEntry] {
        &self.entries
    }

    /// True if any entry belongs to `unit`.
    #[must_use]
    pub fn contains_unit(&self, unit: UnitId) -> bool {
        self.entries.iter().any(|entry| entry.owner == unit)
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total synchronized ticks run since initialization.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn check_speed(owner: UnitId, speed: u32) -> Result<()> {
    if speed == 0 {
        return Err(GameError::InvalidStat {
            unit: owner,
            message: "speed_rating must be positive".into(),
        });
    }
    Ok(())
}

/// Ready entries first, then descending timer, then descending speed. Stable.
fn sort_queue(entries: &mut [TurnEntry]) {
    entries.sort_by(|a, b| {
        b.is_ready()
            .cmp(&a.is_ready())
            .then(b.timer.cmp(&a.timer))
            .then(b.speed.cmp(&a.speed))
    });
}
