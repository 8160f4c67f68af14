//! Authoritative unit state and identifier allocation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use terminal_sim_core::{
    Axis, CellCoord, EdgeDirection, Player, TargetClass, UnitId, UnitKind, UnitStats,
};

/// What an attacker remembers about the previous frame's target search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetMemory {
    /// The unit has not searched for a target yet.
    Unsearched,
    /// The last search found nothing in range.
    Vacant,
    /// The last search selected a target.
    Engaged {
        /// Unit that was selected. It may since have left the board.
        target: UnitId,
        /// Classification of the selected unit.
        class: TargetClass,
        /// Ring distance at which the target was found.
        distance: f32,
    },
}

/// A single unit on the board.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    id: UnitId,
    kind: UnitKind,
    owner: Player,
    cell: CellCoord,
    stability: f32,
    max_stability: f32,
    shields: VecDeque<f32>,
    target_edge: Option<EdgeDirection>,
    last_axis: Axis,
    tiles_moved: u32,
    memory: TargetMemory,
    charged: BTreeSet<UnitId>,
}

impl Unit {
    pub(crate) fn new(
        id: UnitId,
        stats: &UnitStats,
        owner: Player,
        cell: CellCoord,
        target_edge: Option<EdgeDirection>,
        stability: Option<f32>,
    ) -> Self {
        let max_stability = stats.stability();
        Self {
            id,
            kind: stats.kind(),
            owner,
            cell,
            stability: stability
                .filter(|value| value.is_finite())
                .unwrap_or(max_stability),
            max_stability,
            shields: VecDeque::new(),
            target_edge,
            // A fresh unit has "moved horizontally" so its first step prefers
            // the vertical axis.
            last_axis: Axis::Horizontal,
            tiles_moved: 0,
            memory: TargetMemory::Unsearched,
            charged: BTreeSet::new(),
        }
    }

    /// Identifier allocated by the board.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Type of the unit.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Player that owns the unit.
    #[must_use]
    pub const fn owner(&self) -> Player {
        self.owner
    }

    /// Cell the unit occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Hit points excluding shields.
    #[must_use]
    pub const fn stability(&self) -> f32 {
        self.stability
    }

    /// Hit points at full strength.
    #[must_use]
    pub const fn max_stability(&self) -> f32 {
        self.max_stability
    }

    /// Remaining shield charge summed over every charge.
    #[must_use]
    pub fn shield(&self) -> f32 {
        self.shields.iter().sum()
    }

    /// Hit points plus shields. This is what attackers compare.
    #[must_use]
    pub fn effective_stability(&self) -> f32 {
        self.stability + self.shield()
    }

    /// Reports whether the unit is a structure.
    #[must_use]
    pub const fn is_stationary(&self) -> bool {
        self.kind.is_stationary()
    }

    /// Classification used by attackers.
    #[must_use]
    pub const fn class(&self) -> TargetClass {
        self.kind.class()
    }

    /// Edge a mobile unit walks towards. `None` for structures.
    #[must_use]
    pub const fn target_edge(&self) -> Option<EdgeDirection> {
        self.target_edge
    }

    /// Axis of the most recent step.
    #[must_use]
    pub const fn last_axis(&self) -> Axis {
        self.last_axis
    }

    /// Number of steps taken since placement.
    #[must_use]
    pub const fn tiles_moved(&self) -> u32 {
        self.tiles_moved
    }

    /// Outcome of the previous target search.
    #[must_use]
    pub const fn memory(&self) -> TargetMemory {
        self.memory
    }

    /// Reports whether this emitter already shielded `unit`.
    #[must_use]
    pub fn has_charged(&self, unit: UnitId) -> bool {
        self.charged.contains(&unit)
    }

    pub(crate) fn step_to(&mut self, to: CellCoord) {
        self.last_axis = self.cell.axis_towards(to);
        self.cell = to;
        self.tiles_moved += 1;
    }

    /// Deals damage, draining the oldest shield charges first.
    pub(crate) fn absorb(&mut self, damage: f32) {
        if damage <= 0.0 {
            return;
        }
        let mut remaining = damage;
        while let Some(charge) = self.shields.front_mut() {
            if remaining < *charge {
                *charge -= remaining;
                return;
            }
            remaining -= *charge;
            let _ = self.shields.pop_front();
        }
        self.stability -= remaining;
    }

    pub(crate) fn charge(&mut self, amount: f32) {
        if amount > 0.0 {
            self.shields.push_back(amount);
        }
    }

    pub(crate) fn decay_shields(&mut self, amount: f32) {
        for charge in &mut self.shields {
            *charge = (*charge - amount).max(0.0);
        }
        self.shields.retain(|charge| *charge > 0.0);
    }

    pub(crate) fn remember(&mut self, memory: TargetMemory) {
        self.memory = memory;
    }

    pub(crate) fn record_charge(&mut self, unit: UnitId) -> bool {
        self.charged.insert(unit)
    }
}

/// Registry that stores units and manages identifier allocation.
#[derive(Clone, Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, Unit>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    pub(crate) fn allocate(&mut self) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get() + 1);
        id
    }

    pub(crate) fn insert(&mut self, unit: Unit) {
        let _ = self.entries.insert(unit.id(), unit);
    }

    pub(crate) fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&Unit> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.entries.values_mut()
    }
}
