#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for the Terminal simulator.
//!
//! The [`Board`] owns every unit, the per-cell occupancy, the per-edge
//! distance field and both players' resources. It only changes through
//! [`apply`], which validates each [`Command`] and reports the outcome as
//! [`Event`] values. Systems read the board through [`query`].

mod navigation;
mod units;
mod valuation;

use std::sync::Arc;

use terminal_sim_core::{
    Arena, CellCoord, Command, EdgeDirection, Event, GameConfig, PlacementError, Player,
    PlayerResources, RemovalError, UnitId, UnitKind, UnitSeed,
};
use tracing::{debug, warn};

pub use navigation::DistanceCell;
pub use units::{TargetMemory, Unit};
pub use valuation::Valuation;

use navigation::DistanceField;
use units::UnitRegistry;

/// Authoritative state of one simulated board.
///
/// Cloning a board yields a fully independent copy that shares only the
/// immutable configuration, so candidate placements can be simulated side by
/// side.
#[derive(Clone, Debug)]
pub struct Board {
    config: Arc<GameConfig>,
    units: UnitRegistry,
    occupancy: OccupancyGrid,
    field: DistanceField,
    players: [PlayerResources; 2],
    breaches: [u32; 2],
    frame: u32,
}

impl Board {
    /// Creates an empty board.
    #[must_use]
    pub fn new(config: Arc<GameConfig>, players: [PlayerResources; 2]) -> Self {
        let mut board = Self::empty(config, players);
        board.rebuild_field();
        board
    }

    /// Restores a board from a host snapshot.
    ///
    /// The distance field is built once after every unit is placed. Seeds
    /// that cannot be placed are reported through `out_events` and skipped.
    #[must_use]
    pub fn with_units(
        config: Arc<GameConfig>,
        players: [PlayerResources; 2],
        seeds: &[UnitSeed],
        out_events: &mut Vec<Event>,
    ) -> Self {
        let mut board = Self::empty(config, players);
        for seed in seeds {
            let _ = board.place(
                seed.kind,
                seed.cell,
                seed.owner,
                None,
                seed.stability,
                FieldRefresh::Deferred,
                out_events,
            );
        }
        board.rebuild_field();
        board
    }

    fn empty(config: Arc<GameConfig>, players: [PlayerResources; 2]) -> Self {
        let occupancy = OccupancyGrid::new(config.arena().slot_count());
        let field = DistanceField::new(config.arena());
        Self {
            config,
            units: UnitRegistry::new(),
            occupancy,
            field,
            players,
            breaches: [0; 2],
            frame: 0,
        }
    }

    fn rebuild_field(&mut self) {
        let Self {
            config,
            occupancy,
            field,
            ..
        } = self;
        let arena = config.arena();
        field.recompute(arena, |cell| occupancy.blocks(arena, cell));
    }

    fn repair_field(&mut self, cells: &[CellCoord]) {
        let Self {
            config,
            occupancy,
            field,
            ..
        } = self;
        let arena = config.arena();
        field.update(arena, cells, |cell| occupancy.blocks(arena, cell));
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &mut self,
        kind: UnitKind,
        cell: CellCoord,
        owner: Player,
        target: Option<EdgeDirection>,
        stability: Option<f32>,
        refresh: FieldRefresh,
        out_events: &mut Vec<Event>,
    ) -> Option<UnitId> {
        let reject = |reason: PlacementError, out_events: &mut Vec<Event>| {
            warn!(?kind, column = cell.column(), row = cell.row(), %reason, "placement rejected");
            out_events.push(Event::PlacementRejected { kind, cell, reason });
        };

        let Some(index) = self.config.arena().index(cell) else {
            reject(PlacementError::OutOfBounds, out_events);
            return None;
        };
        let occupants = self.occupancy.occupants(index);
        let conflict = if kind.is_stationary() {
            !occupants.is_empty()
        } else {
            occupants.structure.is_some()
        };
        if conflict {
            reject(PlacementError::Occupied, out_events);
            return None;
        }

        let id = self.units.allocate();
        let target_edge =
            (!kind.is_stationary()).then(|| target.unwrap_or_else(|| EdgeDirection::facing(cell)));
        let unit = Unit::new(
            id,
            self.config.stats(kind),
            owner,
            cell,
            target_edge,
            stability,
        );
        self.occupancy.insert(index, id, kind.is_stationary());
        self.units.insert(unit);
        // Cached search floors only hold while no unit appears mid-run.
        for unit in self.units.iter_mut() {
            unit.remember(TargetMemory::Unsearched);
        }
        debug!(
            unit = id.get(),
            ?kind,
            ?owner,
            column = cell.column(),
            row = cell.row(),
            "unit placed"
        );
        out_events.push(Event::UnitPlaced {
            unit: id,
            kind,
            cell,
            owner,
        });

        if kind.is_stationary() && refresh == FieldRefresh::Immediate {
            self.repair_field(&[cell]);
            out_events.push(Event::DistanceFieldUpdated { cells: vec![cell] });
        }
        Some(id)
    }

    fn remove_cell(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(index) = self.config.arena().index(cell) else {
            out_events.push(Event::RemovalRejected {
                cell,
                reason: RemovalError::OutOfBounds,
            });
            return;
        };
        let occupants = self.occupancy.take(index);
        if occupants.is_empty() {
            out_events.push(Event::RemovalRejected {
                cell,
                reason: RemovalError::Empty,
            });
            return;
        }

        let mut removed: Vec<UnitId> = occupants.ids().collect();
        removed.sort_unstable();
        for id in &removed {
            let _ = self.units.remove(*id);
        }
        debug!(
            column = cell.column(),
            row = cell.row(),
            count = removed.len(),
            "cell cleared"
        );
        out_events.push(Event::UnitsRemoved {
            cell,
            units: removed,
        });

        if occupants.structure.is_some() {
            self.repair_field(&[cell]);
            out_events.push(Event::DistanceFieldUpdated { cells: vec![cell] });
        }
    }

    fn advance_frame(&mut self, out_events: &mut Vec<Event>) {
        self.frame += 1;
        let decay = self.config.rules().shield_decay_per_frame;
        for unit in self.units.iter_mut() {
            if !unit.is_stationary() {
                unit.decay_shields(decay);
            }
        }
        out_events.push(Event::FrameAdvanced { frame: self.frame });
    }

    fn step_unit(&mut self, id: UnitId, to: CellCoord, out_events: &mut Vec<Event>) {
        let arena = self.config.arena();
        let Some(unit) = self.units.get(id) else {
            return;
        };
        let from = unit.cell();
        let target_index = arena.index(to);
        let valid = !unit.is_stationary()
            && from.manhattan_distance(to) == 1
            && target_index.is_some_and(|index| self.occupancy.occupants(index).structure.is_none());
        let (Some(from_index), Some(to_index), true) = (arena.index(from), target_index, valid)
        else {
            warn!(unit = id.get(), ?from, ?to, "step rejected");
            return;
        };

        self.occupancy.relocate(id, from_index, to_index);
        if let Some(unit) = self.units.get_mut(id) {
            unit.step_to(to);
        }
        out_events.push(Event::UnitMoved { unit: id, from, to });
    }

    fn breach(&mut self, id: UnitId, out_events: &mut Vec<Event>) {
        let Some(unit) = self.units.get(id) else {
            return;
        };
        let (owner, cell) = (unit.owner(), unit.cell());
        let Some(edge) = unit
            .target_edge()
            .filter(|edge| self.config.arena().is_on_edge(cell, *edge))
        else {
            warn!(unit = id.get(), ?cell, "breach rejected");
            return;
        };

        let _ = self.detach(id);
        let defender = owner.opponent();
        self.players[defender.index()].health -= self.config.rules().breach_damage;
        self.breaches[owner.index()] += 1;
        debug!(unit = id.get(), ?owner, ?edge, "edge breached");
        out_events.push(Event::EdgeBreached {
            unit: id,
            owner,
            edge,
        });
    }

    fn self_destruct(&mut self, id: UnitId, out_events: &mut Vec<Event>) {
        let config = Arc::clone(&self.config);
        let arena = config.arena();
        let rules = config.rules();
        let Some(unit) = self.units.get(id) else {
            return;
        };
        let stranded = unit.target_edge().is_some_and(|edge| {
            self.field.cell(arena, unit.cell()).is_some_and(|distances| {
                distances.distance(edge) == Some(1) && distances.is_provisional(edge)
            })
        });
        if !stranded {
            warn!(unit = id.get(), "self-destruct rejected");
            return;
        }
        let Some(unit) = self.detach(id) else {
            return;
        };

        let mut splashed = Vec::new();
        if unit.tiles_moved() >= rules.self_destruct_min_tiles {
            for cell in arena.cells_in_range(unit.cell(), rules.self_destruct_radius) {
                let Some(index) = arena.index(cell) else {
                    continue;
                };
                splashed.extend(self.occupancy.occupants(index).ids().filter(|victim| {
                    self.units.get(*victim).is_some_and(|victim| {
                        victim.owner() != unit.owner() && victim.effective_stability() > 0.0
                    })
                }));
            }
            for victim in &splashed {
                if let Some(victim) = self.units.get_mut(*victim) {
                    victim.absorb(unit.max_stability());
                }
            }
            splashed.sort_unstable();
        }

        debug!(
            unit = id.get(),
            tiles = unit.tiles_moved(),
            splashed = splashed.len(),
            "unit self-destructed"
        );
        out_events.push(Event::UnitSelfDestructed {
            unit: id,
            cell: unit.cell(),
            splashed,
        });
    }

    fn apply_shield(&mut self, emitter_id: UnitId, unit_id: UnitId, out_events: &mut Vec<Event>) {
        let (Some(emitter), Some(unit)) = (self.units.get(emitter_id), self.units.get(unit_id))
        else {
            return;
        };
        let stats = self.config.stats(emitter.kind());
        let amount = stats.shield_amount();
        let eligible = emitter.is_stationary()
            && !unit.is_stationary()
            && amount > 0.0
            && emitter.owner() == unit.owner()
            && !emitter.has_charged(unit_id)
            && Arena::within_range(emitter.cell().euclidean_distance(unit.cell()), stats.range());
        if !eligible {
            warn!(
                emitter = emitter_id.get(),
                unit = unit_id.get(),
                "shield rejected"
            );
            return;
        }

        if let Some(emitter) = self.units.get_mut(emitter_id) {
            let _ = emitter.record_charge(unit_id);
        }
        if let Some(unit) = self.units.get_mut(unit_id) {
            unit.charge(amount);
        }
        out_events.push(Event::ShieldApplied {
            emitter: emitter_id,
            unit: unit_id,
            amount,
        });
    }

    fn attack(
        &mut self,
        attacker_id: UnitId,
        target_id: UnitId,
        distance: f32,
        out_events: &mut Vec<Event>,
    ) {
        let (Some(attacker), Some(target)) =
            (self.units.get(attacker_id), self.units.get(target_id))
        else {
            return;
        };
        if attacker.owner() == target.owner() {
            warn!(
                attacker = attacker_id.get(),
                target = target_id.get(),
                "attack on a friendly unit rejected"
            );
            return;
        }
        let class = target.class();
        let damage = self.config.stats(attacker.kind()).damage_against(class);

        if let Some(target) = self.units.get_mut(target_id) {
            target.absorb(damage);
        }
        if let Some(attacker) = self.units.get_mut(attacker_id) {
            attacker.remember(TargetMemory::Engaged {
                target: target_id,
                class,
                distance,
            });
        }
        out_events.push(Event::UnitAttacked {
            attacker: attacker_id,
            target: target_id,
            damage,
        });
    }

    fn remove_destroyed(&mut self, out_events: &mut Vec<Event>) {
        let destroyed: Vec<UnitId> = self
            .units
            .iter()
            .filter(|unit| unit.stability() <= 0.0)
            .map(Unit::id)
            .collect();

        let mut opened = Vec::new();
        for id in destroyed {
            let Some(unit) = self.detach(id) else {
                continue;
            };
            if unit.is_stationary() {
                opened.push(unit.cell());
            }
            debug!(unit = id.get(), kind = ?unit.kind(), "unit destroyed");
            out_events.push(Event::UnitDestroyed {
                unit: id,
                kind: unit.kind(),
                cell: unit.cell(),
            });
        }

        if !opened.is_empty() {
            self.repair_field(&opened);
            out_events.push(Event::DistanceFieldUpdated { cells: opened });
        }
    }

    fn detach(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(id)?;
        if let Some(index) = self.config.arena().index(unit.cell()) {
            self.occupancy.remove(index, id);
        }
        Some(unit)
    }
}

/// Applies the provided command to the board, mutating state deterministically.
pub fn apply(board: &mut Board, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceUnit {
            kind,
            cell,
            owner,
            target,
            stability,
        } => {
            let _ = board.place(
                kind,
                cell,
                owner,
                target,
                stability,
                FieldRefresh::Immediate,
                out_events,
            );
        }
        Command::RemoveUnits { cell } => board.remove_cell(cell, out_events),
        Command::AdvanceFrame => board.advance_frame(out_events),
        Command::StepUnit { unit, to } => board.step_unit(unit, to, out_events),
        Command::BreachEdge { unit } => board.breach(unit, out_events),
        Command::SelfDestruct { unit } => board.self_destruct(unit, out_events),
        Command::ApplyShield { emitter, unit } => board.apply_shield(emitter, unit, out_events),
        Command::Attack {
            attacker,
            target,
            distance,
        } => board.attack(attacker, target, distance, out_events),
        Command::ForgetTarget { attacker } => {
            if let Some(unit) = board.units.get_mut(attacker) {
                unit.remember(TargetMemory::Vacant);
            }
        }
        Command::RemoveDestroyed => board.remove_destroyed(out_events),
    }
}

/// Query functions that provide read-only access to the board state.
pub mod query {
    use std::fmt::Write;

    use super::{Board, DistanceCell, Unit, Valuation};
    use terminal_sim_core::{
        Arena, CellCoord, EdgeDirection, GameConfig, Player, PlayerResources, UnitId,
        ARENA_SIZE,
    };

    /// Configuration the board was built from.
    #[must_use]
    pub fn config(board: &Board) -> &GameConfig {
        &board.config
    }

    /// Number of frames simulated so far. Zero before the first frame.
    #[must_use]
    pub fn frame(board: &Board) -> u32 {
        board.frame
    }

    /// Looks up a unit by identifier.
    #[must_use]
    pub fn unit(board: &Board, id: UnitId) -> Option<&Unit> {
        board.units.get(id)
    }

    /// Every unit on the board in identifier order.
    pub fn units(board: &Board) -> impl Iterator<Item = &Unit> + '_ {
        board.units.iter()
    }

    /// Every mobile unit on the board in identifier order.
    pub fn mobile_units(board: &Board) -> impl Iterator<Item = &Unit> + '_ {
        board.units.iter().filter(|unit| !unit.is_stationary())
    }

    /// Reports whether any mobile unit remains on the board.
    #[must_use]
    pub fn has_mobile_units(board: &Board) -> bool {
        mobile_units(board).next().is_some()
    }

    /// Units on a cell: the structure first, then mobile units in arrival
    /// order. Empty for cells outside the arena.
    pub fn units_at(board: &Board, cell: CellCoord) -> impl Iterator<Item = &Unit> + '_ {
        board
            .config
            .arena()
            .index(cell)
            .into_iter()
            .flat_map(move |index| board.occupancy.occupants(index).ids())
            .filter_map(move |id| board.units.get(id))
    }

    /// Reports whether a structure stands on the cell.
    #[must_use]
    pub fn is_occupied_by_structure(board: &Board, cell: CellCoord) -> bool {
        match board.config.arena().index(cell) {
            Some(index) => board.occupancy.occupants(index).structure.is_some(),
            None => {
                tracing::warn!(?cell, "structure lookup outside the arena");
                false
            }
        }
    }

    /// Steps from `cell` to `edge`, or `None` when no value is known.
    #[must_use]
    pub fn distance(board: &Board, edge: EdgeDirection, cell: CellCoord) -> Option<u32> {
        distance_cell(board, cell).and_then(|distances| distances.distance(edge))
    }

    /// Distances from `cell` to every edge.
    #[must_use]
    pub fn distance_cell(board: &Board, cell: CellCoord) -> Option<DistanceCell> {
        let distances = board.field.cell(board.config.arena(), cell);
        if distances.is_none() {
            tracing::warn!(?cell, "distance lookup outside the arena");
        }
        distances
    }

    /// Enemy structures able to fire on a mobile unit of `owner` at `cell`,
    /// nearest first. Empty for cells outside the arena.
    #[must_use]
    pub fn attackers_threatening(board: &Board, cell: CellCoord, owner: Player) -> Vec<&Unit> {
        let config = &board.config;
        if !config.arena().contains(cell) {
            tracing::warn!(?cell, "threat lookup outside the arena");
            return Vec::new();
        }
        config
            .arena()
            .cells_in_range(cell, config.max_structure_range())
            .into_iter()
            .flat_map(|candidate| units_at(board, candidate))
            .filter(|unit| {
                let stats = config.stats(unit.kind());
                unit.is_stationary()
                    && unit.owner() != owner
                    && stats.damage_to_mobiles() > 0.0
                    && Arena::within_range(unit.cell().euclidean_distance(cell), stats.range())
            })
            .collect()
    }

    /// Resources currently held by a player.
    #[must_use]
    pub fn resources(board: &Board, player: Player) -> PlayerResources {
        board.players[player.index()]
    }

    /// Number of edges breached by a player's units so far.
    #[must_use]
    pub fn breaches(board: &Board, player: Player) -> u32 {
        board.breaches[player.index()]
    }

    /// Inputs of the idealness score for a player.
    #[must_use]
    pub fn valuation(board: &Board, player: Player) -> Valuation {
        super::valuation::snapshot(board, player)
    }

    /// Renders one edge's distance field as text, top row first.
    ///
    /// Structures print as `##`, provisional distances carry a trailing `*`
    /// and cells without a value print as `?`.
    #[must_use]
    pub fn render_distance_field(board: &Board, edge: EdgeDirection) -> String {
        let arena = board.config.arena();
        let mut out = String::new();
        for row in (0..ARENA_SIZE).rev() {
            let _ = write!(out, "{row:>2} |");
            for column in 0..ARENA_SIZE {
                let cell = CellCoord::new(column, row);
                if !arena.contains(cell) {
                    out.push_str("   ");
                } else if is_occupied_by_structure(board, cell) {
                    out.push_str(" ##");
                } else {
                    match distance_cell(board, cell) {
                        Some(distances) => match distances.distance(edge) {
                            Some(steps) if distances.is_provisional(edge) => {
                                let _ = write!(out, "{steps:>2}*");
                            }
                            Some(steps) => {
                                let _ = write!(out, "{steps:>3}");
                            }
                            None => out.push_str("  ?"),
                        },
                        None => out.push_str("  ?"),
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldRefresh {
    Immediate,
    Deferred,
}

#[derive(Clone, Debug, Default)]
struct CellOccupants {
    structure: Option<UnitId>,
    mobiles: Vec<UnitId>,
}

impl CellOccupants {
    fn is_empty(&self) -> bool {
        self.structure.is_none() && self.mobiles.is_empty()
    }

    fn ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.structure
            .into_iter()
            .chain(self.mobiles.iter().copied())
    }
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    cells: Vec<CellOccupants>,
}

impl OccupancyGrid {
    fn new(slots: usize) -> Self {
        Self {
            cells: vec![CellOccupants::default(); slots],
        }
    }

    fn occupants(&self, index: usize) -> &CellOccupants {
        &self.cells[index]
    }

    fn insert(&mut self, index: usize, id: UnitId, stationary: bool) {
        let occupants = &mut self.cells[index];
        if stationary {
            occupants.structure = Some(id);
        } else {
            occupants.mobiles.push(id);
        }
    }

    fn remove(&mut self, index: usize, id: UnitId) {
        let occupants = &mut self.cells[index];
        if occupants.structure == Some(id) {
            occupants.structure = None;
        } else {
            occupants.mobiles.retain(|mobile| *mobile != id);
        }
    }

    fn take(&mut self, index: usize) -> CellOccupants {
        std::mem::take(&mut self.cells[index])
    }

    fn relocate(&mut self, id: UnitId, from: usize, to: usize) {
        self.remove(from, id);
        self.insert(to, id, false);
    }

    fn blocks(&self, arena: &Arena, cell: CellCoord) -> bool {
        arena
            .index(cell)
            .map_or(true, |index| self.cells[index].structure.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terminal_sim_core::fixtures;

    fn board() -> Board {
        let players = [PlayerResources::new(30.0, 10.0, 5.0); 2];
        Board::new(Arc::new(fixtures::config()), players)
    }

    fn place(board: &mut Board, kind: UnitKind, cell: CellCoord, owner: Player) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            board,
            Command::PlaceUnit {
                kind,
                cell,
                owner,
                target: None,
                stability: None,
            },
            &mut events,
        );
        events
    }

    fn placed_id(events: &[Event]) -> UnitId {
        events
            .iter()
            .find_map(|event| match event {
                Event::UnitPlaced { unit, .. } => Some(*unit),
                _ => None,
            })
            .expect("unit placed")
    }

    #[test]
    fn placement_outside_arena_is_rejected() {
        let mut board = board();
        let events = place(&mut board, UnitKind::Filter, CellCoord::new(0, 0), Player::First);
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                kind: UnitKind::Filter,
                cell: CellCoord::new(0, 0),
                reason: PlacementError::OutOfBounds,
            }]
        );
    }

    #[test]
    fn structures_exclude_every_other_unit() {
        let mut board = board();
        let cell = CellCoord::new(13, 5);
        let _ = place(&mut board, UnitKind::Filter, cell, Player::First);
        for kind in [UnitKind::Destructor, UnitKind::Ping] {
            let events = place(&mut board, kind, cell, Player::Second);
            assert!(matches!(
                events.as_slice(),
                [Event::PlacementRejected {
                    reason: PlacementError::Occupied,
                    ..
                }]
            ));
        }
    }

    #[test]
    fn mobile_units_stack_on_one_cell() {
        let mut board = board();
        let cell = CellCoord::new(13, 0);
        let first = placed_id(&place(&mut board, UnitKind::Ping, cell, Player::First));
        let second = placed_id(&place(&mut board, UnitKind::Ping, cell, Player::First));
        let stacked: Vec<UnitId> = query::units_at(&board, cell).map(Unit::id).collect();
        assert_eq!(stacked, vec![first, second]);

        let events = place(&mut board, UnitKind::Filter, cell, Player::First);
        assert!(matches!(
            events.as_slice(),
            [Event::PlacementRejected {
                reason: PlacementError::Occupied,
                ..
            }]
        ));
    }

    #[test]
    fn placing_a_structure_refreshes_distances() {
        let mut board = board();
        let wall = CellCoord::new(13, 0);
        let beside = CellCoord::new(14, 0);
        let before = query::distance(&board, EdgeDirection::BottomLeft, beside);
        let events = place(&mut board, UnitKind::Filter, wall, Player::First);
        assert!(events.contains(&Event::DistanceFieldUpdated { cells: vec![wall] }));
        assert!(query::is_occupied_by_structure(&board, wall));
        assert_eq!(before, Some(1));
        assert_eq!(
            query::distance(&board, EdgeDirection::BottomLeft, beside),
            Some(3)
        );
    }

    #[test]
    fn removal_clears_the_cell_and_reopens_it() {
        let mut board = board();
        let cell = CellCoord::new(13, 5);
        let id = placed_id(&place(&mut board, UnitKind::Destructor, cell, Player::First));
        let mut events = Vec::new();
        apply(&mut board, Command::RemoveUnits { cell }, &mut events);
        assert_eq!(
            events,
            vec![
                Event::UnitsRemoved {
                    cell,
                    units: vec![id]
                },
                Event::DistanceFieldUpdated { cells: vec![cell] },
            ]
        );
        assert!(!query::is_occupied_by_structure(&board, cell));

        events.clear();
        apply(&mut board, Command::RemoveUnits { cell }, &mut events);
        assert_eq!(
            events,
            vec![Event::RemovalRejected {
                cell,
                reason: RemovalError::Empty
            }]
        );
    }

    #[test]
    fn breach_requires_standing_on_the_target_edge() {
        let mut board = board();
        let inside = placed_id(&place(
            &mut board,
            UnitKind::Ping,
            CellCoord::new(13, 5),
            Player::First,
        ));
        let mut events = Vec::new();
        apply(&mut board, Command::BreachEdge { unit: inside }, &mut events);
        assert!(events.is_empty());

        let mut events = Vec::new();
        apply(
            &mut board,
            Command::PlaceUnit {
                kind: UnitKind::Ping,
                cell: CellCoord::new(20, 21),
                owner: Player::First,
                target: Some(EdgeDirection::TopRight),
                stability: None,
            },
            &mut events,
        );
        let on_edge = placed_id(&events);
        events.clear();
        apply(&mut board, Command::BreachEdge { unit: on_edge }, &mut events);
        assert_eq!(
            events,
            vec![Event::EdgeBreached {
                unit: on_edge,
                owner: Player::First,
                edge: EdgeDirection::TopRight,
            }]
        );
        assert_eq!(query::resources(&board, Player::Second).health, 29.0);
        assert_eq!(query::breaches(&board, Player::First), 1);
        assert!(query::unit(&board, on_edge).is_none());
    }

    #[test]
    fn shields_apply_once_per_emitter() {
        let mut board = board();
        let emitter = placed_id(&place(
            &mut board,
            UnitKind::Encryptor,
            CellCoord::new(13, 3),
            Player::First,
        ));
        let ping = placed_id(&place(
            &mut board,
            UnitKind::Ping,
            CellCoord::new(13, 1),
            Player::First,
        ));
        let mut events = Vec::new();
        for _ in 0..2 {
            apply(
                &mut board,
                Command::ApplyShield {
                    emitter,
                    unit: ping,
                },
                &mut events,
            );
        }
        assert_eq!(
            events,
            vec![Event::ShieldApplied {
                emitter,
                unit: ping,
                amount: 10.0
            }]
        );
        let ping = query::unit(&board, ping).expect("ping");
        assert_eq!(ping.effective_stability(), 25.0);
    }

    #[test]
    fn attacks_record_target_memory_and_destroy_at_zero() {
        let mut board = board();
        let destructor = placed_id(&place(
            &mut board,
            UnitKind::Destructor,
            CellCoord::new(13, 3),
            Player::Second,
        ));
        let ping = placed_id(&place(
            &mut board,
            UnitKind::Ping,
            CellCoord::new(13, 1),
            Player::First,
        ));
        let mut events = Vec::new();
        for _ in 0..4 {
            apply(
                &mut board,
                Command::Attack {
                    attacker: destructor,
                    target: ping,
                    distance: 2.0,
                },
                &mut events,
            );
        }
        assert_eq!(
            query::unit(&board, destructor).map(Unit::memory),
            Some(TargetMemory::Engaged {
                target: ping,
                class: terminal_sim_core::TargetClass::Mobile,
                distance: 2.0,
            })
        );
        events.clear();
        apply(&mut board, Command::RemoveDestroyed, &mut events);
        assert_eq!(
            events,
            vec![Event::UnitDestroyed {
                unit: ping,
                kind: UnitKind::Ping,
                cell: CellCoord::new(13, 1),
            }]
        );
        assert!(!query::has_mobile_units(&board));
    }

    #[test]
    fn threatening_attackers_are_enemy_damage_dealers_in_range() {
        let mut board = board();
        let enemy = placed_id(&place(
            &mut board,
            UnitKind::Destructor,
            CellCoord::new(13, 4),
            Player::Second,
        ));
        let _ = place(&mut board, UnitKind::Destructor, CellCoord::new(14, 4), Player::First);
        let _ = place(&mut board, UnitKind::Filter, CellCoord::new(12, 4), Player::Second);
        let _ = place(&mut board, UnitKind::Destructor, CellCoord::new(13, 12), Player::Second);

        let threats: Vec<UnitId> =
            query::attackers_threatening(&board, CellCoord::new(13, 1), Player::First)
                .into_iter()
                .map(Unit::id)
                .collect();
        assert_eq!(threats, vec![enemy]);
    }

    #[test]
    fn lookups_outside_the_arena_come_back_empty() {
        let mut board = board();
        let _ = place(&mut board, UnitKind::Destructor, CellCoord::new(0, 13), Player::Second);
        let outside = CellCoord::new(-1, 13);

        assert!(query::attackers_threatening(&board, outside, Player::First).is_empty());
        let inside = query::attackers_threatening(&board, CellCoord::new(1, 13), Player::First);
        assert_eq!(inside.len(), 1);
        assert_eq!(query::distance(&board, EdgeDirection::TopLeft, outside), None);
        assert!(query::distance_cell(&board, outside).is_none());
        assert!(!query::is_occupied_by_structure(&board, outside));
    }

    #[test]
    fn breaching_costs_the_opponent_whichever_edge_is_crossed() {
        let mut board = board();
        let mut events = Vec::new();
        apply(
            &mut board,
            Command::PlaceUnit {
                kind: UnitKind::Ping,
                cell: CellCoord::new(10, 3),
                owner: Player::First,
                target: Some(EdgeDirection::BottomLeft),
                stability: None,
            },
            &mut events,
        );
        let unit = placed_id(&events);
        events.clear();
        apply(&mut board, Command::BreachEdge { unit }, &mut events);

        assert!(matches!(events[..], [Event::EdgeBreached { .. }]));
        assert_eq!(query::resources(&board, Player::First).health, 30.0);
        assert_eq!(query::resources(&board, Player::Second).health, 29.0);
    }

    #[test]
    fn snapshot_seeds_build_the_field_once() {
        let config = Arc::new(fixtures::config());
        let seeds = [
            UnitSeed {
                kind: UnitKind::Filter,
                owner: Player::First,
                cell: CellCoord::new(13, 0),
                stability: Some(12.0),
            },
            UnitSeed {
                kind: UnitKind::Filter,
                owner: Player::First,
                cell: CellCoord::new(40, 1),
                stability: None,
            },
        ];
        let mut events = Vec::new();
        let players = [PlayerResources::new(30.0, 0.0, 0.0); 2];
        let board = Board::with_units(config, players, &seeds, &mut events);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Event::PlacementRejected { .. }));
        let filter = query::units(&board).next().expect("filter");
        assert_eq!(filter.stability(), 12.0);
        assert_eq!(
            query::distance(&board, EdgeDirection::BottomLeft, CellCoord::new(14, 0)),
            Some(3)
        );
    }

    #[test]
    fn rendering_marks_structures() {
        let mut board = board();
        let _ = place(&mut board, UnitKind::Filter, CellCoord::new(13, 0), Player::First);
        let rendered = query::render_distance_field(&board, EdgeDirection::TopRight);
        assert_eq!(rendered.lines().count(), 28);
        let bottom = rendered.lines().last().expect("bottom row");
        assert!(bottom.contains("##"));
    }
}
