#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure target resolution for attacking units.
//!
//! Attackers scan the precomputed range rings around their cell from the
//! nearest ring outwards. Any mobile unit beats any structure, and the scan
//! stops after the first ring that holds a mobile unit.

use terminal_sim_core::{
    Player, RangeRings, TargetClass, UnitId, ARENA_SIZE, RANGE_TOLERANCE,
};
use terminal_sim_world::{query, Board, TargetMemory, Unit};

const FLOOR_EPSILON: f32 = 1e-3;

/// Target selected for one attacker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetChoice {
    /// Unit that will be attacked.
    pub unit: UnitId,
    /// Classification of the selected unit.
    pub class: TargetClass,
    /// Ring distance at which the unit was found.
    pub distance: f32,
}

/// Lowest ring distances worth scanning for each target class.
///
/// Floors come from the previous frame's search: rings known to be empty of
/// eligible targets are skipped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchFloors {
    mobile: f32,
    structure: f32,
}

impl SearchFloors {
    /// Floors that scan every ring.
    pub const OPEN: Self = Self {
        mobile: 0.0,
        structure: 0.0,
    };

    /// Creates floors from explicit ring distances.
    #[must_use]
    pub const fn new(mobile: f32, structure: f32) -> Self {
        Self { mobile, structure }
    }

    /// Derives floors from an attacker's previous search.
    ///
    /// `attacker_moved` and `mobiles_moved` report whether the attacker or
    /// any mobile unit was scheduled to step since that search; each lowers
    /// the affected floors by one ring.
    #[must_use]
    pub fn derive(
        memory: TargetMemory,
        range: f32,
        attacker_moved: bool,
        mobiles_moved: bool,
    ) -> Self {
        let beyond = range + RANGE_TOLERANCE;
        let (mobile, structure) = match memory {
            TargetMemory::Unsearched => return Self::OPEN,
            TargetMemory::Vacant => (beyond, beyond),
            TargetMemory::Engaged {
                class: TargetClass::Mobile,
                distance,
                ..
            } => (distance, 0.0),
            // Structures are ranked by stability, so nearer ones may still
            // be eligible.
            TargetMemory::Engaged {
                class: TargetClass::Structure,
                ..
            } => (beyond, 0.0),
        };

        let attacker_shift = if attacker_moved { 1.0 } else { 0.0 };
        let mobile_shift = if mobiles_moved { 1.0 } else { 0.0 };
        Self {
            mobile: (mobile - attacker_shift - mobile_shift).max(0.0),
            structure: (structure - attacker_shift).max(0.0),
        }
    }

    /// Lowest ring distance scanned for mobile units.
    #[must_use]
    pub const fn mobile(&self) -> f32 {
        self.mobile
    }

    /// Lowest ring distance scanned for structures.
    #[must_use]
    pub const fn structure(&self) -> f32 {
        self.structure
    }

    fn admits(floor: f32, distance: f32) -> bool {
        distance + FLOOR_EPSILON >= floor
    }
}

/// Selects the unit `attacker` fires on this frame, if any.
///
/// Candidates are enemy units with positive effective stability inside the
/// attacker's range. The ranking is, in order: mobile units before
/// structures, lower effective stability, rows closer to the attacker's own
/// side, and columns farther from the centre line. Remaining ties go to the
/// unit found first.
#[must_use]
pub fn resolve(board: &Board, attacker: &Unit, floors: SearchFloors) -> Option<TargetChoice> {
    let config = query::config(board);
    let stats = config.stats(attacker.kind());
    let engages_mobiles = stats.damage_to_mobiles() > 0.0;
    let engages_structures = !attacker.is_stationary()
        && attacker.kind().engages_structures()
        && stats.damage_to_structures() > 0.0;
    if !engages_mobiles && !engages_structures {
        return None;
    }

    let fallback;
    let rings = match config.arena().rings(stats.range()) {
        Some(rings) => rings,
        None => {
            fallback = RangeRings::new(stats.range());
            &fallback
        }
    };

    let mut best: Option<Candidate> = None;
    for ring in rings.iter() {
        let scan_mobiles = engages_mobiles && SearchFloors::admits(floors.mobile, ring.distance());
        let scan_structures = engages_structures
            && SearchFloors::admits(floors.structure, ring.distance())
            && !best.is_some_and(|found| found.class == TargetClass::Mobile);
        if !scan_mobiles && !scan_structures {
            continue;
        }

        for cell in ring.cells_around(attacker.cell()) {
            for unit in query::units_at(board, cell) {
                if unit.owner() == attacker.owner() || unit.effective_stability() <= 0.0 {
                    continue;
                }
                let eligible = match unit.class() {
                    TargetClass::Mobile => scan_mobiles,
                    TargetClass::Structure => scan_structures,
                };
                if !eligible {
                    continue;
                }

                let candidate = Candidate::new(attacker.owner(), unit, ring.distance());
                best = Some(match best {
                    Some(existing) if !candidate.is_better_than(&existing) => existing,
                    _ => candidate,
                });
            }
        }

        if best.is_some_and(|found| found.class == TargetClass::Mobile) {
            break;
        }
    }

    best.map(|candidate| TargetChoice {
        unit: candidate.unit,
        class: candidate.class,
        distance: candidate.distance,
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    unit: UnitId,
    class: TargetClass,
    stability: f32,
    /// Distance in rows from the attacker's own side of the arena.
    depth: i32,
    /// Twice the distance from the centre line between columns 13 and 14.
    spread: i32,
    distance: f32,
}

impl Candidate {
    fn new(attacker: Player, unit: &Unit, distance: f32) -> Self {
        let cell = unit.cell();
        let depth = match attacker {
            Player::First => cell.row(),
            Player::Second => ARENA_SIZE - 1 - cell.row(),
        };
        Self {
            unit: unit.id(),
            class: unit.class(),
            stability: unit.effective_stability(),
            depth,
            spread: (2 * cell.column() - (ARENA_SIZE - 1)).abs(),
            distance,
        }
    }

    fn is_better_than(&self, other: &Self) -> bool {
        if self.class != other.class {
            return self.class == TargetClass::Mobile;
        }
        if self.stability != other.stability {
            return self.stability < other.stability;
        }
        if self.depth != other.depth {
            return self.depth < other.depth;
        }
        self.spread > other.spread
    }
}
