#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Terminal board simulator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative board, and pure systems. Callers submit [`Command`] values
//! describing desired mutations, the board executes those commands via its
//! `apply` entry point, and then reports [`Event`] values describing what
//! actually happened. Systems read immutable board state and respond
//! exclusively with new command batches, which keeps every frame of a
//! simulation reproducible from its inputs.
//!
//! Arena geometry and the unit configuration table also live here so that
//! every crate agrees on bounds, edges, and range rings.

mod arena;
mod config;
#[cfg(feature = "fixtures")]
pub mod fixtures;

pub use arena::{Arena, RangeRings, Ring, ARENA_SIZE, HALF_ARENA, RANGE_TOLERANCE};
pub use config::{ConfigError, GameConfig, IdealnessWeights, Rules, UnitInformation, UnitStats};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the two participants sharing the arena.
///
/// The first player owns the lower half of the diamond and the second
/// player owns the upper half.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    /// Player index `0`, defending the bottom half of the arena.
    First,
    /// Player index `1`, defending the top half of the arena.
    Second,
}

impl Player {
    /// Both players in index order.
    pub const ALL: [Player; 2] = [Player::First, Player::Second];

    /// Zero-based index used by the host protocol and per-player arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// Player that opposes `self`.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = PlacementError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::First),
            1 => Ok(Self::Second),
            owner => Err(PlacementError::InvalidOwner { owner }),
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> Self {
        match player {
            Player::First => 0,
            Player::Second => 1,
        }
    }
}

/// Unique identifier assigned to each unit placed on the board.
///
/// Identifiers increase monotonically in placement order, so they double as
/// the deterministic iteration order of every frame phase.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single arena cell expressed as column and row coordinates.
///
/// Coordinates are signed so that offsets produced by range rings and edge
/// walks can step outside the arena before being rejected by bounds checks.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index (`x`) of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index (`y`) of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Cell displaced from `self` by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Computes the Euclidean distance between two cell coordinates.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f32 {
        let columns = (self.column - other.column) as f32;
        let rows = (self.row - other.row) as f32;
        (columns * columns + rows * rows).sqrt()
    }

    /// Orthogonal neighbours in the fixed order up, down, left, right.
    ///
    /// Movement ties are broken by this order, so it must never change.
    #[must_use]
    pub const fn neighbors(self) -> [CellCoord; 4] {
        [
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
        ]
    }

    /// Axis travelled when stepping from `self` to an orthogonal neighbour.
    #[must_use]
    pub const fn axis_towards(self, other: CellCoord) -> Axis {
        if self.column == other.column {
            Axis::Vertical
        } else {
            Axis::Horizontal
        }
    }
}

/// Axis of a single orthogonal step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Step along a row, changing the column.
    Horizontal,
    /// Step along a column, changing the row.
    Vertical,
}

/// One of the four diagonal boundaries of the diamond arena.
///
/// The declaration order matches the index used by the host protocol:
/// top-right `0`, top-left `1`, bottom-left `2`, bottom-right `3`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EdgeDirection {
    /// Upper right boundary, owned by the second player.
    TopRight,
    /// Upper left boundary, owned by the second player.
    TopLeft,
    /// Lower left boundary, owned by the first player.
    BottomLeft,
    /// Lower right boundary, owned by the first player.
    BottomRight,
}

impl EdgeDirection {
    /// Every edge in index order.
    pub const ALL: [EdgeDirection; 4] = [
        EdgeDirection::TopRight,
        EdgeDirection::TopLeft,
        EdgeDirection::BottomLeft,
        EdgeDirection::BottomRight,
    ];

    /// Zero-based index of the edge.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::TopRight => 0,
            Self::TopLeft => 1,
            Self::BottomLeft => 2,
            Self::BottomRight => 3,
        }
    }

    /// Edge a mobile unit targets by default when deployed at `cell`.
    ///
    /// Units always head for the edge opposite the quadrant they start in.
    #[must_use]
    pub const fn facing(cell: CellCoord) -> Self {
        let right = cell.column() >= HALF_ARENA;
        let top = cell.row() >= HALF_ARENA;
        match (right, top) {
            (false, false) => Self::TopRight,
            (true, false) => Self::TopLeft,
            (false, true) => Self::BottomRight,
            (true, true) => Self::BottomLeft,
        }
    }

    /// Whether the edge lies towards increasing columns.
    #[must_use]
    pub const fn towards_higher_column(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight)
    }

    /// Whether the edge lies towards increasing rows.
    #[must_use]
    pub const fn towards_higher_row(self) -> bool {
        matches!(self, Self::TopRight | Self::TopLeft)
    }
}

/// Catalogue of unit types available to both players.
///
/// The declaration order matches the positional layout of the host's unit
/// information table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum UnitKind {
    /// Blocking wall segment.
    Filter,
    /// Structure that shields friendly mobile units passing within range.
    Encryptor,
    /// Structure that fires on enemy mobile units.
    Destructor,
    /// Fast, fragile mobile unit.
    Ping,
    /// Slow, long-ranged mobile unit.
    Emp,
    /// Mobile unit that only engages other mobile units.
    Scrambler,
}

impl UnitKind {
    /// Every kind in table order.
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Filter,
        UnitKind::Encryptor,
        UnitKind::Destructor,
        UnitKind::Ping,
        UnitKind::Emp,
        UnitKind::Scrambler,
    ];

    /// Position of the kind within the unit information table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Filter => 0,
            Self::Encryptor => 1,
            Self::Destructor => 2,
            Self::Ping => 3,
            Self::Emp => 4,
            Self::Scrambler => 5,
        }
    }

    /// Reports whether the kind is a structure that never moves.
    #[must_use]
    pub const fn is_stationary(self) -> bool {
        matches!(self, Self::Filter | Self::Encryptor | Self::Destructor)
    }

    /// Classification used when ranking attack targets.
    #[must_use]
    pub const fn class(self) -> TargetClass {
        if self.is_stationary() {
            TargetClass::Structure
        } else {
            TargetClass::Mobile
        }
    }

    /// Reports whether units of this kind ever consider structures as targets.
    #[must_use]
    pub const fn engages_structures(self) -> bool {
        !matches!(self, Self::Scrambler)
    }
}

/// Broad classification of a unit as seen by an attacker.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum TargetClass {
    /// A unit that walks towards an edge. Always preferred over structures.
    Mobile,
    /// A structure that stays on its cell until destroyed or removed.
    Structure,
}

/// Per-player resources that feed into the idealness score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerResources {
    /// Remaining health. Reduced when an enemy unit breaches one of the
    /// player's edges.
    pub health: f32,
    /// Banked cores used to purchase structures.
    pub cores: f32,
    /// Banked bits used to purchase mobile units.
    pub bits: f32,
}

impl PlayerResources {
    /// Creates a resource snapshot.
    #[must_use]
    pub const fn new(health: f32, cores: f32, bits: f32) -> Self {
        Self {
            health,
            cores,
            bits,
        }
    }
}

/// Description of a unit restored from a host snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSeed {
    /// Type of unit to place.
    pub kind: UnitKind,
    /// Owner of the unit.
    pub owner: Player,
    /// Cell the unit occupies.
    pub cell: CellCoord,
    /// Remaining stability, or `None` for a unit at full strength.
    pub stability: Option<f32>,
}

/// Commands that express all permissible board mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests placement of a new unit.
    PlaceUnit {
        /// Type of unit to create.
        kind: UnitKind,
        /// Cell the unit should occupy.
        cell: CellCoord,
        /// Player that owns the unit.
        owner: Player,
        /// Edge a mobile unit should walk towards. `None` selects the edge
        /// opposite the deployment quadrant.
        target: Option<EdgeDirection>,
        /// Remaining stability for damaged units restored from a snapshot.
        stability: Option<f32>,
    },
    /// Requests removal of every unit occupying a cell.
    RemoveUnits {
        /// Cell to clear.
        cell: CellCoord,
    },
    /// Advances the frame counter and decays shields on mobile units.
    AdvanceFrame,
    /// Requests that a mobile unit step onto an adjacent cell.
    StepUnit {
        /// Unit attempting to move.
        unit: UnitId,
        /// Orthogonally adjacent destination.
        to: CellCoord,
    },
    /// Requests that a mobile unit on its target edge leave the arena.
    BreachEdge {
        /// Unit scoring the breach.
        unit: UnitId,
    },
    /// Requests that a stranded mobile unit detonate.
    SelfDestruct {
        /// Unit that has no way forward.
        unit: UnitId,
    },
    /// Requests that a shield emitter charge a friendly mobile unit.
    ApplyShield {
        /// Structure emitting the shield.
        emitter: UnitId,
        /// Mobile unit receiving the charge.
        unit: UnitId,
    },
    /// Requests that an attacker deal damage to a target this frame.
    Attack {
        /// Unit dealing damage.
        attacker: UnitId,
        /// Unit receiving damage.
        target: UnitId,
        /// Ring distance at which the target was found.
        distance: f32,
    },
    /// Records that an attacker found nothing to engage this frame.
    ForgetTarget {
        /// Unit that found no target.
        attacker: UnitId,
    },
    /// Removes every unit whose stability fell to zero or below.
    RemoveDestroyed,
}

/// Events reported by the board after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a unit was placed on the board.
    UnitPlaced {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Type of the unit.
        kind: UnitKind,
        /// Cell the unit occupies.
        cell: CellCoord,
        /// Owner of the unit.
        owner: Player,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Type of unit requested.
        kind: UnitKind,
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that every unit on a cell was removed.
    UnitsRemoved {
        /// Cell that was cleared.
        cell: CellCoord,
        /// Units that were removed, in identifier order.
        units: Vec<UnitId>,
    },
    /// Reports that a removal request was rejected.
    RemovalRejected {
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Announces the start of a new frame.
    FrameAdvanced {
        /// One-based number of the frame that just began.
        frame: u32,
    },
    /// Confirms that a mobile unit moved between two cells.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Cell the unit occupied before moving.
        from: CellCoord,
        /// Cell the unit occupies after moving.
        to: CellCoord,
    },
    /// Confirms that a mobile unit breached an enemy edge.
    EdgeBreached {
        /// Unit that left the arena.
        unit: UnitId,
        /// Player that scored the breach.
        owner: Player,
        /// Edge that was breached.
        edge: EdgeDirection,
    },
    /// Confirms that a stranded unit detonated.
    UnitSelfDestructed {
        /// Unit that detonated.
        unit: UnitId,
        /// Cell the unit occupied.
        cell: CellCoord,
        /// Enemy units caught in the splash, in identifier order.
        splashed: Vec<UnitId>,
    },
    /// Confirms that a shield charge was applied.
    ShieldApplied {
        /// Structure that emitted the charge.
        emitter: UnitId,
        /// Mobile unit that received the charge.
        unit: UnitId,
        /// Size of the charge.
        amount: f32,
    },
    /// Confirms that an attacker damaged a target.
    UnitAttacked {
        /// Unit that dealt damage.
        attacker: UnitId,
        /// Unit that received damage.
        target: UnitId,
        /// Damage dealt before shields absorbed any of it.
        damage: f32,
    },
    /// Announces that a unit ran out of stability and left the board.
    UnitDestroyed {
        /// Unit that was destroyed.
        unit: UnitId,
        /// Type of the destroyed unit.
        kind: UnitKind,
        /// Cell the unit occupied.
        cell: CellCoord,
    },
    /// Announces that the distance field changed after structures appeared
    /// or disappeared.
    DistanceFieldUpdated {
        /// Cells whose blocking state changed.
        cells: Vec<CellCoord>,
    },
}

/// Reasons a placement request may be rejected by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the diamond arena.
    #[error("cell lies outside the arena")]
    OutOfBounds,
    /// The requested cell already holds a unit that excludes the new one.
    #[error("cell is already occupied")]
    Occupied,
    /// The owner index does not name a player.
    #[error("owner {owner} is not a player index")]
    InvalidOwner {
        /// Owner index supplied by the caller.
        owner: u8,
    },
}

/// Reasons a removal request may be rejected by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RemovalError {
    /// The requested cell lies outside the diamond arena.
    #[error("cell lies outside the arena")]
    OutOfBounds,
    /// The requested cell holds no units.
    #[error("cell holds no units")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::{
        CellCoord, EdgeDirection, PlacementError, Player, RemovalError, UnitId, UnitKind,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn euclidean_distance_handles_negative_offsets() {
        let origin = CellCoord::new(3, 3);
        assert_eq!(origin.euclidean_distance(CellCoord::new(0, -1)), 5.0);
    }

    #[test]
    fn neighbours_follow_up_down_left_right() {
        let cell = CellCoord::new(5, 5);
        assert_eq!(
            cell.neighbors(),
            [
                CellCoord::new(5, 6),
                CellCoord::new(5, 4),
                CellCoord::new(4, 5),
                CellCoord::new(6, 5),
            ]
        );
    }

    #[test]
    fn facing_targets_opposite_quadrant() {
        assert_eq!(
            EdgeDirection::facing(CellCoord::new(3, 10)),
            EdgeDirection::TopRight
        );
        assert_eq!(
            EdgeDirection::facing(CellCoord::new(20, 10)),
            EdgeDirection::TopLeft
        );
        assert_eq!(
            EdgeDirection::facing(CellCoord::new(3, 20)),
            EdgeDirection::BottomRight
        );
        assert_eq!(
            EdgeDirection::facing(CellCoord::new(20, 20)),
            EdgeDirection::BottomLeft
        );
    }

    #[test]
    fn player_rejects_unknown_indices() {
        assert_eq!(Player::try_from(1), Ok(Player::Second));
        assert_eq!(
            Player::try_from(2),
            Err(PlacementError::InvalidOwner { owner: 2 })
        );
    }

    #[test]
    fn kinds_are_indexed_in_table_order() {
        for (index, kind) in UnitKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), index);
        }
        assert!(!UnitKind::Scrambler.engages_structures());
        assert!(UnitKind::Destructor.is_stationary());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn unit_id_round_trips_through_bincode() {
        assert_round_trip(&UnitId::new(42));
    }

    #[test]
    fn player_round_trips_through_bincode() {
        assert_round_trip(&Player::Second);
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::InvalidOwner { owner: 7 });
    }

    #[test]
    fn removal_error_round_trips_through_bincode() {
        assert_round_trip(&RemovalError::Empty);
    }
}
