//! Diamond arena geometry.
//!
//! The arena is a 28x28 grid clipped to a diamond: row `y` below the
//! horizon spans columns `13 - y ..= 14 + y`, and the upper half mirrors it.
//! Each of the four diagonal boundaries holds fourteen edge cells.

use std::slice;

use crate::{CellCoord, EdgeDirection};

/// Width and height of the square grid that encloses the diamond.
pub const ARENA_SIZE: i32 = 28;

/// Row and column at which the arena splits into halves and quadrants.
pub const HALF_ARENA: i32 = ARENA_SIZE / 2;

const SLOT_COUNT: usize = (ARENA_SIZE * ARENA_SIZE) as usize;

/// Slack added to every range so that diagonal neighbours at the nominal
/// radius are reachable.
pub const RANGE_TOLERANCE: f32 = 0.51;

const RADIUS_EPSILON: f32 = 1e-4;

/// Immutable arena geometry shared by every board built from a configuration.
#[derive(Clone, Debug)]
pub struct Arena {
    edges: [Vec<CellCoord>; 4],
    edge_mask: Vec<u8>,
    rings: Vec<RangeRings>,
}

impl Arena {
    /// Builds the arena and precomputes range rings for every provided radius.
    #[must_use]
    pub fn new(radii: impl IntoIterator<Item = f32>) -> Self {
        let edges = EdgeDirection::ALL.map(edge_cells);
        let mut edge_mask = vec![0u8; SLOT_COUNT];
        for direction in EdgeDirection::ALL {
            for cell in &edges[direction.index()] {
                if let Some(index) = slot(*cell) {
                    edge_mask[index] |= 1 << direction.index();
                }
            }
        }

        let mut rings: Vec<RangeRings> = Vec::new();
        for radius in radii {
            if rings
                .iter()
                .all(|existing| (existing.radius - radius).abs() > RADIUS_EPSILON)
            {
                rings.push(RangeRings::new(radius));
            }
        }

        Self {
            edges,
            edge_mask,
            rings,
        }
    }

    /// Reports whether the cell lies inside the diamond.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        in_bounds(cell)
    }

    /// Dense index of an in-bounds cell, suitable for flat per-cell storage.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        slot(cell)
    }

    /// Length of flat per-cell storage indexed by [`Arena::index`].
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        SLOT_COUNT
    }

    /// Every in-bounds cell in row-major order starting from the bottom row.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        (0..ARENA_SIZE)
            .flat_map(|row| (0..ARENA_SIZE).map(move |column| CellCoord::new(column, row)))
            .filter(|cell| in_bounds(*cell))
    }

    /// Cells lining the requested edge, ordered from the horizon outwards.
    #[must_use]
    pub fn edge(&self, direction: EdgeDirection) -> &[CellCoord] {
        &self.edges[direction.index()]
    }

    /// Reports whether the cell belongs to the requested edge.
    #[must_use]
    pub fn is_on_edge(&self, cell: CellCoord, direction: EdgeDirection) -> bool {
        slot(cell).is_some_and(|index| self.edge_mask[index] & (1 << direction.index()) != 0)
    }

    /// Precomputed rings for a radius listed at construction time.
    #[must_use]
    pub fn rings(&self, radius: f32) -> Option<&RangeRings> {
        self.rings
            .iter()
            .find(|rings| (rings.radius - radius).abs() <= RADIUS_EPSILON)
    }

    /// In-bounds cells within `radius` of `center`, nearest ring first.
    #[must_use]
    pub fn cells_in_range(&self, center: CellCoord, radius: f32) -> Vec<CellCoord> {
        match self.rings(radius) {
            Some(rings) => rings
                .cells_around(center)
                .filter(|cell| in_bounds(*cell))
                .collect(),
            None => {
                let rings = RangeRings::new(radius);
                rings
                    .cells_around(center)
                    .filter(|cell| in_bounds(*cell))
                    .collect()
            }
        }
    }

    /// Reports whether a Euclidean distance falls inside a nominal range.
    #[must_use]
    pub fn within_range(distance: f32, radius: f32) -> bool {
        distance < radius + RANGE_TOLERANCE
    }
}

/// Offsets within a radius grouped into rings of equal distance.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeRings {
    radius: f32,
    rings: Vec<Ring>,
}

impl RangeRings {
    /// Groups every offset within `radius` by exact distance, nearest first.
    #[must_use]
    pub fn new(radius: f32) -> Self {
        let reach = (radius.max(0.0) + RANGE_TOLERANCE).floor() as i32;
        let mut offsets = Vec::new();
        for columns in -reach..=reach {
            for rows in -reach..=reach {
                let squared = columns * columns + rows * rows;
                if Arena::within_range((squared as f32).sqrt(), radius) {
                    offsets.push((squared, columns, rows));
                }
            }
        }
        offsets.sort_by_key(|(squared, _, _)| *squared);

        let mut rings: Vec<Ring> = Vec::new();
        let mut current: Option<i32> = None;
        for (squared, columns, rows) in offsets {
            if current != Some(squared) {
                current = Some(squared);
                rings.push(Ring {
                    distance: (squared as f32).sqrt(),
                    offsets: Vec::new(),
                });
            }
            if let Some(ring) = rings.last_mut() {
                ring.offsets.push((columns, rows));
            }
        }

        Self { radius, rings }
    }

    /// Nominal radius the rings were built for.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Iterates over the rings from nearest to farthest.
    pub fn iter(&self) -> slice::Iter<'_, Ring> {
        self.rings.iter()
    }

    /// Every cell covered by the rings around `center`, nearest first.
    ///
    /// Cells outside the arena are included; callers filter them.
    pub fn cells_around(&self, center: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        self.rings
            .iter()
            .flat_map(move |ring| ring.cells_around(center))
    }
}

/// Set of offsets that share one exact distance from the centre.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    distance: f32,
    offsets: Vec<(i32, i32)>,
}

impl Ring {
    /// Euclidean distance shared by every offset in the ring.
    #[must_use]
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// Number of offsets in the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Reports whether the ring holds no offsets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Cells of the ring around `center`, including out-of-bounds ones.
    pub fn cells_around(&self, center: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        self.offsets
            .iter()
            .map(move |(columns, rows)| center.offset(*columns, *rows))
    }
}

fn in_bounds(cell: CellCoord) -> bool {
    let (column, row) = (cell.column(), cell.row());
    if !(0..ARENA_SIZE).contains(&row) {
        return false;
    }
    let half_width = if row < HALF_ARENA {
        row + 1
    } else {
        ARENA_SIZE - row
    };
    column >= HALF_ARENA - half_width && column < HALF_ARENA + half_width
}

fn slot(cell: CellCoord) -> Option<usize> {
    if in_bounds(cell) {
        usize::try_from(cell.row() * ARENA_SIZE + cell.column()).ok()
    } else {
        None
    }
}

fn edge_cells(direction: EdgeDirection) -> Vec<CellCoord> {
    (0..HALF_ARENA)
        .map(|n| match direction {
            EdgeDirection::TopRight => CellCoord::new(HALF_ARENA + n, ARENA_SIZE - 1 - n),
            EdgeDirection::TopLeft => CellCoord::new(HALF_ARENA - 1 - n, ARENA_SIZE - 1 - n),
            EdgeDirection::BottomLeft => CellCoord::new(HALF_ARENA - 1 - n, n),
            EdgeDirection::BottomRight => CellCoord::new(HALF_ARENA + n, n),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn diamond_holds_four_hundred_twenty_cells() {
        let arena = Arena::new([]);
        assert_eq!(arena.cells().count(), 420);
    }

    #[test]
    fn row_spans_match_the_diamond() {
        let arena = Arena::new([]);
        assert!(arena.contains(CellCoord::new(13, 0)));
        assert!(arena.contains(CellCoord::new(14, 0)));
        assert!(!arena.contains(CellCoord::new(12, 0)));
        assert!(!arena.contains(CellCoord::new(15, 0)));
        assert!(arena.contains(CellCoord::new(0, 13)));
        assert!(arena.contains(CellCoord::new(27, 14)));
        assert!(arena.contains(CellCoord::new(13, 27)));
        assert!(!arena.contains(CellCoord::new(15, 27)));
        assert!(!arena.contains(CellCoord::new(-1, 13)));
        assert!(!arena.contains(CellCoord::new(13, 28)));
    }

    #[test]
    fn every_edge_holds_fourteen_in_bounds_cells() {
        let arena = Arena::new([]);
        for direction in EdgeDirection::ALL {
            let across = EdgeDirection::ALL
                .into_iter()
                .find(|edge| {
                    edge.towards_higher_row() != direction.towards_higher_row()
                        && edge.towards_higher_column() != direction.towards_higher_column()
                })
                .expect("edge across the arena");
            let cells = arena.edge(direction);
            assert_eq!(cells.len(), 14);
            for cell in cells {
                assert!(arena.contains(*cell), "{cell:?} outside arena");
                assert!(arena.is_on_edge(*cell, direction));
                assert!(!arena.is_on_edge(*cell, across));
            }
        }
    }

    #[test]
    fn edges_touch_their_corners() {
        let arena = Arena::new([]);
        assert_eq!(arena.edge(EdgeDirection::TopRight)[0], CellCoord::new(14, 27));
        assert_eq!(arena.edge(EdgeDirection::TopLeft)[13], CellCoord::new(0, 14));
        assert_eq!(arena.edge(EdgeDirection::BottomLeft)[0], CellCoord::new(13, 0));
        assert_eq!(
            arena.edge(EdgeDirection::BottomRight)[13],
            CellCoord::new(27, 13)
        );
    }

    #[test]
    fn splash_rings_include_distance_two() {
        let rings = RangeRings::new(1.5);
        let distances: Vec<f32> = rings.iter().map(Ring::distance).collect();
        let sizes: Vec<usize> = rings.iter().map(Ring::len).collect();
        assert_eq!(distances, vec![0.0, 1.0, 2f32.sqrt(), 2.0]);
        assert_eq!(sizes, vec![1, 4, 4, 4]);
    }

    #[test]
    fn range_three_covers_thirty_seven_offsets() {
        let rings = RangeRings::new(3.0);
        assert_eq!(rings.iter().count(), 8);
        assert_eq!(rings.cells_around(CellCoord::new(0, 0)).count(), 37);
    }

    #[test]
    fn zero_range_covers_only_the_centre() {
        let rings = RangeRings::new(0.0);
        let cells: Vec<CellCoord> = rings.cells_around(CellCoord::new(5, 5)).collect();
        assert_eq!(cells, vec![CellCoord::new(5, 5)]);
    }

    #[test]
    fn duplicate_radii_share_rings() {
        let arena = Arena::new([3.0, 3.0, 1.5]);
        assert!(arena.rings(3.0).is_some());
        assert!(arena.rings(1.5).is_some());
        assert!(arena.rings(4.5).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn rings_are_sorted_and_within_range(radius in 0.0f32..6.0) {
            let rings = RangeRings::new(radius);
            let mut previous = -1.0f32;
            for ring in rings.iter() {
                prop_assert!(ring.distance() > previous);
                prop_assert!(Arena::within_range(ring.distance(), radius));
                previous = ring.distance();
            }
        }

        #[test]
        fn cells_in_range_stay_inside_the_arena(
            column in 0i32..28,
            row in 0i32..28,
            radius in 0.0f32..5.0,
        ) {
            let arena = Arena::new([radius]);
            let center = CellCoord::new(column, row);
            for cell in arena.cells_in_range(center, radius) {
                prop_assert!(arena.contains(cell));
                prop_assert!(Arena::within_range(cell.euclidean_distance(center), radius));
            }
        }
    }
}
