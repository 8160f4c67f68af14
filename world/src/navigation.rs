//! Per-edge distance field maintained by the board.
//!
//! Every cell stores, for each of the four edges, the number of orthogonal
//! steps to the nearest cell of that edge through open cells. Cells walled
//! off from an edge receive provisional distances measured from a single
//! chosen cell of their pocket, which is where trapped units self-destruct.

use std::collections::VecDeque;

use terminal_sim_core::{Arena, CellCoord, EdgeDirection, ARENA_SIZE};

const UNKNOWN: i32 = -1;

/// Distances from one cell to each of the four edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DistanceCell {
    distance: [i32; 4],
    provisional: [bool; 4],
}

impl DistanceCell {
    const UNKNOWN: Self = Self {
        distance: [UNKNOWN; 4],
        provisional: [false; 4],
    };

    /// Steps to the requested edge, or `None` if no value was assigned.
    #[must_use]
    pub fn distance(&self, edge: EdgeDirection) -> Option<u32> {
        u32::try_from(self.distance[edge.index()]).ok()
    }

    /// Reports whether the distance is measured to a pocket seed rather than
    /// the edge itself.
    #[must_use]
    pub const fn is_provisional(&self, edge: EdgeDirection) -> bool {
        self.provisional[edge.index()]
    }
}

/// Dense distance field covering the whole arena.
#[derive(Clone, Debug)]
pub(crate) struct DistanceField {
    cells: Vec<DistanceCell>,
    queued: Vec<bool>,
    queue: VecDeque<CellCoord>,
}

impl DistanceField {
    pub(crate) fn new(arena: &Arena) -> Self {
        Self {
            cells: vec![DistanceCell::UNKNOWN; arena.slot_count()],
            queued: vec![false; arena.slot_count()],
            queue: VecDeque::new(),
        }
    }

    pub(crate) fn cell(&self, arena: &Arena, cell: CellCoord) -> Option<DistanceCell> {
        arena.index(cell).map(|index| self.cells[index])
    }

    /// Rebuilds every distance from the edges outwards.
    pub(crate) fn recompute<F>(&mut self, arena: &Arena, is_blocked: F)
    where
        F: Fn(CellCoord) -> bool,
    {
        self.cells.fill(DistanceCell::UNKNOWN);
        self.reset_queue();

        for edge in EdgeDirection::ALL {
            for &cell in arena.edge(edge) {
                let Some(index) = arena.index(cell) else {
                    continue;
                };
                self.cells[index].distance[edge.index()] = 0;
                if !is_blocked(cell) {
                    self.enqueue(index, cell);
                }
            }
        }
        self.propagate(arena, &is_blocked);

        let open: Vec<CellCoord> = arena.cells().filter(|cell| !is_blocked(*cell)).collect();
        self.fill_enclosures(arena, &is_blocked, &open);
    }

    /// Repairs the field after the blocking state of `changed` cells flipped.
    ///
    /// Opened cells are patched locally as long as every one of them ends up
    /// with a real distance to every edge. A newly blocked cell, or an opening
    /// that leaves a pocket behind, falls back to a full rebuild so that each
    /// pocket keeps exactly one seed.
    pub(crate) fn update<F>(&mut self, arena: &Arena, changed: &[CellCoord], is_blocked: F)
    where
        F: Fn(CellCoord) -> bool,
    {
        if changed.iter().any(|cell| is_blocked(*cell)) {
            self.recompute(arena, is_blocked);
            return;
        }

        self.reset_queue();
        for &cell in changed {
            if let Some(index) = arena.index(cell) {
                self.enqueue(index, cell);
            }
            for neighbor in cell.neighbors() {
                if is_blocked(neighbor) {
                    continue;
                }
                if let Some(index) = arena.index(neighbor) {
                    self.enqueue(index, neighbor);
                }
            }
        }
        self.propagate(arena, &is_blocked);

        let pocketed = changed.iter().any(|cell| {
            self.cell(arena, *cell).is_some_and(|distances| {
                EdgeDirection::ALL.into_iter().any(|edge| {
                    distances.distance(edge).is_none() || distances.is_provisional(edge)
                })
            })
        });
        if pocketed {
            self.recompute(arena, is_blocked);
        }
    }

    fn reset_queue(&mut self) {
        self.queue.clear();
        self.queued.fill(false);
    }

    fn enqueue(&mut self, index: usize, cell: CellCoord) {
        if !self.queued[index] {
            self.queued[index] = true;
            self.queue.push_back(cell);
        }
    }

    /// Relaxes neighbours until no value changes.
    ///
    /// Blocked cells receive values but never spread them.
    fn propagate<F>(&mut self, arena: &Arena, is_blocked: &F)
    where
        F: Fn(CellCoord) -> bool,
    {
        while let Some(cell) = self.queue.pop_front() {
            let Some(index) = arena.index(cell) else {
                continue;
            };
            self.queued[index] = false;
            let source = self.cells[index];

            for neighbor in cell.neighbors() {
                let Some(neighbor_index) = arena.index(neighbor) else {
                    continue;
                };
                let target = &mut self.cells[neighbor_index];
                let mut changed = false;
                for edge in EdgeDirection::ALL {
                    changed |= relax(&source, target, edge);
                }
                if changed && !is_blocked(neighbor) {
                    self.enqueue(neighbor_index, neighbor);
                }
            }
        }
    }

    /// Seeds pockets that no edge can reach.
    ///
    /// For each edge, the open candidate still lacking a distance that lies
    /// furthest towards that edge gets a provisional distance of one. Seeding
    /// repeats until every candidate has a value for every edge.
    fn fill_enclosures<F>(&mut self, arena: &Arena, is_blocked: &F, candidates: &[CellCoord])
    where
        F: Fn(CellCoord) -> bool,
    {
        loop {
            let mut seeds: [Option<(i32, CellCoord)>; 4] = [None; 4];
            for &cell in candidates {
                if is_blocked(cell) {
                    continue;
                }
                let Some(index) = arena.index(cell) else {
                    continue;
                };
                for edge in EdgeDirection::ALL {
                    if self.cells[index].distance[edge.index()] != UNKNOWN {
                        continue;
                    }
                    let rank = enclosure_rank(cell, edge);
                    let seed = &mut seeds[edge.index()];
                    if seed.map_or(true, |(best, _)| rank > best) {
                        *seed = Some((rank, cell));
                    }
                }
            }

            if seeds.iter().all(Option::is_none) {
                return;
            }

            for edge in EdgeDirection::ALL {
                let Some((_, cell)) = seeds[edge.index()] else {
                    continue;
                };
                if let Some(index) = arena.index(cell) {
                    self.cells[index].distance[edge.index()] = 1;
                    self.cells[index].provisional[edge.index()] = true;
                    self.enqueue(index, cell);
                }
            }
            self.propagate(arena, is_blocked);
        }
    }
}

/// Offers `source + 1` to `target` for one edge.
///
/// A value is accepted when the target has none, when it replaces a
/// provisional value with a real one, or when it is shorter within the same
/// class.
fn relax(source: &DistanceCell, target: &mut DistanceCell, edge: EdgeDirection) -> bool {
    let slot = edge.index();
    let from = source.distance[slot];
    if from == UNKNOWN {
        return false;
    }
    let candidate = from + 1;
    let provisional = source.provisional[slot];
    let current = target.distance[slot];
    let current_provisional = target.provisional[slot];

    let accept = current == UNKNOWN
        || (current_provisional && !provisional)
        || (current_provisional == provisional && candidate < current);
    if accept {
        target.distance[slot] = candidate;
        target.provisional[slot] = provisional;
    }
    accept
}

/// Preference for a pocket seed: furthest towards the edge by row, then by
/// column.
fn enclosure_rank(cell: CellCoord, edge: EdgeDirection) -> i32 {
    let row = if edge.towards_higher_row() {
        cell.row()
    } else {
        ARENA_SIZE - 1 - cell.row()
    };
    let column = if edge.towards_higher_column() {
        cell.column()
    } else {
        ARENA_SIZE - 1 - cell.column()
    };
    row * ARENA_SIZE + column
}
