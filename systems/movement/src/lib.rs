#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that walks mobile units towards their edges.
//!
//! Every decision of a frame is taken against the board as it stood when the
//! frame began, so the order in which units are visited never changes the
//! outcome. Commands are emitted in three batches: steps, then breaches, then
//! self-destructs, each batch in unit identifier order.

use terminal_sim_core::{Axis, CellCoord, Command, EdgeDirection, Event, Rules};
use terminal_sim_world::{query, Board, Unit};

/// Pure system that reacts to frame events and emits movement commands.
#[derive(Clone, Debug, Default)]
pub struct Movement {
    steps: Vec<Command>,
    breaches: Vec<Command>,
    detonations: Vec<Command>,
}

impl Movement {
    /// Emits movement commands for every unit scheduled to move this frame.
    ///
    /// Does nothing unless `events` announce a new frame.
    pub fn handle(&mut self, events: &[Event], board: &Board, out: &mut Vec<Command>) {
        let Some(frame) = events.iter().find_map(|event| match event {
            Event::FrameAdvanced { frame } => Some(*frame),
            _ => None,
        }) else {
            return;
        };

        self.steps.clear();
        self.breaches.clear();
        self.detonations.clear();

        let config = query::config(board);
        let arena = config.arena();
        for unit in query::mobile_units(board) {
            if !moves_on(board, unit, frame) {
                continue;
            }
            let Some(edge) = unit.target_edge() else {
                continue;
            };
            let Some(here) = query::distance_cell(board, unit.cell()) else {
                continue;
            };

            if here.distance(edge) == Some(1) && here.is_provisional(edge) {
                self.detonations
                    .push(Command::SelfDestruct { unit: unit.id() });
            } else if arena.is_on_edge(unit.cell(), edge) {
                self.breaches.push(Command::BreachEdge { unit: unit.id() });
            } else if let Some(to) = plan_step(board, unit, edge, config.rules()) {
                self.steps.push(Command::StepUnit {
                    unit: unit.id(),
                    to,
                });
            }
        }

        out.append(&mut self.steps);
        out.append(&mut self.breaches);
        out.append(&mut self.detonations);
    }
}

/// Reports whether `unit` is scheduled to move on `frame`.
///
/// A unit with speed `s` moves on every frame divisible by `round(1 / s)`.
#[must_use]
pub fn moves_on(board: &Board, unit: &Unit, frame: u32) -> bool {
    query::config(board)
        .stats(unit.kind())
        .move_period()
        .is_some_and(|period| frame % period == 0)
}

/// Chooses the neighbour a unit steps onto, if any.
///
/// Only neighbours that do not increase the distance to the target edge
/// qualify, and the largest decrease always wins. Among equal decreases,
/// switching axis and heading towards the edge earn bonuses. Remaining ties
/// go to the first neighbour in up, down, left, right order.
#[must_use]
pub fn plan_step(
    board: &Board,
    unit: &Unit,
    edge: EdgeDirection,
    rules: &Rules,
) -> Option<CellCoord> {
    let arena = query::config(board).arena();
    let current = query::distance(board, edge, unit.cell())?;
    let mut best: Option<Candidate> = None;

    for neighbor in unit.cell().neighbors() {
        if !arena.contains(neighbor) || query::is_occupied_by_structure(board, neighbor) {
            continue;
        }
        let Some(distance) = query::distance(board, edge, neighbor) else {
            continue;
        };
        if distance > current {
            continue;
        }

        let candidate = Candidate {
            cell: neighbor,
            decrease: current - distance,
            bonus: tie_break_bonus(unit.cell(), unit.last_axis(), neighbor, edge, rules),
        };
        best = Some(match best {
            Some(existing) if !candidate.is_better_than(existing) => existing,
            _ => candidate,
        });
    }

    best.map(|candidate| candidate.cell)
}

fn tie_break_bonus(
    from: CellCoord,
    last_axis: Axis,
    to: CellCoord,
    edge: EdgeDirection,
    rules: &Rules,
) -> f32 {
    let signed = |favoured: bool, amount: f32| if favoured { amount } else { -amount };

    let axis = signed(
        from.axis_towards(to) != last_axis,
        rules.axis_alternation_bonus,
    );
    let horizontal = signed(
        (to.column() > from.column()) == edge.towards_higher_column(),
        rules.orientation_bonus,
    );
    let vertical = signed(
        (to.row() > from.row()) == edge.towards_higher_row(),
        rules.orientation_bonus,
    );
    axis + horizontal + vertical
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cell: CellCoord,
    decrease: u32,
    bonus: f32,
}

impl Candidate {
    fn is_better_than(self, other: Candidate) -> bool {
        self.decrease > other.decrease || (self.decrease == other.decrease && self.bonus > other.bonus)
    }
}
