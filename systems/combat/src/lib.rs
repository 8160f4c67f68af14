#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Systems that emit the shield and attack commands of a frame.
//!
//! Attackers fire one at a time in a fixed order, each choosing its target
//! from the board as the previous strikes left it. Units already drained to
//! zero stability are never chosen, but they still fire on the frame they
//! are destroyed.

mod shielding;

use std::collections::{BTreeSet, VecDeque};

use terminal_sim_core::{Command, Event, UnitId};
use terminal_sim_system_movement::moves_on;
use terminal_sim_system_targeting::{resolve, SearchFloors};
use terminal_sim_world::{query, Board, Unit};
use tracing::debug;

pub use shielding::Shielding;

/// Combat system that lines up the attackers of a frame and resolves them
/// one strike at a time.
#[derive(Clone, Debug, Default)]
pub struct Combat {
    frame: u32,
    mobiles_moved: bool,
    sentries: BTreeSet<UnitId>,
    roster: VecDeque<UnitId>,
}

impl Combat {
    /// Lines up the attackers of a new frame: every mobile unit in
    /// identifier order, followed by every structure that has an enemy
    /// mobile unit inside its range.
    ///
    /// Does nothing unless `events` announce a new frame.
    pub fn handle(&mut self, events: &[Event], board: &Board) {
        let Some(frame) = frame_started(events) else {
            return;
        };

        self.frame = frame;
        self.sentries.clear();
        self.roster.clear();

        self.mobiles_moved = query::mobile_units(board).any(|unit| moves_on(board, unit, frame));
        for unit in query::mobile_units(board) {
            self.roster.push_back(unit.id());
            self.sentries.extend(
                query::attackers_threatening(board, unit.cell(), unit.owner())
                    .into_iter()
                    .map(Unit::id),
            );
        }
        self.roster.extend(self.sentries.iter().copied());

        debug!(
            frame,
            attackers = self.roster.len(),
            sentries = self.sentries.len(),
            "attackers lined up"
        );
    }

    /// Resolves the next attacker against the current board.
    ///
    /// Returns `Command::Attack` or `Command::ForgetTarget`, or `None` once
    /// every attacker of the frame has fired. The command must be applied
    /// before the next call so that later attackers see its damage.
    pub fn strike(&mut self, board: &Board) -> Option<Command> {
        while let Some(id) = self.roster.pop_front() {
            let Some(attacker) = query::unit(board, id) else {
                continue;
            };
            let moved = moves_on(board, attacker, self.frame);
            return Some(engage(board, attacker, moved, self.mobiles_moved));
        }
        None
    }
}

fn engage(board: &Board, attacker: &Unit, attacker_moved: bool, mobiles_moved: bool) -> Command {
    let range = query::config(board).stats(attacker.kind()).range();
    let floors = SearchFloors::derive(attacker.memory(), range, attacker_moved, mobiles_moved);
    match resolve(board, attacker, floors) {
        Some(choice) => Command::Attack {
            attacker: attacker.id(),
            target: choice.unit,
            distance: choice.distance,
        },
        None => Command::ForgetTarget {
            attacker: attacker.id(),
        },
    }
}

fn frame_started(events: &[Event]) -> Option<u32> {
    events.iter().find_map(|event| match event {
        Event::FrameAdvanced { frame } => Some(*frame),
        _ => None,
    })
}
