//! Per-player valuation snapshots sourced from the authoritative board.

use terminal_sim_core::Player;

use crate::Board;

/// Inputs of the idealness score for one player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Valuation {
    /// Summed purchase cost of the player's structures on the board.
    pub structure_value: f32,
    /// Banked cores.
    pub cores: f32,
    /// Banked bits.
    pub bits: f32,
    /// Remaining health.
    pub health: f32,
}

pub(crate) fn snapshot(board: &Board, player: Player) -> Valuation {
    let resources = board.players[player.index()];
    Valuation {
        structure_value: structure_value(board, player),
        cores: resources.cores,
        bits: resources.bits,
        health: resources.health,
    }
}

fn structure_value(board: &Board, player: Player) -> f32 {
    board
        .units
        .iter()
        .filter(|unit| unit.is_stationary() && unit.owner() == player)
        .map(|unit| board.config.stats(unit.kind()).cost())
        .sum()
}
