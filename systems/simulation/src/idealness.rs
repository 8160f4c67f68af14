//! Scalar evaluation of a board from one player's point of view.

use terminal_sim_core::Player;
use terminal_sim_world::{query, Board};

/// Weighted sum of a player's structures, banked resources and health.
#[must_use]
pub fn score(board: &Board, player: Player) -> f32 {
    let valuation = query::valuation(board, player);
    let weights = query::config(board).rules().idealness;
    weights.structure_value * valuation.structure_value
        + weights.cores * valuation.cores
        + weights.bits * valuation.bits
        + weights.health * valuation.health
}

/// Score of `perspective` minus the score of its opponent.
///
/// Swapping the perspective negates the result exactly.
#[must_use]
pub fn idealness(board: &Board, perspective: Player) -> f32 {
    score(board, perspective) - score(board, perspective.opponent())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use terminal_sim_core::{fixtures, PlayerResources, UnitKind, UnitSeed, CellCoord};

    #[test]
    fn weights_every_component() {
        let players = [
            PlayerResources::new(30.0, 4.0, 6.0),
            PlayerResources::new(20.0, 0.0, 0.0),
        ];
        let seeds = [UnitSeed {
            kind: UnitKind::Destructor,
            owner: Player::First,
            cell: CellCoord::new(13, 5),
            stability: None,
        }];
        let mut events = Vec::new();
        let board = Board::with_units(Arc::new(fixtures::config()), players, &seeds, &mut events);

        // 0.75 * 3 + 1.0 * 4 + 0.5 * 6 + 2.0 * 30
        assert!((score(&board, Player::First) - 69.25).abs() < 1e-4);
        assert!((score(&board, Player::Second) - 40.0).abs() < 1e-4);
        assert!((idealness(&board, Player::First) - 29.25).abs() < 1e-4);
        assert_eq!(
            idealness(&board, Player::First),
            -idealness(&board, Player::Second)
        );
    }
}
