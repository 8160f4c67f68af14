use std::sync::Arc;

use proptest::prelude::*;
use terminal_sim_core::{fixtures, CellCoord, Player, PlayerResources, UnitKind, UnitSeed};
use terminal_sim_system_simulation::Simulator;
use terminal_sim_world::query;

const PLAYERS: [PlayerResources; 2] = [PlayerResources::new(30.0, 0.0, 0.0); 2];

prop_compose! {
    fn arb_board()(
        walls in prop::collection::vec((0i32..28, 0i32..28), 0..60),
        attackers in prop::collection::vec((0i32..28, 0i32..14, 0usize..3), 1..6),
    ) -> Vec<UnitSeed> {
        let mobiles = [UnitKind::Ping, UnitKind::Emp, UnitKind::Scrambler];
        let walls = walls.into_iter().map(|(column, row)| UnitSeed {
            kind: if row % 3 == 0 { UnitKind::Destructor } else { UnitKind::Filter },
            owner: if row < 14 { Player::First } else { Player::Second },
            cell: CellCoord::new(column, row),
            stability: None,
        });
        let attackers = attackers.into_iter().map(|(column, row, kind)| UnitSeed {
            kind: mobiles[kind],
            owner: Player::First,
            cell: CellCoord::new(column, row),
            stability: None,
        });
        walls.chain(attackers).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_run_finishes(seeds in arb_board()) {
        let simulator = Simulator::from_snapshot(
            Arc::new(fixtures::config()),
            PLAYERS,
            &seeds,
            Player::First,
        );
        let (board, outcome) = simulator.run_to_completion();
        prop_assert!(outcome.finished);
        prop_assert!(!query::has_mobile_units(&board));
        for destroyed in &outcome.destroyed {
            prop_assert!(query::unit(&board, *destroyed).is_none());
        }
    }

    #[test]
    fn swapping_perspective_negates_idealness(seeds in arb_board()) {
        let config = Arc::new(fixtures::config());
        let mine = Simulator::from_snapshot(Arc::clone(&config), PLAYERS, &seeds, Player::First)
            .run_to_completion()
            .1;
        let theirs = Simulator::from_snapshot(config, PLAYERS, &seeds, Player::Second)
            .run_to_completion()
            .1;
        prop_assert_eq!(mine.idealness, -theirs.idealness);
    }
}
