use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use terminal_sim_core::{fixtures, CellCoord, Player, PlayerResources, UnitKind};
use terminal_sim_system_simulation::{Progress, Simulator};
use terminal_sim_world::query;

#[test]
fn deterministic_replay_produces_identical_logs() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(first.events.len() > 10);
}

#[test]
fn forked_runs_match_fresh_runs() {
    let base = scripted();
    let forked = record(base.fork());
    let fresh = record(scripted());
    assert_eq!(forked.fingerprint(), fresh.fingerprint());
}

fn scripted() -> Simulator {
    let players = [
        PlayerResources::new(30.0, 3.0, 8.0),
        PlayerResources::new(30.0, 6.0, 2.0),
    ];
    let mut simulator = Simulator::new(Arc::new(fixtures::config()), players, Player::First);
    for column in 8..20 {
        let kind = if column % 4 == 0 {
            UnitKind::Destructor
        } else {
            UnitKind::Filter
        };
        let _ = simulator
            .place(kind, CellCoord::new(column, 16), Player::Second)
            .expect("defence placed");
    }
    let _ = simulator
        .place(UnitKind::Encryptor, CellCoord::new(13, 4), Player::First)
        .expect("encryptor placed");
    let _ = simulator
        .place_many(UnitKind::Ping, CellCoord::new(13, 0), Player::First, 5)
        .expect("pings placed");
    let _ = simulator
        .place_many(UnitKind::Emp, CellCoord::new(14, 0), Player::First, 2)
        .expect("emps placed");
    simulator
}

fn replay() -> ReplayOutcome {
    record(scripted())
}

fn record(mut simulator: Simulator) -> ReplayOutcome {
    let max_frames = query::config(simulator.board()).rules().max_frames;
    let mut events = Vec::new();
    for _ in 0..max_frames {
        let progress = simulator.step_frame();
        events.extend(simulator.events().iter().map(|event| format!("{event:?}")));
        if progress == Progress::Finished {
            break;
        }
    }

    let (board, outcome) = simulator.run_to_completion();
    let units = query::units(&board)
        .map(|unit| format!("{:?} {:?} {}", unit.id(), unit.cell(), unit.stability()))
        .collect();
    ReplayOutcome {
        units,
        events,
        outcome: format!("{outcome:?}"),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    units: Vec<String>,
    events: Vec<String>,
    outcome: String,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
