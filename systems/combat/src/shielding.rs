use terminal_sim_core::{Command, Event};
use terminal_sim_world::{query, Board};

/// Pure system that lets shield emitters charge friendly mobile units.
///
/// Each emitter charges a given unit at most once over the whole run.
#[derive(Clone, Debug, Default)]
pub struct Shielding {
    scratch: Vec<Command>,
}

impl Shielding {
    /// Emits `Command::ApplyShield` for every friendly mobile unit that
    /// entered an emitter's range and has not been charged by it yet.
    pub fn handle(&mut self, events: &[Event], board: &Board, out: &mut Vec<Command>) {
        if super::frame_started(events).is_none() {
            return;
        }

        self.scratch.clear();
        let config = query::config(board);
        for emitter in query::units(board) {
            let stats = config.stats(emitter.kind());
            if !emitter.is_stationary() || stats.shield_amount() <= 0.0 {
                continue;
            }
            for cell in config.arena().cells_in_range(emitter.cell(), stats.range()) {
                for unit in query::units_at(board, cell) {
                    if unit.is_stationary()
                        || unit.owner() != emitter.owner()
                        || emitter.has_charged(unit.id())
                    {
                        continue;
                    }
                    self.scratch.push(Command::ApplyShield {
                        emitter: emitter.id(),
                        unit: unit.id(),
                    });
                }
            }
        }

        out.append(&mut self.scratch);
    }
}
