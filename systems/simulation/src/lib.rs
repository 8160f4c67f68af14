#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame stepper that plays a board out until no mobile unit remains.
//!
//! A frame runs in fixed phases: the frame counter advances and shields
//! decay, mobile units move, breach or self-destruct, emitters hand out
//! shields, every attacker fires once against the board as the strikes
//! before it left it, and destroyed units leave the board.
//! [`Simulator`] wraps the phases together with the placement and query
//! operations a strategy layer needs to evaluate candidate boards.

mod idealness;

use std::sync::Arc;

use terminal_sim_core::{
    CellCoord, Command, EdgeDirection, Event, GameConfig, PlacementError, Player,
    PlayerResources, RemovalError, UnitId, UnitKind, UnitSeed,
};
use terminal_sim_system_combat::{Combat, Shielding};
use terminal_sim_system_movement::Movement;
use terminal_sim_world::{self as world, query, Board, Unit};
use tracing::{debug, info, warn};

pub use idealness::{idealness, score};

/// Reports whether a run needs further frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Mobile units remain on the board.
    Running,
    /// No mobile unit remains.
    Finished,
}

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// Frames simulated since the board was created.
    pub frames: u32,
    /// Idealness from the simulator's perspective.
    pub idealness: f32,
    /// Remaining health per player, indexed by [`Player::index`].
    pub health: [f32; 2],
    /// Edges breached by each player's units.
    pub breaches: [u32; 2],
    /// Units destroyed by damage, in destruction order.
    pub destroyed: Vec<UnitId>,
    /// `false` when the run was abandoned at the frame limit.
    pub finished: bool,
}

/// Deterministic simulator for one board.
///
/// Cloning through [`Simulator::fork`] yields an independent copy, so a
/// base board with its distance field can be reused for every candidate.
#[derive(Clone, Debug)]
pub struct Simulator {
    board: Board,
    perspective: Player,
    movement: Movement,
    shielding: Shielding,
    combat: Combat,
    events: Vec<Event>,
    commands: Vec<Command>,
    destroyed: Vec<UnitId>,
}

impl Simulator {
    /// Creates a simulator for an empty board.
    #[must_use]
    pub fn new(
        config: Arc<GameConfig>,
        players: [PlayerResources; 2],
        perspective: Player,
    ) -> Self {
        Self::from_board(Board::new(config, players), perspective)
    }

    /// Creates a simulator from a host snapshot.
    ///
    /// Seeds that cannot be placed are skipped; the rejections are kept in
    /// [`Simulator::events`].
    #[must_use]
    pub fn from_snapshot(
        config: Arc<GameConfig>,
        players: [PlayerResources; 2],
        seeds: &[UnitSeed],
        perspective: Player,
    ) -> Self {
        let mut events = Vec::new();
        let board = Board::with_units(config, players, seeds, &mut events);
        let mut simulator = Self::from_board(board, perspective);
        simulator.events = events;
        simulator
    }

    /// Wraps an existing board.
    #[must_use]
    pub fn from_board(board: Board, perspective: Player) -> Self {
        Self {
            board,
            perspective,
            movement: Movement::default(),
            shielding: Shielding::default(),
            combat: Combat::default(),
            events: Vec::new(),
            commands: Vec::new(),
            destroyed: Vec::new(),
        }
    }

    /// Places one unit. Mobile units head for the edge opposite the
    /// quadrant they start in.
    pub fn place(
        &mut self,
        kind: UnitKind,
        cell: CellCoord,
        owner: Player,
    ) -> Result<UnitId, PlacementError> {
        self.spawn(kind, cell, owner, None)
    }

    /// Places a mobile unit that walks towards `edge` instead of the
    /// default edge. Structures ignore `edge`.
    pub fn place_targeting(
        &mut self,
        kind: UnitKind,
        cell: CellCoord,
        owner: Player,
        edge: EdgeDirection,
    ) -> Result<UnitId, PlacementError> {
        self.spawn(kind, cell, owner, Some(edge))
    }

    /// Places `count` identical units on one cell.
    ///
    /// Stops at the first rejection and returns it; units placed before the
    /// rejection stay on the board.
    pub fn place_many(
        &mut self,
        kind: UnitKind,
        cell: CellCoord,
        owner: Player,
        count: u32,
    ) -> Result<Vec<UnitId>, PlacementError> {
        (0..count)
            .map(|_| self.spawn(kind, cell, owner, None))
            .collect()
    }

    /// Removes every unit on a cell and returns their identifiers.
    pub fn remove(&mut self, cell: CellCoord) -> Result<Vec<UnitId>, RemovalError> {
        let start = self.events.len();
        world::apply(
            &mut self.board,
            Command::RemoveUnits { cell },
            &mut self.events,
        );
        self.events[start..]
            .iter()
            .find_map(|event| match event {
                Event::UnitsRemoved { units, .. } => Some(Ok(units.clone())),
                Event::RemovalRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(RemovalError::Empty))
    }

    /// Steps from `cell` to `edge`, or `None` for cells without a value.
    #[must_use]
    pub fn distance_field(&self, edge: EdgeDirection, cell: CellCoord) -> Option<u32> {
        query::distance(&self.board, edge, cell)
    }

    /// Reports whether a structure stands on `cell`.
    #[must_use]
    pub fn is_occupied_by_structure(&self, cell: CellCoord) -> bool {
        query::is_occupied_by_structure(&self.board, cell)
    }

    /// Enemy structures able to fire on a mobile unit of `owner` at `cell`.
    #[must_use]
    pub fn attackers_threatening(&self, cell: CellCoord, owner: Player) -> Vec<&Unit> {
        query::attackers_threatening(&self.board, cell, owner)
    }

    /// Simulates one frame.
    ///
    /// Events of earlier frames are discarded; [`Simulator::events`] then
    /// holds only what this frame reported.
    pub fn step_frame(&mut self) -> Progress {
        if !query::has_mobile_units(&self.board) {
            return Progress::Finished;
        }

        self.events.clear();
        self.apply(Command::AdvanceFrame);

        self.movement
            .handle(&self.events, &self.board, &mut self.commands);
        self.flush();
        self.apply(Command::RemoveDestroyed);

        if query::has_mobile_units(&self.board) {
            self.shielding
                .handle(&self.events, &self.board, &mut self.commands);
            self.flush();
            self.combat.handle(&self.events, &self.board);
            while let Some(command) = self.combat.strike(&self.board) {
                self.apply(command);
            }
            self.apply(Command::RemoveDestroyed);
        }

        self.destroyed
            .extend(self.events.iter().filter_map(|event| match event {
                Event::UnitDestroyed { unit, .. } => Some(*unit),
                _ => None,
            }));
        debug!(
            frame = query::frame(&self.board),
            events = self.events.len(),
            "frame simulated"
        );
        if query::has_mobile_units(&self.board) {
            Progress::Running
        } else {
            Progress::Finished
        }
    }

    /// Simulates frames until no mobile unit remains or the frame limit of
    /// the rules is reached.
    #[must_use]
    pub fn run_to_completion(mut self) -> (Board, Outcome) {
        let max_frames = query::config(&self.board).rules().max_frames;
        let mut progress = if query::has_mobile_units(&self.board) {
            Progress::Running
        } else {
            Progress::Finished
        };
        while progress == Progress::Running && query::frame(&self.board) < max_frames {
            progress = self.step_frame();
        }

        let finished = progress == Progress::Finished;
        if !finished {
            warn!(max_frames, "run abandoned at the frame limit");
        }
        let outcome = self.outcome(finished);
        info!(
            frames = outcome.frames,
            idealness = outcome.idealness,
            destroyed = outcome.destroyed.len(),
            "run complete"
        );
        (self.board, outcome)
    }

    /// Independent copy of the simulator.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Board being simulated.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Events reported since the current frame began, including placements
    /// and removals made after it. Before the first frame, every event since
    /// the simulator was created.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Player whose advantage the idealness score measures.
    #[must_use]
    pub const fn perspective(&self) -> Player {
        self.perspective
    }

    /// Idealness of the current board.
    #[must_use]
    pub fn idealness(&self) -> f32 {
        idealness(&self.board, self.perspective)
    }

    fn spawn(
        &mut self,
        kind: UnitKind,
        cell: CellCoord,
        owner: Player,
        target: Option<EdgeDirection>,
    ) -> Result<UnitId, PlacementError> {
        let start = self.events.len();
        world::apply(
            &mut self.board,
            Command::PlaceUnit {
                kind,
                cell,
                owner,
                target,
                stability: None,
            },
            &mut self.events,
        );
        self.events[start..]
            .iter()
            .find_map(|event| match event {
                Event::UnitPlaced { unit, .. } => Some(Ok(*unit)),
                Event::PlacementRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(PlacementError::OutOfBounds))
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.board, command, &mut self.events);
    }

    fn flush(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.board, command, &mut self.events);
        }
    }

    fn outcome(&self, finished: bool) -> Outcome {
        Outcome {
            frames: query::frame(&self.board),
            idealness: self.idealness(),
            health: Player::ALL.map(|player| query::resources(&self.board, player).health),
            breaches: Player::ALL.map(|player| query::breaches(&self.board, player)),
            destroyed: self.destroyed.clone(),
            finished,
        }
    }
}
