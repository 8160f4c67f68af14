#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Terminal simulator on host files.

mod snapshot;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use terminal_sim_core::{EdgeDirection, Event, Player};
use terminal_sim_system_simulation::{Outcome, Simulator};
use terminal_sim_world::{query, Board};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Deterministic Terminal board simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Plays a board snapshot out and prints the outcome as JSON.
    Simulate {
        #[command(flatten)]
        inputs: Inputs,
        /// Player whose advantage the idealness score measures (0 or 1).
        #[arg(long, default_value_t = 0)]
        perspective: u8,
    },
    /// Prints one edge's distance field for a board snapshot.
    Field {
        #[command(flatten)]
        inputs: Inputs,
        /// Edge the distances lead to.
        #[arg(long, value_enum)]
        edge: EdgeArg,
    },
}

#[derive(clap::Args)]
struct Inputs {
    /// Host game configuration holding `unitInformation`.
    #[arg(long)]
    config: PathBuf,
    /// Board snapshot in JSON.
    #[arg(long)]
    board: PathBuf,
    /// Optional TOML file overriding the simulation rules.
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EdgeArg {
    TopRight,
    TopLeft,
    BottomLeft,
    BottomRight,
}

impl From<EdgeArg> for EdgeDirection {
    fn from(edge: EdgeArg) -> Self {
        match edge {
            EdgeArg::TopRight => Self::TopRight,
            EdgeArg::TopLeft => Self::TopLeft,
            EdgeArg::BottomLeft => Self::BottomLeft,
            EdgeArg::BottomRight => Self::BottomRight,
        }
    }
}

/// Entry point for the Terminal simulator command-line interface.
fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().command {
        CliCommand::Simulate {
            inputs,
            perspective,
        } => simulate(&inputs, perspective),
        CliCommand::Field { inputs, edge } => field(&inputs, edge.into()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(inputs: &Inputs, perspective: Player) -> Result<Simulator> {
    let config = snapshot::load_config(&inputs.config, inputs.rules.as_deref())?;
    let board = snapshot::load_board(&inputs.board)?;
    let seeds = board
        .seeds(&config)
        .with_context(|| format!("invalid board {}", inputs.board.display()))?;

    let simulator = Simulator::from_snapshot(
        Arc::new(config),
        board.resources(),
        &seeds,
        perspective,
    );
    for event in simulator.events() {
        if let Event::PlacementRejected { kind, cell, reason } = event {
            warn!(?kind, ?cell, %reason, "snapshot unit skipped");
        }
    }
    info!(units = seeds.len(), "board loaded");
    Ok(simulator)
}

fn simulate(inputs: &Inputs, perspective: u8) -> Result<()> {
    let perspective = Player::try_from(perspective).context("invalid perspective")?;
    let simulator = load(inputs, perspective)?;
    let (board, outcome) = simulator.run_to_completion();
    let report = Report::new(&board, &outcome);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn field(inputs: &Inputs, edge: EdgeDirection) -> Result<()> {
    let simulator = load(inputs, Player::First)?;
    print!("{}", query::render_distance_field(simulator.board(), edge));
    Ok(())
}

#[derive(Debug, Serialize)]
struct Report {
    frames: u32,
    finished: bool,
    idealness: f32,
    health: [f32; 2],
    breaches: [u32; 2],
    destroyed: Vec<u32>,
    survivors: Vec<Survivor>,
}

#[derive(Debug, Serialize)]
struct Survivor {
    id: u32,
    kind: String,
    owner: u8,
    cell: [i32; 2],
    stability: f32,
}

impl Report {
    fn new(board: &Board, outcome: &Outcome) -> Self {
        let config = query::config(board);
        let survivors = query::units(board)
            .map(|unit| Survivor {
                id: unit.id().get(),
                kind: config.stats(unit.kind()).shorthand().to_owned(),
                owner: unit.owner().into(),
                cell: [unit.cell().column(), unit.cell().row()],
                stability: unit.stability(),
            })
            .collect();
        Self {
            frames: outcome.frames,
            finished: outcome.finished,
            idealness: outcome.idealness,
            health: outcome.health,
            breaches: outcome.breaches,
            destroyed: outcome.destroyed.iter().map(|unit| unit.get()).collect(),
            survivors,
        }
    }
}
