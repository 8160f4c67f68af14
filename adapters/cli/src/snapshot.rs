//! Host file formats: the unit table and board snapshots.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use terminal_sim_core::{
    CellCoord, GameConfig, Player, PlayerResources, Rules, UnitInformation, UnitSeed,
};
use thiserror::Error;

/// Game configuration as the host publishes it. Unknown sections are ignored.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HostConfig {
    pub(crate) unit_information: Vec<UnitInformation>,
}

/// Board state to simulate.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BoardSnapshot {
    pub(crate) players: [PlayerSnapshot; 2],
    #[serde(default)]
    pub(crate) units: Vec<UnitSnapshot>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlayerSnapshot {
    pub(crate) health: f32,
    #[serde(default)]
    pub(crate) cores: f32,
    #[serde(default)]
    pub(crate) bits: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnitSnapshot {
    /// Shorthand from the unit table, such as `PI`.
    pub(crate) kind: String,
    pub(crate) owner: u8,
    pub(crate) cell: [i32; 2],
    #[serde(default)]
    pub(crate) stability: Option<f32>,
}

/// Errors raised while turning a snapshot into board seeds.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum SnapshotError {
    #[error("unit {index} uses unknown shorthand `{shorthand}`")]
    UnknownShorthand { index: usize, shorthand: String },
    #[error("unit {index} has owner {owner}; expected 0 or 1")]
    InvalidOwner { index: usize, owner: u8 },
}

impl BoardSnapshot {
    pub(crate) fn resources(&self) -> [PlayerResources; 2] {
        self.players
            .map(|player| PlayerResources::new(player.health, player.cores, player.bits))
    }

    pub(crate) fn seeds(&self, config: &GameConfig) -> Result<Vec<UnitSeed>, SnapshotError> {
        self.units
            .iter()
            .enumerate()
            .map(|(index, unit)| {
                let kind = config.kind_for_shorthand(&unit.kind).ok_or_else(|| {
                    SnapshotError::UnknownShorthand {
                        index,
                        shorthand: unit.kind.clone(),
                    }
                })?;
                let owner = Player::try_from(unit.owner).map_err(|_| SnapshotError::InvalidOwner {
                    index,
                    owner: unit.owner,
                })?;
                Ok(UnitSeed {
                    kind,
                    owner,
                    cell: CellCoord::new(unit.cell[0], unit.cell[1]),
                    stability: unit.stability,
                })
            })
            .collect()
    }
}

/// Loads and validates the unit table, with optional TOML rule overrides.
pub(crate) fn load_config(path: &Path, rules: Option<&Path>) -> Result<GameConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read unit table {}", path.display()))?;
    let host: HostConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse unit table {}", path.display()))?;

    let rules = match rules {
        Some(rules) => {
            let text = fs::read_to_string(rules)
                .with_context(|| format!("failed to read rules {}", rules.display()))?;
            toml::from_str::<Rules>(&text)
                .with_context(|| format!("failed to parse rules {}", rules.display()))?
        }
        None => Rules::default(),
    };

    GameConfig::new(&host.unit_information, rules).context("invalid unit table")
}

/// Loads a board snapshot.
pub(crate) fn load_board(path: &Path) -> Result<BoardSnapshot> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read board {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse board {}", path.display()))
}
