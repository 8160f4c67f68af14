//! Unit configuration table and simulation rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Arena, UnitKind, ARENA_SIZE};

/// Single entry of the host's `unitInformation` table.
///
/// Entries are positional: index `0` describes filters, `1` encryptors and so
/// on in [`UnitKind::ALL`] order. Fields the host omits stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitInformation {
    /// Two-letter code the host uses to name the kind.
    pub shorthand: Option<String>,
    /// Maximum hit points.
    pub stability: Option<f32>,
    /// Purchase price.
    pub cost: Option<f32>,
    /// Attack or shield range.
    pub range: Option<f32>,
    /// Tiles moved per frame for mobile kinds.
    pub speed: Option<f32>,
    /// Damage dealt by structures.
    pub damage: Option<f32>,
    /// Damage dealt by mobile kinds to structures.
    #[serde(rename = "damageF")]
    pub damage_f: Option<f32>,
    /// Damage dealt by mobile kinds to other mobile units.
    #[serde(rename = "damageI")]
    pub damage_i: Option<f32>,
    /// Shield charge granted by emitters.
    pub shield_amount: Option<f32>,
}

/// Validated statistics for one unit kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    kind: UnitKind,
    shorthand: String,
    stability: f32,
    cost: f32,
    range: f32,
    speed: f32,
    damage_to_structures: f32,
    damage_to_mobiles: f32,
    shield_amount: f32,
}

impl UnitStats {
    fn from_information(kind: UnitKind, info: &UnitInformation) -> Result<Self, ConfigError> {
        let stability = info.stability.ok_or(ConfigError::MissingField {
            kind,
            field: "stability",
        })?;
        let speed = if kind.is_stationary() {
            0.0
        } else {
            info.speed
                .ok_or(ConfigError::MissingField { kind, field: "speed" })?
        };
        let (damage_to_structures, damage_to_mobiles) = if kind.is_stationary() {
            (0.0, info.damage.or(info.damage_i).unwrap_or(0.0))
        } else {
            (
                info.damage_f.or(info.damage).unwrap_or(0.0),
                info.damage_i.or(info.damage).unwrap_or(0.0),
            )
        };

        let stats = Self {
            kind,
            shorthand: info
                .shorthand
                .clone()
                .unwrap_or_else(|| default_shorthand(kind).to_owned()),
            stability,
            cost: info.cost.unwrap_or(0.0),
            range: info.range.unwrap_or(0.0),
            speed,
            damage_to_structures,
            damage_to_mobiles,
            shield_amount: info.shield_amount.unwrap_or(0.0),
        };
        stats.validate()?;
        Ok(stats)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("stability", self.stability),
            ("cost", self.cost),
            ("range", self.range),
            ("speed", self.speed),
            ("damageF", self.damage_to_structures),
            ("damageI", self.damage_to_mobiles),
            ("shieldAmount", self.shield_amount),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    kind: self.kind,
                    field,
                    value,
                });
            }
        }
        if self.stability <= 0.0 {
            return Err(self.invalid("stability", self.stability));
        }
        if !self.kind.is_stationary() && self.speed <= 0.0 {
            return Err(self.invalid("speed", self.speed));
        }
        if self.range > ARENA_SIZE as f32 {
            return Err(self.invalid("range", self.range));
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str, value: f32) -> ConfigError {
        ConfigError::InvalidValue {
            kind: self.kind,
            field,
            value,
        }
    }

    /// Kind described by the statistics.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Two-letter code the host uses for the kind.
    #[must_use]
    pub fn shorthand(&self) -> &str {
        &self.shorthand
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn stability(&self) -> f32 {
        self.stability
    }

    /// Purchase price.
    #[must_use]
    pub const fn cost(&self) -> f32 {
        self.cost
    }

    /// Attack or shield range.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Tiles per frame. Zero for structures.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Damage dealt to structures per attack.
    #[must_use]
    pub const fn damage_to_structures(&self) -> f32 {
        self.damage_to_structures
    }

    /// Damage dealt to mobile units per attack.
    #[must_use]
    pub const fn damage_to_mobiles(&self) -> f32 {
        self.damage_to_mobiles
    }

    /// Damage dealt to a target of the given class.
    #[must_use]
    pub const fn damage_against(&self, class: crate::TargetClass) -> f32 {
        match class {
            crate::TargetClass::Mobile => self.damage_to_mobiles,
            crate::TargetClass::Structure => self.damage_to_structures,
        }
    }

    /// Shield charge granted to each friendly mobile unit in range.
    #[must_use]
    pub const fn shield_amount(&self) -> f32 {
        self.shield_amount
    }

    /// Number of frames between moves, or `None` for structures.
    ///
    /// A unit moves on every frame that is a multiple of its period.
    #[must_use]
    pub fn move_period(&self) -> Option<u32> {
        if self.kind.is_stationary() {
            return None;
        }
        let period = (1.0 / self.speed).round();
        Some(if period >= 1.0 { period as u32 } else { 1 })
    }
}

/// Weights of the idealness score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdealnessWeights {
    /// Weight applied to the summed cost of structures on the board.
    pub structure_value: f32,
    /// Weight applied to banked cores.
    pub cores: f32,
    /// Weight applied to banked bits.
    pub bits: f32,
    /// Weight applied to remaining health.
    pub health: f32,
}

impl Default for IdealnessWeights {
    fn default() -> Self {
        Self {
            structure_value: 0.75,
            cores: 1.0,
            bits: 0.5,
            health: 2.0,
        }
    }
}

/// Tunable constants of the frame stepper.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    /// Shield charge lost by every mobile unit at the start of each frame.
    pub shield_decay_per_frame: f32,
    /// Health removed from the defender when an edge is breached.
    pub breach_damage: f32,
    /// Radius of the splash dealt by a self-destructing unit.
    pub self_destruct_radius: f32,
    /// Tiles a unit must have walked before its self-destruct deals damage.
    pub self_destruct_min_tiles: u32,
    /// Frame count after which a run is abandoned.
    pub max_frames: u32,
    /// Movement bonus for switching axis relative to the previous step.
    pub axis_alternation_bonus: f32,
    /// Movement bonus per axis for stepping towards the target edge.
    pub orientation_bonus: f32,
    /// Weights of the idealness score.
    pub idealness: IdealnessWeights,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            shield_decay_per_frame: 0.15,
            breach_damage: 1.0,
            self_destruct_radius: 1.5,
            self_destruct_min_tiles: 5,
            max_frames: 4096,
            axis_alternation_bonus: 0.5,
            orientation_bonus: 0.05,
            idealness: IdealnessWeights::default(),
        }
    }
}

impl Rules {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("shield_decay_per_frame", self.shield_decay_per_frame),
            ("breach_damage", self.breach_damage),
            ("self_destruct_radius", self.self_destruct_radius),
            ("axis_alternation_bonus", self.axis_alternation_bonus),
            ("orientation_bonus", self.orientation_bonus),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRule { field, value });
            }
        }
        if self.max_frames == 0 {
            return Err(ConfigError::InvalidRule {
                field: "max_frames",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Immutable context shared by every board built for one game.
#[derive(Clone, Debug)]
pub struct GameConfig {
    units: Vec<UnitStats>,
    rules: Rules,
    arena: Arena,
}

impl GameConfig {
    /// Validates the host's unit table and rules and precomputes geometry.
    ///
    /// Entries beyond the six known kinds, such as the host's removal
    /// pseudo-unit, are ignored.
    pub fn new(table: &[UnitInformation], rules: Rules) -> Result<Self, ConfigError> {
        if table.len() < UnitKind::ALL.len() {
            return Err(ConfigError::MissingKinds {
                found: table.len(),
                expected: UnitKind::ALL.len(),
            });
        }
        rules.validate()?;

        let units = UnitKind::ALL
            .into_iter()
            .zip(table)
            .map(|(kind, info)| UnitStats::from_information(kind, info))
            .collect::<Result<Vec<_>, _>>()?;

        for (index, stats) in units.iter().enumerate() {
            if units[..index]
                .iter()
                .any(|other| other.shorthand == stats.shorthand)
            {
                return Err(ConfigError::DuplicateShorthand(stats.shorthand.clone()));
            }
        }

        let radii = units
            .iter()
            .map(UnitStats::range)
            .chain(std::iter::once(rules.self_destruct_radius));
        let arena = Arena::new(radii);

        Ok(Self {
            units,
            rules,
            arena,
        })
    }

    /// Statistics of the requested kind.
    #[must_use]
    pub fn stats(&self, kind: UnitKind) -> &UnitStats {
        &self.units[kind.index()]
    }

    /// Kind whose shorthand matches `code`.
    #[must_use]
    pub fn kind_for_shorthand(&self, code: &str) -> Option<UnitKind> {
        self.units
            .iter()
            .find(|stats| stats.shorthand == code)
            .map(UnitStats::kind)
    }

    /// Simulation rules.
    #[must_use]
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Arena geometry with rings for every configured range.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Longest range among structures that deal damage to mobile units.
    #[must_use]
    pub fn max_structure_range(&self) -> f32 {
        self.units
            .iter()
            .filter(|stats| stats.kind.is_stationary() && stats.damage_to_mobiles > 0.0)
            .map(UnitStats::range)
            .fold(0.0, f32::max)
    }
}

fn default_shorthand(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Filter => "FF",
        UnitKind::Encryptor => "EF",
        UnitKind::Destructor => "DF",
        UnitKind::Ping => "PI",
        UnitKind::Emp => "EI",
        UnitKind::Scrambler => "SI",
    }
}

/// Errors raised while validating the unit table or rules.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The table does not describe every unit kind.
    #[error("unit table lists {found} entries but {expected} unit kinds are required")]
    MissingKinds {
        /// Number of entries supplied.
        found: usize,
        /// Number of entries required.
        expected: usize,
    },
    /// A required field is absent.
    #[error("{kind:?} entry is missing `{field}`")]
    MissingField {
        /// Kind whose entry is incomplete.
        kind: UnitKind,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A field holds a negative, non-finite or out-of-range value.
    #[error("{kind:?} has invalid {field}: {value}")]
    InvalidValue {
        /// Kind whose entry is invalid.
        kind: UnitKind,
        /// Name of the offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
    /// Two kinds share a shorthand, making snapshots ambiguous.
    #[error("shorthand `{0}` is used by more than one unit kind")]
    DuplicateShorthand(String),
    /// A rule holds a negative or non-finite value.
    #[error("rule `{field}` has invalid value {value}")]
    InvalidRule {
        /// Name of the offending rule.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TargetClass;

    fn entry(stability: f32, range: f32, speed: Option<f32>) -> UnitInformation {
        UnitInformation {
            stability: Some(stability),
            cost: Some(1.0),
            range: Some(range),
            speed,
            damage: Some(4.0),
            damage_f: Some(1.0),
            damage_i: Some(2.0),
            ..UnitInformation::default()
        }
    }

    fn table() -> Vec<UnitInformation> {
        vec![
            entry(60.0, 0.0, None),
            entry(30.0, 3.0, None),
            entry(75.0, 3.0, None),
            entry(15.0, 3.0, Some(1.0)),
            entry(5.0, 5.0, Some(0.5)),
            entry(40.0, 3.0, Some(0.25)),
        ]
    }

    #[test]
    fn structures_only_damage_mobile_units() {
        let config = GameConfig::new(&table(), Rules::default()).expect("valid table");
        let destructor = config.stats(UnitKind::Destructor);
        assert_eq!(destructor.damage_against(TargetClass::Mobile), 4.0);
        assert_eq!(destructor.damage_against(TargetClass::Structure), 0.0);
        let ping = config.stats(UnitKind::Ping);
        assert_eq!(ping.damage_against(TargetClass::Structure), 1.0);
        assert_eq!(ping.damage_against(TargetClass::Mobile), 2.0);
    }

    #[test]
    fn move_period_rounds_inverse_speed() {
        let config = GameConfig::new(&table(), Rules::default()).expect("valid table");
        assert_eq!(config.stats(UnitKind::Ping).move_period(), Some(1));
        assert_eq!(config.stats(UnitKind::Emp).move_period(), Some(2));
        assert_eq!(config.stats(UnitKind::Scrambler).move_period(), Some(4));
        assert_eq!(config.stats(UnitKind::Filter).move_period(), None);
    }

    #[test]
    fn default_shorthands_resolve_to_kinds() {
        let config = GameConfig::new(&table(), Rules::default()).expect("valid table");
        assert_eq!(config.kind_for_shorthand("EI"), Some(UnitKind::Emp));
        assert_eq!(config.kind_for_shorthand("RM"), None);
    }

    #[test]
    fn rings_exist_for_every_range_and_the_splash() {
        let config = GameConfig::new(&table(), Rules::default()).expect("valid table");
        for radius in [0.0, 3.0, 5.0, 1.5] {
            assert!(config.arena().rings(radius).is_some(), "missing {radius}");
        }
        assert_eq!(config.max_structure_range(), 3.0);
    }

    #[test]
    fn short_tables_are_rejected() {
        let error = GameConfig::new(&table()[..4], Rules::default()).expect_err("too short");
        assert_eq!(
            error,
            ConfigError::MissingKinds {
                found: 4,
                expected: 6
            }
        );
    }

    #[test]
    fn mobile_units_require_speed() {
        let mut table = table();
        table[3].speed = None;
        let error = GameConfig::new(&table, Rules::default()).expect_err("missing speed");
        assert_eq!(
            error,
            ConfigError::MissingField {
                kind: UnitKind::Ping,
                field: "speed"
            }
        );
    }

    #[test]
    fn negative_values_are_rejected() {
        let mut table = table();
        table[2].range = Some(-1.0);
        assert!(matches!(
            GameConfig::new(&table, Rules::default()),
            Err(ConfigError::InvalidValue {
                kind: UnitKind::Destructor,
                field: "range",
                ..
            })
        ));
    }

    #[test]
    fn duplicate_shorthands_are_rejected() {
        let mut table = table();
        table[0].shorthand = Some("PI".to_owned());
        assert_eq!(
            GameConfig::new(&table, Rules::default()).expect_err("duplicate"),
            ConfigError::DuplicateShorthand("PI".to_owned())
        );
    }

    #[test]
    fn zero_frame_budget_is_rejected() {
        let rules = Rules {
            max_frames: 0,
            ..Rules::default()
        };
        assert!(matches!(
            GameConfig::new(&table(), rules),
            Err(ConfigError::InvalidRule {
                field: "max_frames",
                ..
            })
        ));
    }
}
