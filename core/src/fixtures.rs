//! Canned configuration used by tests across the workspace.

use crate::{GameConfig, Rules, UnitInformation};

/// Unit table modelled on the host's season configuration, including the
/// trailing removal pseudo-unit.
#[must_use]
pub fn unit_table() -> Vec<UnitInformation> {
    vec![
        structure("FF", 60.0, 1.0, 0.0, 0.0, 0.0),
        structure("EF", 30.0, 4.0, 3.0, 0.0, 10.0),
        structure("DF", 75.0, 3.0, 3.0, 4.0, 0.0),
        mobile("PI", 15.0, 1.0, 3.0, 1.0, 1.0, 1.0),
        mobile("EI", 5.0, 3.0, 5.0, 0.5, 3.0, 3.0),
        mobile("SI", 40.0, 1.0, 3.0, 0.25, 0.0, 20.0),
        UnitInformation {
            shorthand: Some("RM".to_owned()),
            ..UnitInformation::default()
        },
    ]
}

/// Configuration built from [`unit_table`] and the default rules.
#[must_use]
pub fn config() -> GameConfig {
    config_with_rules(Rules::default())
}

/// Configuration built from [`unit_table`] and the provided rules.
///
/// # Panics
///
/// Panics if the rules fail validation.
#[must_use]
pub fn config_with_rules(rules: Rules) -> GameConfig {
    match GameConfig::new(&unit_table(), rules) {
        Ok(config) => config,
        Err(error) => panic!("fixture configuration rejected: {error}"),
    }
}

fn structure(
    shorthand: &str,
    stability: f32,
    cost: f32,
    range: f32,
    damage: f32,
    shield_amount: f32,
) -> UnitInformation {
    UnitInformation {
        shorthand: Some(shorthand.to_owned()),
        stability: Some(stability),
        cost: Some(cost),
        range: Some(range),
        damage: Some(damage),
        shield_amount: Some(shield_amount),
        ..UnitInformation::default()
    }
}

fn mobile(
    shorthand: &str,
    stability: f32,
    cost: f32,
    range: f32,
    speed: f32,
    damage_f: f32,
    damage_i: f32,
) -> UnitInformation {
    UnitInformation {
        shorthand: Some(shorthand.to_owned()),
        stability: Some(stability),
        cost: Some(cost),
        range: Some(range),
        speed: Some(speed),
        damage_f: Some(damage_f),
        damage_i: Some(damage_i),
        ..UnitInformation::default()
    }
}
