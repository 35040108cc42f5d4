//! Domain-level error taxonomy.

use thiserror::Error;

/// Errors raised while assembling or validating [`crate::static_data::StaticData`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("region '{region}' references unknown exit '{exit}'")]
    DanglingExit { region: String, exit: String },

    #[error("region '{region}' references unknown location '{location}'")]
    DanglingLocation { region: String, location: String },

    #[error("exit '{exit}' connects to unknown region '{region}'")]
    DanglingConnectedRegion { exit: String, region: String },

    #[error("region '{region}' references unknown dungeon '{dungeon}'")]
    DanglingDungeon { region: String, dungeon: String },

    #[error("no start region configured for player {player}")]
    MissingStartRegion { player: u32 },

    #[error("rules JSON is missing required field '{0}'")]
    MissingField(String),

    #[error("rules JSON has an incompatible player id '{0}'")]
    IncompatiblePlayerId(String),
}

/// A reference to an item/location/region not present in static data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{name}'")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

impl UnknownName {
    pub fn region(name: impl Into<String>) -> Self {
        Self { kind: "region", name: name.into() }
    }

    pub fn location(name: impl Into<String>) -> Self {
        Self { kind: "location", name: name.into() }
    }

    pub fn item(name: impl Into<String>) -> Self {
        Self { kind: "item", name: name.into() }
    }
}
