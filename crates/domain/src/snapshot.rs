//! Snapshot: the serialised, value-typed view the UI receives.
//! Immutable once received — the UI never mutates a snapshot in place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;
use crate::inventory::ResolvedItem;
use crate::state::{ReachabilityStatus, SettingValue};

/// The full engine-state view posted back to the UI after every
/// state-mutating command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Monotonic logical clock; the proxy discards any snapshot whose
    /// generation isn't strictly greater than the last one it cached.
    pub generation: u64,

    pub inventory: BTreeMap<String, u32>,
    pub checked_locations: Vec<String>,
    pub flags: BTreeSet<String>,
    pub events: BTreeSet<String>,
    pub settings: BTreeMap<String, SettingValue>,
    pub region_reachability: BTreeMap<String, ReachabilityStatus>,

    /// `(player, location)` pairs newly reachable since the previous
    /// snapshot.
    pub newly_reachable: BTreeSet<(PlayerId, String)>,

    pub location_accessibility: Option<BTreeMap<String, bool>>,
    pub inventory_resolved: Option<BTreeMap<String, Vec<ResolvedItem>>>,

    pub game_name: String,
    pub player_id: PlayerId,
    pub rules_source: String,
}

impl Serialize for ResolvedItem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Repr<'a> {
            name: &'a str,
            level: u32,
            provides: &'a [String],
        }
        Repr { name: &self.name, level: self.level, provides: &self.provides }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResolvedItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr {
            name: String,
            level: u32,
            provides: Vec<String>,
        }
        let repr = Repr::deserialize(deserializer)?;
        Ok(ResolvedItem { name: repr.name, level: repr.level, provides: repr.provides })
    }
}

/// The save-format sub-object: round-trips via
/// `getSavableStateData`/`applyRuntimeStateData`. Deliberately excludes
/// static data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SavableState {
    pub inventory: BTreeMap<String, u32>,
    pub checked_locations: Vec<String>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
    #[serde(default)]
    pub events: BTreeSet<String>,
}
