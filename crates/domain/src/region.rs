//! Static-after-load world graph entities.

use std::collections::BTreeSet;

use crate::ids::{DungeonName, ExitName, ItemName, LocationName, PlayerId, RegionName};
use crate::rule::Rule;

/// A directed connection between regions, gated by an access rule.
#[derive(Debug, Clone)]
pub struct Exit {
    pub name: ExitName,
    pub connected_region: Option<RegionName>,
    pub access_rule: Rule,
}

/// A reference to the item placed at a location, including its owning
/// player slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub name: ItemName,
    pub player: PlayerId,
}

/// A checkable location. Never mutated after load; whether it has been
/// *checked* is derived state tracked on `State`.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: LocationName,
    pub player: PlayerId,
    pub region: RegionName,
    pub access_rule: Rule,
    pub item: Option<ItemRef>,
    pub event: bool,
}

/// A region in the world graph. Regions never change after load.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: RegionName,
    pub exits: Vec<ExitName>,
    pub locations: Vec<LocationName>,
    pub region_rules: Vec<Rule>,
    pub dungeon: Option<DungeonName>,
    pub tags: BTreeSet<String>,
    pub is_light_world: bool,
    pub is_dark_world: bool,
}

impl Region {
    pub fn new(name: impl Into<RegionName>) -> Self {
        Self {
            name: name.into(),
            exits: Vec::new(),
            locations: Vec::new(),
            region_rules: Vec::new(),
            dungeon: None,
            tags: BTreeSet::new(),
            is_light_world: false,
            is_dark_world: false,
        }
    }
}

/// A dungeon grouping of regions, used by UIs to group the region panel:
/// a named grouping of regions, nothing more.
#[derive(Debug, Clone)]
pub struct Dungeon {
    pub name: DungeonName,
    pub regions: Vec<RegionName>,
}
