//! StaticData: everything parsed from the rules JSON at load time.
//! Immutable after `loadRules` completes.

use std::collections::HashMap;

use crate::error::LoadError;
use crate::ids::{DungeonName, ExitName, GroupName, ItemName, LocationName, PlayerId, RegionName};
use crate::item::{Item, ProgressionMapping};
use crate::region::{Dungeon, Exit, Location, Region};

/// Everything derived from the rules JSON for one player slot.
#[derive(Debug, Clone, Default)]
pub struct StaticData {
    pub game_name: String,
    pub player_id: PlayerId,
    pub rules_source: String,

    pub items: HashMap<ItemName, Item>,
    pub regions: HashMap<RegionName, Region>,
    pub locations: HashMap<LocationName, Location>,
    pub exits: HashMap<ExitName, Exit>,
    pub dungeons: HashMap<DungeonName, Dungeon>,

    pub progression_mapping: ProgressionMapping,
    pub groups: HashMap<GroupName, std::collections::HashSet<ItemName>>,

    pub starting_items: Vec<ItemName>,
    pub start_regions: Vec<RegionName>,

    /// UIs sort by these when the user requests "original" order.
    pub original_location_order: Vec<LocationName>,
    pub original_exit_order: Vec<ExitName>,
    pub original_region_order: Vec<RegionName>,
}

impl StaticData {
    pub fn new(game_name: impl Into<String>, player_id: PlayerId, rules_source: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            player_id,
            rules_source: rules_source.into(),
            ..Default::default()
        }
    }

    /// Invariant: after load, every region's exits/locations reference
    /// an existing entity, every exit's connected region exists (or is
    /// null), and every region's dungeon (if any) exists. Called by the
    /// loader before the atomic swap; on failure the caller discards this
    /// instance and keeps whatever was previously loaded.
    pub fn validate_referential_integrity(&self) -> Result<(), LoadError> {
        for region in self.regions.values() {
            for exit_name in &region.exits {
                if !self.exits.contains_key(exit_name) {
                    return Err(LoadError::DanglingExit {
                        region: region.name.to_string(),
                        exit: exit_name.to_string(),
                    });
                }
            }
            for location_name in &region.locations {
                if !self.locations.contains_key(location_name) {
                    return Err(LoadError::DanglingLocation {
                        region: region.name.to_string(),
                        location: location_name.to_string(),
                    });
                }
            }
            if let Some(dungeon_name) = &region.dungeon {
                if !self.dungeons.contains_key(dungeon_name) {
                    return Err(LoadError::DanglingDungeon {
                        region: region.name.to_string(),
                        dungeon: dungeon_name.to_string(),
                    });
                }
            }
        }
        for exit in self.exits.values() {
            if let Some(target) = &exit.connected_region {
                if !self.regions.contains_key(target) {
                    return Err(LoadError::DanglingConnectedRegion {
                        exit: exit.name.to_string(),
                        region: target.to_string(),
                    });
                }
            }
        }
        if self.start_regions.is_empty() {
            return Err(LoadError::MissingStartRegion { player: self.player_id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn valid_static_data() -> StaticData {
        let mut data = StaticData::new("Test Game", 1, "test.json");
        let mut region = Region::new("Menu");
        region.exits.push("Menu -> Hyrule".into());
        data.exits.insert(
            "Menu -> Hyrule".into(),
            Exit {
                name: "Menu -> Hyrule".into(),
                connected_region: Some("Hyrule".into()),
                access_rule: Rule::always_true(),
            },
        );
        data.regions.insert("Hyrule".into(), Region::new("Hyrule"));
        data.regions.insert(region.name.clone(), region);
        data.start_regions.push("Menu".into());
        data
    }

    #[test]
    fn valid_graph_passes_integrity_check() {
        assert!(valid_static_data().validate_referential_integrity().is_ok());
    }

    #[test]
    fn dangling_exit_reference_fails_atomically() {
        let mut data = valid_static_data();
        data.regions.get_mut("Menu").unwrap().exits.push("Menu -> Nowhere".into());
        assert!(matches!(
            data.validate_referential_integrity(),
            Err(LoadError::DanglingExit { .. })
        ));
    }

    #[test]
    fn missing_start_region_is_rejected() {
        let mut data = valid_static_data();
        data.start_regions.clear();
        assert!(matches!(
            data.validate_referential_integrity(),
            Err(LoadError::MissingStartRegion { .. })
        ));
    }
}
