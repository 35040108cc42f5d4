//! Permissive rules-JSON reader: accepts either the nested per-player
//! form or a legacy flat form (wrapped under player 1) without requiring
//! the caller to know up front which shape a blob uses.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracker_domain::SettingValue;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RegionDto {
    #[serde(default)]
    pub exits: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub region_rules: Vec<Json>,
    #[serde(default)]
    pub is_light_world: bool,
    #[serde(default)]
    pub is_dark_world: bool,
    #[serde(default)]
    pub dungeon: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExitDto {
    #[serde(default)]
    pub connected_region: Option<String>,
    #[serde(default = "default_true_rule")]
    pub access_rule: Json,
}

fn default_true_rule() -> Json {
    Json::Bool(true)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemRefDto {
    pub name: String,
    #[serde(default)]
    pub player: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationDto {
    #[serde(default)]
    pub player: u32,
    pub region: String,
    #[serde(default = "default_true_rule")]
    pub access_rule: Json,
    #[serde(default)]
    pub item: Option<ItemRefDto>,
    #[serde(default)]
    pub event: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ItemDto {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub event: bool,
    #[serde(default)]
    pub advancement: Option<bool>,
    #[serde(default)]
    pub priority: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DungeonDto {
    #[serde(default)]
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProgressionEntryDto {
    pub name: String,
    pub level: u32,
    #[serde(default)]
    pub provides: Vec<String>,
}

/// Everything the loader needs for a single player slot.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PlayerRules {
    #[serde(default)]
    pub regions: HashMap<String, RegionDto>,
    #[serde(default)]
    pub exits: HashMap<String, ExitDto>,
    #[serde(default)]
    pub locations: HashMap<String, LocationDto>,
    #[serde(default)]
    pub items: HashMap<String, ItemDto>,
    #[serde(default)]
    pub item_groups: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub progression_mapping: HashMap<String, Vec<ProgressionEntryDto>>,
    #[serde(default)]
    pub dungeons: HashMap<String, DungeonDto>,
    #[serde(default)]
    pub mode: Json,
    #[serde(default)]
    pub settings: BTreeMap<String, SettingValue>,
    #[serde(default)]
    pub start_regions: Vec<String>,
    #[serde(default)]
    pub starting_items: Vec<String>,
}

/// The full rules-JSON document, keyed by player id.
#[derive(Debug, Clone, Serialize)]
pub struct RulesDocument {
    pub game_name: String,
    pub players: HashMap<u32, PlayerRules>,
}

impl RulesDocument {
    /// The single legacy entry point `loadRules` wraps a flat document
    /// under, regardless of how many slots the nested form might carry.
    pub fn legacy_player(&self) -> Option<&PlayerRules> {
        self.players.get(&1)
    }
}

/// A JSON object is treated as "nested" (player-id keyed) when every key
/// parses as an integer and every value is itself an object. A legacy flat
/// document has non-numeric keys (region/item names) at the top level.
fn looks_nested(value: &Json) -> bool {
    match value.as_object() {
        Some(map) if !map.is_empty() => {
            map.keys().all(|k| k.parse::<u32>().is_ok()) && map.values().all(Json::is_object)
        }
        _ => false,
    }
}

impl<'de> Deserialize<'de> for RulesDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let mut root = Json::deserialize(deserializer)?;
        let root_obj = root
            .as_object_mut()
            .ok_or_else(|| serde::de::Error::custom("rules document must be a JSON object"))?;

        let game_name = root_obj
            .remove("game_name")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        // Every per-player field name this document recognises.
        const FIELDS: &[&str] = &[
            "regions",
            "exits",
            "locations",
            "items",
            "item_groups",
            "progression_mapping",
            "dungeons",
            "mode",
            "settings",
            "start_regions",
            "starting_items",
        ];

        let nested = root_obj.get("regions").map(looks_nested).unwrap_or(false);

        let mut players: HashMap<u32, Json> = HashMap::new();
        if nested {
            // Pivot field-major (`{"regions": {"1": {...}}}`) into
            // player-major (`{1: {"regions": {...}}}`).
            for field in FIELDS {
                if let Some(Json::Object(per_player)) = root_obj.remove(*field) {
                    for (pid_str, value) in per_player {
                        let pid: u32 = pid_str
                            .parse()
                            .map_err(|_| serde::de::Error::custom(format!("invalid player id '{pid_str}'")))?;
                        players
                            .entry(pid)
                            .or_insert_with(|| Json::Object(Default::default()))
                            .as_object_mut()
                            .expect("inserted as object")
                            .insert((*field).to_string(), value);
                    }
                }
            }
        } else {
            // Legacy flat: every recognised field belongs to player 1.
            let mut flat = serde_json::Map::new();
            for field in FIELDS {
                if let Some(value) = root_obj.remove(*field) {
                    flat.insert((*field).to_string(), value);
                }
            }
            players.insert(1, Json::Object(flat));
        }

        let mut out = HashMap::with_capacity(players.len());
        for (pid, value) in players {
            let rules: PlayerRules = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            out.insert(pid, rules);
        }

        Ok(RulesDocument { game_name, players: out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_form_parses_into_player_slots() {
        let json = serde_json::json!({
            "game_name": "ALTTP",
            "regions": { "1": { "Menu": { "exits": ["Menu -> Hyrule"] } } },
            "start_regions": { "1": ["Menu"] },
        });
        let doc: RulesDocument = serde_json::from_value(json).unwrap();
        assert_eq!(doc.game_name, "ALTTP");
        let player = doc.players.get(&1).unwrap();
        assert!(player.regions.contains_key("Menu"));
        assert_eq!(player.start_regions, vec!["Menu".to_string()]);
    }

    #[test]
    fn legacy_flat_form_is_wrapped_under_player_1() {
        let json = serde_json::json!({
            "game_name": "Generic",
            "regions": { "Menu": { "exits": [] } },
            "start_regions": ["Menu"],
        });
        let doc: RulesDocument = serde_json::from_value(json).unwrap();
        let player = doc.legacy_player().unwrap();
        assert!(player.regions.contains_key("Menu"));
        assert_eq!(player.start_regions, vec!["Menu".to_string()]);
    }
}
