//! Rules-JSON → [`StaticData`] conversion. The wire shapes
//! live in `tracker-protocol`; this module is the only place that turns
//! them into the domain's owned, validated graph.

use std::collections::BTreeSet;

use serde_json::Value as Json;
use tracing::warn;
use tracker_domain::{
    CompareOp, Dungeon, Exit, Item, ItemRef, Location, LoadError, ProgressionEntry, ProgressionMapping, Region,
    Resolvable, Rule, StaticData, Value,
};
use tracker_protocol::{PlayerRules, RulesDocument};

/// Build one player's [`StaticData`] out of a parsed rules document. `player_id` selects which slot to materialise; multiworld
/// seeds carry every slot in `document.players` but a single tracker
/// instance only ever tracks one.
pub fn build_static_data(document: &RulesDocument, player_id: u32, rules_source: &str) -> Result<StaticData, LoadError> {
    let rules = document
        .players
        .get(&player_id)
        .ok_or_else(|| LoadError::IncompatiblePlayerId(player_id.to_string()))?;

    let mut data = StaticData::new(document.game_name.clone(), player_id, rules_source);
    data.progression_mapping = build_progression_mapping(rules);
    data.groups = rules
        .item_groups
        .iter()
        .map(|(group, members)| (group.clone().into(), members.iter().cloned().map(Into::into).collect()))
        .collect();

    for (name, dto) in &rules.items {
        let mut item = Item::new(name.clone());
        item.groups = dto.groups.iter().cloned().collect::<BTreeSet<_>>();
        item.event = dto.event;
        item.advancement = dto.advancement;
        item.priority = dto.priority;
        data.items.insert(name.clone().into(), item);
    }

    for (name, dto) in &rules.exits {
        data.exits.insert(
            name.clone().into(),
            Exit {
                name: name.clone().into(),
                connected_region: dto.connected_region.clone().map(Into::into),
                access_rule: parse_rule(&dto.access_rule),
            },
        );
        data.original_exit_order.push(name.clone().into());
    }

    for (name, dto) in &rules.locations {
        data.locations.insert(
            name.clone().into(),
            Location {
                name: name.clone().into(),
                player: dto.player,
                region: dto.region.clone().into(),
                access_rule: parse_rule(&dto.access_rule),
                item: dto.item.as_ref().map(|item_ref| ItemRef { name: item_ref.name.clone().into(), player: item_ref.player }),
                event: dto.event,
            },
        );
        data.original_location_order.push(name.clone().into());
    }

    for (name, dto) in &rules.regions {
        let mut region = Region::new(name.clone());
        region.exits = dto.exits.iter().cloned().map(Into::into).collect();
        region.locations = dto.locations.iter().cloned().map(Into::into).collect();
        region.region_rules = dto.region_rules.iter().map(parse_rule).collect();
        region.dungeon = dto.dungeon.clone().map(Into::into);
        region.is_light_world = dto.is_light_world;
        region.is_dark_world = dto.is_dark_world;
        data.regions.insert(name.clone().into(), region);
        data.original_region_order.push(name.clone().into());
    }

    for (name, dto) in &rules.dungeons {
        data.dungeons.insert(
            name.clone().into(),
            Dungeon { name: name.clone().into(), regions: dto.regions.iter().cloned().map(Into::into).collect() },
        );
    }

    data.start_regions = rules.start_regions.iter().cloned().map(Into::into).collect();
    data.starting_items = rules.starting_items.iter().cloned().map(Into::into).collect();

    data.validate_referential_integrity()?;
    Ok(data)
}

fn build_progression_mapping(rules: &PlayerRules) -> ProgressionMapping {
    let mut mapping = ProgressionMapping::new();
    for (base, ladder) in &rules.progression_mapping {
        let entries = ladder
            .iter()
            .map(|entry| ProgressionEntry { name: entry.name.clone().into(), level: entry.level, provides: entry.provides.clone() })
            .collect();
        mapping.insert(base.clone().into(), entries);
    }
    mapping
}

/// Parse a JSON-encoded rule-AST node into a [`Rule`]. A bare JSON
/// scalar (no `"kind"` field) is a literal constant — this is how
/// `access_rule` defaults (`true`) and simple flags are expressed. An
/// object whose `"kind"` this reader doesn't recognise degrades to
/// `always_false` with a warning, the same "never throws" discipline the
/// interpreter itself follows, so one malformed rule node doesn't fail the
/// entire load.
pub fn parse_rule(json: &Json) -> Rule {
    let Some(object) = json.as_object() else {
        return Rule::Constant(json_to_value(json));
    };
    let Some(kind) = object.get("kind").and_then(Json::as_str) else {
        return Rule::Constant(json_to_value(json));
    };

    match kind {
        "constant" => Rule::Constant(object.get("value").map(json_to_value).unwrap_or(Value::Null)),
        "name" => Rule::Name(str_field(object, "name")),
        "attribute" => Rule::Attribute {
            object: Box::new(parse_rule(object.get("object").unwrap_or(&Json::Null))),
            attr: str_field(object, "attr"),
        },
        "subscript" => Rule::Subscript {
            value: Box::new(parse_rule(object.get("value").unwrap_or(&Json::Null))),
            index: Box::new(parse_rule(object.get("index").unwrap_or(&Json::Null))),
        },
        "function_call" => Rule::FunctionCall {
            function: Box::new(parse_rule(object.get("function").unwrap_or(&Json::Null))),
            args: parse_rule_list(object.get("args")),
        },
        "item_check" => Rule::ItemCheck { item: parse_resolvable_string(object.get("item")) },
        "count_check" => Rule::CountCheck {
            item: parse_resolvable_string(object.get("item")),
            count: object.get("count").map(parse_resolvable_int),
        },
        "group_check" => Rule::GroupCheck {
            group: parse_resolvable_string(object.get("group")),
            count: object.get("count").map(parse_resolvable_int),
        },
        "state_flag" => Rule::StateFlag { flag: parse_resolvable_string(object.get("flag")) },
        "helper" => Rule::Helper { name: str_field(object, "name"), args: parse_rule_list(object.get("args")) },
        "state_method" => Rule::StateMethod { method: str_field(object, "method"), args: parse_rule_list(object.get("args")) },
        "comparison" => Rule::Comparison {
            op: parse_compare_op(str_field(object, "op").as_str()),
            left: Box::new(parse_rule(object.get("left").unwrap_or(&Json::Null))),
            right: Box::new(parse_rule(object.get("right").unwrap_or(&Json::Null))),
        },
        "and" => Rule::And(parse_rule_list(object.get("conditions"))),
        "or" => Rule::Or(parse_rule_list(object.get("conditions"))),
        other => {
            warn!(kind = %other, "unrecognised rule node kind, defaulting to always_false");
            Rule::always_false()
        }
    }
}

fn parse_rule_list(json: Option<&Json>) -> Vec<Rule> {
    match json.and_then(Json::as_array) {
        Some(items) => items.iter().map(parse_rule).collect(),
        None => Vec::new(),
    }
}

fn parse_resolvable_string(json: Option<&Json>) -> Resolvable<String> {
    match json {
        Some(Json::String(s)) => Resolvable::Literal(s.clone()),
        Some(other @ Json::Object(_)) => Resolvable::Nested(Box::new(parse_rule(other))),
        _ => Resolvable::Literal(String::new()),
    }
}

fn parse_resolvable_int(json: &Json) -> Resolvable<i64> {
    match json {
        Json::Number(n) => Resolvable::Literal(n.as_i64().unwrap_or(0)),
        other @ Json::Object(_) => Resolvable::Nested(Box::new(parse_rule(other))),
        _ => Resolvable::Literal(0),
    }
}

fn parse_compare_op(op: &str) -> CompareOp {
    match op {
        "gte" | ">=" => CompareOp::GtE,
        "gt" | ">" => CompareOp::Gt,
        "lte" | "<=" => CompareOp::LtE,
        "lt" | "<" => CompareOp::Lt,
        _ => CompareOp::Eq,
    }
}

fn str_field(object: &serde_json::Map<String, Json>, key: &str) -> String {
    object.get(key).and_then(Json::as_str).unwrap_or_default().to_string()
}

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        Json::Object(map) => Value::Map(map.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_document() -> RulesDocument {
        let json = serde_json::json!({
            "game_name": "Test Game",
            "regions": {
                "Menu": { "exits": ["Menu -> Hyrule"], "locations": [] },
                "Hyrule": { "exits": [], "locations": ["Link's House"] },
            },
            "exits": {
                "Menu -> Hyrule": { "connected_region": "Hyrule" },
            },
            "locations": {
                "Link's House": { "region": "Hyrule", "access_rule": true },
            },
            "start_regions": ["Menu"],
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn builds_valid_static_data_from_minimal_document() {
        let document = minimal_document();
        let data = build_static_data(&document, 1, "test.json").unwrap();
        assert_eq!(data.game_name, "Test Game");
        assert!(data.regions.contains_key("Hyrule"));
        assert!(data.locations.contains_key("Link's House"));
        assert_eq!(data.start_regions, vec!["Menu".into()]);
    }

    #[test]
    fn unknown_player_id_is_rejected() {
        let document = minimal_document();
        assert!(matches!(build_static_data(&document, 7, "test.json"), Err(LoadError::IncompatiblePlayerId(_))));
    }

    #[test]
    fn parses_and_or_and_leaf_rule_kinds() {
        let json = serde_json::json!({
            "kind": "and",
            "conditions": [
                { "kind": "item_check", "item": "Bombs" },
                { "kind": "comparison", "op": "gte", "left": { "kind": "constant", "value": 2 }, "right": { "kind": "constant", "value": 1 } },
            ],
        });
        let rule = parse_rule(&json);
        assert!(matches!(rule, Rule::And(ref conditions) if conditions.len() == 2));
    }

    #[test]
    fn bare_json_scalar_parses_as_constant() {
        assert_eq!(parse_rule(&serde_json::json!(true)), Rule::Constant(Value::Bool(true)));
    }
}
