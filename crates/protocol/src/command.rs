//! Inbound command envelope: every operation the UI can ask the
//! worker to perform, addressed by `queryId`/`correlationId`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracker_domain::SettingValue;

use crate::ids::{CorrelationId, QueryId};

/// One slot's worth of rules-JSON input plus the player id it belongs to,
/// as accepted by `loadRules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: u32,
    pub game_name: String,
}

/// The full inbound command vocabulary, tagged by `command` on the wire
/// the way `ClientMessage` tags by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload")]
pub enum Command {
    LoadRules {
        rules_data: serde_json::Value,
        player_info: PlayerInfo,
    },
    AddItemToInventory {
        item: String,
        #[serde(default = "default_quantity")]
        quantity: u32,
    },
    RemoveItemFromInventory {
        item: String,
        #[serde(default = "default_quantity")]
        quantity: u32,
    },
    CheckLocation {
        location_name: String,
        #[serde(default = "default_true")]
        add_items: bool,
        #[serde(default)]
        force_check: bool,
    },
    UncheckLocation {
        location_name: String,
    },
    BeginBatchUpdate {
        #[serde(default)]
        defer_region_computation: bool,
    },
    CommitBatchUpdate,
    SyncCheckedLocationsFromServer {
        checked_location_ids: Vec<String>,
    },
    ClearStateAndReset,
    ClearEventItems,
    ApplyRuntimeState {
        inventory: BTreeMap<String, u32>,
        checked_locations: Vec<String>,
        #[serde(default)]
        flags: Vec<String>,
        #[serde(default)]
        events: Vec<String>,
    },
    RecalculateAccessibility,
    EvaluateRuleRemote {
        rule: serde_json::Value,
    },
    EvaluateLocationAccessibilityForTest {
        location_name: String,
        #[serde(default)]
        required_items: Vec<String>,
        #[serde(default)]
        excluded_items: Vec<String>,
    },
    ApplyTestInventoryAndEvaluate {
        location_name: String,
        #[serde(default)]
        required_items: Vec<String>,
        #[serde(default)]
        excluded_items: Vec<String>,
    },
    SetAutoCollectEventsConfig {
        enabled: bool,
    },
    SetSpoilerTestMode {
        enabled: bool,
    },
    Ping {
        #[serde(default)]
        payload: serde_json::Value,
    },
    GetFullSnapshot,
    GetWorkerQueueStatus,
    ToggleQueueReporting {
        enabled: bool,
    },
}

fn default_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Command {
    /// Whether this command mutates engine state and therefore must
    /// trigger exactly one snapshot emission on success.
    pub fn mutates_state(&self) -> bool {
        !matches!(
            self,
            Command::EvaluateRuleRemote { .. }
                | Command::EvaluateLocationAccessibilityForTest { .. }
                | Command::Ping { .. }
                | Command::GetFullSnapshot
                | Command::GetWorkerQueueStatus
                | Command::ToggleQueueReporting { .. }
                | Command::SetAutoCollectEventsConfig { .. }
                | Command::SetSpoilerTestMode { .. }
                | Command::BeginBatchUpdate { .. }
        )
    }

    /// A short machine-stable name for logging/diagnostics, independent of
    /// the derived `#[serde(tag = "command")]` string.
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadRules { .. } => "loadRules",
            Command::AddItemToInventory { .. } => "addItemToInventory",
            Command::RemoveItemFromInventory { .. } => "removeItemFromInventory",
            Command::CheckLocation { .. } => "checkLocation",
            Command::UncheckLocation { .. } => "uncheckLocation",
            Command::BeginBatchUpdate { .. } => "beginBatchUpdate",
            Command::CommitBatchUpdate => "commitBatchUpdate",
            Command::SyncCheckedLocationsFromServer { .. } => "syncCheckedLocationsFromServer",
            Command::ClearStateAndReset => "clearStateAndReset",
            Command::ClearEventItems => "clearEventItems",
            Command::ApplyRuntimeState { .. } => "applyRuntimeState",
            Command::RecalculateAccessibility => "recalculateAccessibility",
            Command::EvaluateRuleRemote { .. } => "evaluateRuleRemote",
            Command::EvaluateLocationAccessibilityForTest { .. } => "evaluateLocationAccessibilityForTest",
            Command::ApplyTestInventoryAndEvaluate { .. } => "applyTestInventoryAndEvaluate",
            Command::SetAutoCollectEventsConfig { .. } => "setAutoCollectEventsConfig",
            Command::SetSpoilerTestMode { .. } => "setSpoilerTestMode",
            Command::Ping { .. } => "ping",
            Command::GetFullSnapshot => "getFullSnapshot",
            Command::GetWorkerQueueStatus => "getWorkerQueueStatus",
            Command::ToggleQueueReporting { .. } => "toggleQueueReporting",
        }
    }
}

/// Inbound envelope: `{ command, payload, queryId, correlationId,
/// expectResponse }`. `Command`'s own `#[serde(tag = "command", content =
/// "payload")]` already folds `command`/`payload` into one value, so this
/// wraps that value with the remaining envelope fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(flatten)]
    pub command: Command,
    pub query_id: QueryId,
    pub correlation_id: CorrelationId,
    #[serde(default = "default_true")]
    pub expect_response: bool,
}

/// A scalar setting value accepted over the wire for `ApplyRuntimeState`'s
/// optional game-specific flags (re-exported from domain for convenience).
pub type WireSettingValue = SettingValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_test_inventory_and_evaluate_mutates_but_its_read_only_sibling_does_not() {
        let apply = Command::ApplyTestInventoryAndEvaluate { location_name: "L".into(), required_items: vec![], excluded_items: vec![] };
        let evaluate = Command::EvaluateLocationAccessibilityForTest { location_name: "L".into(), required_items: vec![], excluded_items: vec![] };
        assert!(apply.mutates_state());
        assert!(!evaluate.mutates_state());
    }

    #[test]
    fn queries_and_acks_do_not_mutate_state() {
        assert!(!Command::EvaluateRuleRemote { rule: serde_json::Value::Null }.mutates_state());
        assert!(!Command::GetFullSnapshot.mutates_state());
        assert!(!Command::Ping { payload: serde_json::Value::Null }.mutates_state());
        assert!(!Command::SetAutoCollectEventsConfig { enabled: true }.mutates_state());
    }

    #[test]
    fn load_rules_and_check_location_mutate_state() {
        assert!(Command::LoadRules { rules_data: serde_json::Value::Null, player_info: PlayerInfo { player_id: 1, game_name: "G".into() } }.mutates_state());
        assert!(Command::CheckLocation { location_name: "L".into(), add_items: true, force_check: false }.mutates_state());
    }

    #[test]
    fn name_matches_the_wire_command_tag() {
        let command = Command::ApplyTestInventoryAndEvaluate { location_name: "L".into(), required_items: vec![], excluded_items: vec![] };
        assert_eq!(command.name(), "applyTestInventoryAndEvaluate");
    }
}
