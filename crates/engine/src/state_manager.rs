//! StateManager: the command-handling façade. Owns the mutable
//! `Inventory`/`State`, the immutable `StaticData` (once loaded), and the
//! batch-update and recompute policy every command funnels through.

use std::collections::{BTreeMap, HashSet};

use tracing::{info, warn};
use tracker_domain::{Inventory, SavableState, Snapshot, State, StaticData};
use tracker_protocol::{Command, PlayerInfo};

use crate::config::EngineConfig;
use crate::error::{AccessDenied, CommandError};
use crate::helpers::HelperRegistry;
use crate::load;
use crate::reachability;
use crate::rules::{evaluate, EvalContext};

/// What a handled command produced, before the worker wraps it into a
/// [`tracker_protocol::WorkerMessage`].
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    /// A state-mutating command completed; carries the fresh snapshot.
    Snapshot(Box<Snapshot>),
    /// A read-only query result (`evaluateRuleRemote`,
    /// `evaluateLocationAccessibilityForTest`): no state changed, nothing
    /// to snapshot.
    Bool(bool),
    /// `applyTestInventoryAndEvaluate`: mutates the real inventory, then
    /// reports both the resulting snapshot and the test location's
    /// accessibility under that mutated state.
    TestApplication { snapshot: Box<Snapshot>, location_accessible: bool },
    /// Acknowledges a command with no natural return value
    /// (`setAutoCollectEventsConfig`, `setSpoilerTestMode`).
    Ack,
}

/// Owns engine state for one player slot across the life of a worker.
pub struct StateManager {
    inventory: Inventory,
    state: State,
    static_data: Option<StaticData>,
    helpers: HelperRegistry,
    config: EngineConfig,
    generation: u64,
    batch_depth: u32,
    batch_defer_region_computation: bool,
    last_outcome: reachability::RecomputeOutcome,
    /// Locations whose `checkLocation` call actually granted an item to
    /// this player's inventory (i.e. `add_items` was true and the location
    /// held an item for this slot). `uncheckLocation` consults this to
    /// reverse exactly what the matching check added, never more.
    items_granted: HashSet<String>,
}

impl StateManager {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inventory: Inventory::new(),
            state: State::new(),
            static_data: None,
            helpers: HelperRegistry::new(),
            config,
            generation: 0,
            batch_depth: 0,
            batch_defer_region_computation: false,
            last_outcome: reachability::RecomputeOutcome::default(),
            items_granted: HashSet::new(),
        }
    }

    pub fn static_data(&self) -> Option<&StaticData> {
        self.static_data.as_ref()
    }

    fn require_static_data(&self) -> Result<&StaticData, CommandError> {
        self.static_data.as_ref().ok_or_else(|| CommandError::Load(tracker_domain::LoadError::MissingField("rules".into())))
    }

    fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Dispatch one command. `BeginBatchUpdate`,
    /// `CommitBatchUpdate`, `Ping`, `GetWorkerQueueStatus` and
    /// `ToggleQueueReporting` are handled one layer up (worker/queue
    /// concerns, not engine-state concerns) except for
    /// `BeginBatchUpdate`/`CommitBatchUpdate` themselves, whose batching
    /// discipline belongs here alongside the state it defers.
    pub fn handle(&mut self, command: &Command) -> Result<CommandOutcome, CommandError> {
        match command {
            Command::LoadRules { rules_data, player_info } => self.load_rules(rules_data, player_info),
            Command::AddItemToInventory { item, quantity } => self.add_item(item, *quantity),
            Command::RemoveItemFromInventory { item, quantity } => self.remove_item(item, *quantity),
            Command::CheckLocation { location_name, add_items, force_check } => self.check_location(location_name, *add_items, *force_check),
            Command::UncheckLocation { location_name } => self.uncheck_location(location_name),
            Command::BeginBatchUpdate { defer_region_computation } => self.begin_batch(*defer_region_computation),
            Command::CommitBatchUpdate => self.commit_batch(),
            Command::SyncCheckedLocationsFromServer { checked_location_ids } => self.sync_checked_locations(checked_location_ids),
            Command::ClearStateAndReset => self.clear_state_and_reset(),
            Command::ClearEventItems => self.clear_event_items(),
            Command::ApplyRuntimeState { inventory, checked_locations, flags, events } => {
                self.apply_runtime_state(inventory, checked_locations, flags, events)
            }
            Command::RecalculateAccessibility => self.recalculate_accessibility(),
            Command::EvaluateRuleRemote { rule } => self.evaluate_rule_remote(rule),
            Command::EvaluateLocationAccessibilityForTest { location_name, required_items, excluded_items } => {
                self.evaluate_location_for_test(location_name, required_items, excluded_items)
            }
            Command::ApplyTestInventoryAndEvaluate { location_name, required_items, excluded_items } => {
                self.apply_test_inventory_and_evaluate(location_name, required_items, excluded_items)
            }
            Command::SetAutoCollectEventsConfig { enabled } => {
                self.state.set_setting("auto_collect_events", tracker_domain::SettingValue::Bool(*enabled));
                Ok(CommandOutcome::Ack)
            }
            Command::SetSpoilerTestMode { enabled } => {
                self.config = std::mem::take(&mut self.config).with_spoiler_test_mode(*enabled);
                Ok(CommandOutcome::Ack)
            }
            Command::GetFullSnapshot => {
                Ok(CommandOutcome::Snapshot(Box::new(self.snapshot(SnapshotExtras { include_accessibility: true, include_resolved: true }))))
            }
            Command::Ping { .. } | Command::GetWorkerQueueStatus | Command::ToggleQueueReporting { .. } => {
                unreachable!("queue-level commands are dispatched by the worker, not StateManager")
            }
        }
    }

    fn load_rules(&mut self, rules_data: &serde_json::Value, player_info: &PlayerInfo) -> Result<CommandOutcome, CommandError> {
        let document: tracker_protocol::RulesDocument =
            serde_json::from_value(rules_data.clone()).map_err(|_| tracker_domain::LoadError::MissingField("rules".into()))?;
        let rules_source = player_info.game_name.clone();
        let static_data = load::build_static_data(&document, player_info.player_id, &rules_source)?;

        self.inventory = Inventory::new();
        self.state = State::new();
        self.helpers = HelperRegistry::for_game(&static_data.game_name);
        for item in static_data.starting_items.clone() {
            self.inventory.add(item, 1);
        }
        self.last_outcome = reachability::RecomputeOutcome::default();
        self.items_granted.clear();
        self.static_data = Some(static_data);

        self.recompute_reachability();
        info!(game = %player_info.game_name, player = player_info.player_id, "rules loaded");
        Ok(CommandOutcome::Snapshot(Box::new(self.snapshot(Default::default()))))
    }

    fn add_item(&mut self, item: &str, quantity: u32) -> Result<CommandOutcome, CommandError> {
        self.require_static_data()?;
        self.inventory.add(item.into(), quantity);
        self.after_mutation()
    }

    fn remove_item(&mut self, item: &str, quantity: u32) -> Result<CommandOutcome, CommandError> {
        self.require_static_data()?;
        self.inventory.remove(item, quantity);
        self.after_mutation()
    }

    fn check_location(&mut self, location_name: &str, add_items: bool, force_check: bool) -> Result<CommandOutcome, CommandError> {
        let static_data = self.require_static_data()?;
        let location = static_data
            .locations
            .get(location_name)
            .ok_or_else(|| tracker_domain::UnknownName::location(location_name))?
            .clone();

        // Multiworld item policy: only add the placed item to
        // inventory when it belongs to the tracked player's own slot.
        if !force_check {
            let ctx = self.eval_context();
            let accessible = self.state.is_region_reachable(location.region.as_str()) && evaluate(&location.access_rule, &ctx).truthy();
            if !accessible {
                return Err(AccessDenied { location: location_name.to_string() }.into());
            }
        }

        self.state.checked_locations_mut().insert(location_name.into());
        if add_items {
            if let Some(item_ref) = &location.item {
                if item_ref.player == static_data.player_id {
                    self.inventory.add(item_ref.name.clone(), 1);
                    self.items_granted.insert(location_name.to_string());
                }
            }
        }
        if location.event {
            self.state.process_event_item(location_name);
        }

        self.after_mutation()
    }

    /// Reverses exactly what the matching `checkLocation` did: drops the
    /// checked-location membership and, only if that check actually granted
    /// an item to this player, removes one copy of it again.
    fn uncheck_location(&mut self, location_name: &str) -> Result<CommandOutcome, CommandError> {
        let static_data = self.require_static_data()?;
        self.state.checked_locations_mut().remove(location_name);
        if self.items_granted.remove(location_name) {
            if let Some(item_ref) = static_data.locations.get(location_name).and_then(|loc| loc.item.as_ref()) {
                self.inventory.remove(item_ref.name.as_str(), 1);
            }
        }
        self.after_mutation()
    }

    fn begin_batch(&mut self, defer_region_computation: bool) -> Result<CommandOutcome, CommandError> {
        self.batch_depth += 1;
        self.batch_defer_region_computation = defer_region_computation;
        Ok(CommandOutcome::Ack)
    }

    fn commit_batch(&mut self) -> Result<CommandOutcome, CommandError> {
        if self.batch_depth == 0 {
            warn!("commitBatchUpdate with no matching beginBatchUpdate");
        } else {
            self.batch_depth -= 1;
        }
        if self.in_batch() {
            return Ok(CommandOutcome::Ack);
        }
        self.recompute_reachability();
        Ok(CommandOutcome::Snapshot(Box::new(self.snapshot(Default::default()))))
    }

    fn sync_checked_locations(&mut self, ids: &[String]) -> Result<CommandOutcome, CommandError> {
        self.require_static_data()?;
        self.state.checked_locations_mut().replace(ids.iter().map(Into::into));
        // Replacing the checked set wholesale bypasses the check/uncheck
        // flow; the old per-location "did this grant an item" bookkeeping
        // no longer corresponds to anything in the new set.
        self.items_granted.clear();
        self.after_mutation()
    }

    /// Empties inventory and events; preserves settings (e.g.
    /// `auto_collect_events`) across the reset.
    fn clear_state_and_reset(&mut self) -> Result<CommandOutcome, CommandError> {
        let static_data = self.require_static_data()?.clone();
        self.inventory = Inventory::new();
        for item in static_data.starting_items.clone() {
            self.inventory.add(item, 1);
        }
        let mut state = State::new();
        for (key, value) in self.state.settings() {
            state.set_setting(key.to_string(), value.clone());
        }
        self.state = state;
        self.last_outcome = reachability::RecomputeOutcome::default();
        self.items_granted.clear();
        self.after_mutation()
    }

    fn clear_event_items(&mut self) -> Result<CommandOutcome, CommandError> {
        self.require_static_data()?;
        self.state.clear_all_events();
        self.after_mutation()
    }

    fn apply_runtime_state(
        &mut self,
        inventory: &BTreeMap<String, u32>,
        checked_locations: &[String],
        flags: &[String],
        events: &[String],
    ) -> Result<CommandOutcome, CommandError> {
        self.require_static_data()?;
        self.inventory = Inventory::new();
        for (item, count) in inventory {
            self.inventory.add(item.clone().into(), *count);
        }
        self.state.checked_locations_mut().replace(checked_locations.iter().map(Into::into));
        self.items_granted.clear();
        for flag in flags {
            self.state.set_flag(flag.clone());
        }
        for event in events {
            self.state.process_event_item(event.clone());
        }
        self.after_mutation()
    }

    fn recalculate_accessibility(&mut self) -> Result<CommandOutcome, CommandError> {
        self.require_static_data()?;
        self.after_mutation()
    }

    fn evaluate_rule_remote(&self, rule_json: &serde_json::Value) -> Result<CommandOutcome, CommandError> {
        self.require_static_data()?;
        let rule = load::parse_rule(rule_json);
        let ctx = self.eval_context();
        Ok(CommandOutcome::Bool(evaluate(&rule, &ctx).truthy()))
    }

    fn evaluate_location_for_test(&self, location_name: &str, required_items: &[String], excluded_items: &[String]) -> Result<CommandOutcome, CommandError> {
        let static_data = self.require_static_data()?;
        let location = static_data.locations.get(location_name).ok_or_else(|| tracker_domain::UnknownName::location(location_name))?;

        let mut scratch = self.inventory.clone();
        for item in required_items {
            scratch.add(item.clone().into(), 1);
        }
        for item in excluded_items {
            scratch.exclude_item(item.clone().into());
        }

        let ctx = EvalContext::new(&scratch, &self.state, static_data, &self.helpers, static_data.player_id, self.config.helper_recursion_limit());
        let accessible = self.state.is_region_reachable(location.region.as_str()) && evaluate(&location.access_rule, &ctx).truthy();
        Ok(CommandOutcome::Bool(accessible))
    }

    /// Unlike `evaluateLocationAccessibilityForTest`, this actually applies
    /// `required_items`/`excluded_items` to the live inventory, recomputes
    /// reachability from the mutated state, and reports the test
    /// location's accessibility alongside the fresh snapshot.
    fn apply_test_inventory_and_evaluate(
        &mut self,
        location_name: &str,
        required_items: &[String],
        excluded_items: &[String],
    ) -> Result<CommandOutcome, CommandError> {
        let static_data = self.require_static_data()?;
        static_data.locations.get(location_name).ok_or_else(|| tracker_domain::UnknownName::location(location_name))?;

        for item in required_items {
            self.inventory.add(item.clone().into(), 1);
        }
        for item in excluded_items {
            self.inventory.exclude_item(item.clone().into());
        }

        self.recompute_reachability();

        let static_data = self.require_static_data()?;
        let location = static_data.locations.get(location_name).ok_or_else(|| tracker_domain::UnknownName::location(location_name))?;
        let ctx = EvalContext::new(&self.inventory, &self.state, static_data, &self.helpers, static_data.player_id, self.config.helper_recursion_limit());
        let location_accessible = self.state.is_region_reachable(location.region.as_str()) && evaluate(&location.access_rule, &ctx).truthy();

        Ok(CommandOutcome::TestApplication { snapshot: Box::new(self.snapshot(Default::default())), location_accessible })
    }

    fn after_mutation(&mut self) -> Result<CommandOutcome, CommandError> {
        if self.in_batch() && self.batch_defer_region_computation {
            return Ok(CommandOutcome::Ack);
        }
        self.recompute_reachability();
        Ok(CommandOutcome::Snapshot(Box::new(self.snapshot(Default::default()))))
    }

    fn recompute_reachability(&mut self) {
        let Some(static_data) = &self.static_data else { return };
        let outcome = reachability::recompute(&self.inventory, &mut self.state, static_data, &self.helpers, self.config.helper_recursion_limit());
        self.last_outcome = outcome;
    }

    fn eval_context(&self) -> EvalContext<'_> {
        let static_data = self.static_data.as_ref().expect("eval_context requires loaded rules");
        EvalContext::new(&self.inventory, &self.state, static_data, &self.helpers, static_data.player_id, self.config.helper_recursion_limit())
    }

    /// Build the externally visible snapshot. `location_accessibility`/
    /// `inventory_resolved` are populated from `extra` when the caller wants
    /// the heavier diagnostic fields (`getFullSnapshot`); ordinary mutating
    /// commands omit them to keep the common-path payload small.
    fn snapshot(&mut self, extra: SnapshotExtras) -> Snapshot {
        self.generation += 1;
        let static_data = self.static_data.as_ref();

        let newly_reachable = self
            .last_outcome
            .newly_reachable_regions
            .iter()
            .map(|region| (static_data.map(|d| d.player_id).unwrap_or(0), region.clone()))
            .collect();

        Snapshot {
            generation: self.generation,
            inventory: self
                .inventory_counts(),
            checked_locations: self.state.checked_locations().iter().map(|n| n.as_str().to_string()).collect(),
            flags: self.state.flags().map(str::to_string).collect(),
            events: self.state.events().map(str::to_string).collect(),
            settings: self.state.settings().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            region_reachability: self.state.region_reachability().iter().map(|(k, v)| (k.as_str().to_string(), *v)).collect(),
            newly_reachable,
            location_accessibility: if extra.include_accessibility { Some(self.last_outcome.location_accessibility.clone()) } else { None },
            inventory_resolved: if extra.include_resolved { Some(self.resolved_inventory()) } else { None },
            game_name: static_data.map(|d| d.game_name.clone()).unwrap_or_default(),
            player_id: static_data.map(|d| d.player_id).unwrap_or(0),
            rules_source: static_data.map(|d| d.rules_source.clone()).unwrap_or_default(),
        }
    }

    fn inventory_counts(&self) -> BTreeMap<String, u32> {
        self.static_data
            .as_ref()
            .map(|d| d.items.keys().filter_map(|name| {
                let count = self.inventory.count(name.as_str());
                (count > 0).then(|| (name.as_str().to_string(), count))
            }).collect())
            .unwrap_or_default()
    }

    fn resolved_inventory(&self) -> BTreeMap<String, Vec<tracker_domain::ResolvedItem>> {
        let Some(static_data) = &self.static_data else { return Default::default() };
        static_data
            .progression_mapping
            .iter_bases()
            .filter_map(|base| {
                let resolved = self.inventory.resolve(base.as_str(), &static_data.progression_mapping);
                (!resolved.is_empty()).then(|| (base.as_str().to_string(), resolved))
            })
            .collect()
    }

    pub fn savable_state(&self) -> SavableState {
        SavableState {
            inventory: self.inventory_counts(),
            checked_locations: self.state.checked_locations().iter().map(|n| n.as_str().to_string()).collect(),
            flags: self.state.flags().map(str::to_string).collect(),
            events: self.state.events().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotExtras {
    pub include_accessibility: bool,
    pub include_resolved: bool,
}

#[cfg(test)]
mod tests {
    use tracker_protocol::PlayerInfo;

    use super::*;

    fn player_info() -> PlayerInfo {
        PlayerInfo { player_id: 1, game_name: "Test Game".into() }
    }

    /// One reachable region with two always-accessible locations, each
    /// holding an item for a distinct player slot.
    fn two_location_rules() -> serde_json::Value {
        serde_json::json!({
            "game_name": "Test Game",
            "regions": { "Menu": { "exits": [], "locations": ["L_A", "L_B"] } },
            "locations": {
                "L_A": { "region": "Menu", "item": { "name": "Item A", "player": 1 } },
                "L_B": { "region": "Menu", "item": { "name": "Item B", "player": 2 } },
            },
            "items": {
                "Item A": {},
                "Item B": {},
            },
            "start_regions": ["Menu"],
        })
    }

    /// Single reachable region with one location gated on carrying "Key".
    fn gated_location_rules() -> serde_json::Value {
        serde_json::json!({
            "game_name": "Test Game",
            "regions": { "Menu": { "exits": [], "locations": ["L_Gated"] } },
            "locations": {
                "L_Gated": {
                    "region": "Menu",
                    "access_rule": { "kind": "item_check", "item": "Key" },
                    "item": { "name": "Prize", "player": 1 },
                },
            },
            "items": { "Key": {}, "Prize": {} },
            "start_regions": ["Menu"],
        })
    }

    #[test]
    fn batch_update_emits_no_snapshot_until_commit_and_applies_everything_in_order() {
        let mut manager = StateManager::new(EngineConfig::default());
        manager.handle(&Command::LoadRules { rules_data: two_location_rules(), player_info: player_info() }).unwrap();

        assert!(matches!(manager.handle(&Command::BeginBatchUpdate { defer_region_computation: true }).unwrap(), CommandOutcome::Ack));
        assert!(matches!(manager.handle(&Command::AddItemToInventory { item: "Item A".into(), quantity: 1 }).unwrap(), CommandOutcome::Ack));
        assert!(matches!(
            manager.handle(&Command::CheckLocation { location_name: "L_A".into(), add_items: true, force_check: true }).unwrap(),
            CommandOutcome::Ack
        ));
        assert!(matches!(
            manager.handle(&Command::CheckLocation { location_name: "L_B".into(), add_items: true, force_check: true }).unwrap(),
            CommandOutcome::Ack
        ));

        let CommandOutcome::Snapshot(snapshot) = manager.handle(&Command::CommitBatchUpdate).unwrap() else {
            panic!("commitBatchUpdate must emit a snapshot");
        };
        assert_eq!(snapshot.checked_locations, vec!["L_A".to_string(), "L_B".to_string()]);
    }

    #[test]
    fn multiworld_check_marks_checked_without_adding_another_players_item() {
        let mut manager = StateManager::new(EngineConfig::default());
        manager.handle(&Command::LoadRules { rules_data: two_location_rules(), player_info: player_info() }).unwrap();

        let CommandOutcome::Snapshot(snapshot) =
            manager.handle(&Command::CheckLocation { location_name: "L_B".into(), add_items: true, force_check: true }).unwrap()
        else {
            panic!("expected a snapshot");
        };
        assert!(snapshot.checked_locations.contains(&"L_B".to_string()));
        assert!(!snapshot.inventory.contains_key("Item B"));
    }

    #[test]
    fn check_then_uncheck_restores_inventory_and_checked_set() {
        let mut manager = StateManager::new(EngineConfig::default());
        manager.handle(&Command::LoadRules { rules_data: two_location_rules(), player_info: player_info() }).unwrap();
        let before = manager.snapshot(Default::default());

        manager.handle(&Command::CheckLocation { location_name: "L_A".into(), add_items: true, force_check: true }).unwrap();
        manager.handle(&Command::UncheckLocation { location_name: "L_A".into() }).unwrap();

        let after = manager.snapshot(Default::default());
        assert_eq!(before.checked_locations, after.checked_locations);
        assert_eq!(before.inventory, after.inventory);
    }

    #[test]
    fn get_full_snapshot_includes_location_accessibility_and_resolved_inventory() {
        let mut manager = StateManager::new(EngineConfig::default());
        manager.handle(&Command::LoadRules { rules_data: two_location_rules(), player_info: player_info() }).unwrap();

        let CommandOutcome::Snapshot(snapshot) = manager.handle(&Command::GetFullSnapshot).unwrap() else {
            panic!("expected a snapshot");
        };
        assert!(snapshot.location_accessibility.is_some());
        assert!(snapshot.inventory_resolved.is_some());
    }

    #[test]
    fn clear_state_and_reset_preserves_settings() {
        let mut manager = StateManager::new(EngineConfig::default());
        manager.handle(&Command::LoadRules { rules_data: two_location_rules(), player_info: player_info() }).unwrap();
        manager.handle(&Command::SetAutoCollectEventsConfig { enabled: false }).unwrap();
        manager.handle(&Command::AddItemToInventory { item: "Item A".into(), quantity: 3 }).unwrap();

        let CommandOutcome::Snapshot(snapshot) = manager.handle(&Command::ClearStateAndReset).unwrap() else {
            panic!("expected a snapshot");
        };
        assert!(!snapshot.inventory.contains_key("Item A"));
        assert_eq!(snapshot.settings.get("auto_collect_events"), Some(&tracker_domain::SettingValue::Bool(false)));
    }

    #[test]
    fn evaluate_location_for_test_uses_a_scratch_inventory_and_leaves_real_inventory_untouched() {
        let mut manager = StateManager::new(EngineConfig::default());
        manager.handle(&Command::LoadRules { rules_data: gated_location_rules(), player_info: player_info() }).unwrap();

        let CommandOutcome::Bool(without_key) = manager
            .handle(&Command::EvaluateLocationAccessibilityForTest {
                location_name: "L_Gated".into(),
                required_items: vec![],
                excluded_items: vec![],
            })
            .unwrap()
        else {
            panic!("expected a bool");
        };
        assert!(!without_key);

        let CommandOutcome::Bool(with_key) = manager
            .handle(&Command::EvaluateLocationAccessibilityForTest {
                location_name: "L_Gated".into(),
                required_items: vec!["Key".into()],
                excluded_items: vec![],
            })
            .unwrap()
        else {
            panic!("expected a bool");
        };
        assert!(with_key);

        assert_eq!(manager.inventory.count("Key"), 0);
    }

    #[test]
    fn apply_test_inventory_and_evaluate_mutates_real_inventory_and_reports_new_snapshot() {
        let mut manager = StateManager::new(EngineConfig::default());
        manager.handle(&Command::LoadRules { rules_data: gated_location_rules(), player_info: player_info() }).unwrap();

        let CommandOutcome::TestApplication { snapshot, location_accessible } = manager
            .handle(&Command::ApplyTestInventoryAndEvaluate {
                location_name: "L_Gated".into(),
                required_items: vec!["Key".into()],
                excluded_items: vec![],
            })
            .unwrap()
        else {
            panic!("expected a test-application outcome");
        };

        assert!(location_accessible);
        assert_eq!(snapshot.inventory.get("Key"), Some(&1));
        assert_eq!(manager.inventory.count("Key"), 1);
    }
}
