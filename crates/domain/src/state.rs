//! State: flags, events, settings, derived reachability and
//! checked-location tracking.

use std::collections::{HashMap, HashSet};

use crate::ids::{LocationName, RegionName};

/// Ternary region-reachability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityStatus {
    Unreachable,
    Reachable,
    Checked,
}

impl ReachabilityStatus {
    pub fn is_reachable_or_checked(self) -> bool {
        matches!(self, Self::Reachable | Self::Checked)
    }
}

/// A settings value, as stored per-player. Rules JSON settings are scalar
/// (bool/number/string); modeled as a small closed enum rather than
/// `serde_json::Value` so callers get exhaustive matches.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) => Some(*f as i64),
            _ => None,
        }
    }
}

/// Insertion-ordered set of checked location names. `checkLocation`/
/// `uncheckLocation` must preserve the order locations were first checked
/// in, so this is a small `Vec` + membership-index pair rather than a
/// bare `HashSet`.
#[derive(Debug, Clone, Default)]
pub struct CheckedLocations {
    order: Vec<LocationName>,
    members: HashSet<LocationName>,
}

impl CheckedLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: LocationName) -> bool {
        if self.members.insert(name.clone()) {
            self.order.push(name);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        if self.members.remove(name) {
            self.order.retain(|n| n.as_str() != name);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationName> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Replace the checked set wholesale, preserving the order given.
    pub fn replace(&mut self, names: impl IntoIterator<Item = LocationName>) {
        self.clear();
        for name in names {
            self.insert(name);
        }
    }
}

/// Flags, events, settings and derived reachability/checked state.
/// Mutable, owned by the `StateManager`.
#[derive(Debug, Clone, Default)]
pub struct State {
    flags: HashSet<String>,
    events: HashSet<String>,
    settings: HashMap<String, SettingValue>,
    region_reachability: HashMap<RegionName, ReachabilityStatus>,
    checked_locations: CheckedLocations,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.flags.insert(name.into());
    }

    pub fn clear_flag(&mut self, name: &str) {
        self.flags.remove(name);
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.events.contains(name)
    }

    /// Marks an event item active. Fired either when the event's sentinel
    /// location is checked, or directly by the auto-collect fix-point.
    pub fn process_event_item(&mut self, name: impl Into<String>) {
        self.events.insert(name.into());
    }

    pub fn clear_event(&mut self, name: &str) {
        self.events.remove(name);
    }

    pub fn clear_all_events(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    pub fn setting(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(key)
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: SettingValue) {
        self.settings.insert(key.into(), value);
    }

    pub fn settings(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `auto_collect_events` defaults to enabled.
    pub fn auto_collect_events(&self) -> bool {
        self.setting("auto_collect_events")
            .and_then(SettingValue::as_bool)
            .unwrap_or(true)
    }

    pub fn region_status(&self, region: &str) -> ReachabilityStatus {
        self.region_reachability
            .get(region)
            .copied()
            .unwrap_or(ReachabilityStatus::Unreachable)
    }

    pub fn set_region_status(&mut self, region: RegionName, status: ReachabilityStatus) {
        self.region_reachability.insert(region, status);
    }

    pub fn is_region_reachable(&self, region: &str) -> bool {
        self.region_status(region).is_reachable_or_checked()
    }

    pub fn reset_region_reachability(&mut self) {
        self.region_reachability.clear();
    }

    pub fn region_reachability(&self) -> &HashMap<RegionName, ReachabilityStatus> {
        &self.region_reachability
    }

    pub fn is_location_checked(&self, name: &str) -> bool {
        self.checked_locations.contains(name)
    }

    pub fn checked_locations(&self) -> &CheckedLocations {
        &self.checked_locations
    }

    pub fn checked_locations_mut(&mut self) -> &mut CheckedLocations {
        &mut self.checked_locations
    }
}
