//! Inventory: item counts, exclusion, progressive resolution.

use std::collections::{HashMap, HashSet};

use crate::ids::{GroupName, ItemName};
use crate::item::ProgressionMapping;

/// A resolved progression rung, returned by [`Inventory::resolve`] for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub name: String,
    pub level: u32,
    pub provides: Vec<String>,
}

/// Mutable owned-by-`StateManager` inventory.
///
/// `has`/`count_group` need information that lives outside the inventory
/// itself (active events live on `State`; group membership and progression
/// ladders live on `StaticData`), so those queries take the collaborating
/// data as explicit arguments rather than reaching for ambient state — the
/// same shape the rule interpreter's `evaluate(rule, ctx)` contract uses.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    counts: HashMap<ItemName, u32>,
    exclude: HashSet<ItemName>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count[item] += n` unless `item` is excluded. Returns `false` when
    /// the add was suppressed by exclusion (callers use this to decide
    /// whether to also fire the event hook).
    pub fn add(&mut self, item: ItemName, n: u32) -> bool {
        if self.exclude.contains(&item) {
            return false;
        }
        *self.counts.entry(item).or_insert(0) += n;
        true
    }

    /// Saturates at zero.
    pub fn remove(&mut self, item: &str, n: u32) {
        if let Some(count) = self.counts.get_mut(item) {
            *count = count.saturating_sub(n);
        }
    }

    pub fn exclude_item(&mut self, item: ItemName) {
        self.exclude.insert(item);
    }

    pub fn unexclude_item(&mut self, item: &str) {
        self.exclude.remove(item);
    }

    pub fn is_excluded(&self, item: &str) -> bool {
        self.exclude.contains(item)
    }

    /// Direct count, as distinct from resolved `has`. `count("Progressive
    /// Sword")` after adding one copy is `1`, never the resolved item name.
    pub fn count(&self, item: &str) -> u32 {
        self.counts.get(item).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Invariant: `has(x)` iff `x` is an active event, or (`x` isn't
    /// excluded and (direct count > 0, or some progression ladder resolves
    /// to `x` at the current base count)).
    pub fn has(&self, item: &str, is_active_event: bool, progression: &ProgressionMapping) -> bool {
        if is_active_event {
            return true;
        }
        if self.exclude.contains(item) {
            return false;
        }
        if self.count(item) > 0 {
            return true;
        }
        progression
            .bases_resolving_to(item)
            .into_iter()
            .any(|(base, level)| self.count(base.as_str()) >= level)
    }

    /// `countGroup(g) = 0` if `"Any"+g` is excluded, else the sum of
    /// `count(i)` over every item `i` in group `g`.
    pub fn count_group(&self, group: &str, groups: &HashMap<GroupName, HashSet<ItemName>>) -> u32 {
        let any_key = format!("Any{group}");
        if self.exclude.contains(any_key.as_str()) {
            return 0;
        }
        match groups.get(group) {
            Some(members) => members.iter().map(|i| self.count(i.as_str())).sum(),
            None => 0,
        }
    }

    /// Diagnostic resolution: every ladder rung reachable at the current
    /// base count, across every progressive item owned.
    pub fn resolve(&self, item: &str, progression: &ProgressionMapping) -> Vec<ResolvedItem> {
        let count = self.count(item);
        progression
            .resolved_at(item, count)
            .into_iter()
            .map(|entry| ResolvedItem {
                name: entry.name.as_str().to_string(),
                level: entry.level,
                provides: entry.provides.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ProgressionEntry;

    fn sword_progression() -> ProgressionMapping {
        let mut mapping = ProgressionMapping::new();
        mapping.insert(
            "Progressive Sword".into(),
            vec![
                ProgressionEntry { name: "Fighter Sword".into(), level: 1, provides: vec![] },
                ProgressionEntry { name: "Master Sword".into(), level: 2, provides: vec![] },
            ],
        );
        mapping
    }

    #[test]
    fn progressive_sword_scenario_from_spec_8_1() {
        let progression = sword_progression();
        let mut inv = Inventory::new();
        inv.add("Progressive Sword".into(), 1);

        assert!(inv.has("Fighter Sword", false, &progression));
        assert!(!inv.has("Master Sword", false, &progression));
        assert!(inv.has("Progressive Sword", false, &progression));
        assert_eq!(inv.count("Progressive Sword"), 1);
    }

    #[test]
    fn count_never_goes_negative() {
        let mut inv = Inventory::new();
        inv.remove("Bombs", 5);
        assert_eq!(inv.count("Bombs"), 0);
        inv.add("Bombs".into(), 2);
        inv.remove("Bombs", 10);
        assert_eq!(inv.count("Bombs"), 0);
    }

    #[test]
    fn exclusion_suppresses_has_even_with_direct_count() {
        let progression = ProgressionMapping::new();
        let mut inv = Inventory::new();
        inv.add("Flippers".into(), 1);
        inv.exclude_item("Flippers".into());
        assert!(!inv.has("Flippers", false, &progression));
    }

    #[test]
    fn unexcluding_does_not_retroactively_resurrect_counts() {
        // Exclusion is a query-time filter, not a historical gate: the
        // count itself was never touched, so removing the exclusion
        // immediately exposes whatever was already there.
        let progression = ProgressionMapping::new();
        let mut inv = Inventory::new();
        inv.add("Flippers".into(), 1);
        inv.exclude_item("Flippers".into());
        assert!(!inv.has("Flippers", false, &progression));
        inv.unexclude_item("Flippers");
        assert!(inv.has("Flippers", false, &progression));
        assert_eq!(inv.count("Flippers"), 1);
    }

    #[test]
    fn active_event_has_true_regardless_of_count() {
        let progression = ProgressionMapping::new();
        let inv = Inventory::new();
        assert!(inv.has("Pendant", true, &progression));
    }

    #[test]
    fn count_group_sums_members_and_zero_on_any_exclusion() {
        let mut groups: HashMap<GroupName, HashSet<ItemName>> = HashMap::new();
        groups.insert(
            "Bottle".into(),
            ["Bottle", "Bottle (Red Potion)"]
                .into_iter()
                .map(ItemName::from)
                .collect(),
        );
        let mut inv = Inventory::new();
        inv.add("Bottle".into(), 1);
        inv.add("Bottle (Red Potion)".into(), 2);
        assert_eq!(inv.count_group("Bottle", &groups), 3);

        inv.exclude_item("AnyBottle".into());
        assert_eq!(inv.count_group("Bottle", &groups), 0);
    }
}
