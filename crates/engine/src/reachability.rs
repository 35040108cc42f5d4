//! Reachability recomputation: BFS over the region graph, region
//! access-rule and `region_rules` evaluation, checked-location derivation,
//! location accessibility, and the event auto-collect fix-point.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracker_domain::{Inventory, ReachabilityStatus, State, StaticData};

use crate::helpers::HelperLookup;
use crate::rules::{evaluate, EvalContext};

/// What changed in the most recent recompute, handed back to the command
/// layer so it can populate `Snapshot::newly_reachable`.
#[derive(Debug, Default, Clone)]
pub struct RecomputeOutcome {
    pub newly_reachable_regions: BTreeSet<String>,
    pub collected_events: BTreeSet<String>,
    pub location_accessibility: BTreeMap<String, bool>,
}

/// Recompute region reachability, derive checked-region status, and run the
/// event auto-collect fix-point. Mutates `state` in place.
///
/// The BFS visits regions in frontier order and evaluates each candidate
/// region's access rule (and any `Exit` rule leading to it) against the
/// *current* inventory/state snapshot. A region whose rule references
/// another region's reachability via `can_reach` only sees whatever that
/// other region's status happens to be at the moment of evaluation — if
/// the referenced region is visited later in the same pass, the reference
/// resolves unreachable this time and catches up on the next recompute.
/// This mirrors a plain forward BFS rather than a full fixed-point solver;
/// only the event auto-collect loop below is iterated to a fixed point.
pub fn recompute(inventory: &Inventory, state: &mut State, static_data: &StaticData, helpers: &dyn HelperLookup, depth_limit: u32) -> RecomputeOutcome {
    let previously_reachable: BTreeSet<String> =
        static_data.regions.keys().filter(|name| state.is_region_reachable(name.as_str())).map(|n| n.as_str().to_string()).collect();

    state.reset_region_reachability();
    let mut collected_events = BTreeSet::new();

    loop {
        run_bfs(inventory, state, static_data, helpers, depth_limit);
        let newly_collected = collect_events(inventory, state, static_data, helpers, depth_limit);
        if newly_collected.is_empty() {
            break;
        }
        collected_events.extend(newly_collected);
        if !state.auto_collect_events() {
            break;
        }
        // An event just got collected: region rules referencing it may now
        // pass, so the whole BFS reruns against the enlarged event set.
        state.reset_region_reachability();
    }

    mark_checked_regions(state, static_data);

    let newly_reachable_regions: BTreeSet<String> = static_data
        .regions
        .keys()
        .map(|n| n.as_str().to_string())
        .filter(|name| state.is_region_reachable(name) && !previously_reachable.contains(name))
        .collect();

    let location_accessibility = compute_location_accessibility(inventory, state, static_data, helpers, depth_limit);

    RecomputeOutcome { newly_reachable_regions, collected_events, location_accessibility }
}

fn run_bfs(inventory: &Inventory, state: &mut State, static_data: &StaticData, helpers: &dyn HelperLookup, depth_limit: u32) {
    let mut queue: VecDeque<String> = static_data.start_regions.iter().map(|r| r.as_str().to_string()).collect();
    let mut visited: BTreeSet<String> = BTreeSet::new();

    while let Some(region_name) = queue.pop_front() {
        if visited.contains(&region_name) {
            continue;
        }
        let Some(region) = static_data.regions.get(region_name.as_str()) else {
            continue;
        };

        visited.insert(region_name.clone());

        let ctx = EvalContext::new(inventory, state, static_data, helpers, static_data.player_id, depth_limit);
        let region_gate = region.region_rules.iter().all(|rule| evaluate(rule, &ctx).truthy());
        if region_gate {
            state.set_region_status(region_name.as_str().into(), ReachabilityStatus::Reachable);
        }

        // `region_rules` only downgrades *this* region's own reachable/
        // unreachable status (spec §4.6 step 2); a region entered but
        // gated still lets the BFS traverse onward through its exits.
        for exit_name in &region.exits {
            let Some(exit) = static_data.exits.get(exit_name.as_str()) else { continue };
            let Some(target) = &exit.connected_region else { continue };
            if visited.contains(target.as_str()) {
                continue;
            }
            let ctx = EvalContext::new(inventory, state, static_data, helpers, static_data.player_id, depth_limit);
            if evaluate(&exit.access_rule, &ctx).truthy() {
                queue.push_back(target.as_str().to_string());
            }
        }
    }
}

/// Collect every event item whose sentinel location is checked-and-reachable
/// or whose owning region is reachable, not yet active. Called once per BFS
/// pass; the caller loops this to a fixed point.
fn collect_events(inventory: &Inventory, state: &mut State, static_data: &StaticData, helpers: &dyn HelperLookup, depth_limit: u32) -> BTreeSet<String> {
    let mut collected = BTreeSet::new();
    for location in static_data.locations.values() {
        if !location.event || state.has_event(location.name.as_str()) {
            continue;
        }
        if !state.is_region_reachable(location.region.as_str()) {
            continue;
        }
        let ctx = EvalContext::new(inventory, state, static_data, helpers, static_data.player_id, depth_limit);
        if evaluate(&location.access_rule, &ctx).truthy() {
            collected.insert(location.name.as_str().to_string());
        }
    }
    for name in &collected {
        state.process_event_item(name.clone());
    }
    collected
}

/// A region is `Checked` once every location it contains has been checked
///; regions with no locations stay
/// `Reachable` rather than vacuously `Checked`.
fn mark_checked_regions(state: &mut State, static_data: &StaticData) {
    for region in static_data.regions.values() {
        if state.region_status(region.name.as_str()) != ReachabilityStatus::Reachable {
            continue;
        }
        if region.locations.is_empty() {
            continue;
        }
        let all_checked = region.locations.iter().all(|loc| state.is_location_checked(loc.as_str()));
        if all_checked {
            state.set_region_status(region.name.clone(), ReachabilityStatus::Checked);
        }
    }
}

/// `locationAccessibility(L)`: `true` iff `L`'s region is reachable and its
/// own access rule passes, independent of whether `L` has been checked.
fn compute_location_accessibility(
    inventory: &Inventory,
    state: &State,
    static_data: &StaticData,
    helpers: &dyn HelperLookup,
    depth_limit: u32,
) -> BTreeMap<String, bool> {
    static_data
        .locations
        .values()
        .map(|location| {
            let ctx = EvalContext::new(inventory, state, static_data, helpers, static_data.player_id, depth_limit);
            let accessible = state.is_region_reachable(location.region.as_str()) && evaluate(&location.access_rule, &ctx).truthy();
            (location.name.as_str().to_string(), accessible)
        })
        .collect()
}
