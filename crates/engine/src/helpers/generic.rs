//! Game-agnostic helpers available regardless of which game's rules are
//! loaded.

use std::sync::Arc;

use tracker_domain::Value;

use crate::rules::context::EvalContext;
use crate::rules::interpreter;

use super::HelperRegistry;

/// `can_reach(name, kind, player)`: the same dispatch the interpreter's
/// `function_call` node falls back to for recognised multiworld paths
///, exposed as an ordinary helper so rules can call it directly too.
fn can_reach(ctx: &EvalContext, args: &[Value]) -> Value {
    let Some(name) = args.first().and_then(Value::as_str) else {
        return Value::Bool(false);
    };
    let kind = args.get(1).and_then(Value::as_str).unwrap_or("Region");

    let reachable = match kind {
        "Region" => ctx.state.is_region_reachable(name),
        "Location" => ctx
            .static_data
            .locations
            .get(name)
            .map(|loc| ctx.state.is_region_reachable(loc.region.as_str()) && interpreter::evaluate(&loc.access_rule, ctx).truthy())
            .unwrap_or(false),
        "Entrance" | "Exit" => ctx
            .static_data
            .exits
            .get(name)
            .map(|exit| {
                exit.connected_region
                    .as_ref()
                    .map(|r| ctx.state.is_region_reachable(r.as_str()))
                    .unwrap_or(false)
                    && interpreter::evaluate(&exit.access_rule, ctx).truthy()
            })
            .unwrap_or(false),
        _ => false,
    };
    Value::Bool(reachable)
}

fn item_count(ctx: &EvalContext, args: &[Value]) -> Value {
    match args.first().and_then(Value::as_str) {
        Some(name) => Value::Int(ctx.inventory.count(name) as i64),
        None => Value::Int(0),
    }
}

fn has_any(ctx: &EvalContext, args: &[Value]) -> Value {
    let names = match args.first() {
        Some(Value::List(items)) => items.clone(),
        _ => args.to_vec(),
    };
    let any = names.iter().filter_map(Value::as_str).any(|name| has(ctx, name));
    Value::Bool(any)
}

fn has_all(ctx: &EvalContext, args: &[Value]) -> Value {
    let names = match args.first() {
        Some(Value::List(items)) => items.clone(),
        _ => args.to_vec(),
    };
    let all = !names.is_empty() && names.iter().filter_map(Value::as_str).all(|name| has(ctx, name));
    Value::Bool(all)
}

fn has(ctx: &EvalContext, name: &str) -> bool {
    ctx.inventory.has(name, ctx.state.has_event(name), &ctx.static_data.progression_mapping)
}

pub fn registry() -> HelperRegistry {
    let mut registry = HelperRegistry::new();
    registry.register("can_reach", Arc::new(can_reach));
    registry.register("item_count", Arc::new(item_count));
    registry.register("has_any", Arc::new(has_any));
    registry.register("has_all", Arc::new(has_all));
    registry
}
