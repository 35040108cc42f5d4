//! ALTTP-specific helpers.

use std::sync::Arc;

use tracker_domain::Value;

use crate::rules::context::EvalContext;

use super::HelperRegistry;

const BASE_BOMB_CAPACITY: i64 = 10;
const BOMBS_PER_UPGRADE: i64 = 5;

/// `can_use_bombs(capacity)`: true once owned bomb-upgrade capacity covers
/// `capacity`. With `bombless_start`, the base
/// capacity is zero until the first upgrade is collected.
fn can_use_bombs(ctx: &EvalContext, args: &[Value]) -> Value {
    let required = args.first().and_then(Value::as_f64).unwrap_or(0.0) as i64;
    let upgrades = ctx.inventory.count("Bomb Upgrade (+5)") as i64;
    let bombless_start = ctx.state.setting("bombless_start").and_then(|v| v.as_bool()).unwrap_or(false);

    let base = if bombless_start && upgrades == 0 { 0 } else { BASE_BOMB_CAPACITY };
    let capacity = base + upgrades * BOMBS_PER_UPGRADE;
    Value::Bool(capacity >= required)
}

fn has_sword(ctx: &EvalContext, _args: &[Value]) -> Value {
    Value::Bool(ctx.inventory.count("Progressive Sword") > 0 || ctx.inventory.count("Master Sword") > 0)
}

fn can_lift_rocks(ctx: &EvalContext, _args: &[Value]) -> Value {
    Value::Bool(ctx.inventory.count("Power Glove") > 0 || ctx.inventory.count("Titans Mitts") > 0)
}

fn can_lift_heavy_rocks(ctx: &EvalContext, _args: &[Value]) -> Value {
    Value::Bool(ctx.inventory.count("Titans Mitts") > 0)
}

pub fn registry() -> HelperRegistry {
    let mut registry = HelperRegistry::new();
    registry.register("can_use_bombs", Arc::new(can_use_bombs));
    registry.register("has_sword", Arc::new(has_sword));
    registry.register("can_lift_rocks", Arc::new(can_lift_rocks));
    registry.register("can_lift_heavy_rocks", Arc::new(can_lift_heavy_rocks));
    registry
}
