//! KH2-specific helpers. Thin stand-ins: KH2's real logic keys off
//! per-world dictionaries and list sums the randomizer's own engine derives
//! from run-specific data this tracker never receives, so these fall back
//! to summing the named items directly out of inventory.

use std::sync::Arc;

use tracker_domain::Value;

use crate::rules::context::EvalContext;

use super::HelperRegistry;

/// `kh2_dict_count(dict_name, keys)`: sum of `item_count` over every key in
/// `keys`. `dict_name` is accepted for call-signature compatibility with
/// the randomizer's own helper but otherwise unused, since inventory counts
/// are already keyed by item name alone.
fn kh2_dict_count(ctx: &EvalContext, args: &[Value]) -> Value {
    let keys: Vec<&str> = match args.get(1) {
        Some(Value::List(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let total: i64 = keys.iter().map(|k| ctx.inventory.count(k) as i64).sum();
    Value::Int(total)
}

/// `kh2_list_any_sum(list_name)`: sum of every item count whose name starts
/// with `list_name`, the closest this tracker can get to "sum this named
/// list" without the randomizer's own list contents.
fn kh2_list_any_sum(ctx: &EvalContext, args: &[Value]) -> Value {
    let Some(prefix) = args.first().and_then(Value::as_str) else {
        return Value::Int(0);
    };
    let total: i64 = ctx
        .static_data
        .items
        .keys()
        .filter(|name| name.as_str().starts_with(prefix))
        .map(|name| ctx.inventory.count(name.as_str()) as i64)
        .sum();
    Value::Int(total)
}

/// `form_list_unlock(form_name)`: true once the named Drive Form has been
/// collected directly. Form unlock order in the real randomizer depends on
/// a run-specific form list this tracker never receives, so this checks
/// the form itself rather than a position in that list.
fn form_list_unlock(ctx: &EvalContext, args: &[Value]) -> Value {
    let Some(name) = args.first().and_then(Value::as_str) else {
        return Value::Bool(false);
    };
    Value::Bool(ctx.inventory.count(name) > 0)
}

pub fn registry() -> HelperRegistry {
    let mut registry = HelperRegistry::new();
    registry.register("kh2_dict_count", Arc::new(kh2_dict_count));
    registry.register("kh2_list_any_sum", Arc::new(kh2_list_any_sum));
    registry.register("form_list_unlock", Arc::new(form_list_unlock));
    registry
}

#[cfg(test)]
mod tests {
    use tracker_domain::{Inventory, State, StaticData};

    use super::*;
    use crate::helpers::HelperRegistry as Registry;

    #[test]
    fn dict_count_sums_requested_keys() {
        let mut inventory = Inventory::new();
        inventory.add("Fire".into(), 2);
        inventory.add("Blizzard".into(), 1);
        let state = State::new();
        let static_data = StaticData::new("KH2", 1, "test.json");
        let helpers = Registry::new();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);

        let keys = Value::List(vec![Value::Str("Fire".into()), Value::Str("Blizzard".into())]);
        assert_eq!(kh2_dict_count(&ctx, &[Value::Str("magic".into()), keys]), Value::Int(3));
    }

    #[test]
    fn form_list_unlock_reflects_direct_ownership() {
        let mut inventory = Inventory::new();
        inventory.add("Valor Form".into(), 1);
        let state = State::new();
        let static_data = StaticData::new("KH2", 1, "test.json");
        let helpers = Registry::new();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);

        assert_eq!(form_list_unlock(&ctx, &[Value::Str("Valor Form".into())]), Value::Bool(true));
        assert_eq!(form_list_unlock(&ctx, &[Value::Str("Final Form".into())]), Value::Bool(false));
    }
}
