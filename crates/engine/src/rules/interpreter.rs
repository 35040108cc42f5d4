//! The rule AST interpreter. `evaluate` never returns `Err`: an
//! unknown helper or state method degrades to `false` (logged), matching
//! the rule "evaluation never throws" so a single bad rule can't take down
//! a reachability pass.

use tracing::warn;
use tracker_domain::{CompareOp, Resolvable, Rule, Value};

use super::context::EvalContext;

/// Evaluate a rule node to a [`Value`]. Boolean-context callers (reachability,
/// `checkLocation`) read the result through [`Value::truthy`].
///
/// When `ctx` carries a `TraceCollector` (via [`EvalContext::with_trace`]),
/// every recursive call through this entry point also records a
/// [`crate::rules::RuleTrace`] frame; without one attached this adds a
/// single branch and nothing else.
pub fn evaluate(rule: &Rule, ctx: &EvalContext) -> Value {
    let Some(collector) = ctx.trace else {
        return evaluate_node(rule, ctx);
    };
    collector.enter();
    let value = evaluate_node(rule, ctx);
    collector.exit(describe_node(rule), value.clone());
    value
}

/// Describes a node for its trace label. Deliberately terse — enough to
/// tell nodes of the same kind apart in a trace dump, not a full dump of
/// the node's arguments.
fn describe_node(rule: &Rule) -> String {
    match rule {
        Rule::Constant(_) => "constant".to_string(),
        Rule::Name(name) => format!("name({name})"),
        Rule::Attribute { attr, .. } => format!("attribute(.{attr})"),
        Rule::Subscript { .. } => "subscript".to_string(),
        Rule::FunctionCall { .. } => "function_call".to_string(),
        Rule::ItemCheck { item } => format!("item_check({})", describe_resolvable(item)),
        Rule::CountCheck { item, .. } => format!("count_check({})", describe_resolvable(item)),
        Rule::GroupCheck { group, .. } => format!("group_check({})", describe_resolvable(group)),
        Rule::StateFlag { flag } => format!("state_flag({})", describe_resolvable(flag)),
        Rule::Helper { name, .. } => format!("helper({name})"),
        Rule::StateMethod { method, .. } => format!("state_method({method})"),
        Rule::Comparison { op, .. } => format!("comparison({op:?})"),
        Rule::And(_) => "and".to_string(),
        Rule::Or(_) => "or".to_string(),
    }
}

fn describe_resolvable(resolvable: &Resolvable<String>) -> &str {
    match resolvable {
        Resolvable::Literal(s) => s.as_str(),
        Resolvable::Nested(_) => "<nested>",
    }
}

fn evaluate_node(rule: &Rule, ctx: &EvalContext) -> Value {
    match rule {
        Rule::Constant(value) => value.clone(),

        Rule::And(conditions) => {
            for condition in conditions {
                if !evaluate(condition, ctx).truthy() {
                    return Value::Bool(false);
                }
            }
            Value::Bool(true)
        }

        Rule::Or(conditions) => {
            for condition in conditions {
                if evaluate(condition, ctx).truthy() {
                    return Value::Bool(true);
                }
            }
            Value::Bool(false)
        }

        Rule::ItemCheck { item } => {
            let Some(item) = resolve_string(item, ctx) else {
                return Value::Bool(false);
            };
            Value::Bool(ctx.inventory.has(&item, ctx.state.has_event(&item), &ctx.static_data.progression_mapping))
        }

        Rule::CountCheck { item, count } => {
            let Some(item) = resolve_string(item, ctx) else {
                return Value::Bool(false);
            };
            let required = resolve_int(count.as_ref(), ctx).unwrap_or(1);
            Value::Bool(ctx.inventory.count(&item) as i64 >= required)
        }

        Rule::GroupCheck { group, count } => {
            let Some(group) = resolve_string(group, ctx) else {
                return Value::Bool(false);
            };
            let required = resolve_int(count.as_ref(), ctx).unwrap_or(1);
            Value::Bool(ctx.inventory.count_group(&group, &ctx.static_data.groups) as i64 >= required)
        }

        Rule::StateFlag { flag } => {
            let Some(flag) = resolve_string(flag, ctx) else {
                return Value::Bool(false);
            };
            Value::Bool(ctx.state.has_flag(&flag))
        }

        Rule::Helper { name, args } => {
            let Ok(_guard) = ctx.enter_call() else {
                warn!(helper = %name, "helper recursion limit exceeded");
                return Value::Bool(false);
            };
            let args: Vec<Value> = args.iter().map(|a| evaluate(a, ctx)).collect();
            match ctx.helpers.call(name, ctx, &args) {
                Some(value) => value,
                None => {
                    warn!(helper = %name, "unknown helper, defaulting to false");
                    Value::Bool(false)
                }
            }
        }

        Rule::StateMethod { method, args } => {
            let Ok(_guard) = ctx.enter_call() else {
                warn!(method = %method, "state method recursion limit exceeded");
                return Value::Bool(false);
            };
            let args: Vec<Value> = args.iter().map(|a| evaluate(a, ctx)).collect();
            eval_state_method(method, &args, ctx)
        }

        Rule::Comparison { op, left, right } => {
            let left = evaluate(left, ctx);
            let right = evaluate(right, ctx);
            Value::Bool(compare(&left, &right, *op))
        }

        Rule::Name(name) => eval_name(name, ctx),

        Rule::Attribute { object, attr } => eval_attribute(object, attr, ctx),

        Rule::Subscript { value, index } => {
            let value = evaluate(value, ctx);
            let index = evaluate(index, ctx);
            value.index(&index)
        }

        Rule::FunctionCall { function, args } => eval_function_call(function, args, ctx),
    }
}

fn resolve_string(resolvable: &Resolvable<String>, ctx: &EvalContext) -> Option<String> {
    match resolvable {
        Resolvable::Literal(s) => Some(s.clone()),
        Resolvable::Nested(rule) => evaluate(rule, ctx).as_str().map(str::to_owned),
    }
}

fn resolve_int(resolvable: Option<&Resolvable<i64>>, ctx: &EvalContext) -> Option<i64> {
    match resolvable {
        None => None,
        Some(Resolvable::Literal(n)) => Some(*n),
        Some(Resolvable::Nested(rule)) => evaluate(rule, ctx).as_f64().map(|f| f as i64),
    }
}

fn eval_name(name: &str, ctx: &EvalContext) -> Value {
    match name {
        "state" | "self" | "multiworld" => Value::Callable(name.to_string()),
        "builtins" => Value::Callable("builtins".to_string()),
        "player" => Value::Int(ctx.player as i64),
        _ => {
            if ctx.state.has_flag(name) {
                Value::Bool(true)
            } else {
                Value::Bool(ctx.inventory.has(name, ctx.state.has_event(name), &ctx.static_data.progression_mapping))
            }
        }
    }
}

const BUILTIN_ATTRS: &[&str] = &["len", "zip", "range", "all", "any", "bool"];

fn eval_attribute(object: &Rule, attr: &str, ctx: &EvalContext) -> Value {
    let object = evaluate(object, ctx);
    match object {
        Value::Callable(path) if BUILTIN_ATTRS.contains(&attr) && path == "builtins" => Value::Callable(attr.to_string()),
        Value::Callable(path) => Value::Callable(format!("{path}.{attr}")),
        Value::Map(map) => map.get(attr).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn eval_function_call(function: &Rule, args: &[Rule], ctx: &EvalContext) -> Value {
    let Ok(_guard) = ctx.enter_call() else {
        warn!("function call recursion limit exceeded");
        return Value::Bool(false);
    };

    let target = evaluate(function, ctx);
    let args: Vec<Value> = args.iter().map(|a| evaluate(a, ctx)).collect();

    let Value::Callable(path) = target else {
        return Value::Null;
    };

    if path.ends_with(".can_defeat") || path.ends_with(".defeat_rule") {
        return Value::Bool(true);
    }
    if let Some(kind) = multiworld_getter_kind(&path) {
        let name = args.first().cloned().unwrap_or(Value::Null);
        let player = args.get(1).cloned().unwrap_or(Value::Int(ctx.player as i64));
        let call_args = [name, Value::Str(kind.to_string()), player];
        return ctx.helpers.call("can_reach", ctx, &call_args).unwrap_or(Value::Bool(false));
    }
    if path.ends_with(".can_reach") || path == "can_reach" {
        return ctx.helpers.call("can_reach", ctx, &args).unwrap_or(Value::Bool(false));
    }
    if !path.contains('.') {
        if let Some(result) = eval_builtin(&path, &args) {
            return result;
        }
    }

    let name = path.rsplit('.').next().unwrap_or(&path);
    match ctx.helpers.call(name, ctx, &args) {
        Some(value) => value,
        None => {
            warn!(function = %path, "unresolvable function call, defaulting to false");
            Value::Bool(false)
        }
    }
}

/// `state.multiworld.get_region/get_location/get_entrance(name, player)` →
/// the `can_reach` kind it maps to, per spec §4.1's function_call table.
fn multiworld_getter_kind(path: &str) -> Option<&'static str> {
    if path.ends_with(".get_region") {
        Some("Region")
    } else if path.ends_with(".get_location") {
        Some("Location")
    } else if path.ends_with(".get_entrance") {
        Some("Entrance")
    } else {
        None
    }
}

fn eval_builtin(name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "len" => Some(Value::Int(match args.first()? {
            Value::List(items) => items.len() as i64,
            Value::Map(map) => map.len() as i64,
            Value::Str(s) => s.len() as i64,
            _ => 0,
        })),
        "range" => {
            let n = args.first()?.as_f64()? as i64;
            Some(Value::List((0..n).map(Value::Int).collect()))
        }
        "all" => Some(Value::Bool(match args.first()? {
            Value::List(items) => items.iter().all(Value::truthy),
            other => other.truthy(),
        })),
        "any" => Some(Value::Bool(match args.first()? {
            Value::List(items) => items.iter().any(Value::truthy),
            other => other.truthy(),
        })),
        "bool" => Some(Value::Bool(args.first().map(Value::truthy).unwrap_or(false))),
        "zip" => {
            let lists: Vec<&Vec<Value>> = args
                .iter()
                .filter_map(|a| match a {
                    Value::List(items) => Some(items),
                    _ => None,
                })
                .collect();
            let len = lists.iter().map(|l| l.len()).min().unwrap_or(0);
            let zipped = (0..len)
                .map(|i| Value::List(lists.iter().map(|l| l[i].clone()).collect()))
                .collect();
            Some(Value::List(zipped))
        }
        _ => None,
    }
}

fn eval_state_method(method: &str, args: &[Value], ctx: &EvalContext) -> Value {
    match method {
        "has" => {
            let Some(name) = args.first().and_then(Value::as_str) else {
                return Value::Bool(false);
            };
            let required = args.get(1).and_then(Value::as_f64).unwrap_or(1.0) as i64;
            Value::Bool(ctx.inventory.count(name) as i64 >= required)
        }
        "count" => {
            let Some(name) = args.first().and_then(Value::as_str) else {
                return Value::Int(0);
            };
            Value::Int(ctx.inventory.count(name) as i64)
        }
        "has_group" => {
            let Some(group) = args.first().and_then(Value::as_str) else {
                return Value::Bool(false);
            };
            let required = args.get(2).and_then(Value::as_f64).unwrap_or(1.0) as i64;
            Value::Bool(ctx.inventory.count_group(group, &ctx.static_data.groups) as i64 >= required)
        }
        "can_reach" => ctx.helpers.call("can_reach", ctx, args).unwrap_or(Value::Bool(false)),
        _ => {
            warn!(method = %method, "unknown state method, defaulting to false");
            Value::Bool(false)
        }
    }
}

fn compare(left: &Value, right: &Value, op: CompareOp) -> bool {
    let ordering = match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l.partial_cmp(&r),
        _ => match (left.as_str(), right.as_str()) {
            (Some(l), Some(r)) => Some(l.cmp(r)),
            _ => None,
        },
    };

    match (op, ordering) {
        (CompareOp::Eq, _) => left == right,
        (_, None) => false,
        (CompareOp::GtE, Some(o)) => o.is_ge(),
        (CompareOp::Gt, Some(o)) => o.is_gt(),
        (CompareOp::LtE, Some(o)) => o.is_le(),
        (CompareOp::Lt, Some(o)) => o.is_lt(),
    }
}

#[cfg(test)]
mod tests {
    use tracker_domain::{Inventory, State, StaticData};

    use super::*;
    use crate::helpers::HelperRegistry;

    fn fixture() -> (Inventory, State, StaticData, HelperRegistry) {
        (Inventory::new(), State::new(), StaticData::new("Test Game", 1, "test.json"), HelperRegistry::new())
    }

    #[test]
    fn and_of_empty_is_true_or_of_empty_is_false() {
        let (inventory, state, static_data, helpers) = fixture();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);
        assert_eq!(evaluate(&Rule::And(vec![]), &ctx), Value::Bool(true));
        assert_eq!(evaluate(&Rule::Or(vec![]), &ctx), Value::Bool(false));
    }

    #[test]
    fn and_short_circuits_without_evaluating_later_operands() {
        let (inventory, state, static_data, helpers) = fixture();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);
        // A later operand that would panic the recursion guard if ever
        // evaluated proves short-circuit: depth never climbs past one call.
        let rule = Rule::And(vec![Rule::always_false(), Rule::Helper { name: "does_not_exist".into(), args: vec![] }]);
        assert_eq!(evaluate(&rule, &ctx), Value::Bool(false));
    }

    #[test]
    fn constant_round_trips_through_evaluate() {
        let (inventory, state, static_data, helpers) = fixture();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);
        assert_eq!(evaluate(&Rule::Constant(Value::Int(7)), &ctx), Value::Int(7));
    }

    #[test]
    fn comparison_matches_host_numeric_ordering() {
        let (inventory, state, static_data, helpers) = fixture();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);
        let rule = Rule::Comparison {
            op: CompareOp::GtE,
            left: Box::new(Rule::Constant(Value::Int(5))),
            right: Box::new(Rule::Constant(Value::Int(5))),
        };
        assert_eq!(evaluate(&rule, &ctx), Value::Bool(true));
    }

    #[test]
    fn item_check_reflects_inventory_count() {
        let (mut inventory, state, static_data, helpers) = fixture();
        inventory.add("Bombs".into(), 1);
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);
        assert_eq!(evaluate(&Rule::item("Bombs"), &ctx), Value::Bool(true));
        assert_eq!(evaluate(&Rule::item("Flippers"), &ctx), Value::Bool(false));
    }

    #[test]
    fn unknown_helper_degrades_to_false_rather_than_erroring() {
        let (inventory, state, static_data, helpers) = fixture();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);
        let rule = Rule::Helper { name: "nonexistent_helper".into(), args: vec![] };
        assert_eq!(evaluate(&rule, &ctx), Value::Bool(false));
    }

    #[test]
    fn builtins_name_binds_to_a_callable_so_len_attribute_resolves() {
        let (inventory, state, static_data, helpers) = fixture();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);
        let rule = Rule::FunctionCall {
            function: Box::new(Rule::Attribute { object: Box::new(Rule::Name("builtins".into())), attr: "len".into() }),
            args: vec![Rule::Constant(Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))],
        };
        assert_eq!(evaluate(&rule, &ctx), Value::Int(3));
    }

    #[test]
    fn multiworld_get_region_call_maps_to_can_reach() {
        use tracker_domain::{Exit, Region};

        let inventory = Inventory::new();
        let mut state = State::new();
        state.set_region_status("Hyrule".into(), tracker_domain::ReachabilityStatus::Reachable);
        let mut static_data = StaticData::new("Test Game", 1, "test.json");
        static_data.regions.insert("Hyrule".into(), Region::new("Hyrule"));
        static_data.exits.insert(
            "unused".into(),
            Exit { name: "unused".into(), connected_region: None, access_rule: Rule::always_true() },
        );
        let helpers = crate::helpers::HelperRegistry::for_game("Test Game");
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);

        let rule = Rule::FunctionCall {
            function: Box::new(Rule::Attribute {
                object: Box::new(Rule::Attribute { object: Box::new(Rule::Name("state".into())), attr: "multiworld".into() }),
                attr: "get_region".into(),
            }),
            args: vec![Rule::Constant(Value::Str("Hyrule".into())), Rule::Constant(Value::Int(1))],
        };
        assert_eq!(evaluate(&rule, &ctx), Value::Bool(true));
    }

    #[test]
    fn attaching_a_trace_collector_records_a_tree_matching_the_rule_shape() {
        use crate::rules::trace::TraceCollector;

        let (mut inventory, state, static_data, helpers) = fixture();
        inventory.add("Bombs".into(), 1);
        let collector = TraceCollector::new();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64).with_trace(&collector);

        let rule = Rule::And(vec![Rule::item("Bombs"), Rule::count("Bombs", 1)]);
        assert_eq!(evaluate(&rule, &ctx), Value::Bool(true));

        let root = collector.take().expect("evaluate should have populated a root trace");
        assert_eq!(root.node, "and");
        assert_eq!(root.result, Value::Bool(true));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].node, "item_check(Bombs)");
        assert_eq!(root.children[1].node, "count_check(Bombs)");
    }

    #[test]
    fn untraced_evaluate_leaves_no_trace_collector_involved() {
        let (inventory, state, static_data, helpers) = fixture();
        let ctx = EvalContext::new(&inventory, &state, &static_data, &helpers, 1, 64);
        assert!(ctx.trace.is_none());
        assert_eq!(evaluate(&Rule::always_true(), &ctx), Value::Bool(true));
    }
}
