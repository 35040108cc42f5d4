//! Helper registry: named per-game functions callable from rule
//! ASTs. Helpers are grouped by game and merged at load time, game-specific
//! overriding generic on name collision.

pub mod alttp;
pub mod generic;
pub mod kh2;

use std::collections::HashMap;
use std::sync::Arc;

use tracker_domain::Value;

use crate::rules::context::EvalContext;

/// A pure function `(ctx, args) -> value`.
pub type HelperFn = Arc<dyn Fn(&EvalContext, &[Value]) -> Value + Send + Sync>;

/// Port the interpreter calls through, so tests can substitute a
/// call-counting fake without touching the real registry (the usual
/// `*Port` + `mockall::automock` convention used across this workspace).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait HelperLookup: Send + Sync {
    fn call(&self, name: &str, ctx: &EvalContext, args: &[Value]) -> Option<Value>;
}

/// A name-keyed table of helper functions for one game (or the generic
/// baseline).
#[derive(Clone)]
pub struct HelperRegistry {
    helpers: HashMap<String, HelperFn>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self { helpers: HashMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, f: HelperFn) {
        self.helpers.insert(name.into(), f);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Merge `specific` over `self`; entries in `specific` win on collision.
    pub fn merged_with(mut self, specific: HelperRegistry) -> Self {
        for (name, f) in specific.helpers {
            self.helpers.insert(name, f);
        }
        self
    }

    /// The merged registry for a named game: generic baseline plus the
    /// matching per-game module, if any.
    pub fn for_game(game_name: &str) -> Self {
        let base = generic::registry();
        match game_name.to_ascii_lowercase().as_str() {
            s if s.contains("alttp") || s.contains("link to the past") => base.merged_with(alttp::registry()),
            s if s.contains("kh2") || s.contains("kingdom hearts") => base.merged_with(kh2::registry()),
            _ => base,
        }
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HelperLookup for HelperRegistry {
    fn call(&self, name: &str, ctx: &EvalContext, args: &[Value]) -> Option<Value> {
        self.helpers.get(name).map(|f| f(ctx, args))
    }
}
