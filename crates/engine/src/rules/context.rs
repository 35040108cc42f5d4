//! Evaluation context.

use std::cell::Cell;

use tracker_domain::{Inventory, PlayerId, State, StaticData};

use crate::helpers::HelperLookup;
use crate::rules::trace::TraceCollector;

/// The read-only view a single `evaluate` call operates against, plus a
/// recursion-depth guard shared across the whole evaluation (helpers may
/// call back into `evaluate`, so the guard must be visible across nested
/// calls rather than reset per node).
pub struct EvalContext<'a> {
    pub inventory: &'a Inventory,
    pub state: &'a State,
    pub static_data: &'a StaticData,
    pub helpers: &'a dyn HelperLookup,
    pub player: PlayerId,
    depth: Cell<u32>,
    depth_limit: u32,
    /// Present only when the caller wants a `RuleTrace` tree back;
    /// `evaluate` skips all trace bookkeeping when this is `None`.
    pub(crate) trace: Option<&'a TraceCollector>,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        inventory: &'a Inventory,
        state: &'a State,
        static_data: &'a StaticData,
        helpers: &'a dyn HelperLookup,
        player: PlayerId,
        depth_limit: u32,
    ) -> Self {
        Self { inventory, state, static_data, helpers, player, depth: Cell::new(0), depth_limit, trace: None }
    }

    /// The same context, but with a [`TraceCollector`] attached so the next
    /// top-level `evaluate(rule, &ctx)` call also populates `collector`.
    pub fn with_trace(mut self, collector: &'a TraceCollector) -> Self {
        self.trace = Some(collector);
        self
    }

    /// Enter a helper/state-method call, bumping the recursion guard.
    /// Returns `Err` (depth limit exceeded) rather than recursing further.
    pub fn enter_call(&self) -> Result<CallGuard<'_, 'a>, crate::error::RuleEvalError> {
        let current = self.depth.get();
        if current >= self.depth_limit {
            return Err(crate::error::RuleEvalError::RecursionLimitExceeded { limit: self.depth_limit });
        }
        self.depth.set(current + 1);
        Ok(CallGuard { ctx: self })
    }
}

/// RAII guard decrementing the recursion counter on drop, so an early
/// return or panic-free error path never leaks depth.
pub struct CallGuard<'g, 'a> {
    ctx: &'g EvalContext<'a>,
}

impl Drop for CallGuard<'_, '_> {
    fn drop(&mut self) {
        self.ctx.depth.set(self.ctx.depth.get() - 1);
    }
}
