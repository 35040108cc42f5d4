//! Optional per-node evaluation traces (spec §4.1's "traces (optional)
//! capture per-node results for debugging"). A [`TraceCollector`] attached
//! to an [`EvalContext`] via [`EvalContext::with_trace`] builds one
//! [`RuleTrace`] tree per top-level `evaluate` call; without one attached,
//! `evaluate` takes the untraced path and pays nothing for it.

use std::cell::RefCell;

use tracker_domain::Value;

/// One evaluated rule node: its label, the value it produced, and the
/// traces of any nested nodes `evaluate` recursed into while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTrace {
    pub node: String,
    pub result: Value,
    pub children: Vec<RuleTrace>,
}

/// Accumulates nested evaluation frames into a single root [`RuleTrace`].
/// Not `Send`/`Sync` by design — a trace collector lives for the duration
/// of one `evaluate` call tree on one thread.
#[derive(Default)]
pub struct TraceCollector {
    frames: RefCell<Vec<Vec<RuleTrace>>>,
    root: RefCell<Option<RuleTrace>>,
}

impl TraceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by `evaluate` before recursing into a node's own logic.
    pub(crate) fn enter(&self) {
        self.frames.borrow_mut().push(Vec::new());
    }

    /// Called by `evaluate` after a node produced `result`, closing out the
    /// frame `enter` opened and attaching it to the parent frame (or, if
    /// this was the outermost call, stashing it as the completed root).
    pub(crate) fn exit(&self, node: String, result: Value) {
        let children = self.frames.borrow_mut().pop().unwrap_or_default();
        let trace = RuleTrace { node, result, children };
        let mut frames = self.frames.borrow_mut();
        match frames.last_mut() {
            Some(parent) => parent.push(trace),
            None => *self.root.borrow_mut() = Some(trace),
        }
    }

    /// Take the most recently completed top-level trace, if any.
    pub fn take(&self) -> Option<RuleTrace> {
        self.root.borrow_mut().take()
    }
}
