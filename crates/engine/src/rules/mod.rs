//! Rule evaluation: the AST interpreter and its evaluation context.

pub mod context;
pub mod interpreter;
pub mod trace;

pub use context::EvalContext;
pub use interpreter::evaluate;
pub use trace::{RuleTrace, TraceCollector};
