//! Worker-side runtime: the rule interpreter, game-logic
//! helper registry, reachability engine, `StateManager` command façade, and
//! the command queue + worker loop that drives it for one player slot.
//!
//! This crate owns every piece of mutable engine state; `tracker-client`
//! only ever talks to it through the `Command`/`WorkerMessage` wire types in
//! `tracker-protocol`.

pub mod config;
pub mod error;
pub mod helpers;
pub mod load;
pub mod queue;
pub mod reachability;
pub mod rules;
pub mod state_manager;
pub mod worker;

pub use config::EngineConfig;
pub use error::{AccessDenied, CommandError, EngineError, EngineErrorWithCorrelation, QueueError, RuleEvalError, WorkerFatal};
pub use queue::{CommandQueue, QueuedCommand};
pub use state_manager::{CommandOutcome, SnapshotExtras, StateManager};
pub use worker::{Worker, WorkerHandle};
