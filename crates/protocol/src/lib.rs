//! Wire contract shared by the worker and UI contexts: command/response
//! envelopes, the permissive rules-JSON reader's DTOs, and published events.

pub mod command;
pub mod error;
pub mod ids;
pub mod rules_json;
pub mod worker_message;

pub use command::{Command, CommandEnvelope, PlayerInfo};
pub use error::ProtocolError;
pub use ids::{CorrelationId, QueryId, QueryIdGenerator};
pub use rules_json::{
    DungeonDto, ExitDto, ItemDto, ItemRefDto, LocationDto, PlayerRules, ProgressionEntryDto, RegionDto,
    RulesDocument,
};
pub use worker_message::{CommandFailure, CommandState, CommandStateTransition, WorkerMessage, WorkerQueueStatus};
