//! Outbound worker→UI messages and the per-command state machine.

use serde::{Deserialize, Serialize};
use tracker_domain::Snapshot;

use crate::ids::{CorrelationId, QueryId};

/// Per-command lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandState {
    Pending,
    Queued,
    Executing,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl CommandState {
    /// Whether this is a terminal state; once reached the command will
    /// never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut | Self::Cancelled)
    }
}

/// One recorded transition, kept in a bounded history per command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandStateTransition {
    pub query_id: QueryId,
    pub correlation_id: CorrelationId,
    pub state: CommandState,
    pub command_name: String,
}

/// `{pending, processing, currentCommand}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerQueueStatus {
    pub pending: usize,
    pub processing: usize,
    pub current_command: Option<String>,
}

/// A clean, loggable failure description. Carries a
/// human message and a taxonomy tag rather than a full backtrace — the
/// worker never panics, so there is no stack to forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandFailure {
    pub kind: String,
    pub message: String,
}

/// Outbound message, tagged by `type` the way `ServerMessage` is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    QueryResponse {
        query_id: QueryId,
        correlation_id: CorrelationId,
        result: serde_json::Value,
    },
    CommandEnqueued {
        query_id: QueryId,
        correlation_id: CorrelationId,
        command_name: String,
        queue_depth: usize,
    },
    CommandCompleted {
        query_id: QueryId,
        correlation_id: CorrelationId,
        result: serde_json::Value,
    },
    CommandFailed {
        query_id: QueryId,
        correlation_id: CorrelationId,
        command_name: String,
        failure: CommandFailure,
    },
    PingResponse {
        query_id: QueryId,
        correlation_id: CorrelationId,
        payload: serde_json::Value,
    },
    RulesLoadedConfirmation {
        query_id: QueryId,
        correlation_id: CorrelationId,
        game_name: String,
        player_id: u32,
        snapshot: Snapshot,
    },
    StateSnapshot {
        query_id: Option<QueryId>,
        correlation_id: Option<CorrelationId>,
        snapshot: Snapshot,
    },
    WorkerError {
        message: String,
        fatal: bool,
    },
    Event {
        name: String,
        payload: serde_json::Value,
    },
    EventPublish {
        name: String,
        payload: serde_json::Value,
    },
    Progress {
        query_id: QueryId,
        correlation_id: CorrelationId,
        percent: u8,
        message: Option<String>,
    },
    WorkerQueueStatus {
        status: WorkerQueueStatus,
    },
    WorkerInitializedConfirmation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_state_terminality_matches_4_8() {
        assert!(!CommandState::Pending.is_terminal());
        assert!(!CommandState::Queued.is_terminal());
        assert!(!CommandState::Executing.is_terminal());
        assert!(CommandState::Completed.is_terminal());
        assert!(CommandState::Failed.is_terminal());
        assert!(CommandState::TimedOut.is_terminal());
        assert!(CommandState::Cancelled.is_terminal());
    }

    #[test]
    fn worker_message_round_trips_through_json() {
        let msg = WorkerMessage::WorkerInitializedConfirmation;
        let json = serde_json::to_string(&msg).unwrap();
        let back: WorkerMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, WorkerMessage::WorkerInitializedConfirmation));
    }
}
