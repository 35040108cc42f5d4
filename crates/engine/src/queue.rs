//! Command queue: FIFO ordering, correlation-id tracking, the
//! per-command state machine and its bounded history, and queue-status
//! reporting. The worker loop (`crate::worker`) owns one `CommandQueue` and
//! drains it to completion one command at a time — "single-threaded
//! cooperative... no preemption".

use std::collections::VecDeque;

use dashmap::DashMap;
use tracker_protocol::{Command, CommandEnvelope, CommandState, CommandStateTransition, CorrelationId, QueryId, WorkerQueueStatus};

/// One command sitting in the FIFO, still carrying its full envelope so the
/// worker can echo `queryId`/`correlationId` on every outbound message tied
/// to it.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub envelope: CommandEnvelope,
}

/// FIFO command queue plus the bounded per-command transition history,
/// logged to the last N transitions (suggested 1000). The history lives
/// in a `DashMap` rather than behind the same lock as the FIFO:
/// `getWorkerQueueStatus`/a queue-reporting task reads it without
/// contending with the command being dequeued, the same pattern as the
/// `DashMap`-backed state managers used elsewhere in this workspace.
pub struct CommandQueue {
    pending: VecDeque<QueuedCommand>,
    states: DashMap<QueryId, CommandState>,
    history: DashMap<QueryId, Vec<CommandStateTransition>>,
    history_len: usize,
    reporting_enabled: bool,
    currently_executing: Option<(QueryId, String)>,
}

impl CommandQueue {
    pub fn new(history_len: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            states: DashMap::new(),
            history: DashMap::new(),
            history_len,
            reporting_enabled: true,
            currently_executing: None,
        }
    }

    /// Enqueue a command; arrival order is preserved.
    pub fn enqueue(&mut self, envelope: CommandEnvelope) {
        self.transition(envelope.query_id, envelope.correlation_id, CommandState::Pending, envelope.command.name());
        self.transition(envelope.query_id, envelope.correlation_id, CommandState::Queued, envelope.command.name());
        self.pending.push_back(QueuedCommand { envelope });
    }

    /// Pull the next command off the FIFO and mark it executing. Returns
    /// `None` when the queue is empty.
    pub fn dequeue(&mut self) -> Option<QueuedCommand> {
        let queued = self.pending.pop_front()?;
        self.currently_executing = Some((queued.envelope.query_id, queued.envelope.command.name().to_string()));
        self.transition(queued.envelope.query_id, queued.envelope.correlation_id, CommandState::Executing, queued.envelope.command.name());
        Some(queued)
    }

    /// Record a command's terminal outcome.
    pub fn finish(&mut self, query_id: QueryId, correlation_id: CorrelationId, command_name: &str, state: CommandState) {
        debug_assert!(state.is_terminal(), "finish() must be called with a terminal state");
        self.transition(query_id, correlation_id, state, command_name);
        if self.currently_executing.as_ref().map(|(id, _)| *id) == Some(query_id) {
            self.currently_executing = None;
        }
    }

    fn transition(&self, query_id: QueryId, correlation_id: CorrelationId, state: CommandState, command_name: &str) {
        self.states.insert(query_id, state);
        if !self.reporting_enabled {
            return;
        }
        let mut entry = self.history.entry(query_id).or_default();
        entry.push(CommandStateTransition { query_id, correlation_id, state, command_name: command_name.to_string() });
        if entry.len() > self.history_len {
            let overflow = entry.len() - self.history_len;
            entry.drain(0..overflow);
        }
    }

    pub fn state_of(&self, query_id: QueryId) -> Option<CommandState> {
        self.states.get(&query_id).map(|s| *s)
    }

    pub fn history_of(&self, query_id: QueryId) -> Vec<CommandStateTransition> {
        self.history.get(&query_id).map(|h| h.clone()).unwrap_or_default()
    }

    pub fn set_reporting_enabled(&mut self, enabled: bool) {
        self.reporting_enabled = enabled;
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// `{pending, processing, currentCommand}`.
    pub fn status(&self) -> WorkerQueueStatus {
        WorkerQueueStatus {
            pending: self.pending.len(),
            processing: if self.currently_executing.is_some() { 1 } else { 0 },
            current_command: self.currently_executing.as_ref().map(|(_, name)| name.clone()),
        }
    }
}

/// A command the caller tried to submit that isn't present anywhere in the
/// queue's bookkeeping (neither pending, executing, nor in history) — used
/// by diagnostics, not by the normal dequeue path.
pub fn command_name(command: &Command) -> &'static str {
    command.name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_protocol::{Command, CommandEnvelope};

    fn envelope(command: Command) -> CommandEnvelope {
        CommandEnvelope { command, query_id: QueryId(0), correlation_id: CorrelationId::new(), expect_response: true }
    }

    #[test]
    fn commands_dequeue_in_arrival_order() {
        let mut queue = CommandQueue::new(10);
        queue.enqueue(CommandEnvelope { query_id: QueryId(1), ..envelope(Command::GetFullSnapshot) });
        queue.enqueue(CommandEnvelope { query_id: QueryId(2), ..envelope(Command::GetFullSnapshot) });

        let first = queue.dequeue().unwrap();
        let second = queue.dequeue().unwrap();
        assert_eq!(first.envelope.query_id, QueryId(1));
        assert_eq!(second.envelope.query_id, QueryId(2));
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn dequeue_transitions_through_the_expected_states() {
        let mut queue = CommandQueue::new(10);
        let env = envelope(Command::GetFullSnapshot);
        let query_id = env.query_id;
        let correlation_id = env.correlation_id;
        queue.enqueue(env);
        assert_eq!(queue.state_of(query_id), Some(CommandState::Queued));

        let queued = queue.dequeue().unwrap();
        assert_eq!(queue.state_of(query_id), Some(CommandState::Executing));

        queue.finish(query_id, correlation_id, queued.envelope.command.name(), CommandState::Completed);
        assert_eq!(queue.state_of(query_id), Some(CommandState::Completed));

        let history = queue.history_of(query_id);
        let states: Vec<_> = history.iter().map(|t| t.state).collect();
        assert_eq!(states, vec![CommandState::Pending, CommandState::Queued, CommandState::Executing, CommandState::Completed]);
    }

    #[test]
    fn history_is_bounded_to_the_configured_length() {
        let mut queue = CommandQueue::new(2);
        let env = envelope(Command::GetFullSnapshot);
        let query_id = env.query_id;
        let correlation_id = env.correlation_id;
        queue.enqueue(env);
        for _ in 0..5 {
            queue.finish(query_id, correlation_id, "getFullSnapshot", CommandState::Completed);
        }
        assert_eq!(queue.history_of(query_id).len(), 2);
    }

    #[test]
    fn queue_status_reports_pending_depth_and_current_command() {
        let mut queue = CommandQueue::new(10);
        queue.enqueue(CommandEnvelope { query_id: QueryId(1), ..envelope(Command::GetFullSnapshot) });
        queue.enqueue(CommandEnvelope { query_id: QueryId(2), ..envelope(Command::CommitBatchUpdate) });
        assert_eq!(queue.status().pending, 2);

        let queued = queue.dequeue().unwrap();
        let status = queue.status();
        assert_eq!(status.pending, 1);
        assert_eq!(status.processing, 1);
        assert_eq!(status.current_command.as_deref(), Some(queued.envelope.command.name()));
    }

    #[test]
    fn disabling_reporting_stops_history_growth_but_keeps_current_state() {
        let mut queue = CommandQueue::new(10);
        let env = envelope(Command::GetFullSnapshot);
        let query_id = env.query_id;
        let correlation_id = env.correlation_id;
        queue.enqueue(env);
        queue.set_reporting_enabled(false);
        queue.finish(query_id, correlation_id, "getFullSnapshot", CommandState::Completed);
        assert_eq!(queue.state_of(query_id), Some(CommandState::Completed));
        assert!(queue.history_of(query_id).len() <= 2);
    }
}
