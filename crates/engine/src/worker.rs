//! Worker loop: the single task that owns a `StateManager` and
//! a `CommandQueue` for one player slot, draining commands to completion one
//! at a time and emitting `WorkerMessage`s on an outbound channel. One
//! long-lived `tokio::spawn`ed task per player slot, the same shape as any
//! other long-running background service in this workspace.

use std::panic::{self, AssertUnwindSafe};

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracker_protocol::{Command, CommandEnvelope, CommandFailure, CommandState, WorkerMessage};

use crate::config::EngineConfig;
use crate::error::CommandError;
use crate::queue::CommandQueue;
use crate::state_manager::{CommandOutcome, StateManager};

/// UI-side handle: the only thing `tracker-client` holds onto. Sending a
/// command never blocks; the paired receiver of `WorkerMessage`s is
/// returned separately by [`Worker::spawn`] since only one task reads it.
#[derive(Clone)]
pub struct WorkerHandle {
    command_tx: mpsc::UnboundedSender<CommandEnvelope>,
}

impl WorkerHandle {
    /// Enqueue a command. Fails only once the worker task itself has ended
    /// (e.g. the whole process is shutting down), mirroring `postMessage`
    /// into a torn-down worker.
    pub fn send(&self, envelope: CommandEnvelope) -> Result<(), CommandEnvelope> {
        self.command_tx.send(envelope).map_err(|e| e.0)
    }
}

/// Owns the queue and the engine state for one player slot.
pub struct Worker {
    state_manager: StateManager,
    queue: CommandQueue,
}

impl Worker {
    pub fn new(config: EngineConfig) -> Self {
        let history_len = config.command_history_len();
        Self { state_manager: StateManager::new(config), queue: CommandQueue::new(history_len) }
    }

    /// Spawn the worker as a background task. Returns the handle the UI sends commands through and
    /// the receiver it reads `WorkerMessage`s from.
    pub fn spawn(config: EngineConfig) -> (WorkerHandle, mpsc::UnboundedReceiver<WorkerMessage>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let worker = Worker::new(config);
        tokio::spawn(worker.run(command_rx, message_tx));
        (WorkerHandle { command_tx }, message_rx)
    }

    /// Drive the loop to completion; exits once every `WorkerHandle` (and
    /// thus every sender half of `command_rx`) has been dropped.
    pub async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<CommandEnvelope>, message_tx: mpsc::UnboundedSender<WorkerMessage>) {
        let _ = message_tx.send(WorkerMessage::WorkerInitializedConfirmation);
        while let Some(envelope) = command_rx.recv().await {
            self.enqueue_and_process(envelope, &message_tx);
        }
        info!("worker channel closed, shutting down");
    }

    fn enqueue_and_process(&mut self, envelope: CommandEnvelope, message_tx: &mpsc::UnboundedSender<WorkerMessage>) {
        let query_id = envelope.query_id;
        let correlation_id = envelope.correlation_id;
        let command_name = envelope.command.name();

        self.queue.enqueue(envelope);
        let _ = message_tx.send(WorkerMessage::CommandEnqueued {
            query_id,
            correlation_id,
            command_name: command_name.to_string(),
            queue_depth: self.queue.len(),
        });

        let Some(queued) = self.queue.dequeue() else { return };
        self.process_one(queued, message_tx);
    }

    fn process_one(&mut self, queued: crate::queue::QueuedCommand, message_tx: &mpsc::UnboundedSender<WorkerMessage>) {
        let CommandEnvelope { command, query_id, correlation_id, .. } = queued.envelope;
        let command_name = command.name();

        match command {
            Command::Ping { payload } => {
                self.queue.finish(query_id, correlation_id, command_name, CommandState::Completed);
                let _ = message_tx.send(WorkerMessage::PingResponse { query_id, correlation_id, payload });
                return;
            }
            Command::GetWorkerQueueStatus => {
                let status = self.queue.status();
                self.queue.finish(query_id, correlation_id, command_name, CommandState::Completed);
                let result = serde_json::to_value(&status).unwrap_or(serde_json::Value::Null);
                let _ = message_tx.send(WorkerMessage::QueryResponse { query_id, correlation_id, result });
                return;
            }
            Command::ToggleQueueReporting { enabled } => {
                self.queue.set_reporting_enabled(enabled);
                self.queue.finish(query_id, correlation_id, command_name, CommandState::Completed);
                let _ = message_tx.send(WorkerMessage::CommandCompleted { query_id, correlation_id, result: serde_json::Value::Null });
                return;
            }
            other => self.dispatch_to_state_manager(other, query_id, correlation_id, command_name, message_tx),
        }
    }

    /// Run one command through `StateManager::handle`, guarded by
    /// `catch_unwind` so a single command's bug can never take the whole
    /// worker down. A caught panic is treated as
    /// `WorkerFatal`: every other queued command is cancelled and a fatal
    /// `WorkerError` is emitted, cancelling the rest of the queue.
    fn dispatch_to_state_manager(
        &mut self,
        command: Command,
        query_id: tracker_protocol::QueryId,
        correlation_id: tracker_protocol::CorrelationId,
        command_name: &str,
        message_tx: &mpsc::UnboundedSender<WorkerMessage>,
    ) {
        let state_manager = &mut self.state_manager;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| state_manager.handle(&command)));

        match outcome {
            Ok(Ok(result)) => {
                self.queue.finish(query_id, correlation_id, command_name, CommandState::Completed);
                let _ = message_tx.send(self.completion_message(command_name, query_id, correlation_id, result));
            }
            Ok(Err(err)) => {
                warn!(command = command_name, error = %err, "command failed");
                self.queue.finish(query_id, correlation_id, command_name, CommandState::Failed);
                let _ = message_tx.send(WorkerMessage::CommandFailed {
                    query_id,
                    correlation_id,
                    command_name: command_name.to_string(),
                    failure: failure_of(&err),
                });
            }
            Err(panic) => {
                let message = panic_message(&panic);
                error!(command = command_name, %message, "command panicked, entering fatal cascade");
                self.queue.finish(query_id, correlation_id, command_name, CommandState::Failed);
                let _ = message_tx.send(WorkerMessage::CommandFailed {
                    query_id,
                    correlation_id,
                    command_name: command_name.to_string(),
                    failure: CommandFailure { kind: "WorkerFatal".into(), message: message.clone() },
                });
                self.cancel_all_pending(message_tx);
                let _ = message_tx.send(WorkerMessage::WorkerError { message, fatal: true });
            }
        }
    }

    fn completion_message(
        &self,
        command_name: &str,
        query_id: tracker_protocol::QueryId,
        correlation_id: tracker_protocol::CorrelationId,
        outcome: CommandOutcome,
    ) -> WorkerMessage {
        match outcome {
            CommandOutcome::Snapshot(snapshot) if command_name == "loadRules" => WorkerMessage::RulesLoadedConfirmation {
                query_id,
                correlation_id,
                game_name: snapshot.game_name.clone(),
                player_id: snapshot.player_id,
                snapshot: *snapshot,
            },
            CommandOutcome::Snapshot(snapshot) => {
                WorkerMessage::CommandCompleted { query_id, correlation_id, result: serde_json::to_value(&*snapshot).unwrap_or(serde_json::Value::Null) }
            }
            CommandOutcome::Bool(value) => WorkerMessage::CommandCompleted { query_id, correlation_id, result: serde_json::Value::Bool(value) },
            CommandOutcome::TestApplication { snapshot, location_accessible } => WorkerMessage::CommandCompleted {
                query_id,
                correlation_id,
                result: serde_json::json!({
                    "new_snapshot": &*snapshot,
                    "new_inventory": snapshot.inventory,
                    "location_accessibility_result": location_accessible,
                }),
            },
            CommandOutcome::Ack => WorkerMessage::CommandCompleted { query_id, correlation_id, result: serde_json::Value::Null },
        }
    }

    /// Drain every command still sitting in the FIFO as `Cancelled`.
    /// Commands already dispatched before the panic are unaffected; only
    /// work that never got to run is cancelled.
    fn cancel_all_pending(&mut self, message_tx: &mpsc::UnboundedSender<WorkerMessage>) {
        while let Some(queued) = self.queue.dequeue() {
            let envelope = queued.envelope;
            self.queue.finish(envelope.query_id, envelope.correlation_id, envelope.command.name(), CommandState::Cancelled);
            let _ = message_tx.send(WorkerMessage::CommandFailed {
                query_id: envelope.query_id,
                correlation_id: envelope.correlation_id,
                command_name: envelope.command.name().to_string(),
                failure: CommandFailure { kind: "Cancelled".into(), message: "worker entered a fatal state".into() },
            });
        }
    }
}

fn failure_of(err: &CommandError) -> CommandFailure {
    CommandFailure { kind: error_kind(err).into(), message: err.to_string() }
}

fn error_kind(err: &CommandError) -> &'static str {
    match err {
        CommandError::Load(_) => "LoadError",
        CommandError::AccessDenied(_) => "AccessDenied",
        CommandError::UnknownName(_) => "UnknownName",
        CommandError::Queue(_) => "QueueError",
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use tracker_protocol::{CorrelationId, PlayerInfo, QueryId};

    use super::*;

    fn envelope(command: Command, query_id: u64) -> CommandEnvelope {
        CommandEnvelope { command, query_id: QueryId(query_id), correlation_id: CorrelationId::new(), expect_response: true }
    }

    fn minimal_rules() -> serde_json::Value {
        serde_json::json!({
            "game_name": "Test Game",
            "regions": { "Menu": { "exits": [], "locations": [] } },
            "start_regions": ["Menu"],
        })
    }

    #[tokio::test]
    async fn spawning_emits_initialized_confirmation_first() {
        let (_, mut messages) = Worker::spawn(EngineConfig::default());
        let first = messages.recv().await.unwrap();
        assert!(matches!(first, WorkerMessage::WorkerInitializedConfirmation));
    }

    #[tokio::test]
    async fn load_rules_emits_enqueued_then_rules_loaded_confirmation() {
        let (handle, mut messages) = Worker::spawn(EngineConfig::default());
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::WorkerInitializedConfirmation));

        let player_info = PlayerInfo { player_id: 1, game_name: "Test Game".into() };
        handle.send(envelope(Command::LoadRules { rules_data: minimal_rules(), player_info }, 1)).unwrap();

        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::CommandEnqueued { .. }));
        match messages.recv().await.unwrap() {
            WorkerMessage::RulesLoadedConfirmation { player_id, game_name, .. } => {
                assert_eq!(player_id, 1);
                assert_eq!(game_name, "Test Game");
            }
            other => panic!("expected RulesLoadedConfirmation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ping_echoes_its_payload_without_touching_state_manager() {
        let (handle, mut messages) = Worker::spawn(EngineConfig::default());
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::WorkerInitializedConfirmation));

        handle.send(envelope(Command::Ping { payload: serde_json::json!("hello") }, 7)).unwrap();
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::CommandEnqueued { .. }));
        match messages.recv().await.unwrap() {
            WorkerMessage::PingResponse { payload, .. } => assert_eq!(payload, serde_json::json!("hello")),
            other => panic!("expected PingResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_location_check_fails_the_command_without_killing_the_worker() {
        let (handle, mut messages) = Worker::spawn(EngineConfig::default());
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::WorkerInitializedConfirmation));

        let player_info = PlayerInfo { player_id: 1, game_name: "Test Game".into() };
        handle.send(envelope(Command::LoadRules { rules_data: minimal_rules(), player_info }, 1)).unwrap();
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::CommandEnqueued { .. }));
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::RulesLoadedConfirmation { .. }));

        handle.send(envelope(Command::CheckLocation { location_name: "Nowhere".into(), add_items: true, force_check: false }, 2)).unwrap();
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::CommandEnqueued { .. }));
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::CommandFailed { .. }));

        // The worker is still alive and answers a follow-up ping.
        handle.send(envelope(Command::Ping { payload: serde_json::Value::Null }, 3)).unwrap();
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::CommandEnqueued { .. }));
        assert!(matches!(messages.recv().await.unwrap(), WorkerMessage::PingResponse { .. }));
    }
}
