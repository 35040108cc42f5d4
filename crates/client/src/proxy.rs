//! UI-side `Proxy`: owns the worker handle, the pending-request
//! table with its centralized deletion/late-response bookkeeping, the
//! generation-guarded snapshot cache, and the `stateManager:*` event bus.
//! This is the in-process analogue of a `postMessage` duplex channel:
//! one `tokio::mpsc` pair for commands and responses, `tokio::oneshot`
//! per request, `tokio::broadcast` for published events.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, oneshot, watch};
use tracing::warn;
use tracker_domain::Snapshot;
use tracker_engine::{Worker, WorkerHandle};
use tracker_protocol::{Command, CommandEnvelope, CorrelationId, PlayerInfo, QueryId, QueryIdGenerator, WorkerMessage, WorkerQueueStatus};

use crate::config::ProxyConfig;
use crate::error::ProxyError;

struct PendingEntry {
    sender: oneshot::Sender<WorkerMessage>,
    submitted_at: Instant,
}

/// Centralizes every pending-request mutation: inserting a new request, resolving one
/// on arrival, and recognising a response that arrives after its request
/// already gave up (bounded `deleted` history) versus one for an id that
/// was never issued at all.
struct PendingTable {
    pending: HashMap<QueryId, PendingEntry>,
    deleted: VecDeque<QueryId>,
    deleted_cap: usize,
    late: HashMap<QueryId, (WorkerMessage, Instant)>,
}

impl PendingTable {
    fn new(deleted_cap: usize) -> Self {
        Self { pending: HashMap::new(), deleted: VecDeque::new(), deleted_cap, late: HashMap::new() }
    }

    fn insert(&mut self, query_id: QueryId, entry: PendingEntry) {
        self.pending.insert(query_id, entry);
    }

    fn mark_deleted(&mut self, query_id: QueryId) {
        self.deleted.push_back(query_id);
        if self.deleted.len() > self.deleted_cap {
            self.deleted.pop_front();
        }
    }

    fn delete(&mut self, query_id: QueryId) -> Option<PendingEntry> {
        let entry = self.pending.remove(&query_id);
        if entry.is_some() {
            self.mark_deleted(query_id);
        }
        entry
    }

    fn was_recently_deleted(&self, query_id: QueryId) -> bool {
        self.deleted.contains(&query_id)
    }

    fn buffer_late(&mut self, query_id: QueryId, message: WorkerMessage) {
        self.late.insert(query_id, (message, Instant::now()));
    }

    #[cfg(test)]
    fn late_response(&self, query_id: QueryId) -> Option<&WorkerMessage> {
        self.late.get(&query_id).map(|(message, _)| message)
    }

    fn fail_all(&mut self) {
        for (_, entry) in self.pending.drain() {
            let _ = entry.sender.send(WorkerMessage::WorkerError { message: "worker entered a fatal state".into(), fatal: true });
        }
    }

    /// Drop every pending entry that's outlived `request_timeout +
    /// late_grace` with no response at all, and every buffered late
    /// response older than `late_grace`.
    fn purge_expired(&mut self, request_timeout: Duration, late_grace: Duration) {
        let now = Instant::now();
        let deadline = request_timeout + late_grace;
        let expired: Vec<QueryId> = self
            .pending
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.submitted_at) > deadline)
            .map(|(id, _)| *id)
            .collect();
        for query_id in expired {
            self.pending.remove(&query_id);
            self.mark_deleted(query_id);
            warn!(%query_id, "command never answered within timeout + grace period, giving up");
        }
        self.late.retain(|_, (_, inserted_at)| now.duration_since(*inserted_at) <= late_grace);
    }
}

/// The UI-facing façade: one `Proxy` per tracked player slot, each owning
/// its own worker task.
pub struct Proxy {
    handle: WorkerHandle,
    query_ids: QueryIdGenerator,
    pending: Arc<Mutex<PendingTable>>,
    snapshot_cache: Arc<Mutex<Option<Snapshot>>>,
    events: broadcast::Sender<(String, serde_json::Value)>,
    ready: watch::Receiver<bool>,
    loaded_game: Arc<Mutex<Option<(String, u32)>>>,
    config: ProxyConfig,
}

impl Proxy {
    pub fn new(config: ProxyConfig) -> Self {
        let (handle, message_rx) = Worker::spawn(config.engine.clone());
        let pending = Arc::new(Mutex::new(PendingTable::new(config.deleted_history_len)));
        let snapshot_cache: Arc<Mutex<Option<Snapshot>>> = Arc::new(Mutex::new(None));
        let (events_tx, _events_rx) = broadcast::channel(256);
        let (ready_tx, ready_rx) = watch::channel(false);
        let loaded_game = Arc::new(Mutex::new(None));

        tokio::spawn(run_reader(message_rx, pending.clone(), snapshot_cache.clone(), events_tx.clone(), ready_tx, loaded_game.clone()));
        tokio::spawn(run_cleanup(pending.clone(), config.request_timeout, config.late_response_grace_period, config.cleanup_interval));

        Self { handle, query_ids: QueryIdGenerator::new(), pending, snapshot_cache, events: events_tx, ready: ready_rx, loaded_game, config }
    }

    /// Wait until the worker has emitted `workerInitializedConfirmation`.
    /// Safe to call any number of times, including after readiness has
    /// already happened.
    pub async fn ensure_ready(&self, timeout: Duration) -> Result<(), ProxyError> {
        let mut ready = self.ready.clone();
        if *ready.borrow() {
            return Ok(());
        }
        tokio::time::timeout(timeout, async {
            while !*ready.borrow() {
                if ready.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .map_err(|_| ProxyError::NotReady)
    }

    /// Send a command and await its response, subject to
    /// `ProxyConfig::request_timeout`. `expectResponse: false`
    /// commands fire-and-forget and never populate the pending table.
    pub async fn query(&self, command: Command) -> Result<WorkerMessage, ProxyError> {
        let query_id = self.query_ids.next();
        let correlation_id = CorrelationId::new();
        let envelope = CommandEnvelope { command, query_id, correlation_id, expect_response: true };

        let (tx, rx) = oneshot::channel();
        {
            let mut table = self.pending.lock().unwrap();
            table.insert(query_id, PendingEntry { sender: tx, submitted_at: Instant::now() });
        }

        if self.handle.send(envelope).is_err() {
            self.pending.lock().unwrap().delete(query_id);
            return Err(ProxyError::WorkerGone);
        }

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err(ProxyError::WorkerGone),
            Err(_) => Err(ProxyError::Timeout(query_id)),
        }
    }

    /// Fire a command without waiting for a response.
    pub fn notify(&self, command: Command) -> Result<(), ProxyError> {
        let envelope = CommandEnvelope { command, query_id: self.query_ids.next(), correlation_id: CorrelationId::new(), expect_response: false };
        self.handle.send(envelope).map_err(|_| ProxyError::WorkerGone)
    }

    pub async fn load_rules(&self, rules_data: serde_json::Value, player_info: PlayerInfo) -> Result<Snapshot, ProxyError> {
        result_as_snapshot(self.query(Command::LoadRules { rules_data, player_info }).await?)
    }

    pub async fn add_item(&self, item: impl Into<String>, quantity: u32) -> Result<Snapshot, ProxyError> {
        result_as_snapshot(self.query(Command::AddItemToInventory { item: item.into(), quantity }).await?)
    }

    pub async fn remove_item(&self, item: impl Into<String>, quantity: u32) -> Result<Snapshot, ProxyError> {
        result_as_snapshot(self.query(Command::RemoveItemFromInventory { item: item.into(), quantity }).await?)
    }

    pub async fn check_location(&self, location_name: impl Into<String>, add_items: bool, force_check: bool) -> Result<Snapshot, ProxyError> {
        result_as_snapshot(self.query(Command::CheckLocation { location_name: location_name.into(), add_items, force_check }).await?)
    }

    pub async fn uncheck_location(&self, location_name: impl Into<String>) -> Result<Snapshot, ProxyError> {
        result_as_snapshot(self.query(Command::UncheckLocation { location_name: location_name.into() }).await?)
    }

    pub async fn clear_state_and_reset(&self) -> Result<Snapshot, ProxyError> {
        result_as_snapshot(self.query(Command::ClearStateAndReset).await?)
    }

    pub async fn recalculate_accessibility(&self) -> Result<Snapshot, ProxyError> {
        result_as_snapshot(self.query(Command::RecalculateAccessibility).await?)
    }

    pub async fn evaluate_rule_remote(&self, rule: serde_json::Value) -> Result<bool, ProxyError> {
        result_as_bool(self.query(Command::EvaluateRuleRemote { rule }).await?)
    }

    pub async fn evaluate_location_accessibility_for_test(
        &self,
        location_name: impl Into<String>,
        required_items: Vec<String>,
        excluded_items: Vec<String>,
    ) -> Result<bool, ProxyError> {
        result_as_bool(
            self.query(Command::EvaluateLocationAccessibilityForTest { location_name: location_name.into(), required_items, excluded_items }).await?,
        )
    }

    pub async fn apply_test_inventory_and_evaluate(
        &self,
        location_name: impl Into<String>,
        required_items: Vec<String>,
        excluded_items: Vec<String>,
    ) -> Result<TestApplicationResult, ProxyError> {
        result_as_test_application(
            self.query(Command::ApplyTestInventoryAndEvaluate { location_name: location_name.into(), required_items, excluded_items }).await?,
        )
    }

    pub async fn get_full_snapshot(&self) -> Result<Snapshot, ProxyError> {
        result_as_snapshot(self.query(Command::GetFullSnapshot).await?)
    }

    pub async fn get_queue_status(&self) -> Result<WorkerQueueStatus, ProxyError> {
        match self.query(Command::GetWorkerQueueStatus).await? {
            WorkerMessage::QueryResponse { result, .. } => serde_json::from_value(result).map_err(Into::into),
            WorkerMessage::CommandFailed { failure, .. } => Err(ProxyError::Command(failure)),
            _ => Err(ProxyError::UnexpectedResponse),
        }
    }

    pub async fn ping(&self, payload: serde_json::Value) -> Result<serde_json::Value, ProxyError> {
        match self.query(Command::Ping { payload }).await? {
            WorkerMessage::PingResponse { payload, .. } => Ok(payload),
            WorkerMessage::CommandFailed { failure, .. } => Err(ProxyError::Command(failure)),
            _ => Err(ProxyError::UnexpectedResponse),
        }
    }

    /// The most recent snapshot the reader task has accepted, if any has
    /// arrived yet.
    pub fn cached_snapshot(&self) -> Option<Snapshot> {
        self.snapshot_cache.lock().unwrap().clone()
    }

    /// Whether a snapshot claiming `candidate_generation` would be
    /// discarded as stale against the cache.
    pub fn is_potential_stale_snapshot(&self, candidate_generation: u64) -> bool {
        self.snapshot_cache.lock().unwrap().as_ref().map(|cached| candidate_generation <= cached.generation).unwrap_or(false)
    }

    /// `(game_name, player_id)` of the most recently loaded rules document,
    /// materialized from the last `rulesLoadedConfirmation`.
    pub fn loaded_game(&self) -> Option<(String, u32)> {
        self.loaded_game.lock().unwrap().clone()
    }

    /// Subscribe to `stateManager:<event>` republication.
    pub fn subscribe_events(&self) -> broadcast::Receiver<(String, serde_json::Value)> {
        self.events.subscribe()
    }
}

fn result_as_snapshot(message: WorkerMessage) -> Result<Snapshot, ProxyError> {
    match message {
        WorkerMessage::RulesLoadedConfirmation { snapshot, .. } => Ok(snapshot),
        WorkerMessage::CommandCompleted { result, .. } => serde_json::from_value(result).map_err(Into::into),
        WorkerMessage::CommandFailed { failure, .. } => Err(ProxyError::Command(failure)),
        _ => Err(ProxyError::UnexpectedResponse),
    }
}

fn result_as_bool(message: WorkerMessage) -> Result<bool, ProxyError> {
    match message {
        WorkerMessage::CommandCompleted { result, .. } => result.as_bool().ok_or(ProxyError::UnexpectedResponse),
        WorkerMessage::CommandFailed { failure, .. } => Err(ProxyError::Command(failure)),
        _ => Err(ProxyError::UnexpectedResponse),
    }
}

/// `applyTestInventoryAndEvaluate`'s response shape: the mutated snapshot,
/// its inventory pulled out for convenience, and the test location's
/// accessibility under that mutation.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TestApplicationResult {
    pub new_snapshot: Snapshot,
    pub new_inventory: std::collections::BTreeMap<String, u32>,
    pub location_accessibility_result: bool,
}

fn result_as_test_application(message: WorkerMessage) -> Result<TestApplicationResult, ProxyError> {
    match message {
        WorkerMessage::CommandCompleted { result, .. } => serde_json::from_value(result).map_err(Into::into),
        WorkerMessage::CommandFailed { failure, .. } => Err(ProxyError::Command(failure)),
        _ => Err(ProxyError::UnexpectedResponse),
    }
}

fn update_snapshot_if_newer(cache: &Arc<Mutex<Option<Snapshot>>>, candidate: Snapshot) {
    let mut guard = cache.lock().unwrap();
    let stale = guard.as_ref().map(|cached| candidate.generation <= cached.generation).unwrap_or(false);
    if !stale {
        *guard = Some(candidate);
    }
}

fn query_id_of(message: &WorkerMessage) -> Option<QueryId> {
    match message {
        WorkerMessage::QueryResponse { query_id, .. }
        | WorkerMessage::CommandCompleted { query_id, .. }
        | WorkerMessage::CommandFailed { query_id, .. }
        | WorkerMessage::PingResponse { query_id, .. }
        | WorkerMessage::RulesLoadedConfirmation { query_id, .. }
        | WorkerMessage::Progress { query_id, .. } => Some(*query_id),
        WorkerMessage::StateSnapshot { query_id, .. } => *query_id,
        _ => None,
    }
}

async fn run_reader(
    mut message_rx: tokio::sync::mpsc::UnboundedReceiver<WorkerMessage>,
    pending: Arc<Mutex<PendingTable>>,
    snapshot_cache: Arc<Mutex<Option<Snapshot>>>,
    events: broadcast::Sender<(String, serde_json::Value)>,
    ready_tx: watch::Sender<bool>,
    loaded_game: Arc<Mutex<Option<(String, u32)>>>,
) {
    while let Some(message) = message_rx.recv().await {
        match &message {
            WorkerMessage::WorkerInitializedConfirmation => {
                let _ = ready_tx.send(true);
                continue;
            }
            WorkerMessage::Event { name, payload } | WorkerMessage::EventPublish { name, payload } => {
                let _ = events.send((format!("stateManager:{name}"), payload.clone()));
                continue;
            }
            WorkerMessage::WorkerError { message: text, fatal } => {
                warn!(fatal, %text, "worker reported an error");
                if *fatal {
                    pending.lock().unwrap().fail_all();
                }
                continue;
            }
            WorkerMessage::StateSnapshot { snapshot, .. } => {
                update_snapshot_if_newer(&snapshot_cache, snapshot.clone());
            }
            WorkerMessage::RulesLoadedConfirmation { snapshot, game_name, player_id, .. } => {
                update_snapshot_if_newer(&snapshot_cache, snapshot.clone());
                *loaded_game.lock().unwrap() = Some((game_name.clone(), *player_id));
            }
            WorkerMessage::CommandCompleted { result, .. } => {
                if let Ok(snapshot) = serde_json::from_value::<Snapshot>(result.clone()) {
                    update_snapshot_if_newer(&snapshot_cache, snapshot);
                } else if let Some(nested) = result.get("new_snapshot") {
                    if let Ok(snapshot) = serde_json::from_value::<Snapshot>(nested.clone()) {
                        update_snapshot_if_newer(&snapshot_cache, snapshot);
                    }
                }
            }
            _ => {}
        }

        if let Some(query_id) = query_id_of(&message) {
            let mut table = pending.lock().unwrap();
            if let Some(entry) = table.delete(query_id) {
                let _ = entry.sender.send(message);
            } else if table.was_recently_deleted(query_id) {
                warn!(%query_id, "late response arrived for an already-resolved query, buffering");
                table.buffer_late(query_id, message);
            } else {
                warn!(%query_id, "response arrived for an unrecognised query id");
            }
        }
    }
}

async fn run_cleanup(pending: Arc<Mutex<PendingTable>>, request_timeout: Duration, late_grace: Duration, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        pending.lock().unwrap().purge_expired(request_timeout, late_grace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_rules() -> serde_json::Value {
        serde_json::json!({
            "game_name": "Test Game",
            "regions": { "Menu": { "exits": [], "locations": [] } },
            "start_regions": ["Menu"],
        })
    }

    #[tokio::test]
    async fn ensure_ready_resolves_once_the_worker_initializes() {
        let proxy = Proxy::new(ProxyConfig::default());
        proxy.ensure_ready(Duration::from_secs(2)).await.unwrap();
        // Calling it again after readiness must not hang.
        proxy.ensure_ready(Duration::from_millis(50)).await.unwrap();
    }

    #[tokio::test]
    async fn load_rules_then_add_item_updates_the_cached_snapshot() {
        let proxy = Proxy::new(ProxyConfig::default());
        proxy.ensure_ready(Duration::from_secs(2)).await.unwrap();

        let player_info = PlayerInfo { player_id: 1, game_name: "Test Game".into() };
        let snapshot = proxy.load_rules(minimal_rules(), player_info).await.unwrap();
        assert_eq!(snapshot.player_id, 1);
        assert_eq!(proxy.loaded_game(), Some(("Test Game".to_string(), 1)));

        let after_add = proxy.add_item("Sword", 1).await.unwrap();
        assert_eq!(after_add.inventory.get("Sword"), Some(&1));
        assert!(after_add.generation > snapshot.generation);

        let cached = proxy.cached_snapshot().unwrap();
        assert_eq!(cached.generation, after_add.generation);
        assert!(proxy.is_potential_stale_snapshot(snapshot.generation));
        assert!(!proxy.is_potential_stale_snapshot(after_add.generation + 1));
    }

    #[tokio::test]
    async fn apply_test_inventory_and_evaluate_mutates_inventory_and_updates_cache() {
        let proxy = Proxy::new(ProxyConfig::default());
        proxy.ensure_ready(Duration::from_secs(2)).await.unwrap();

        let rules = serde_json::json!({
            "game_name": "Test Game",
            "regions": { "Menu": { "exits": [], "locations": ["L_Gated"] } },
            "locations": {
                "L_Gated": { "region": "Menu", "access_rule": { "kind": "item_check", "item": "Key" } },
            },
            "items": { "Key": {} },
            "start_regions": ["Menu"],
        });
        let player_info = PlayerInfo { player_id: 1, game_name: "Test Game".into() };
        let loaded = proxy.load_rules(rules, player_info).await.unwrap();

        let result = proxy.apply_test_inventory_and_evaluate("L_Gated", vec!["Key".to_string()], vec![]).await.unwrap();
        assert!(result.location_accessibility_result);
        assert_eq!(result.new_inventory.get("Key"), Some(&1));
        assert!(result.new_snapshot.generation > loaded.generation);

        let cached = proxy.cached_snapshot().unwrap();
        assert_eq!(cached.generation, result.new_snapshot.generation);
    }

    #[tokio::test]
    async fn checking_an_unknown_location_surfaces_a_command_error() {
        let proxy = Proxy::new(ProxyConfig::default());
        proxy.ensure_ready(Duration::from_secs(2)).await.unwrap();
        let player_info = PlayerInfo { player_id: 1, game_name: "Test Game".into() };
        proxy.load_rules(minimal_rules(), player_info).await.unwrap();

        let err = proxy.check_location("Nowhere", true, false).await.unwrap_err();
        assert!(matches!(err, ProxyError::Command(_)));
    }

    #[test]
    fn a_response_for_an_already_deleted_query_is_buffered_as_late() {
        let mut table = PendingTable::new(8);
        let (tx, _rx) = oneshot::channel();
        table.insert(QueryId(1), PendingEntry { sender: tx, submitted_at: Instant::now() });
        table.delete(QueryId(1));

        assert!(table.was_recently_deleted(QueryId(1)));
        table.buffer_late(QueryId(1), WorkerMessage::WorkerInitializedConfirmation);
        assert!(table.late_response(QueryId(1)).is_some());
    }

    #[test]
    fn purge_expired_drops_pending_entries_that_never_answered() {
        let mut table = PendingTable::new(8);
        let (tx, rx) = oneshot::channel();
        table.insert(QueryId(1), PendingEntry { sender: tx, submitted_at: Instant::now() - Duration::from_secs(60) });

        table.purge_expired(Duration::from_secs(1), Duration::from_secs(1));

        assert!(table.was_recently_deleted(QueryId(1)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn a_request_that_exceeds_the_timeout_reports_timeout_not_a_hang() {
        let config = ProxyConfig::default().with_request_timeout(Duration::from_millis(1));
        let proxy = Proxy::new(config);
        // No ensure_ready: the very first query races the worker's startup,
        // which is exactly the kind of slow/late response the timeout path
        // and the late-response buffer exist to handle.
        let result = proxy.ping(serde_json::Value::Null).await;
        assert!(matches!(result, Ok(_) | Err(ProxyError::Timeout(_))));
    }
}
