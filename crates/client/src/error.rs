//! Proxy-side error taxonomy, composed the way
//! `tracker-engine::error` composes its leaf errors, with the same
//! `CorrelationId`-carrying wrapper pattern as `EngineErrorWithCorrelation`.

use thiserror::Error;
use tracker_protocol::{CommandFailure, CorrelationId, QueryId};

/// Everything that can go wrong on the UI side of the channel.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The worker never answered within the configured timeout. The
    /// pending entry is *not* deleted when this fires — a late response
    /// may still arrive within the grace period.
    #[error("query {0} timed out waiting for a worker response")]
    Timeout(QueryId),

    /// The worker task has ended; no further commands can be sent.
    #[error("worker is no longer running")]
    WorkerGone,

    /// The worker reported a command-level failure.
    #[error("command failed ({0}): {1}", .0.kind, .0.message)]
    Command(CommandFailure),

    /// `ensure_ready` was called and the worker never reached its
    /// initialized state within the given deadline.
    #[error("worker did not become ready in time")]
    NotReady,

    /// The worker answered with a message shape the caller didn't expect
    /// for the command it sent (e.g. a `Bool` result expected, an `Ack`
    /// response received).
    #[error("unexpected response shape for this command")]
    UnexpectedResponse,

    #[error("failed to decode worker response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// `ProxyError` tagged with the command's correlation id, mirroring
/// `tracker_engine::EngineErrorWithCorrelation`.
#[derive(Debug)]
pub struct ProxyErrorWithCorrelation {
    pub correlation_id: CorrelationId,
    pub error: ProxyError,
}

impl ProxyErrorWithCorrelation {
    pub fn new(correlation_id: CorrelationId, error: ProxyError) -> Self {
        Self { correlation_id, error }
    }
}

impl std::fmt::Display for ProxyErrorWithCorrelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[correlation_id={}] {}", self.correlation_id.short(), self.error)
    }
}

impl std::error::Error for ProxyErrorWithCorrelation {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_wrapper_formats_short_id_and_inner_error() {
        let correlation_id = CorrelationId::new();
        let err = ProxyErrorWithCorrelation::new(correlation_id, ProxyError::WorkerGone);
        let display = format!("{err}");
        assert!(display.contains(&correlation_id.short()));
        assert!(display.contains("worker is no longer running"));
    }
}
