//! Engine-wide error taxonomy, composed the way `infrastructure::error`
//! aggregates leaf port errors into one `InfraError`.

use thiserror::Error;
use tracker_domain::LoadError;
use tracker_protocol::CorrelationId;

/// `checkLocation` on an inaccessible location without `forceCheck`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("location '{location}' is not accessible")]
pub struct AccessDenied {
    pub location: String,
}

/// Raised only by `evaluateRuleRemote`/diagnostics paths that need to
/// surface an interpreter problem explicitly; ordinary rule evaluation
/// never raises this — it downgrades to
/// `false` plus a log entry instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleEvalError {
    #[error("unknown helper '{0}'")]
    UnknownHelper(String),

    #[error("unknown state method '{0}'")]
    UnknownStateMethod(String),

    #[error("helper recursion depth exceeded (limit {limit})")]
    RecursionLimitExceeded { limit: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("command '{0}' not found in queue")]
    NotFound(String),
}

/// Every command-level failure the worker can report via `commandFailed`.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("access denied: {0}")]
    AccessDenied(#[from] AccessDenied),

    #[error("unknown name: {0}")]
    UnknownName(#[from] tracker_domain::UnknownName),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Aggregate engine error, mirroring `InfraError`'s role: the single type
/// use-case/command handlers return, regardless of which leaf error fired.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    #[error("rule evaluation error: {0}")]
    RuleEval(#[from] RuleEvalError),

    #[error(transparent)]
    Fatal(#[from] WorkerFatal),
}

/// The worker cannot continue; every pending command must be rejected and
/// the proxy must reinitialise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("worker fatal: {0}")]
pub struct WorkerFatal(pub String);

/// `EngineError` tagged with the command's correlation id, mirroring
/// `InfraErrorWithCorrelation`.
#[derive(Debug)]
pub struct EngineErrorWithCorrelation {
    pub correlation_id: CorrelationId,
    pub error: EngineError,
}

impl EngineErrorWithCorrelation {
    pub fn new(correlation_id: CorrelationId, error: EngineError) -> Self {
        Self { correlation_id, error }
    }
}

impl std::fmt::Display for EngineErrorWithCorrelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[correlation_id={}] {}", self.correlation_id.short(), self.error)
    }
}

impl std::error::Error for EngineErrorWithCorrelation {
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
        let err = EngineErrorWithCorrelation::new(
            correlation_id,
            EngineError::Command(CommandError::AccessDenied(AccessDenied { location: "L1".into() })),
        );
        let display = format!("{err}");
        assert!(display.contains(&correlation_id.short()));
        assert!(display.contains("L1"));
    }
}
