//! Protocol-level errors: malformed wire payloads, as distinct from the
//! domain/engine-level `LoadError`/`RuleEvalError` taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed rules document: {0}")]
    MalformedRulesDocument(#[from] serde_json::Error),

    #[error("malformed command envelope: {0}")]
    MalformedEnvelope(serde_json::Error),
}
