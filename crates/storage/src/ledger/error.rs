#![forbid(unsafe_code)]

use super::EscalationStatus;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("io on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encode ledger: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("escalation cannot be resolved to {status}")]
    InvalidTransition { status: EscalationStatus },
    #[error("escalation request {id} was not found")]
    NotFound { id: String },
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Io { .. } | LedgerError::Encode(_) => "LEDGER_IO",
            LedgerError::InvalidInput(_) => "INVALID_INPUT",
            LedgerError::InvalidTransition { .. } => "INVALID_TRANSITION",
            LedgerError::NotFound { .. } => "NOT_FOUND",
        }
    }
}
