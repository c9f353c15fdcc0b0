#![forbid(unsafe_code)]

use pg_core::policy::WriteMode;
use pg_storage::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("cannot preview an empty diff")]
    EmptyDiff,
    #[error("invalid diff: {detail}")]
    InvalidDiff { detail: String },
    #[error("patch targets path outside project root: {path}")]
    PathEscape { path: String },
    #[error("failed to apply diff for {path}: {detail}")]
    ApplyConflict { path: String, detail: String },
    #[error("write access to {path} ({mode}) is denied by capability rule {rule}")]
    WriteDenied {
        path: String,
        mode: WriteMode,
        rule: String,
    },
    #[error(
        "write access to {path} ({mode}) is not in the allowlist; escalation required (id: {ticket_id})"
    )]
    EscalationRequired {
        path: String,
        mode: WriteMode,
        ticket_id: String,
    },
    #[error("no preview found for patch id {patch_id}")]
    SessionNotFound { patch_id: String },
    #[error("resource is currently locked: {path}")]
    ResourceLocked { path: String },
    #[error("escalation ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    /// Stable machine-readable code for tool responses.
    pub fn code(&self) -> &'static str {
        match self {
            PatchError::EmptyDiff => "EMPTY_DIFF",
            PatchError::InvalidDiff { .. } => "INVALID_DIFF",
            PatchError::PathEscape { .. } => "PATH_ESCAPE",
            PatchError::ApplyConflict { .. } => "APPLY_CONFLICT",
            PatchError::WriteDenied { .. } => "WRITE_DENIED",
            PatchError::EscalationRequired { .. } => "ESCALATION_REQUIRED",
            PatchError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            PatchError::ResourceLocked { .. } => "RESOURCE_LOCKED",
            PatchError::Ledger(err) => err.code(),
            PatchError::Io { .. } => "IO",
        }
    }

    pub(crate) fn io(op: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        PatchError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
