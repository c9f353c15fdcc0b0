#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationStatus {
    Pending,
    Approved,
    Denied,
}

impl EscalationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EscalationStatus::Pending => "pending",
            EscalationStatus::Approved => "approved",
            EscalationStatus::Denied => "denied",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "denied" => Some(Self::Denied),
            _ => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        !matches!(self, EscalationStatus::Pending)
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One escalation request. Records are appended and later resolved in place, never removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationTicket {
    pub id: String,
    pub path: String,
    pub mode: String,
    pub reason: String,
    pub requested_by: String,
    pub requested_at: String,
    pub status: EscalationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EscalationRequest {
    pub path: String,
    pub mode: String,
    pub reason: String,
    pub requested_by: String,
}

#[derive(Clone, Debug)]
pub struct EscalationResolution {
    pub id: String,
    pub status: EscalationStatus,
    pub resolver: Option<String>,
    pub notes: Option<String>,
}

/// On-disk shape: `{ "records": [...] }`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct LedgerState {
    #[serde(default)]
    pub(crate) records: Vec<EscalationTicket>,
}
