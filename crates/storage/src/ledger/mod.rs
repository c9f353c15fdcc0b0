#![forbid(unsafe_code)]

mod error;
mod file;
mod types;

pub use error::*;
pub use types::*;

use pg_core::paths::normalize_relative_path;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Escalation tickets persisted as one JSON document.
///
/// Every load → mutate → save sequence runs inside a single lane (`lane`), so concurrent
/// recorders and resolvers cannot lose each other's updates. Reads take the lane as well and
/// therefore never observe a sequence halfway through.
#[derive(Debug)]
pub struct EscalationLedger {
    path: PathBuf,
    lane: Mutex<()>,
}

impl EscalationLedger {
    /// No I/O happens here; the file appears on the first save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lane: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File a request, or return the pending ticket already filed for the same
    /// (path, mode, reason).
    pub fn record(&self, request: EscalationRequest) -> Result<EscalationTicket, LedgerError> {
        let path = normalize_relative_path(&request.path);
        let mode = request.mode.trim().to_string();
        let reason = request.reason.trim().to_string();
        if path.is_empty() {
            return Err(LedgerError::InvalidInput("escalation path must not be empty"));
        }
        if mode.is_empty() {
            return Err(LedgerError::InvalidInput("escalation mode must not be empty"));
        }
        if reason.is_empty() {
            return Err(LedgerError::InvalidInput("escalation reason must not be empty"));
        }

        let _lane = self.enter_lane();
        let mut state = file::load_state(&self.path);

        if let Some(existing) = state.records.iter().find(|record| {
            record.status == EscalationStatus::Pending
                && record.path == path
                && record.mode == mode
                && record.reason == reason
        }) {
            tracing::info!(
                id = %existing.id,
                path = %existing.path,
                mode = %existing.mode,
                reason = %existing.reason,
                "escalation already pending"
            );
            return Ok(existing.clone());
        }

        let ticket = EscalationTicket {
            id: uuid::Uuid::new_v4().to_string(),
            path,
            mode,
            reason,
            requested_by: request.requested_by.trim().to_string(),
            requested_at: now_rfc3339(),
            status: EscalationStatus::Pending,
            resolved_at: None,
            resolver: None,
            notes: None,
        };
        state.records.push(ticket.clone());
        file::save_state(&self.path, &state)?;

        tracing::info!(
            id = %ticket.id,
            path = %ticket.path,
            mode = %ticket.mode,
            reason = %ticket.reason,
            requested_by = %ticket.requested_by,
            "recorded escalation request"
        );
        Ok(ticket)
    }

    /// Tickets ordered by request time, oldest first.
    pub fn list(
        &self,
        status: Option<EscalationStatus>,
    ) -> Result<Vec<EscalationTicket>, LedgerError> {
        let _lane = self.enter_lane();
        let state = file::load_state(&self.path);

        let mut records = state
            .records
            .into_iter()
            .filter(|record| status.is_none_or(|wanted| record.status == wanted))
            .collect::<Vec<_>>();
        records.sort_by(|a, b| {
            let ka = parse_rfc3339(&a.requested_at);
            let kb = parse_rfc3339(&b.requested_at);
            ka.cmp(&kb)
        });

        tracing::debug!(
            total = records.len(),
            status = status.map(EscalationStatus::as_str).unwrap_or("all"),
            "listed escalation requests"
        );
        Ok(records)
    }

    pub fn get(&self, id: &str) -> Result<Option<EscalationTicket>, LedgerError> {
        let _lane = self.enter_lane();
        let state = file::load_state(&self.path);
        Ok(state.records.into_iter().find(|record| record.id == id))
    }

    /// Approve or deny a pending ticket. Resolving an already-resolved ticket returns it
    /// untouched, whatever status was asked for.
    pub fn resolve(
        &self,
        resolution: EscalationResolution,
    ) -> Result<EscalationTicket, LedgerError> {
        if !resolution.status.is_resolved() {
            return Err(LedgerError::InvalidTransition {
                status: resolution.status,
            });
        }

        let _lane = self.enter_lane();
        let mut state = file::load_state(&self.path);

        let Some(record) = state
            .records
            .iter_mut()
            .find(|record| record.id == resolution.id)
        else {
            tracing::warn!(id = %resolution.id, "attempted to resolve missing escalation");
            return Err(LedgerError::NotFound { id: resolution.id });
        };

        if record.status.is_resolved() {
            tracing::info!(id = %record.id, status = %record.status, "escalation already resolved");
            return Ok(record.clone());
        }

        record.status = resolution.status;
        record.resolved_at = Some(now_rfc3339());
        record.resolver = resolution.resolver.filter(|v| !v.trim().is_empty());
        record.notes = resolution.notes.filter(|v| !v.trim().is_empty());
        let resolved = record.clone();

        file::save_state(&self.path, &state)?;

        tracing::info!(
            id = %resolved.id,
            status = %resolved.status,
            resolver = resolved.resolver.as_deref().unwrap_or("-"),
            "resolved escalation request"
        );
        Ok(resolved)
    }

    // The lane guards no data, so a panic in another holder leaves nothing inconsistent behind.
    fn enter_lane(&self) -> MutexGuard<'_, ()> {
        self.lane.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn parse_rfc3339(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}
