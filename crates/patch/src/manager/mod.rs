#![forbid(unsafe_code)]

use crate::diff::{self, FileDiff};
use crate::error::PatchError;
use crate::fsops;
use crate::locks::LockSet;
use crate::rollback::{UndoOp, rollback};
use crate::types::{AppliedFile, FilePlan, FileSummary, PatchApplied, PatchPreview, PatchSession};
use pg_core::paths::{escapes_base, normalize_relative_path};
use pg_core::policy::{CapabilityPolicy, PolicyDecision, WriteMode};
use pg_storage::{
    EscalationLedger, EscalationRequest, EscalationResolution, EscalationStatus, EscalationTicket,
};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;

pub const ESCALATION_REASON: &str = "not_allowlisted";
pub const ESCALATION_REQUESTER: &str = "patch_manager";

/// Owns the previewed sessions and the write locks for one project root.
#[derive(Debug)]
pub struct PatchManager {
    project_root: PathBuf,
    policy: CapabilityPolicy,
    ledger: Arc<EscalationLedger>,
    sessions: Mutex<HashMap<String, PatchSession>>,
    locks: LockSet,
}

impl PatchManager {
    pub fn new(
        project_root: impl Into<PathBuf>,
        policy: CapabilityPolicy,
        ledger: Arc<EscalationLedger>,
    ) -> Self {
        let project_root = project_root.into();
        let project_root = project_root.canonicalize().unwrap_or(project_root);
        Self {
            project_root,
            policy,
            ledger,
            sessions: Mutex::new(HashMap::new()),
            locks: LockSet::new(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn policy(&self) -> &CapabilityPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &EscalationLedger {
        &self.ledger
    }

    /// Parse `diff_text`, patch every file in memory, and run the capability checks.
    ///
    /// Nothing on disk changes. On success the plan is kept under the returned patch id until it
    /// is applied or cancelled.
    pub fn preview(&self, diff_text: &str) -> Result<PatchPreview, PatchError> {
        if diff_text.trim().is_empty() {
            return Err(PatchError::EmptyDiff);
        }
        let files = diff::parse_unified_diff(diff_text).map_err(|err| PatchError::InvalidDiff {
            detail: err.to_string(),
        })?;
        if files.is_empty() {
            return Err(PatchError::EmptyDiff);
        }
        let digest = sha256_hex(diff_text);

        let mut seen = HashSet::new();
        let mut plans = Vec::with_capacity(files.len());
        for file in &files {
            let plan = self.plan_file(file)?;
            if !seen.insert(plan.relative_path.clone()) {
                return Err(PatchError::InvalidDiff {
                    detail: format!("{} appears more than once", plan.relative_path),
                });
            }
            plans.push(plan);
        }

        for plan in &plans {
            self.check_capability(plan, &digest)?;
        }

        let session = PatchSession {
            id: uuid::Uuid::new_v4().to_string(),
            raw_diff: diff_text.to_string(),
            diff_sha256: digest,
            file_plans: plans,
            created_at: OffsetDateTime::now_utc(),
        };
        let preview = PatchPreview {
            patch_id: session.id.clone(),
            files: session.file_plans.iter().map(FileSummary::from).collect(),
        };

        tracing::info!(
            patch_id = %session.id,
            files = session.file_plans.len(),
            paths = ?preview.files.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
            diff_sha256 = %session.diff_sha256,
            "previewed patch"
        );
        self.sessions().insert(session.id.clone(), session);
        Ok(preview)
    }

    /// Write a previewed session to disk, all files or none.
    pub fn apply(&self, patch_id: &str) -> Result<PatchApplied, PatchError> {
        // The session leaves the table only once its paths are locked; `try_acquire` never
        // blocks, so holding the table meanwhile is fine.
        let (session, _guard) = {
            let mut sessions = self.sessions();
            let session = sessions
                .get(patch_id)
                .ok_or_else(|| PatchError::SessionNotFound {
                    patch_id: patch_id.to_string(),
                })?;
            let targets = session
                .file_plans
                .iter()
                .map(|plan| plan.absolute_path.clone())
                .collect::<Vec<_>>();
            match self.locks.try_acquire(&targets) {
                Ok(guard) => match sessions.remove(patch_id) {
                    Some(session) => (session, guard),
                    None => {
                        return Err(PatchError::SessionNotFound {
                            patch_id: patch_id.to_string(),
                        });
                    }
                },
                Err(busy) => {
                    let path = session
                        .file_plans
                        .iter()
                        .find(|plan| plan.absolute_path == busy)
                        .map(|plan| plan.relative_path.clone())
                        .unwrap_or_else(|| busy.display().to_string());
                    tracing::warn!(patch_id = %session.id, path = %path, "patch apply refused: path locked");
                    return Err(PatchError::ResourceLocked { path });
                }
            }
        };

        let mut undo = Vec::new();
        let mut applied = Vec::with_capacity(session.file_plans.len());
        for plan in &session.file_plans {
            if let Err(err) = self.write_plan(plan, &mut undo) {
                tracing::error!(
                    patch_id = %session.id,
                    path = %plan.relative_path,
                    mode = %plan.mode,
                    error = %err,
                    steps = undo.len(),
                    "patch apply failed; rolling back"
                );
                let report = rollback(undo);
                if report.is_clean() {
                    tracing::info!(patch_id = %session.id, reverted = report.reverted, "rollback complete");
                } else {
                    tracing::error!(
                        patch_id = %session.id,
                        reverted = report.reverted,
                        failures = ?report.failures,
                        "rollback incomplete"
                    );
                }
                return Err(err);
            }
            applied.push(AppliedFile::from(plan));
        }

        tracing::info!(
            patch_id = %session.id,
            files = applied.len(),
            paths = ?applied.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
            diff_sha256 = %session.diff_sha256,
            "applied patch"
        );
        Ok(PatchApplied {
            patch_id: session.id,
            applied_files: applied,
        })
    }

    pub fn cancel(&self, patch_id: &str) -> Result<(), PatchError> {
        let session = self
            .sessions()
            .remove(patch_id)
            .ok_or_else(|| PatchError::SessionNotFound {
                patch_id: patch_id.to_string(),
            })?;
        tracing::info!(
            patch_id = %session.id,
            files = session.file_plans.len(),
            diff_sha256 = %session.diff_sha256,
            "cancelled patch"
        );
        Ok(())
    }

    /// Live session ids, oldest preview first.
    pub fn session_ids(&self) -> Vec<String> {
        let sessions = self.sessions();
        let mut live = sessions.values().collect::<Vec<_>>();
        live.sort_by_key(|session| session.created_at);
        live.into_iter().map(|session| session.id.clone()).collect()
    }

    pub fn record_escalation(
        &self,
        request: EscalationRequest,
    ) -> Result<EscalationTicket, PatchError> {
        Ok(self.ledger.record(request)?)
    }

    pub fn list_escalations(
        &self,
        status: Option<EscalationStatus>,
    ) -> Result<Vec<EscalationTicket>, PatchError> {
        Ok(self.ledger.list(status)?)
    }

    pub fn resolve_escalation(
        &self,
        resolution: EscalationResolution,
    ) -> Result<EscalationTicket, PatchError> {
        Ok(self.ledger.resolve(resolution)?)
    }

    fn plan_file(&self, file: &FileDiff) -> Result<FilePlan, PatchError> {
        let name = file.target_name().ok_or_else(|| PatchError::InvalidDiff {
            detail: "file entry has no usable path".to_string(),
        })?;
        if file.is_rename_or_copy() {
            return Err(PatchError::InvalidDiff {
                detail: format!("{name}: rename and copy sections are not supported"),
            });
        }
        // Only an explicit git mode header may stand in for hunks (an empty file being added or
        // removed).
        if file.hunks.is_empty() && !file.declares_mode {
            return Err(PatchError::InvalidDiff {
                detail: format!("{name} has no hunks"),
            });
        }
        let relative_path = normalize_relative_path(strip_diff_prefix(name));
        if escapes_base(&relative_path) {
            return Err(PatchError::PathEscape {
                path: name.to_string(),
            });
        }
        let absolute_path = self.project_root.join(&relative_path);
        self.ensure_within_root(&absolute_path, &relative_path)?;

        let metadata = match std::fs::metadata(&absolute_path) {
            Ok(metadata) => Some(metadata),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(PatchError::io("stat", &relative_path, err)),
        };
        if metadata.as_ref().is_some_and(|m| m.is_dir()) {
            return Err(PatchError::ApplyConflict {
                path: relative_path,
                detail: "target is a directory".to_string(),
            });
        }
        let existed_before = metadata.is_some();

        let mode = if file.old_is_null() {
            WriteMode::Create
        } else if file.new_is_null() {
            WriteMode::Delete
        } else {
            WriteMode::Modify
        };
        let conflict = match (mode, existed_before) {
            (WriteMode::Create, true) => Some("diff creates a file that already exists"),
            (WriteMode::Delete, false) => Some("diff deletes a file that does not exist"),
            (WriteMode::Modify, false) => Some("target file does not exist"),
            _ => None,
        };
        if let Some(detail) = conflict {
            return Err(PatchError::ApplyConflict {
                path: relative_path,
                detail: detail.to_string(),
            });
        }

        let original_content = if existed_before {
            std::fs::read_to_string(&absolute_path)
                .map_err(|err| PatchError::io("read", &relative_path, err))?
        } else {
            String::new()
        };
        let patched = diff::apply_file_diff(&original_content, file).map_err(|err| {
            PatchError::ApplyConflict {
                path: relative_path.clone(),
                detail: err.to_string(),
            }
        })?;
        let patched_content = match mode {
            WriteMode::Delete if !patched.is_empty() => {
                return Err(PatchError::ApplyConflict {
                    path: relative_path,
                    detail: "delete does not remove the whole file".to_string(),
                });
            }
            WriteMode::Delete => String::new(),
            WriteMode::Create | WriteMode::Modify => patched,
        };

        Ok(FilePlan {
            absolute_path,
            relative_path,
            mode,
            original_content,
            patched_content,
            existed_before,
        })
    }

    fn check_capability(&self, plan: &FilePlan, digest: &str) -> Result<(), PatchError> {
        match self.policy.evaluate(&plan.relative_path, plan.mode) {
            PolicyDecision::Allowed { .. } => Ok(()),
            PolicyDecision::Denied { rule } => {
                tracing::warn!(
                    path = %plan.relative_path,
                    mode = %plan.mode,
                    rule = %rule,
                    diff_sha256 = %digest,
                    "patch write denied by capability policy"
                );
                Err(PatchError::WriteDenied {
                    path: plan.relative_path.clone(),
                    mode: plan.mode,
                    rule: rule.to_string(),
                })
            }
            PolicyDecision::Ambiguous => {
                let ticket = self.ledger.record(EscalationRequest {
                    path: plan.relative_path.clone(),
                    mode: plan.mode.as_str().to_string(),
                    reason: ESCALATION_REASON.to_string(),
                    requested_by: ESCALATION_REQUESTER.to_string(),
                })?;
                tracing::warn!(
                    path = %plan.relative_path,
                    mode = %plan.mode,
                    ticket_id = %ticket.id,
                    diff_sha256 = %digest,
                    "patch write requires escalation"
                );
                Err(PatchError::EscalationRequired {
                    path: plan.relative_path.clone(),
                    mode: plan.mode,
                    ticket_id: ticket.id,
                })
            }
        }
    }

    /// Resolve symlinks on the deepest existing part of `absolute` and require the result to
    /// stay under the project root.
    fn ensure_within_root(&self, absolute: &Path, relative: &str) -> Result<(), PatchError> {
        let escape = || PatchError::PathEscape {
            path: relative.to_string(),
        };
        let existing = fsops::nearest_existing(absolute).ok_or_else(escape)?;
        let resolved = existing
            .canonicalize()
            .map_err(|err| PatchError::io("resolve", relative, err))?;
        if resolved.starts_with(&self.project_root) {
            Ok(())
        } else {
            Err(escape())
        }
    }

    fn write_plan(&self, plan: &FilePlan, undo: &mut Vec<UndoOp>) -> Result<(), PatchError> {
        let rel = plan.relative_path.as_str();
        self.ensure_within_root(&plan.absolute_path, rel)?;

        match plan.mode {
            WriteMode::Delete => {
                let removed = fsops::remove_if_exists(&plan.absolute_path)
                    .map_err(|err| PatchError::io("remove", rel, err))?;
                if removed {
                    undo.push(UndoOp::RestoreContent {
                        path: plan.absolute_path.clone(),
                        content: plan.original_content.clone(),
                    });
                } else {
                    tracing::debug!(path = %rel, "file already absent; delete skipped");
                }
            }
            WriteMode::Create | WriteMode::Modify => {
                if let Some(parent) = plan.absolute_path.parent() {
                    for dir in fsops::missing_dirs(parent) {
                        match std::fs::create_dir(&dir) {
                            Ok(()) => undo.push(UndoOp::RemoveDir { path: dir }),
                            Err(err) if err.kind() == ErrorKind::AlreadyExists && dir.is_dir() => {}
                            Err(err) => return Err(PatchError::io("create directory", rel, err)),
                        }
                    }
                }
                fsops::write_atomic(&plan.absolute_path, &plan.patched_content)
                    .map_err(|err| PatchError::io("write", rel, err))?;
                undo.push(if plan.existed_before {
                    UndoOp::RestoreContent {
                        path: plan.absolute_path.clone(),
                        content: plan.original_content.clone(),
                    }
                } else {
                    UndoOp::RemoveFile {
                        path: plan.absolute_path.clone(),
                    }
                });
            }
        }
        tracing::debug!(path = %rel, mode = %plan.mode, "wrote file plan");
        Ok(())
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, PatchSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drop one conventional `a/` or `b/` prefix.
fn strip_diff_prefix(name: &str) -> &str {
    name.strip_prefix("a/")
        .or_else(|| name.strip_prefix("b/"))
        .unwrap_or(name)
}

fn sha256_hex(text: &str) -> String {
    Sha256::digest(text.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
