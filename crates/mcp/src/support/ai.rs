#![forbid(unsafe_code)]

use pg_patch::PatchError;
use pg_storage::LedgerError;
use serde_json::{Value, json};

pub(crate) fn ai_ok_with_warnings(
    intent: &str,
    result: Value,
    warnings: Vec<Value>,
    refs: Vec<Value>,
) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "result": result,
        "warnings": warnings,
        "refs": refs,
        "error": null
    })
}

pub(crate) fn ai_ok(intent: &str, result: Value) -> Value {
    ai_ok_with_warnings(intent, result, Vec::new(), Vec::new())
}

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    ai_error_with(code, message, None, Vec::new())
}

pub(crate) fn ai_error_with(
    code: &str,
    message: &str,
    recovery: Option<&str>,
    refs: Vec<Value>,
) -> Value {
    let mut error_obj = serde_json::Map::new();
    error_obj.insert("code".to_string(), Value::String(code.to_string()));
    error_obj.insert(
        "message".to_string(),
        Value::String(message.trim().to_string()),
    );
    if let Some(recovery) = recovery {
        error_obj.insert(
            "recovery".to_string(),
            Value::String(recovery.trim().to_string()),
        );
    }

    json!({
        "success": false,
        "intent": "error",
        "result": {},
        "warnings": [],
        "refs": refs,
        "error": Value::Object(error_obj)
    })
}

pub(crate) fn escalation_ref(ticket_id: &str) -> Value {
    json!({ "kind": "escalation", "id": ticket_id })
}

pub(crate) fn patch_ref(patch_id: &str) -> Value {
    json!({ "kind": "patch", "id": patch_id })
}

pub(crate) fn patch_error(err: PatchError) -> Value {
    let message = err.to_string();
    match &err {
        PatchError::EscalationRequired { ticket_id, .. } => ai_error_with(
            err.code(),
            &message,
            Some(
                "Ask a reviewer to resolve the escalation (resolve_permission_escalation), \
                 extend the allow rules, then preview the diff again.",
            ),
            vec![escalation_ref(ticket_id)],
        ),
        PatchError::SessionNotFound { patch_id } => ai_error_with(
            err.code(),
            &message,
            Some("Patch ids are single-use; run preview_patch again to get a fresh id."),
            vec![patch_ref(patch_id)],
        ),
        PatchError::ResourceLocked { .. } => ai_error_with(
            err.code(),
            &message,
            Some("Another patch is writing the same file; retry apply_patch later."),
            Vec::new(),
        ),
        PatchError::ApplyConflict { .. } => ai_error_with(
            err.code(),
            &message,
            Some("The file changed since the diff was made; regenerate the diff from current content."),
            Vec::new(),
        ),
        PatchError::Ledger(inner) => ledger_error(inner),
        _ => ai_error_with(err.code(), &message, None, Vec::new()),
    }
}

fn ledger_error(err: &LedgerError) -> Value {
    let recovery = match err {
        LedgerError::NotFound { .. } => {
            Some("Use list_permission_escalations to find a valid escalation_id.")
        }
        LedgerError::InvalidTransition { .. } => Some("status must be approved or denied."),
        _ => None,
    };
    ai_error_with(err.code(), &err.to_string(), recovery, Vec::new())
}
