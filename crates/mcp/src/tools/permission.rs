#![forbid(unsafe_code)]

use crate::{
    McpServer, ai_error, ai_ok, ai_ok_with_warnings, args_object, escalation_ref, optional_string,
    patch_error, require_string,
};
use pg_core::policy::WriteMode;
use pg_storage::{EscalationRequest, EscalationResolution, EscalationStatus, EscalationTicket};
use serde_json::{Value, json};

pub(crate) fn list(server: &mut McpServer, args: Value) -> Value {
    let args = match args_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match optional_string(args, "status") {
        Ok(None) => None,
        Ok(Some(raw)) => match EscalationStatus::parse(raw.trim()) {
            Some(status) => Some(status),
            None => {
                return ai_error(
                    "INVALID_INPUT",
                    "status must be one of: pending|approved|denied",
                );
            }
        },
        Err(resp) => return resp,
    };

    match server.manager().list_escalations(status) {
        Ok(records) => ai_ok(
            "list_permission_escalations",
            json!({
                "status": status.map(EscalationStatus::as_str).unwrap_or("all"),
                "count": records.len(),
                "records": records,
            }),
        ),
        Err(err) => patch_error(err),
    }
}

pub(crate) fn resolve(server: &mut McpServer, args: Value) -> Value {
    let args = match args_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id = match require_string(args, "escalation_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match require_string(args, "status") {
        Ok(raw) => match EscalationStatus::parse(raw.trim()) {
            Some(status) => status,
            None => return ai_error("INVALID_INPUT", "status must be one of: approved|denied"),
        },
        Err(resp) => return resp,
    };
    let resolver = match optional_string(args, "resolver") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let notes = match optional_string(args, "notes") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let resolution = EscalationResolution {
        id,
        status,
        resolver,
        notes,
    };
    match server.manager().resolve_escalation(resolution) {
        Ok(ticket) => ai_ok_with_warnings(
            "resolve_permission_escalation",
            json!({
                "escalation_id": ticket.id,
                "status": ticket.status.as_str(),
                "resolved_at": ticket.resolved_at,
                "resolver": ticket.resolver,
                "notes": ticket.notes,
            }),
            Vec::new(),
            vec![escalation_ref(&ticket.id)],
        ),
        Err(err) => patch_error(err),
    }
}

pub(crate) fn request(server: &mut McpServer, args: Value) -> Value {
    let args = match args_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let path = match require_string(args, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mode = match require_string(args, "mode") {
        Ok(raw) => match WriteMode::parse(raw.trim()) {
            Some(mode) => mode,
            None => {
                return ai_error("INVALID_INPUT", "mode must be one of: create|modify|delete");
            }
        },
        Err(resp) => return resp,
    };
    let reason = match require_string(args, "reason") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let requested_by = match optional_string(args, "requested_by") {
        Ok(v) => v
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "mcp_client".to_string()),
        Err(resp) => return resp,
    };

    let request = EscalationRequest {
        path,
        mode: mode.as_str().to_string(),
        reason,
        requested_by,
    };
    match server.manager().record_escalation(request) {
        Ok(ticket) => ticket_response(ticket),
        Err(err) => patch_error(err),
    }
}

fn ticket_response(ticket: EscalationTicket) -> Value {
    let refs = vec![escalation_ref(&ticket.id)];
    match serde_json::to_value(&ticket) {
        Ok(record) => ai_ok_with_warnings("request_permission_escalation", record, Vec::new(), refs),
        Err(err) => ai_error("INTERNAL", &format!("failed to encode escalation: {err}")),
    }
}
