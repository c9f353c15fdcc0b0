#![forbid(unsafe_code)]

use serde_json::{Value, json};

fn patch_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "patch_id": { "type": "string", "description": "Identifier returned from preview_patch" }
        },
        "required": ["patch_id"]
    })
}

pub(crate) fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "preview_patch",
            "description": "Preview a unified diff without applying it. Checks paths, hunks and write policy; returns a single-use patch_id.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "diff": { "type": "string", "description": "Unified diff to preview" }
                },
                "required": ["diff"]
            },
        }),
        json!({
            "name": "apply_patch",
            "description": "Apply a previously previewed patch atomically; every file is restored if any write fails.",
            "inputSchema": patch_id_schema(),
        }),
        json!({
            "name": "cancel_patch",
            "description": "Discard a previewed patch without touching any file.",
            "inputSchema": patch_id_schema(),
        }),
        json!({
            "name": "list_permission_escalations",
            "description": "List recorded permission escalation requests, optionally filtered by status.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "status": { "type": "string", "enum": ["pending", "approved", "denied"] }
                }
            },
        }),
        json!({
            "name": "resolve_permission_escalation",
            "description": "Approve or deny a pending permission escalation request.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "escalation_id": { "type": "string" },
                    "status": { "type": "string", "enum": ["approved", "denied"] },
                    "resolver": { "type": "string", "description": "Who resolved it (audit trail)" },
                    "notes": { "type": "string" }
                },
                "required": ["escalation_id", "status"]
            },
        }),
        json!({
            "name": "request_permission_escalation",
            "description": "File a permission escalation request for a path and write mode.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "mode": { "type": "string", "enum": ["create", "modify", "delete"] },
                    "reason": { "type": "string" },
                    "requested_by": { "type": "string" }
                },
                "required": ["path", "mode", "reason"]
            },
        }),
    ]
}
