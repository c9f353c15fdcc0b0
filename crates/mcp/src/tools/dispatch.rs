#![forbid(unsafe_code)]

use crate::McpServer;
use serde_json::Value;

use super::{patch, permission};

pub(crate) fn dispatch_tool(server: &mut McpServer, name: &str, args: Value) -> Option<Value> {
    let resp = match name {
        "preview_patch" => patch::preview(server, args),
        "apply_patch" => patch::apply(server, args),
        "cancel_patch" => patch::cancel(server, args),
        "list_permission_escalations" => permission::list(server, args),
        "resolve_permission_escalation" => permission::resolve(server, args),
        "request_permission_escalation" => permission::request(server, args),
        _ => return None,
    };
    Some(resp)
}
