#![forbid(unsafe_code)]

mod support;
use support::*;

use serde_json::json;

const CREATE_GUIDE: &str = "--- /dev/null\n+++ b/docs/guide.md\n@@ -0,0 +1,2 @@\n+# Guide\n+hello\n";

#[test]
fn preview_then_apply_writes_the_file() {
    let mut server = Server::start_initialized();

    let preview = server.call(10, "preview_patch", json!({ "diff": CREATE_GUIDE }));
    assert_eq!(preview["success"], json!(true), "{preview}");
    assert_eq!(preview["result"]["files"][0]["path"], json!("docs/guide.md"));
    assert_eq!(preview["result"]["files"][0]["mode"], json!("create"));
    assert_eq!(preview["result"]["files"][0]["patched_size"], json!(14));
    assert!(!server.root().join("docs/guide.md").exists());

    let patch_id = preview["result"]["patch_id"].as_str().expect("patch_id").to_string();
    let applied = server.call(11, "apply_patch", json!({ "patch_id": patch_id }));
    assert_eq!(applied["success"], json!(true), "{applied}");
    assert_eq!(
        applied["result"]["applied_files"],
        json!([{ "path": "docs/guide.md", "mode": "create" }])
    );
    assert_eq!(
        std::fs::read_to_string(server.root().join("docs/guide.md")).expect("guide"),
        "# Guide\nhello\n"
    );

    let again = server.call(12, "apply_patch", json!({ "patch_id": patch_id }));
    assert_eq!(error_code(&again), Some("SESSION_NOT_FOUND"));
}

#[test]
fn cancelled_patch_cannot_be_applied() {
    let mut server = Server::start_initialized();
    let preview = server.call(10, "preview_patch", json!({ "diff": CREATE_GUIDE }));
    let patch_id = preview["result"]["patch_id"].as_str().expect("patch_id").to_string();

    let cancelled = server.call(11, "cancel_patch", json!({ "patch_id": patch_id }));
    assert_eq!(cancelled["result"], json!({ "patch_id": patch_id, "cancelled": true }));

    let applied = server.call(12, "apply_patch", json!({ "patch_id": patch_id }));
    assert_eq!(error_code(&applied), Some("SESSION_NOT_FOUND"));
    assert!(!server.root().join("docs/guide.md").exists());
}

#[test]
fn ambiguous_path_escalates_and_resolves_once() {
    let mut server = Server::start_initialized();
    let diff = "--- /dev/null\n+++ b/src/main.rs\n@@ -0,0 +1 @@\n+fn main() {}\n";

    let preview = server.call(20, "preview_patch", json!({ "diff": diff }));
    assert_eq!(error_code(&preview), Some("ESCALATION_REQUIRED"));
    assert_eq!(preview["refs"][0]["kind"], json!("escalation"));
    let ticket_id = preview["refs"][0]["id"].as_str().expect("ticket id").to_string();
    assert!(server.ledger_path().exists());
    assert!(!server.root().join("src/main.rs").exists());

    let pending = server.call(21, "list_permission_escalations", json!({ "status": "pending" }));
    assert_eq!(pending["result"]["status"], json!("pending"));
    assert_eq!(pending["result"]["count"], json!(1));
    assert_eq!(pending["result"]["records"][0]["path"], json!("src/main.rs"));

    let resolved = server.call(
        22,
        "resolve_permission_escalation",
        json!({ "escalation_id": ticket_id, "status": "approved", "resolver": "lead" }),
    );
    assert_eq!(resolved["success"], json!(true), "{resolved}");
    assert_eq!(resolved["result"]["status"], json!("approved"));
    assert_eq!(resolved["result"]["resolver"], json!("lead"));
    let resolved_at = resolved["result"]["resolved_at"].clone();
    assert!(resolved_at.is_string());

    let repeat = server.call(
        23,
        "resolve_permission_escalation",
        json!({ "escalation_id": ticket_id, "status": "denied" }),
    );
    assert_eq!(repeat["result"]["status"], json!("approved"));
    assert_eq!(repeat["result"]["resolved_at"], resolved_at);

    let all = server.call(24, "list_permission_escalations", json!({}));
    assert_eq!(all["result"]["status"], json!("all"));
    assert_eq!(all["result"]["count"], json!(1));

    let unknown = server.call(
        25,
        "resolve_permission_escalation",
        json!({ "escalation_id": "missing", "status": "approved" }),
    );
    assert_eq!(error_code(&unknown), Some("NOT_FOUND"));
}

#[test]
fn denied_and_escaping_paths_are_rejected() {
    let mut server = Server::start_initialized();

    let denied = server.call(
        30,
        "preview_patch",
        json!({ "diff": "--- /dev/null\n+++ b/server/node_modules/x.gd\n@@ -0,0 +1 @@\n+x\n" }),
    );
    assert_eq!(error_code(&denied), Some("WRITE_DENIED"));

    let escape = server.call(
        31,
        "preview_patch",
        json!({ "diff": "--- a/../../etc/passwd\n+++ b/../../etc/passwd\n@@ -1 +1 @@\n-root\n+owned\n" }),
    );
    assert_eq!(error_code(&escape), Some("PATH_ESCAPE"));

    let empty = server.call(32, "preview_patch", json!({ "diff": "   " }));
    assert_eq!(error_code(&empty), Some("EMPTY_DIFF"));

    let missing = server.call(34, "preview_patch", json!({}));
    assert_eq!(error_code(&missing), Some("INVALID_INPUT"));

    let prose = server.call(33, "preview_patch", json!({ "diff": "nothing to see\n" }));
    assert_eq!(error_code(&prose), Some("EMPTY_DIFF"));

    assert!(!server.ledger_path().exists());
}

#[test]
fn policy_file_replaces_builtin_rules() {
    let policy_dir = tempfile::tempdir().expect("policy dir");
    let policy = policy_dir.path().join("policy.yaml");
    std::fs::write(
        &policy,
        "write_allow:\n  - type: directory\n    value: src\nwrite_deny:\n  - type: directory\n    value: docs\n",
    )
    .expect("write policy");
    let policy_arg = policy.to_string_lossy().to_string();

    let mut server = Server::start_with_args(&["--policy", &policy_arg]);
    server.initialize_default();

    let allowed = server.call(
        40,
        "preview_patch",
        json!({ "diff": "--- /dev/null\n+++ b/src/main.rs\n@@ -0,0 +1 @@\n+fn main() {}\n" }),
    );
    assert_eq!(allowed["success"], json!(true), "{allowed}");

    let denied = server.call(41, "preview_patch", json!({ "diff": CREATE_GUIDE }));
    assert_eq!(error_code(&denied), Some("WRITE_DENIED"));
}

#[test]
fn request_tool_exposes_the_ledger() {
    let mut server = Server::start_initialized();
    let args = json!({
        "path": "scripts/build.sh",
        "mode": "create",
        "reason": "add build script",
        "requested_by": "agent-7"
    });

    let first = server.call(50, "request_permission_escalation", args.clone());
    assert_eq!(first["success"], json!(true), "{first}");
    assert_eq!(first["result"]["requestedBy"], json!("agent-7"));

    let second = server.call(51, "request_permission_escalation", args);
    assert_eq!(second["result"]["id"], first["result"]["id"]);

    let bad_mode = server.call(
        52,
        "request_permission_escalation",
        json!({ "path": "a", "mode": "rename", "reason": "r" }),
    );
    assert_eq!(error_code(&bad_mode), Some("INVALID_INPUT"));
}
