#![forbid(unsafe_code)]

use crate::{
    McpServer, ai_ok_with_warnings, args_object, patch_error, patch_ref, require_string,
    require_text,
};
use serde_json::{Value, json};

pub(crate) fn preview(server: &mut McpServer, args: Value) -> Value {
    let args = match args_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let diff = match require_text(args, "diff") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match server.manager().preview(&diff) {
        Ok(preview) => {
            let files = preview
                .files
                .iter()
                .map(|file| {
                    json!({
                        "path": file.path,
                        "mode": file.mode.as_str(),
                        "original_size": file.original_size,
                        "patched_size": file.patched_size,
                    })
                })
                .collect::<Vec<_>>();
            ai_ok_with_warnings(
                "preview_patch",
                json!({ "patch_id": preview.patch_id, "files": files }),
                Vec::new(),
                vec![patch_ref(&preview.patch_id)],
            )
        }
        Err(err) => patch_error(err),
    }
}

pub(crate) fn apply(server: &mut McpServer, args: Value) -> Value {
    let args = match args_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch_id = match require_string(args, "patch_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match server.manager().apply(&patch_id) {
        Ok(applied) => {
            let files = applied
                .applied_files
                .iter()
                .map(|file| json!({ "path": file.path, "mode": file.mode.as_str() }))
                .collect::<Vec<_>>();
            ai_ok_with_warnings(
                "apply_patch",
                json!({ "patch_id": applied.patch_id, "applied_files": files }),
                Vec::new(),
                vec![patch_ref(&applied.patch_id)],
            )
        }
        Err(err) => patch_error(err),
    }
}

pub(crate) fn cancel(server: &mut McpServer, args: Value) -> Value {
    let args = match args_object(&args) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch_id = match require_string(args, "patch_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match server.manager().cancel(&patch_id) {
        Ok(()) => crate::ai_ok(
            "cancel_patch",
            json!({ "patch_id": patch_id, "cancelled": true }),
        ),
        Err(err) => patch_error(err),
    }
}
