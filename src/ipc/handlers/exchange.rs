use std::path::PathBuf;

use serde_json::json;
use tracing::info;

use crate::exchange::{export_classes, import_classes, ImportError};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn param_path(req: &Request) -> Option<PathBuf> {
    req.params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(path) = param_path(req) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match export_classes(&path, session.roster.classes()) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "path": path.to_string_lossy(),
                "classCount": summary.class_count,
            }),
        ),
        Err(e) => err(&req.id, "export_failed", format!("{e:?}"), None),
    }
}

fn handle_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(path) = param_path(req) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    // Any failure below leaves the current roster untouched.
    let classes = match import_classes(&path) {
        Ok(c) => c,
        Err(ImportError::Read { .. }) => {
            return err(&req.id, "read_failed", "could not read import file", None)
        }
        Err(e @ ImportError::Parse(_)) => {
            return err(&req.id, "parse_failed", e.to_string(), None)
        }
        Err(e @ ImportError::Shape(_)) => return err(&req.id, "bad_shape", e.to_string(), None),
    };

    let class_count = classes.len();
    session.roster.replace_all(classes);
    info!(path = %path.display(), class_count, "roster imported");

    ok(
        &req.id,
        json!({
            "classCount": class_count,
            "activeIndex": session.roster.active_index(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exchange.export" => Some(handle_export(state, req)),
        "exchange.import" => Some(handle_import(state, req)),
        _ => None,
    }
}
