use std::path::PathBuf;
use std::rc::Rc;

use serde_json::json;
use tracing::info;

use crate::calc::GradeScale;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Session};
use crate::roster::Roster;
use crate::store::{SqliteStore, StateStore};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let store = match SqliteStore::open(&path) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "store_open_failed", format!("{e:?}"), None),
    };
    let store: Rc<dyn StateStore> = Rc::new(store);

    let classes = match store.load_classes() {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return err(&req.id, "store_read_failed", format!("{e:?}"), None),
    };
    let scale = match store.load_grade_scale() {
        Ok(v) => v.unwrap_or_else(GradeScale::standard),
        Err(e) => return err(&req.id, "store_read_failed", format!("{e:?}"), None),
    };

    let class_count = classes.len();
    info!(path = %path.display(), class_count, "workspace opened");

    state.workspace = Some(path.clone());
    state.session = Some(Session {
        roster: Roster::new(classes, store.clone()),
        scale,
        store,
    });

    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "classCount": class_count
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
