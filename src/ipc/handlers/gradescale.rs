use serde_json::json;
use tracing::warn;

use crate::calc::{coerce_number, GradeScale};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Session};

/// Scale writes follow the same fire-and-forget policy as the roster: the
/// in-memory mutation stands even when the snapshot write fails.
fn persist_scale(session: &Session) {
    if let Err(e) = session.store.save_grade_scale(&session.scale) {
        warn!(error = %e, "failed to persist grade scale");
    }
}

fn handle_scale_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, json!({ "gradeScale": session.scale }))
}

fn handle_scale_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let grade = match req.params.get("grade").and_then(|v| v.as_str()) {
        Some(g) if !g.trim().is_empty() => g.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing grade", None),
    };
    let Some(raw_min) = req.params.get("minPercentage") else {
        return err(&req.id, "bad_params", "missing minPercentage", None);
    };
    let min_percent = coerce_number(raw_min);

    session.scale.set(&grade, min_percent);
    persist_scale(session);
    ok(&req.id, json!({ "gradeScale": session.scale }))
}

fn handle_scale_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    session.scale = GradeScale::standard();
    persist_scale(session);
    ok(&req.id, json!({ "gradeScale": session.scale }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "gradeScale.get" => Some(handle_scale_get(state, req)),
        "gradeScale.update" => Some(handle_scale_update(state, req)),
        "gradeScale.reset" => Some(handle_scale_reset(state, req)),
        _ => None,
    }
}
