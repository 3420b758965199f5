use serde_json::json;

use crate::calc::ClassType;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::ClassPatch;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return ok(&req.id, json!({ "classes": [], "activeIndex": 0 }));
    };

    let classes: Vec<serde_json::Value> = session
        .roster
        .classes()
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "type": c.class_type.as_str(),
                "assignmentCount": c.data.len(),
                "categoryCount": c.categories.len(),
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "classes": classes,
            "activeIndex": session.roster.active_index(),
        }),
    )
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing name", None),
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    let class_type = match req
        .params
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(ClassType::parse)
    {
        Some(t) => t,
        None => {
            return err(
                &req.id,
                "bad_params",
                "type must be point-based or category-weighted",
                None,
            )
        }
    };

    session.roster.add_class(&name, class_type);
    ok(
        &req.id,
        json!({
            "name": name,
            "type": class_type.as_str(),
            "index": session.roster.len() - 1,
        }),
    )
}

fn handle_classes_switch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(index) = req.params.get("index").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing index", None);
    };
    let index = index as usize;
    if index >= session.roster.len() {
        return err(&req.id, "bad_params", "index out of bounds", None);
    }

    session.roster.switch_class(index);
    ok(&req.id, json!({ "activeIndex": index }))
}

fn handle_classes_rename(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(index) = req.params.get("index").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing index", None);
    };
    let index = index as usize;
    if index >= session.roster.len() {
        return err(&req.id, "not_found", "class not found", None);
    }

    let name = req
        .params
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    session.roster.rename_class(index, name);
    ok(&req.id, json!({ "index": index, "name": name }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(index) = req.params.get("index").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing index", None);
    };
    let index = index as usize;
    if !session.roster.delete_class(index) {
        return err(&req.id, "not_found", "class not found", None);
    }

    ok(
        &req.id,
        json!({
            "classCount": session.roster.len(),
            "activeIndex": session.roster.active_index(),
        }),
    )
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(raw_patch) = req.params.get("patch") else {
        return err(&req.id, "bad_params", "missing patch", None);
    };
    // The class type is immutable; a patch naming it (or anything unknown)
    // is rejected outright.
    let patch: ClassPatch = match serde_json::from_value(raw_patch.clone()) {
        Ok(p) => p,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    if !session.roster.update_active(patch) {
        return err(&req.id, "not_found", "no active class", None);
    }

    ok(&req.id, json!({ "activeIndex": session.roster.active_index() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.switch" => Some(handle_classes_switch(state, req)),
        "classes.rename" => Some(handle_classes_rename(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        "classes.update" => Some(handle_classes_update(state, req)),
        _ => None,
    }
}
