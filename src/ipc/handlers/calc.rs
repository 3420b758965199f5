use serde_json::json;

use crate::calc::{self, aggregate, coerce_number, round_off_2_decimals, ClassType};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Session};
use crate::predict;

fn param_number(req: &Request, key: &str) -> f64 {
    req.params.get(key).map(coerce_number).unwrap_or(0.0)
}

fn handle_class_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let index = match req.params.get("index").and_then(|v| v.as_u64()) {
        Some(i) => i as usize,
        None => session.roster.active_index(),
    };
    let Some(class) = session.roster.class_at(index) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let agg = aggregate(class, &session.scale);

    let assignments: Vec<serde_json::Value> = class
        .data
        .iter()
        .map(|a| {
            let percent = if a.total > 0.0 {
                round_off_2_decimals(100.0 * a.score / a.total)
            } else {
                0.0
            };
            let mut row = json!({
                "score": a.score,
                "total": a.total,
                "percent": percent,
            });
            if let Some(name) = &a.name {
                row["name"] = json!(name);
            }
            if let Some(category) = &a.category {
                row["category"] = json!(category);
            }
            row
        })
        .collect();

    let categories: Vec<serde_json::Value> = agg
        .categories
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "weight": c.weight,
                "score": c.score,
                "total": c.total,
                "percent": round_off_2_decimals(c.percent),
                "contribution": round_off_2_decimals(c.contribution),
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "name": class.name,
            "type": class.class_type.as_str(),
            "totalScore": agg.total_score,
            "totalMax": agg.total_max,
            "percent": round_off_2_decimals(agg.percent),
            "letter": agg.letter,
            "assignments": assignments,
            "categories": categories,
        }),
    )
}

fn active_class_of_type<'a>(
    session: &'a Session,
    req: &Request,
    wanted: ClassType,
) -> Result<&'a calc::Class, serde_json::Value> {
    let Some(class) = session.roster.active_class() else {
        return Err(err(&req.id, "not_found", "no active class", None));
    };
    if class.class_type != wanted {
        return Err(err(
            &req.id,
            "bad_params",
            format!("active class is not {}", wanted.as_str()),
            None,
        ));
    }
    Ok(class)
}

fn handle_needed_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let class = match active_class_of_type(session, req, ClassType::PointBased) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let agg = aggregate(class, &session.scale);
    let next_total = param_number(req, "nextTotal");
    let target_grade = req
        .params
        .get("targetGrade")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    // Unknown grade or missing next total yields null, not an error.
    let needed = predict::needed_score(
        agg.total_score,
        agg.total_max,
        next_total,
        target_grade,
        &session.scale,
    );

    match needed {
        None => ok(&req.id, json!({ "needed": null })),
        Some(needed) => ok(
            &req.id,
            json!({
                "needed": needed,
                "neededPercent": round_off_2_decimals(100.0 * needed / next_total),
            }),
        ),
    }
}

fn handle_predicted_grade(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let class = match active_class_of_type(session, req, ClassType::PointBased) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    if req.params.get("score").is_none() {
        return err(&req.id, "bad_params", "missing score", None);
    }
    let agg = aggregate(class, &session.scale);
    let next_total = param_number(req, "nextTotal");
    let score = param_number(req, "score");

    if !(agg.total_max + next_total > 0.0) {
        return err(
            &req.id,
            "bad_params",
            "nextTotal must be positive while the class has no graded work",
            None,
        );
    }

    match predict::predicted_grade(agg.total_score, agg.total_max, next_total, score, &session.scale)
    {
        None => ok(&req.id, json!({ "grade": null })),
        Some(p) => ok(
            &req.id,
            json!({
                "grade": p.grade,
                "newTotalScore": p.new_total_score,
                "newTotalMax": p.new_total_max,
                "newPercent": round_off_2_decimals(p.new_percent),
            }),
        ),
    }
}

fn handle_category_needed_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let class = match active_class_of_type(session, req, ClassType::CategoryWeighted) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let agg = aggregate(class, &session.scale);
    let category_name = req
        .params
        .get("categoryName")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let next_total = param_number(req, "nextTotal");
    let target_grade = req
        .params
        .get("targetGrade")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let needed = predict::category_needed_score(
        &agg,
        category_name,
        next_total,
        target_grade,
        &session.scale,
    );

    match needed {
        None => ok(&req.id, json!({ "needed": null })),
        Some(needed) => ok(
            &req.id,
            json!({
                "needed": needed,
                "neededPercent": round_off_2_decimals(100.0 * needed / next_total),
            }),
        ),
    }
}

fn handle_category_predicted_grade(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let class = match active_class_of_type(session, req, ClassType::CategoryWeighted) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let agg = aggregate(class, &session.scale);
    let category_name = req
        .params
        .get("categoryName")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let next_total = param_number(req, "nextTotal");
    let score = param_number(req, "score");

    match predict::category_predicted_grade(&agg, category_name, next_total, score, &session.scale)
    {
        None => ok(&req.id, json!({ "grade": null, "newPercent": null })),
        Some(p) => ok(
            &req.id,
            json!({
                "grade": p.grade,
                "newPercent": round_off_2_decimals(p.new_percent),
            }),
        ),
    }
}

fn handle_term_blend(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(raw_weights) = req.params.get("weights") else {
        return err(&req.id, "bad_params", "missing weights", None);
    };
    let weights = predict::BlendWeights {
        term1: raw_weights.get("term1").map(coerce_number).unwrap_or(0.0),
        term2: raw_weights.get("term2").map(coerce_number).unwrap_or(0.0),
        final_exam: raw_weights
            .get("finalExam")
            .map(coerce_number)
            .unwrap_or(0.0),
    };

    // An invalid configuration suppresses any numeric result.
    if !weights.is_valid() {
        return err(&req.id, "invalid_weights", "weights must total 100%", None);
    }
    if !(weights.term2 > 0.0) {
        return err(
            &req.id,
            "invalid_weights",
            "term 2 weight must be positive",
            None,
        );
    }

    let term1 = param_number(req, "term1");
    let final_exam = param_number(req, "finalExam");
    let target = param_number(req, "target");

    match predict::solve_term_blend(term1, final_exam, weights, target) {
        None => err(&req.id, "invalid_weights", "weights must total 100%", None),
        Some(r) => ok(
            &req.id,
            json!({
                "neededTerm2": r.needed_term2,
                "achievability": r.achievability,
                "target": target,
                "targetLetter": session.scale.letter_for(target),
            }),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calc.classSummary" => Some(handle_class_summary(state, req)),
        "calc.neededScore" => Some(handle_needed_score(state, req)),
        "calc.predictedGrade" => Some(handle_predicted_grade(state, req)),
        "calc.categoryNeededScore" => Some(handle_category_needed_score(state, req)),
        "calc.categoryPredictedGrade" => Some(handle_category_predicted_grade(state, req)),
        "calc.termBlend" => Some(handle_term_blend(state, req)),
        _ => None,
    }
}
