use std::path::PathBuf;
use std::rc::Rc;

use serde::Deserialize;

use crate::calc::GradeScale;
use crate::roster::Roster;
use crate::store::StateStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything loaded for an open workspace: the roster (which persists itself
/// through the shared store) plus the grade scale, whose lifecycle is
/// independent of any class.
pub struct Session {
    pub roster: Roster,
    pub scale: GradeScale,
    pub store: Rc<dyn StateStore>,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub session: Option<Session>,
}
