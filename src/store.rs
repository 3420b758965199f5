use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::calc::{Class, GradeScale};

pub const CLASSES_KEY: &str = "classes";
pub const GRADE_SCALE_KEY: &str = "gradeScale";

/// The injected load/save capability behind the roster and the grade scale.
/// Two independent documents are kept: the class list and the scale. Loads
/// happen once at workspace selection; saves on every mutation.
pub trait StateStore {
    fn load_classes(&self) -> anyhow::Result<Option<Vec<Class>>>;
    fn save_classes(&self, classes: &[Class]) -> anyhow::Result<()>;
    fn load_grade_scale(&self) -> anyhow::Result<Option<GradeScale>>;
    fn save_grade_scale(&self, scale: &GradeScale) -> anyhow::Result<()>;
}

/// SQLite-backed store: one `app_state` key/value table holding each document
/// as a JSON string.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the workspace database.
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace).with_context(|| {
            format!(
                "failed to create workspace {}",
                workspace.to_string_lossy()
            )
        })?;
        let db_path = workspace.join("gradetrack.sqlite3");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS app_state(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT
            )",
            [],
        )?;

        Ok(Self { conn })
    }

    fn get_json(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
        let text: Option<String> = self
            .conn
            .query_row("SELECT value FROM app_state WHERE key = ?", [key], |r| {
                r.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read state key {}", key))?;
        match text {
            None => Ok(None),
            Some(t) => {
                let value = serde_json::from_str(&t)
                    .with_context(|| format!("state key {} holds invalid JSON", key))?;
                Ok(Some(value))
            }
        }
    }

    fn set_json(&self, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
        let text = serde_json::to_string(value)
            .with_context(|| format!("failed to serialize state key {}", key))?;
        self.conn
            .execute(
                "INSERT INTO app_state(key, value, updated_at) VALUES(?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                (key, &text, Utc::now().to_rfc3339()),
            )
            .with_context(|| format!("failed to write state key {}", key))?;
        Ok(())
    }
}

impl StateStore for SqliteStore {
    fn load_classes(&self) -> anyhow::Result<Option<Vec<Class>>> {
        match self.get_json(CLASSES_KEY)? {
            None => Ok(None),
            Some(v) => {
                let classes = serde_json::from_value(v)
                    .context("classes state does not match the expected shape")?;
                Ok(Some(classes))
            }
        }
    }

    fn save_classes(&self, classes: &[Class]) -> anyhow::Result<()> {
        self.set_json(CLASSES_KEY, &serde_json::to_value(classes)?)
    }

    fn load_grade_scale(&self) -> anyhow::Result<Option<GradeScale>> {
        match self.get_json(GRADE_SCALE_KEY)? {
            None => Ok(None),
            Some(v) => {
                let scale = serde_json::from_value(v)
                    .context("grade scale state does not match the expected shape")?;
                Ok(Some(scale))
            }
        }
    }

    fn save_grade_scale(&self, scale: &GradeScale) -> anyhow::Result<()> {
        self.set_json(GRADE_SCALE_KEY, &serde_json::to_value(scale)?)
    }
}

#[cfg(test)]
pub struct MemoryStore {
    classes: std::cell::RefCell<Option<Vec<Class>>>,
    scale: std::cell::RefCell<Option<GradeScale>>,
    saves: std::cell::Cell<usize>,
    fail_writes: std::cell::Cell<bool>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            classes: std::cell::RefCell::new(None),
            scale: std::cell::RefCell::new(None),
            saves: std::cell::Cell::new(0),
            fail_writes: std::cell::Cell::new(false),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

#[cfg(test)]
impl StateStore for MemoryStore {
    fn load_classes(&self) -> anyhow::Result<Option<Vec<Class>>> {
        Ok(self.classes.borrow().clone())
    }

    fn save_classes(&self, classes: &[Class]) -> anyhow::Result<()> {
        if self.fail_writes.get() {
            anyhow::bail!("simulated write failure");
        }
        *self.classes.borrow_mut() = Some(classes.to_vec());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn load_grade_scale(&self) -> anyhow::Result<Option<GradeScale>> {
        Ok(self.scale.borrow().clone())
    }

    fn save_grade_scale(&self, scale: &GradeScale) -> anyhow::Result<()> {
        if self.fail_writes.get() {
            anyhow::bail!("simulated write failure");
        }
        *self.scale.borrow_mut() = Some(scale.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
