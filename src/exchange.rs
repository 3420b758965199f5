use std::path::Path;

use anyhow::Context;

use crate::calc::Class;

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub class_count: usize,
}

/// Import failures come in three kinds: unreadable file, malformed JSON, or
/// well-formed JSON of the wrong shape. The caller maps each to its own error
/// code and leaves prior state untouched.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("file is not valid JSON: {0}")]
    Parse(serde_json::Error),
    #[error("{0}")]
    Shape(String),
}

/// Writes the roster as a pretty-printed JSON array, the same shape the store
/// keeps under its `classes` key.
pub fn export_classes(path: &Path, classes: &[Class]) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    let text =
        serde_json::to_string_pretty(classes).context("failed to serialize class roster")?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))?;
    Ok(ExportSummary {
        class_count: classes.len(),
    })
}

/// Parses and validates an exchange file. All-or-nothing: the root must be an
/// array and every element must be class-shaped, otherwise nothing is
/// imported.
pub fn import_classes(path: &Path) -> Result<Vec<Class>, ImportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    let root: serde_json::Value = serde_json::from_str(&text).map_err(ImportError::Parse)?;
    if !root.is_array() {
        return Err(ImportError::Shape(
            "root must be a JSON array of classes".to_string(),
        ));
    }
    serde_json::from_value(root)
        .map_err(|e| ImportError::Shape(format!("class entry does not match expected shape: {}", e)))
}
