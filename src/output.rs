//! JSON artifacts written next to the console report.
//!
//! The catalog snapshot lands at `<dir>/catalog.json`; each index answer
//! lands at `<dir>/<safe name>.json`.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{AuditError, AuditResult};

pub const CATALOG_FILE: &str = "catalog.json";

/// Replace characters that would break a flat file name.
pub fn safe_file_stem(semantic_id: &str) -> String {
    semantic_id.replace([' ', '/'], "_")
}

pub fn catalog_path(dir: &Path) -> PathBuf {
    dir.join(CATALOG_FILE)
}

pub fn chunks_path(dir: &Path, semantic_id: &str) -> PathBuf {
    dir.join(format!("{}.json", safe_file_stem(semantic_id)))
}

/// Pretty-print `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> AuditResult<()> {
    let io_err = |source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AuditError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
    std::fs::write(path, json).map_err(io_err)?;

    tracing::debug!(path = %path.display(), "wrote artifact");
    Ok(())
}
