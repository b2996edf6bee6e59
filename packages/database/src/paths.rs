//! Canonical file paths for the `DuckDB` data directory.
//!
//! All paths are relative to the project root's `data/` directory unless
//! overridden with `DATABASE_PATH`.

use std::path::{Path, PathBuf};

/// File name of the healthcare store inside `data/`.
const DATABASE_FILE: &str = "healthcare.duckdb";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// current directory when the manifest directory has fewer ancestors than
/// expected (e.g. a vendored build).
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default store path, `data/healthcare.duckdb`.
#[must_use]
pub fn default_database_path() -> PathBuf {
    data_dir().join(DATABASE_FILE)
}

/// Returns the store path from `DATABASE_PATH`, or the default.
#[must_use]
pub fn database_path_from_env() -> PathBuf {
    std::env::var("DATABASE_PATH").map_or_else(|_| default_database_path(), PathBuf::from)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_lives_under_data() {
        let path = default_database_path();
        assert!(path.ends_with("data/healthcare.duckdb"));
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }
}
