#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the `DuckDB` data directory.

use std::path::{Path, PathBuf};

/// Environment variable overriding the default database location.
pub const DB_PATH_ENV: &str = "FLEET_DB_PATH";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the database file to use when none is given explicitly:
/// `$FLEET_DB_PATH` if set and non-empty, else `data/fleet.duckdb`.
#[must_use]
pub fn default_db_path() -> PathBuf {
    std::env::var_os(DB_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map_or_else(|| data_dir().join("fleet.duckdb"), PathBuf::from)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_lives_under_project_root() {
        let root = project_root();
        assert!(root.join("Cargo.toml").exists());
        assert_eq!(data_dir(), root.join("data"));
    }

    #[test]
    fn ensure_dir_accepts_empty_parent() {
        // `Path::new("fleet.duckdb").parent()` is the empty path.
        ensure_dir(Path::new("")).unwrap();
    }
}
