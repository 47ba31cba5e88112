//! Data directory resolution and the per-Expression HTML archive layout.
//!
//! Priority order for the data directory (spec.md §6):
//! 1. `$MWI_DATA_LOCATION` if set and non-empty.
//! 2. `$XDG_DATA_HOME/mwi` if `XDG_DATA_HOME` is set.
//! 3. `~/.local/share/mwi` (default).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns the data directory: database file + per-expression archives.
pub fn data_dir() -> PathBuf {
    if let Ok(explicit) = std::env::var("MWI_DATA_LOCATION") {
        if !explicit.is_empty() {
            return PathBuf::from(explicit);
        }
    }

    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data.is_empty() {
            return PathBuf::from(xdg_data).join("mwi");
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".local").join("share").join("mwi");
    }

    PathBuf::from(".local/share/mwi")
}

/// Path to the SQLite database file (`data_dir/storage.sqlite3`).
pub fn database_path() -> PathBuf {
    data_dir().join("storage.sqlite3")
}

/// Path to the state/log directory (`data_dir/logs`). Logging has no XDG
/// state split of its own here since the engine is CLI-driven, not daemonized.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Path to an Expression's archived raw HTML: `lands/<land_id>/<expression_id>`.
pub fn expression_archive_path(land_id: i64, expression_id: i64) -> PathBuf {
    data_dir()
        .join("lands")
        .join(land_id.to_string())
        .join(expression_id.to_string())
}

/// Write an Expression's archived HTML atomically (temp file + rename), so a
/// crash mid-write never leaves a half-written archive visible under the
/// real path.
pub fn write_expression_archive(land_id: i64, expression_id: i64, html: &str) -> io::Result<()> {
    let path = expression_archive_path(land_id, expression_id);
    write_file_atomic(&path, html.as_bytes())
}

fn write_file_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
