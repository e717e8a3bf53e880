use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use crate::error::WorktaskError;

use super::migrations;

/// Default database location: `<data_dir>/worktask/worktask.db`.
pub fn default_db_path() -> Result<PathBuf, WorktaskError> {
    let base = dirs::data_dir()
        .ok_or_else(|| WorktaskError::config("Cannot determine the user data directory"))?;
    Ok(base.join("worktask").join("worktask.db"))
}

/// Open an existing database. Returns error if not initialized.
pub fn open_db(path: &Path) -> Result<Connection, WorktaskError> {
    if !path.exists() {
        return Err(WorktaskError::not_initialized(&path.display().to_string()));
    }
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    // Cheap and idempotent; picks up tables added since `init`.
    migrations::run_migrations(&conn)?;
    debug!(path = %path.display(), "opened database");
    Ok(conn)
}

/// Create directories and database, then run migrations.
pub fn init_db(path: &Path) -> Result<PathBuf, WorktaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| WorktaskError::database(e.to_string()))?;
    }
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    debug!(path = %path.display(), "initialized database");
    Ok(path.to_path_buf())
}

/// A private in-memory database with the full schema.
pub fn open_in_memory() -> Result<Connection, WorktaskError> {
    let conn = Connection::open_in_memory()?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<(), WorktaskError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}
