use rusqlite::Connection;
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::errors::StoreError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Lazily opened SQLite handle. The job is single-threaded, so the connection
/// lives in a `RefCell` next to its path instead of a pool.
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
    conn: RefCell<Option<Connection>>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
            conn: RefCell::new(None),
        }
    }

    /// Provides a mutable connection to the closure, opening it on first use.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut slot = self
            .conn
            .try_borrow_mut()
            .map_err(|_| StoreError::Unavailable)?;

        if slot.is_none() {
            let conn = Connection::open(&self.path)
                .map_err(|e| StoreError::Db(format!("Open DB failed: {e}")))?;
            conn.busy_timeout(self.busy_timeout)?;
            *slot = Some(conn);
        }

        let conn = slot.as_mut().ok_or(StoreError::Unavailable)?;
        f(conn)
    }
}

/// Apply the embedded schema. Safe to run on every start.
pub fn init_db(db: &Database) -> Result<(), StoreError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| StoreError::Db(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })?;

    info!(path = %db.path.display(), "Database initialized");
    Ok(())
}
