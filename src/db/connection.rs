use rusqlite::Connection;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::errors::CrmError;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slot, tagged with the file it was opened on.
thread_local! {
    static DB_CONN: RefCell<Option<(PathBuf, Connection)>> = RefCell::new(None);
}

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provides a mutable connection to the closure, opening (or reopening, if
    /// this thread last used another file) on demand.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CrmError>
    where
        F: FnOnce(&mut Connection) -> Result<T, CrmError>,
    {
        DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let stale = !matches!(slot.as_ref(), Some((p, _)) if p == &self.path);
                if stale {
                    let conn = Connection::open(&self.path)?;
                    *slot = Some((self.path.clone(), conn));
                }
                match slot.as_mut() {
                    Some((_, conn)) => f(conn),
                    None => Err(CrmError::Internal("cache connection missing".into())),
                }
            })
            .map_err(|_| CrmError::Internal("thread-local connection unavailable".into()))?
    }
}

/// Apply the bundled schema. Safe to run on every start.
pub fn init_db(db: &Database) -> Result<(), CrmError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
    })?;

    tracing::debug!(path = %db.path().display(), "local cache schema applied");
    Ok(())
}
